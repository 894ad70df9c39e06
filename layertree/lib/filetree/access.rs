use getset::Getters;

use crate::file::{FilePath, FileResolution};

use super::FileNode;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A node reached by resolving a requested path.
///
/// `leaf_link_resolution` holds the basename links that were followed to reach `node`, in the
/// order they were followed. It never contains `node` itself.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct NodeAccess {
    /// The path that was requested
    request_path: FilePath,

    /// The node the request resolved to
    node: FileNode,

    /// The basename links followed on the way
    leaf_link_resolution: Vec<NodeAccess>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl NodeAccess {
    /// Creates a new access without any followed links.
    pub fn new(request_path: FilePath, node: FileNode) -> Self {
        Self {
            request_path,
            node,
            leaf_link_resolution: Vec::new(),
        }
    }

    /// Records the chain of links followed to reach the node.
    pub fn with_link_resolution(mut self, links: Vec<NodeAccess>) -> Self {
        self.leaf_link_resolution = links;
        self
    }

    pub(crate) fn with_request_path(mut self, request_path: FilePath) -> Self {
        self.request_path = request_path;
        self
    }

    /// Consumes the access and returns the node.
    pub fn into_node(self) -> FileNode {
        self.node
    }

    /// Converts the access into a [`FileResolution`].
    pub fn into_resolution(self) -> FileResolution {
        FileResolution {
            request_path: self.request_path,
            reference: self.node.reference,
            link_resolutions: self
                .leaf_link_resolution
                .into_iter()
                .map(NodeAccess::into_resolution)
                .collect(),
        }
    }
}
