use crate::{
    file::{FilePath, FileType, Reference},
    tree::{Node, NodeId},
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The kind of a [`FileNode`], together with the data each kind carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A regular file, or any other non-directory, non-link entry
    Regular,

    /// A directory
    Directory,

    /// A symlink with its raw target, which may be relative
    SymLink(String),

    /// A hardlink with its absolute target
    HardLink(FilePath),
}

/// A node in a [`FileTree`](super::FileTree).
///
/// A node without a reference is a directory that was created implicitly as the ancestor of
/// another path. It receives a reference once the layer describes it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// The path the node lives at
    pub real_path: FilePath,

    /// The kind of the node
    pub kind: NodeKind,

    /// The file the node stands for
    pub reference: Option<Reference>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl NodeKind {
    /// Returns the file type of the kind.
    pub fn file_type(&self) -> FileType {
        match self {
            NodeKind::Regular => FileType::Regular,
            NodeKind::Directory => FileType::Directory,
            NodeKind::SymLink(_) => FileType::SymLink,
            NodeKind::HardLink(_) => FileType::HardLink,
        }
    }
}

impl FileNode {
    /// Creates a new node.
    pub fn new(real_path: FilePath, kind: NodeKind, reference: Option<Reference>) -> Self {
        Self {
            real_path,
            kind,
            reference,
        }
    }

    /// Creates a directory node without a reference.
    pub fn implicit_dir(real_path: FilePath) -> Self {
        Self::new(real_path, NodeKind::Directory, None)
    }

    /// Returns the file type of the node.
    pub fn file_type(&self) -> FileType {
        self.kind.file_type()
    }

    /// Returns `true` if the node is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }

    /// Returns `true` if the node is a symlink or a hardlink.
    pub fn is_link(&self) -> bool {
        matches!(self.kind, NodeKind::SymLink(_) | NodeKind::HardLink(_))
    }

    /// Returns the path a link node points at.
    ///
    /// Absolute targets are used as is, relative symlink targets are joined onto the directory
    /// holding the link. An empty target yields `None`, so the link is treated as dead.
    pub fn link_target(&self) -> Option<FilePath> {
        match &self.kind {
            NodeKind::SymLink(target) if target.is_empty() => None,
            NodeKind::SymLink(target) if target.starts_with('/') => Some(FilePath::new(target)),
            NodeKind::SymLink(target) => {
                let dir = self.real_path.parent().unwrap_or_else(FilePath::root);
                Some(dir.join(target))
            }
            NodeKind::HardLink(target) => Some(target.clone()),
            NodeKind::Regular | NodeKind::Directory => None,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Node for FileNode {
    fn id(&self) -> NodeId {
        NodeId::from(&self.real_path)
    }
}

impl From<&FilePath> for NodeId {
    fn from(path: &FilePath) -> Self {
        NodeId::new(path.as_str())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
