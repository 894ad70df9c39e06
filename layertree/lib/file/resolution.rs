use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{FilePath, Reference};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The outcome of resolving a requested path in a tree.
///
/// `reference` is the file the path finally resolved to, if any. `link_resolutions` records every
/// basename link that was followed along the way, in the order they were followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResolution {
    /// The path that was requested
    pub request_path: FilePath,

    /// The file the request resolved to
    pub reference: Option<Reference>,

    /// The links that were followed to reach `reference`
    pub link_resolutions: Vec<FileResolution>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FileResolution {
    /// Creates a resolution without any followed links.
    pub fn new(request_path: impl Into<FilePath>, reference: Option<Reference>) -> Self {
        Self {
            request_path: request_path.into(),
            reference,
            link_resolutions: Vec::new(),
        }
    }

    /// Returns `true` if the request resolved to a file.
    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Returns the resolved reference followed by the references of every link in the chain.
    pub fn references(&self) -> Vec<&Reference> {
        self.reference
            .iter()
            .chain(
                self.link_resolutions
                    .iter()
                    .filter_map(|link| link.reference.as_ref()),
            )
            .collect()
    }

    /// Returns the requested path and the request paths of every followed link.
    pub fn all_request_paths(&self) -> BTreeSet<FilePath> {
        std::iter::once(&self.request_path)
            .chain(self.link_resolutions.iter().map(|link| &link.request_path))
            .cloned()
            .collect()
    }

    /// Returns every request path and real path involved in the resolution.
    pub fn all_paths(&self) -> BTreeSet<FilePath> {
        let mut paths = self.all_request_paths();
        paths.extend(
            self.references()
                .into_iter()
                .map(|reference| reference.real_path.clone()),
        );
        paths
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
