use globset::{GlobBuilder, GlobMatcher};
use typed_builder::TypedBuilder;

use crate::{
    file::{FilePath, FileResolution},
    filetree::{FileTree, LinkResolutionOption},
    LayerTreeError, LayerTreeResult,
};

use super::{parse_glob, validate_basename, validate_basename_glob, Index, IndexEntry, SearchBasis};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Answers path, glob, basename, extension and MIME type queries over a tree.
///
/// Without an index every glob search walks the whole tree. With an index, cheap patterns are
/// answered from the index and every hit is checked against the tree, so files removed or
/// replaced by a later layer are never returned.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct SearchContext<'a> {
    /// The tree queries are answered for, usually a squashed tree
    tree: &'a FileTree,

    /// The index of every file in the layers of `tree`
    #[builder(default, setter(strip_option))]
    index: Option<&'a Index>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<'a> SearchContext<'a> {
    /// Creates a new search context.
    pub fn new(tree: &'a FileTree, index: Option<&'a Index>) -> Self {
        Self { tree, index }
    }

    /// Resolves a single path, always following a link in the final segment.
    ///
    /// Returns nothing if the path does not resolve to a file with a reference.
    pub fn search_by_path(
        &self,
        path: impl Into<FilePath>,
        options: &[LinkResolutionOption],
    ) -> LayerTreeResult<Vec<FileResolution>> {
        let mut options = options.to_vec();
        options.push(LinkResolutionOption::FollowBasenameLinks);

        Ok(self
            .tree
            .file(path, &options)?
            .filter(FileResolution::has_reference)
            .into_iter()
            .collect())
    }

    /// Returns every file matching the glob `pattern`.
    pub fn search_by_glob(
        &self,
        pattern: &str,
        options: &[LinkResolutionOption],
    ) -> LayerTreeResult<Vec<FileResolution>> {
        let Some(index) = self.index else {
            return self.search_by_full_glob(pattern, options);
        };

        let mut resolutions = Vec::new();
        for request in parse_glob(pattern) {
            tracing::trace!(basis = %request.basis, value = %request.value, "searching by glob");

            let entries = match request.basis {
                SearchBasis::FullPath => {
                    resolutions.extend(self.search_by_path(request.value.as_str(), options)?);
                    continue;
                }
                SearchBasis::Glob => {
                    resolutions.extend(self.search_by_full_glob(&request.value, options)?);
                    continue;
                }
                SearchBasis::Basename => index.get_by_basename(&request.value)?,
                SearchBasis::BasenameGlob => index.get_by_basename_glob(&request.value)?,
                SearchBasis::Extension => index.get_by_extension(&request.value),
            };

            resolutions.extend(self.references_in_tree(entries, request.requirement.as_deref())?);
        }

        Ok(resolutions)
    }

    /// Returns every file named exactly `basename`.
    pub fn search_by_basename(
        &self,
        basename: &str,
        options: &[LinkResolutionOption],
    ) -> LayerTreeResult<Vec<FileResolution>> {
        match self.index {
            Some(index) => self.references_in_tree(index.get_by_basename(basename)?, None),
            None => {
                validate_basename(basename)?;
                self.search_by_full_glob(&format!("**/{basename}"), options)
            }
        }
    }

    /// Returns every file whose basename matches the single-segment glob `pattern`.
    pub fn search_by_basename_glob(
        &self,
        pattern: &str,
        options: &[LinkResolutionOption],
    ) -> LayerTreeResult<Vec<FileResolution>> {
        match self.index {
            Some(index) => self.references_in_tree(index.get_by_basename_glob(pattern)?, None),
            None => {
                validate_basename_glob(pattern)?;
                self.search_by_full_glob(&format!("**/{pattern}"), options)
            }
        }
    }

    /// Returns every file whose basename ends in `extension`.
    pub fn search_by_extension(
        &self,
        extension: &str,
        options: &[LinkResolutionOption],
    ) -> LayerTreeResult<Vec<FileResolution>> {
        match self.index {
            Some(index) => self.references_in_tree(index.get_by_extension(extension), None),
            None => {
                let extension = extension.trim_start_matches('.');
                self.search_by_full_glob(&format!("**/*.{extension}"), options)
            }
        }
    }

    /// Returns every file with one of the given MIME types.
    ///
    /// ## Errors
    ///
    /// Returns `MissingIndex` if the context has no index, since trees hold no MIME types.
    pub fn search_by_mime_type(&self, mime_types: &[&str]) -> LayerTreeResult<Vec<FileResolution>> {
        let Some(index) = self.index else {
            return Err(LayerTreeError::MissingIndex(
                "searching by MIME type".to_string(),
            ));
        };

        let mut resolutions = Vec::new();
        for mime_type in mime_types {
            resolutions.extend(self.references_in_tree(index.get_by_mime_type(mime_type), None)?);
        }

        Ok(resolutions)
    }

    fn search_by_full_glob(
        &self,
        pattern: &str,
        options: &[LinkResolutionOption],
    ) -> LayerTreeResult<Vec<FileResolution>> {
        tracing::debug!(pattern, "searching the whole tree by glob");
        self.tree.files_by_glob(pattern, options)
    }

    /// Keeps the index entries that are still the files the tree resolves their paths to.
    fn references_in_tree(
        &self,
        entries: Vec<IndexEntry>,
        requirement: Option<&str>,
    ) -> LayerTreeResult<Vec<FileResolution>> {
        let requirement = requirement.map(compile_requirement).transpose()?;

        let mut resolutions = Vec::new();
        for entry in entries {
            let resolution = match self.tree.file(
                entry.reference.real_path.clone(),
                &[LinkResolutionOption::FollowBasenameLinks],
            ) {
                Ok(Some(resolution)) => resolution,
                Ok(None) => continue,
                Err(LayerTreeError::LinkCycleDetected(path)) => {
                    tracing::trace!(%path, "skipping index entry with a link cycle");
                    continue;
                }
                Err(error) => return Err(error),
            };

            let in_tree = resolution
                .references()
                .iter()
                .any(|reference| reference.id == entry.reference.id);
            if !in_tree {
                continue;
            }

            if let Some(matcher) = &requirement {
                let matches = resolution
                    .all_paths()
                    .iter()
                    .any(|path| matcher.is_match(path.as_str()));
                if !matches {
                    continue;
                }
            }

            resolutions.push(resolution);
        }

        Ok(resolutions)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn compile_requirement(requirement: &str) -> LayerTreeResult<GlobMatcher> {
    Ok(GlobBuilder::new(requirement)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}
