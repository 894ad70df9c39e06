use std::collections::BTreeSet;

use globset::{GlobBuilder, GlobMatcher};

use crate::{
    file::{FilePath, FileResolution},
    LayerTreeError, LayerTreeResult, DIR_SEPARATOR,
};

use super::{FileTree, LinkResolutionOption, LinkResolutionStrategy};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A single `/`-separated segment of a compiled glob pattern.
enum Segment {
    /// `**`, matching zero or more directories
    Recursive,

    /// A segment without metacharacters
    Literal(String),

    /// A segment with metacharacters, matched against one basename
    Pattern(GlobMatcher),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FileTree {
    /// Returns the resolution of every non-directory path matching the glob `pattern`.
    ///
    /// The pattern is matched segment by segment against the tree, listing directories through
    /// links the way a real filesystem would. `*` never crosses a `/` and `**` matches any number
    /// of directories. Relative patterns are anchored at `/`. Matches are resolved with `options`,
    /// so links in the final segment are only followed when requested.
    pub fn files_by_glob(
        &self,
        pattern: &str,
        options: &[LinkResolutionOption],
    ) -> LayerTreeResult<Vec<FileResolution>> {
        let segments = compile(pattern)?;

        let mut matches = BTreeSet::new();
        let mut branch = vec![FilePath::root()];
        self.expand_glob(&FilePath::root(), &segments, &mut branch, &mut matches)?;

        let mut resolutions = Vec::new();
        for path in matches {
            match self.file_access(path.clone(), options) {
                Ok(Some(access)) if !access.get_node().is_dir() => {
                    resolutions.push(access.into_resolution());
                }
                Ok(_) => {}
                Err(LayerTreeError::LinkCycleDetected(_)) => {
                    tracing::trace!(%path, "skipping glob match with a link cycle");
                }
                Err(error) => return Err(error),
            }
        }

        Ok(resolutions)
    }

    fn expand_glob(
        &self,
        current: &FilePath,
        segments: &[Segment],
        branch: &mut Vec<FilePath>,
        matches: &mut BTreeSet<FilePath>,
    ) -> LayerTreeResult<()> {
        let Some((segment, rest)) = segments.split_first() else {
            matches.insert(current.clone());
            return Ok(());
        };

        match segment {
            Segment::Recursive => {
                self.expand_glob(current, rest, branch, matches)?;

                for child in self.glob_entries(current) {
                    if rest.is_empty() {
                        matches.insert(child.clone());
                    }

                    let Some(dir) = self.glob_dir(&child) else {
                        continue;
                    };

                    // A directory already on the branch is reached again through a link
                    if branch.contains(&dir) {
                        tracing::trace!(path = %child, "not descending into link loop");
                        continue;
                    }

                    branch.push(dir);
                    let result = self.expand_glob(&child, segments, branch, matches);
                    branch.pop();
                    result?;
                }
            }
            Segment::Literal(name) => {
                self.expand_glob_child(&current.join(name), rest, branch, matches)?;
            }
            Segment::Pattern(matcher) => {
                for child in self.glob_entries(current) {
                    if matcher.is_match(child.basename()) {
                        self.expand_glob_child(&child, rest, branch, matches)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn expand_glob_child(
        &self,
        child: &FilePath,
        rest: &[Segment],
        branch: &mut Vec<FilePath>,
        matches: &mut BTreeSet<FilePath>,
    ) -> LayerTreeResult<()> {
        if rest.is_empty() {
            if self.glob_entry_exists(child) {
                matches.insert(child.clone());
            }
            return Ok(());
        }

        let Some(dir) = self.glob_dir(child) else {
            return Ok(());
        };

        branch.push(dir);
        let result = self.expand_glob(child, rest, branch, matches);
        branch.pop();
        result
    }

    fn glob_entries(&self, dir: &FilePath) -> Vec<FilePath> {
        self.list_paths(dir.clone()).unwrap_or_else(|error| {
            tracing::trace!(%dir, %error, "cannot list glob directory");
            Vec::new()
        })
    }

    /// Returns the real path of the directory `path` resolves to, following every link.
    fn glob_dir(&self, path: &FilePath) -> Option<FilePath> {
        let strategy = LinkResolutionStrategy::from_options(&[
            LinkResolutionOption::FollowBasenameLinks,
        ]);

        match self.resolve(path.clone(), strategy) {
            Ok(Some(access)) if access.get_node().is_dir() => {
                Some(access.into_node().real_path)
            }
            _ => None,
        }
    }

    fn glob_entry_exists(&self, path: &FilePath) -> bool {
        let strategy = LinkResolutionStrategy::from_options(&[]);
        matches!(self.resolve(path.clone(), strategy), Ok(Some(_)))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn compile(pattern: &str) -> LayerTreeResult<Vec<Segment>> {
    let mut segments: Vec<Segment> = Vec::new();
    for segment in pattern.split(DIR_SEPARATOR).filter(|segment| !segment.is_empty()) {
        if segment == "**" {
            if !matches!(segments.last(), Some(Segment::Recursive)) {
                segments.push(Segment::Recursive);
            }
            continue;
        }

        if !has_meta(segment) {
            segments.push(Segment::Literal(segment.to_string()));
            continue;
        }

        let matcher = GlobBuilder::new(segment)
            .literal_separator(true)
            .build()?
            .compile_matcher();
        segments.push(Segment::Pattern(matcher));
    }

    Ok(segments)
}

/// Returns `true` if the segment holds any glob metacharacter.
pub(crate) fn has_meta(segment: &str) -> bool {
    segment.contains(['*', '?', '[', ']', '{', '}', '\\'])
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
