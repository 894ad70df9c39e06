use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use typed_path::{Utf8UnixComponent, Utf8UnixPath};

use crate::{
    LayerTreeError, LayerTreeResult, DIR_SEPARATOR, OPAQUE_WHITEOUT, ROOT_PATH, WHITEOUT_PREFIX,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A normalized, absolute unix path inside an image filesystem.
///
/// Normalization rules:
/// - Relative paths are anchored at `/`
/// - `.` components and redundant separators are removed
/// - `..` components are resolved and never climb above `/`
/// - Trailing separators are trimmed, except for the root path itself
///
/// Two paths that normalize the same way compare equal, so `FilePath::new("/a/b/")` and
/// `FilePath::new("/a/./b")` name the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FilePath(String);

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FilePath {
    /// Creates a new normalized path.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(normalize(path.as_ref()))
    }

    /// Returns the root path.
    pub fn root() -> Self {
        Self(ROOT_PATH.to_string())
    }

    /// Returns the string representation of the path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this is the root path.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_PATH
    }

    /// Returns the final segment of the path, or `/` for the root path.
    pub fn basename(&self) -> &str {
        if self.is_root() {
            return ROOT_PATH;
        }

        self.0
            .rsplit_once(DIR_SEPARATOR)
            .map(|(_, name)| name)
            .unwrap_or(&self.0)
    }

    /// Returns the parent directory of the path, or `None` for the root path.
    pub fn parent(&self) -> Option<FilePath> {
        if self.is_root() {
            return None;
        }

        match self.0.rsplit_once(DIR_SEPARATOR) {
            Some(("", _)) | None => Some(Self::root()),
            Some((parent, _)) => Some(Self(parent.to_string())),
        }
    }

    /// Appends a relative path to this path and normalizes the result.
    pub fn join(&self, path: impl AsRef<str>) -> FilePath {
        Self::new(format!("{}{}{}", self.0, DIR_SEPARATOR, path.as_ref()))
    }

    /// Returns the segments of the path, excluding the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(DIR_SEPARATOR).filter(|segment| !segment.is_empty())
    }

    /// Returns every ancestor of the path, from the root down to the direct parent.
    pub fn ancestors(&self) -> Vec<FilePath> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(path) = current {
            current = path.parent();
            ancestors.push(path);
        }

        ancestors.reverse();
        ancestors
    }

    /// Returns `true` if the basename marks a whiteout, including opaque directory markers.
    pub fn is_whiteout(&self) -> bool {
        self.basename().starts_with(WHITEOUT_PREFIX)
    }

    /// Returns `true` if the basename is the opaque directory marker.
    pub fn is_opaque_whiteout(&self) -> bool {
        self.basename() == OPAQUE_WHITEOUT
    }

    /// Returns the path hidden by this whiteout.
    ///
    /// ## Errors
    ///
    /// Returns `NotAWhiteout` if the path is not a whiteout or if it is an opaque directory
    /// marker, which hides a set of paths rather than a single one.
    pub fn un_whiteout(&self) -> LayerTreeResult<FilePath> {
        if !self.is_whiteout() || self.is_opaque_whiteout() {
            return Err(LayerTreeError::NotAWhiteout(self.clone()));
        }

        let name = &self.basename()[WHITEOUT_PREFIX.len()..];
        if name.is_empty() {
            return Err(LayerTreeError::NotAWhiteout(self.clone()));
        }

        let parent = self.parent().unwrap_or_else(Self::root);
        Ok(parent.join(name))
    }

    /// Returns the path of the opaque marker that would sit directly inside this directory.
    pub fn opaque_whiteout(&self) -> FilePath {
        self.join(OPAQUE_WHITEOUT)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Normalizes a unix path string.
///
/// Unlike a filesystem lookup this never fails: `..` at the root stays at the root, matching
/// how link targets inside an image are interpreted.
fn normalize(path: &str) -> String {
    let mut normalized: Vec<&str> = Vec::new();
    for component in Utf8UnixPath::new(path).components() {
        match component {
            Utf8UnixComponent::RootDir | Utf8UnixComponent::CurDir => {}
            Utf8UnixComponent::ParentDir => {
                normalized.pop();
            }
            Utf8UnixComponent::Normal(segment) => {
                if !segment.is_empty() {
                    normalized.push(segment);
                }
            }
        }
    }

    if normalized.is_empty() {
        return ROOT_PATH.to_string();
    }

    format!("{}{}", ROOT_PATH, normalized.join("/"))
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FilePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for FilePath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&String> for FilePath {
    fn from(path: &String) -> Self {
        Self::new(path)
    }
}

impl From<&FilePath> for FilePath {
    fn from(path: &FilePath) -> Self {
        path.clone()
    }
}

impl From<FilePath> for String {
    fn from(path: FilePath) -> Self {
        path.0
    }
}

impl AsRef<str> for FilePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_normalize() {
        assert_eq!(FilePath::new("/a/b/").as_str(), "/a/b");
        assert_eq!(FilePath::new("/a//b").as_str(), "/a/b");
        assert_eq!(FilePath::new("/a/./b").as_str(), "/a/b");
        assert_eq!(FilePath::new("a/b").as_str(), "/a/b");
        assert_eq!(FilePath::new("/a/c/../b").as_str(), "/a/b");
        assert_eq!(FilePath::new("/../../b").as_str(), "/b");
        assert_eq!(FilePath::new("").as_str(), "/");
        assert_eq!(FilePath::new("/").as_str(), "/");
        assert_eq!(FilePath::new("///").as_str(), "/");
        assert_eq!(FilePath::new("/a/b/"), FilePath::new("/a/b"));
    }

    #[test]
    fn test_file_path_basename_and_parent() {
        let path = FilePath::new("/usr/lib/libc.so.6");
        assert_eq!(path.basename(), "libc.so.6");
        assert_eq!(path.parent(), Some(FilePath::new("/usr/lib")));
        assert_eq!(FilePath::new("/usr").parent(), Some(FilePath::root()));
        assert_eq!(FilePath::root().parent(), None);
        assert_eq!(FilePath::root().basename(), "/");
    }

    #[test]
    fn test_file_path_join_and_segments() {
        let path = FilePath::new("/usr/lib");
        assert_eq!(path.join("../bin/sh").as_str(), "/usr/bin/sh");
        assert_eq!(FilePath::root().join("etc").as_str(), "/etc");
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["usr", "lib"]);
        assert_eq!(FilePath::root().segments().count(), 0);
        assert_eq!(
            FilePath::new("/a/b/c").ancestors(),
            vec![FilePath::root(), FilePath::new("/a"), FilePath::new("/a/b")]
        );
    }

    #[test]
    fn test_file_path_whiteouts() -> anyhow::Result<()> {
        let whiteout = FilePath::new("/etc/.wh.motd");
        assert!(whiteout.is_whiteout());
        assert!(!whiteout.is_opaque_whiteout());
        assert_eq!(whiteout.un_whiteout()?, FilePath::new("/etc/motd"));

        let opaque = FilePath::new("/etc/.wh..wh..opq");
        assert!(opaque.is_whiteout());
        assert!(opaque.is_opaque_whiteout());
        assert!(matches!(
            opaque.un_whiteout(),
            Err(LayerTreeError::NotAWhiteout(_))
        ));

        assert!(!FilePath::new("/etc/motd").is_whiteout());
        assert!(FilePath::new("/etc/motd").un_whiteout().is_err());
        assert_eq!(
            FilePath::new("/etc").opaque_whiteout(),
            FilePath::new("/etc/.wh..wh..opq")
        );

        Ok(())
    }
}
