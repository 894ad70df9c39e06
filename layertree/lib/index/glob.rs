use std::{
    fmt::{self, Display},
    sync::LazyLock,
};

use regex::Regex;

use crate::{filetree::has_meta, DIR_SEPARATOR};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Runs of two or more separators
static REPEATED_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/{2,}").unwrap());

/// Runs of three or more stars
static REPEATED_STARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*{3,}").unwrap());

/// `**` segments directly following each other
static RECURSIVE_STREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(/\*\*)+").unwrap());

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The cheapest way a glob pattern can be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchBasis {
    /// Match the whole pattern against the tree
    Glob,

    /// Look up a single path
    FullPath,

    /// Look up files ending in an extension
    Extension,

    /// Look up files with an exact basename
    Basename,

    /// Match basenames against a single-segment glob
    BasenameGlob,
}

/// A classified search derived from a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// How the search is answered
    pub basis: SearchBasis,

    /// The path, extension, basename or glob to search with
    pub value: String,

    /// A glob every candidate path must also match
    pub requirement: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SearchRequest {
    fn new(basis: SearchBasis, value: impl Into<String>) -> Self {
        Self {
            basis,
            value: value.into(),
            requirement: None,
        }
    }

    fn with_requirement(mut self, requirement: Option<String>) -> Self {
        self.requirement = requirement;
        self
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Classifies a glob pattern into the searches that answer it.
///
/// - A pattern without wildcards is a full path lookup
/// - Brace alternation, character classes and basenames made only of wildcards need a full glob
/// - `*.ext` is an extension lookup, a plain basename is a basename lookup and any other
///   basename is a basename glob
///
/// Relative patterns are anchored at the root, like full tree globs are. Unless the pattern is
/// a basename below `**/`, the anchored pattern is returned as a requirement that every
/// candidate must match as well.
pub fn parse_glob(pattern: &str) -> Vec<SearchRequest> {
    let pattern = clean_glob(pattern);

    if !has_meta(&pattern) {
        return vec![SearchRequest::new(SearchBasis::FullPath, pattern)];
    }

    if pattern.contains(['[', ']', '{', '}']) {
        return vec![SearchRequest::new(SearchBasis::Glob, pattern)];
    }

    let (prefix, basename) = match pattern.rsplit_once(DIR_SEPARATOR) {
        Some((prefix, basename)) => (Some(prefix), basename),
        None => (None, pattern.as_str()),
    };

    if basename.chars().all(|c| c == '*' || c == '?') {
        return vec![SearchRequest::new(SearchBasis::Glob, pattern.clone())];
    }

    let requirement = match prefix {
        Some("**") | Some("/**") => None,
        _ if pattern.starts_with(DIR_SEPARATOR) => Some(pattern.clone()),
        _ => Some(format!("{DIR_SEPARATOR}{pattern}")),
    };

    let request = match basename.strip_prefix('*') {
        Some(extension)
            if extension.len() > 1 && extension.starts_with('.') && !has_meta(extension) =>
        {
            SearchRequest::new(SearchBasis::Extension, extension)
        }
        _ if !has_meta(basename) => SearchRequest::new(SearchBasis::Basename, basename),
        _ => SearchRequest::new(SearchBasis::BasenameGlob, basename),
    };

    vec![request.with_requirement(requirement)]
}

/// Trims a glob pattern and collapses redundant separators and stars.
pub fn clean_glob(pattern: &str) -> String {
    let pattern = pattern.trim();
    let pattern = REPEATED_SEPARATORS.replace_all(pattern, "/");
    let pattern = REPEATED_STARS.replace_all(&pattern, "**");
    let pattern = RECURSIVE_STREAKS.replace_all(&pattern, "**");

    if pattern.len() > 1 {
        pattern.trim_end_matches(DIR_SEPARATOR).to_string()
    } else {
        pattern.to_string()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for SearchBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchBasis::Glob => "glob",
            SearchBasis::FullPath => "full-path",
            SearchBasis::Extension => "extension",
            SearchBasis::Basename => "basename",
            SearchBasis::BasenameGlob => "basename-glob",
        };

        write!(f, "{name}")
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(pattern: &str) -> SearchRequest {
        let mut requests = parse_glob(pattern);
        assert_eq!(requests.len(), 1);
        requests.remove(0)
    }

    fn request(basis: SearchBasis, value: &str, requirement: Option<&str>) -> SearchRequest {
        SearchRequest {
            basis,
            value: value.to_string(),
            requirement: requirement.map(str::to_string),
        }
    }

    #[test]
    fn test_clean_glob() {
        assert_eq!(clean_glob("  /usr//lib///*.so  "), "/usr/lib/*.so");
        assert_eq!(clean_glob("/usr/****/*.so"), "/usr/**/*.so");
        assert_eq!(clean_glob("**/**/**/bin/"), "**/bin");
        assert_eq!(clean_glob("/"), "/");
    }

    #[test]
    fn test_parse_glob_full_path() {
        assert_eq!(
            parse_one("/etc/os-release"),
            request(SearchBasis::FullPath, "/etc/os-release", None)
        );
        assert_eq!(
            parse_one("etc//passwd/"),
            request(SearchBasis::FullPath, "etc/passwd", None)
        );
    }

    #[test]
    fn test_parse_glob_index_searches() {
        assert_eq!(
            parse_one("**/*.jar"),
            request(SearchBasis::Extension, ".jar", None)
        );
        assert_eq!(
            parse_one("**/*.tar.gz"),
            request(SearchBasis::Extension, ".tar.gz", None)
        );
        assert_eq!(
            parse_one("**/os-release"),
            request(SearchBasis::Basename, "os-release", None)
        );
        assert_eq!(
            parse_one("**/python3.*"),
            request(SearchBasis::BasenameGlob, "python3.*", None)
        );
        assert_eq!(
            parse_one("**/*."),
            request(SearchBasis::BasenameGlob, "*.", None)
        );
    }

    #[test]
    fn test_parse_glob_requirements() {
        assert_eq!(
            parse_one("/usr/lib/**/*.so"),
            request(SearchBasis::Extension, ".so", Some("/usr/lib/**/*.so"))
        );
        assert_eq!(
            parse_one("usr/*/bin/java"),
            request(SearchBasis::Basename, "java", Some("/usr/*/bin/java"))
        );
        assert_eq!(
            parse_one("/lib*"),
            request(SearchBasis::BasenameGlob, "lib*", Some("/lib*"))
        );
        assert_eq!(
            parse_one("*.py"),
            request(SearchBasis::Extension, ".py", Some("/*.py"))
        );
    }

    #[test]
    fn test_parse_glob_falls_back_to_full_glob() {
        assert_eq!(parse_one("**"), request(SearchBasis::Glob, "**", None));
        assert_eq!(
            parse_one("/etc/*"),
            request(SearchBasis::Glob, "/etc/*", None)
        );
        assert_eq!(
            parse_one("**/*.{jar,war}"),
            request(SearchBasis::Glob, "**/*.{jar,war}", None)
        );
        assert_eq!(
            parse_one("**/lib[cz].so"),
            request(SearchBasis::Glob, "**/lib[cz].so", None)
        );
    }
}
