use getset::CopyGetters;
use typed_builder::TypedBuilder;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Options that control how the final segment of a path is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkResolutionOption {
    /// Follow a link in the final segment of the path to the file it points at
    FollowBasenameLinks,

    /// Return the last link of a chain whose target does not exist instead of nothing.
    /// Implies [`LinkResolutionOption::FollowBasenameLinks`].
    DoNotFollowDeadBasenameLinks,
}

/// Decides which links are followed while resolving a path.
///
/// Ancestor links are links in any segment but the last one, basename links are links in the
/// last segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters, TypedBuilder)]
#[getset(get_copy = "pub with_prefix")]
pub struct LinkResolutionStrategy {
    /// Follow links in the ancestor segments of the path
    #[builder(default)]
    follow_ancestor_links: bool,

    /// Follow a link in the final segment of the path
    #[builder(default)]
    follow_basename_links: bool,

    /// Stop at the last link of a dead chain instead of resolving to nothing
    #[builder(default)]
    do_not_follow_dead_basename_links: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl LinkResolutionStrategy {
    /// Creates a strategy that follows ancestor links and applies the given basename options.
    pub fn from_options(options: &[LinkResolutionOption]) -> Self {
        let mut strategy = Self {
            follow_ancestor_links: true,
            ..Self::default()
        };

        for option in options {
            match option {
                LinkResolutionOption::FollowBasenameLinks => {
                    strategy.follow_basename_links = true;
                }
                LinkResolutionOption::DoNotFollowDeadBasenameLinks => {
                    strategy.follow_basename_links = true;
                    strategy.do_not_follow_dead_basename_links = true;
                }
            }
        }

        strategy
    }

    /// Returns `true` if any kind of link is followed.
    pub fn follows_links(&self) -> bool {
        self.follow_ancestor_links || self.follow_basename_links
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for LinkResolutionStrategy {
    fn default() -> Self {
        Self::builder().build()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
