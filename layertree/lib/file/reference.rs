use std::{
    fmt::{self, Display},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use serde::{Deserialize, Serialize};

use super::FilePath;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A unique identifier of a file in an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(u64);

/// A handle to a concrete file in an image.
///
/// The id is assigned once by a [`ReferenceIdGenerator`] and never changes. `real_path` is the
/// path the file was described at in its layer, which is not necessarily the path it was
/// requested by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    /// The unique id of the file
    pub id: ReferenceId,

    /// The path the file was described at
    pub real_path: FilePath,
}

/// Allocates unique [`ReferenceId`]s.
///
/// Clones share the same counter, so trees that are squashed together should be created from
/// clones of one generator.
#[derive(Debug, Clone)]
pub struct ReferenceIdGenerator {
    next: Arc<AtomicU64>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ReferenceId {
    /// Returns the numeric value of the id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Reference {
    /// Creates a new reference.
    pub fn new(id: ReferenceId, real_path: impl Into<FilePath>) -> Self {
        Self {
            id,
            real_path: real_path.into(),
        }
    }
}

impl ReferenceIdGenerator {
    /// Creates a new generator. The first id it hands out is `1`.
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Returns the next unused id.
    pub fn next_id(&self) -> ReferenceId {
        ReferenceId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a reference to the file at `real_path` with a fresh id.
    pub fn create_reference(&self, real_path: impl Into<FilePath>) -> Reference {
        Reference::new(self.next_id(), real_path)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for ReferenceIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.real_path, self.id)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
