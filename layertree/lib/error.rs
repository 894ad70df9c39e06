use std::{
    error::Error,
    fmt::{self, Display},
};

use thiserror::Error;

use crate::{
    file::{FilePath, FileType},
    tree::NodeId,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a layer tree operation.
pub type LayerTreeResult<T> = Result<T, LayerTreeError>;

/// An error that occurred during a layer tree operation.
#[derive(pretty_error_debug::Debug, Error)]
pub enum LayerTreeError {
    /// Following a chain of links revisited a path that was already resolved
    #[error("link cycle detected while resolving: {0}")]
    LinkCycleDetected(FilePath),

    /// The root path cannot be removed from a tree
    #[error("cannot remove the root path")]
    RemovingRoot,

    /// The path was described twice with incompatible types
    #[error("path {path} already exists as {existing}, cannot add it as {requested}")]
    TypeMismatch {
        /// The path that was added twice
        path: FilePath,

        /// The type of the node already in the tree
        existing: FileType,

        /// The type of the node that was requested
        requested: FileType,
    },

    /// The glob pattern cannot be used for the requested search
    #[error("invalid glob: {0}")]
    InvalidGlob(String),

    /// The glob pattern could not be compiled
    #[error("glob error: {0}")]
    Glob(#[from] globset::Error),

    /// The search requires an index but none was provided
    #[error("search requires a file index: {0}")]
    MissingIndex(String),

    /// The node is not in the tree
    #[error("node not in tree: {0}")]
    NodeNotFound(NodeId),

    /// A node with the same id is already in the tree
    #[error("node already exists: {0}")]
    NodeAlreadyExists(NodeId),

    /// A node cannot be its own parent
    #[error("cannot add self edge: {0}")]
    SelfEdge(NodeId),

    /// The path does not name a whiteout file
    #[error("not a whiteout path: {0}")]
    NotAWhiteout(FilePath),

    /// The parent of a path is missing from the tree
    #[error("unable to find parent path: {0}")]
    ParentNotFound(FilePath),

    /// Merging a layer into the squashed tree failed
    #[error("failed to squash layer {index}: {source}")]
    Layer {
        /// The position of the layer in the union
        index: usize,

        /// The error raised while merging the layer
        #[source]
        source: Box<LayerTreeError>,
    },

    /// Custom error.
    #[error(transparent)]
    Custom(#[from] AnyError),
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl LayerTreeError {
    /// Creates a new `Err` result.
    pub fn custom(error: impl Into<anyhow::Error>) -> LayerTreeError {
        LayerTreeError::Custom(AnyError {
            error: error.into(),
        })
    }

    /// Annotates the error with the index of the layer that produced it.
    pub fn in_layer(self, index: usize) -> LayerTreeError {
        LayerTreeError::Layer {
            index,
            source: Box::new(self),
        }
    }
}

impl AnyError {
    /// Downcasts the error to a `T`.
    pub fn downcast<T>(&self) -> Option<&T>
    where
        T: Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<T>()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates an `Ok` `LayerTreeResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> LayerTreeResult<T> {
    Result::Ok(value)
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}
