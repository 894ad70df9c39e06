//! Layer trees: path resolution, mutation, globbing and squashing.

mod access;
mod builder;
mod filetree;
mod glob;
mod node;
mod strategy;
mod union;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use access::*;
pub use builder::*;
pub use filetree::*;
pub use node::*;
pub use strategy::*;
pub use union::*;

pub(crate) use glob::has_meta;
