//! Generic single-parent node graph.
//!
//! The tree is an arena: nodes are owned by one map and every relationship is expressed through
//! [`NodeId`]s, so a built tree can be shared for read-only access across threads.

mod node;
mod tree;
mod walker;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use node::*;
pub use tree::*;
pub use walker::*;
