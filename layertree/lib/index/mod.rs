//! Secondary lookup tables over layer entries, and searches that combine them with a tree.

mod glob;
mod index;
mod search;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use glob::*;
pub use index::*;
pub use search::*;
