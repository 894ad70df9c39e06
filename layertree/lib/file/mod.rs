//! Paths, references and archive metadata shared by trees and indexes.

mod metadata;
mod path;
mod reference;
mod resolution;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use metadata::*;
pub use path::*;
pub use reference::*;
pub use resolution::*;
