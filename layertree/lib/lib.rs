//! `layertree` is a library for modelling the filesystem of a container image as a stack of
//! layer trees.
//!
//! # Overview
//!
//! Every layer of an OCI/Docker image is described by a stream of archive entries. `layertree`
//! turns each stream into a [`FileTree`](filetree::FileTree), resolves paths through those trees
//! the way a container runtime would (following symlinks and hardlinks in ancestor and basename
//! position), and squashes the ordered layers into a single view honoring OCI whiteouts and
//! opaque directories.
//!
//! # Key Features
//!
//! - **Link Resolution**: independent ancestor and basename link following, with cycle detection
//! - **Layer Squashing**: OCI whiteout (`.wh.<name>`) and opaque directory (`.wh..wh..opq`) support
//! - **Indexed Search**: lookups by basename, extension, MIME type and glob patterns
//!
//! # Usage Example
//!
//! ```rust
//! use layertree::{
//!     file::{FileType, Metadata},
//!     filetree::{FileTree, LayerBuilder, UnionTree},
//!     index::{Index, SearchContext},
//! };
//!
//! # fn main() -> layertree::LayerTreeResult<()> {
//! let index = Index::new();
//!
//! let mut lower = FileTree::new();
//! LayerBuilder::new(&mut lower, &index).add_all([
//!     Metadata::builder().path("/etc/os-release").file_type(FileType::Regular).build(),
//!     Metadata::builder().path("/etc/motd").file_type(FileType::Regular).build(),
//! ])?;
//!
//! let mut upper = FileTree::with_id_generator(lower.get_id_generator().clone());
//! LayerBuilder::new(&mut upper, &index).add_all([
//!     Metadata::builder().path("/etc/.wh.motd").file_type(FileType::Regular).build(),
//! ])?;
//!
//! let squashed = UnionTree::from_layers([&lower, &upper]).squash()?;
//! assert!(squashed.has_path("/etc/os-release", &[]));
//! assert!(!squashed.has_path("/etc/motd", &[]));
//!
//! let context = SearchContext::new(&squashed, Some(&index));
//! assert_eq!(context.search_by_glob("**/os-release", &[])?.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`tree`] - Generic single-parent node graph and depth-first walking
//! - [`file`] - Paths, references, archive metadata and resolution results
//! - [`filetree`] - Path resolution, mutation, globbing and layer squashing
//! - [`index`] - Secondary lookup tables and glob search

#![warn(missing_docs)]
#![allow(clippy::module_inception)]

mod defaults;
mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod file;
pub mod filetree;
pub mod index;
pub mod tree;

pub use defaults::*;
pub use error::*;
