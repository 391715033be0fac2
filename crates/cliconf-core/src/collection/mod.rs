//! Recursive read/write collections over configuration trees.
//!
//! A [`Collection`] exposes one node: scalars are read and written by key,
//! sections come back as further collections sharing the same storage.
//! Iteration yields only the scalar children of a node; section names are
//! listed separately via [`Collection::section_names`].

pub mod iter;
pub mod store;
pub mod view;

pub use iter::ScalarIter;
pub use store::NodeId;
pub use view::{Collection, Item};
