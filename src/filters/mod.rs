//! Filter module.
//!
//! Contains the filter catalog and built-in filter implementations.

pub mod registry;
pub mod builtin;

pub use registry::{CatalogEntry, FilterCatalog};
pub use builtin::BuiltinExecutor;
