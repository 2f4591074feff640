//! Core types and traits for FilterShop.
//!
//! This module contains the foundational pieces every pipeline builds on:
//! - Parameter value types and declared parameter types
//! - Parameter specifications and inspector rows
//! - Filter kinds, categories and instances
//! - The filter execution capability
//! - Source images
//! - Error types

pub mod types;
pub mod parameter;
pub mod kind;
pub mod instance;
pub mod executor;
pub mod source;
pub mod error;

// Re-export commonly used types
pub use types::{Value, ParameterType, ImageValue, Color, ExportFormat};
pub use parameter::{ParameterSpec, ParameterRow, ParameterColumn};
pub use kind::{FilterKind, Category};
pub use instance::{FilterInstance, InstanceId, ParameterMap};
pub use executor::{FilterExecutor, FnExecutor, SharedExecutor};
pub use source::{SourceImage, SourceId};
pub use error::{FilterShopError, CatalogError, ParameterError, ChainError, FilterExecutionError, ExportError};
