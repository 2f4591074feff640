//! # FilterShop - Ordered Image Filter Chains
//!
//! FilterShop lets an application open an image, pick filters from a
//! categorized catalog, stack them into an ordered chain, watch a live
//! preview of the result and export the final image to disk.
//!
//! ## Features
//!
//! - **Filter Catalog**: Kinds grouped by category with typed parameter schemas
//! - **Ordered Chains**: Append, remove and reorder instances; every edit notifies subscribers
//! - **Live Preview**: Downscaled, cached, best-effort rendering after each edit
//! - **Authoritative Export**: Full-resolution, snapshot-based, atomically written to disk
//! - **Pluggable Execution**: Pixel work goes through the [`FilterExecutor`](crate::core::executor::FilterExecutor) trait
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use filtershop::prelude::*;
//!
//! let doc = Document::with_builtins(&FilterShopConfig::default());
//! doc.open_image("input.png")?;
//!
//! let blur = doc.add_filter("GaussianBlur")?;
//! doc.set_parameter(blur, "radius", Value::Number(4.0))?;
//! doc.add_filter("SepiaTone")?;
//!
//! let preview = doc.preview().expect("image is open");
//! println!("preview is {}x{}", preview.width(), preview.height());
//!
//! doc.export_to("output.png", None)?;
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Values, parameter specs, filter kinds and instances, errors
//! - [`chain`]: The ordered chain and its change notifications
//! - [`filters`]: The catalog and the built-in filters
//! - [`execution`]: Preview and export pipelines
//! - [`document`]: A session tying image, chain and pipelines together
//! - [`config`]: TOML configuration
//!
//! ## Custom Executors
//!
//! Any backend can render filters by implementing
//! [`FilterExecutor`](crate::core::executor::FilterExecutor):
//!
//! ```rust,ignore
//! use filtershop::prelude::*;
//!
//! struct Passthrough;
//!
//! impl FilterExecutor for Passthrough {
//!     fn apply(
//!         &self,
//!         _kind: &FilterKind,
//!         _parameters: &ParameterMap,
//!         input: &DynamicImage,
//!     ) -> Result<DynamicImage, FilterExecutionError> {
//!         Ok(input.clone())
//!     }
//! }
//! ```

#![warn(clippy::all)]

pub mod core;
pub mod chain;
pub mod filters;
pub mod execution;
pub mod document;
pub mod config;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use filtershop::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{Color, ExportFormat, ImageValue, ParameterType, Value};
    pub use crate::core::parameter::{ParameterColumn, ParameterRow, ParameterSpec};
    pub use crate::core::kind::{Category, FilterKind};
    pub use crate::core::instance::{FilterInstance, InstanceId, ParameterMap};
    pub use crate::core::executor::{FilterExecutor, FnExecutor, SharedExecutor};
    pub use crate::core::source::{SourceId, SourceImage};

    // Errors
    pub use crate::core::error::{
        CatalogError, ChainError, ConfigError, ExportError, FilterExecutionError, FilterShopError,
        FilterShopResult, ImageLoadError, ParameterError,
    };

    // Chain
    pub use crate::chain::observer::{ChainEvent, ChainListener, SubscriptionId};
    pub use crate::chain::structure::{ChainSnapshot, FilterChain};

    // Filters
    pub use crate::filters::builtin::BuiltinExecutor;
    pub use crate::filters::registry::{CatalogEntry, FilterCatalog};

    // Execution
    pub use crate::execution::export::{ExportHandle, ExportOutput, ExportPipeline, ExportTarget};
    pub use crate::execution::preview::{PreviewPipeline, PreviewSurface};

    // Session
    pub use crate::config::{ChainPolicy, FilterShopConfig};
    pub use crate::document::{Document, DocumentState, ParameterSheet};

    pub use image::DynamicImage;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
