//! Chain execution.
//!
//! Two pipelines apply a chain to an image: a best-effort preview over a
//! downscaled copy and an authoritative full-resolution export.

pub mod preview;
pub mod export;

pub use preview::{PreviewPipeline, PreviewSurface};
pub use export::{
    apply_chain, encode_to, ExportHandle, ExportOutput, ExportPipeline, ExportTarget,
};
