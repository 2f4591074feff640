//! Built-in filter implementations.
//!
//! This module contains the standard filter kinds that ship with FilterShop
//! and [`BuiltinExecutor`], the CPU backend that renders them.

mod blur;
mod color;
mod composite;
mod distortion;
mod gradient;
mod sharpen;
mod stylize;

use crate::core::error::FilterExecutionError;
use crate::core::executor::FilterExecutor;
use crate::core::instance::ParameterMap;
use crate::core::kind::FilterKind;
use crate::core::types::{Color, ImageValue, Value};
use crate::filters::registry::FilterCatalog;
use image::{DynamicImage, RgbaImage};
use indexmap::IndexMap;
use rayon::prelude::*;

/// A filter kind together with its pixel implementation.
pub trait BuiltinFilter: Send + Sync {
    /// Static description registered in the catalog.
    fn kind(&self) -> FilterKind;

    /// Render `input` with the given parameter values.
    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError>;
}

fn all_filters() -> Vec<Box<dyn BuiltinFilter>> {
    let mut filters = blur::filters();
    filters.extend(color::filters());
    filters.extend(composite::filters());
    filters.extend(distortion::filters());
    filters.extend(gradient::filters());
    filters.extend(sharpen::filters());
    filters.extend(stylize::filters());
    filters
}

/// Register all built-in filter kinds.
pub fn register_all(catalog: &mut FilterCatalog) {
    for filter in all_filters() {
        catalog.register(filter.kind());
    }
}

// Re-export for direct access
pub use blur::{BoxBlur, GaussianBlur};
pub use color::{ColorControls, ColorInvert, ExposureAdjust, GammaAdjust, Monochrome, SepiaTone};
pub use composite::SourceOverCompositing;
pub use distortion::DisplacementDistortion;
pub use gradient::{LinearGradient, RadialGradient};
pub use sharpen::{SharpenLuminance, UnsharpMask};
pub use stylize::{Edges, Pixellate};

/// CPU executor for every built-in kind.
///
/// Kinds it does not know are reported as `Unsupported`.
pub struct BuiltinExecutor {
    filters: IndexMap<String, Box<dyn BuiltinFilter>>,
}

impl BuiltinExecutor {
    pub fn new() -> Self {
        let filters = all_filters()
            .into_iter()
            .map(|filter| (filter.kind().id, filter))
            .collect();
        Self { filters }
    }

    /// Whether this executor can render `kind_id`.
    pub fn supports(&self, kind_id: &str) -> bool {
        self.filters.contains_key(kind_id)
    }
}

impl Default for BuiltinExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BuiltinExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinExecutor")
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FilterExecutor for BuiltinExecutor {
    fn name(&self) -> &str {
        "builtin"
    }

    fn apply(
        &self,
        kind: &FilterKind,
        parameters: &ParameterMap,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let filter = self
            .filters
            .get(&kind.id)
            .ok_or_else(|| FilterExecutionError::Unsupported {
                kind: kind.id.clone(),
            })?;

        if input.width() == 0 || input.height() == 0 {
            return Err(FilterExecutionError::InvalidInput {
                kind: kind.id.clone(),
                reason: "image has no pixels".to_string(),
            });
        }

        check_finite(&kind.id, parameters)?;
        filter.execute(&Params::new(&kind.id, parameters), input)
    }
}

/// Reject NaN and infinite numbers before any filter sizes a kernel from them.
fn check_finite(kind: &str, parameters: &ParameterMap) -> Result<(), FilterExecutionError> {
    for (name, value) in parameters {
        let finite = match value {
            Value::Number(n) => n.is_finite(),
            Value::Vector(v) => v.iter().all(|c| c.is_finite()),
            _ => true,
        };
        if !finite {
            return Err(FilterExecutionError::InvalidInput {
                kind: kind.to_string(),
                reason: format!("parameter '{}' is not a finite number", name),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Parameter access
// ============================================================================

/// Typed read access to an instance's parameter values.
///
/// Missing or mistyped values fall back to the caller's default.
pub struct Params<'a> {
    kind: &'a str,
    values: &'a ParameterMap,
}

impl<'a> Params<'a> {
    pub fn new(kind: &'a str, values: &'a ParameterMap) -> Self {
        Self { kind, values }
    }

    pub fn kind(&self) -> &str {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn number(&self, name: &str, default: f64) -> f64 {
        self.get(name).and_then(Value::as_number).unwrap_or(default)
    }

    /// A two-component vector as a point.
    pub fn point(&self, name: &str, default: (f64, f64)) -> (f64, f64) {
        match self.get(name).and_then(Value::as_vector) {
            Some([x, y, ..]) => (*x, *y),
            _ => default,
        }
    }

    pub fn color(&self, name: &str, default: Color) -> Color {
        self.get(name).and_then(Value::as_color).unwrap_or(default)
    }

    pub fn image(&self, name: &str) -> Option<&ImageValue> {
        self.get(name).and_then(Value::as_image)
    }

    /// Error for an input this kind cannot render.
    pub fn invalid(&self, reason: impl Into<String>) -> FilterExecutionError {
        FilterExecutionError::InvalidInput {
            kind: self.kind.to_string(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Pixel helpers
// ============================================================================

/// Apply `f` to every RGBA pixel in parallel.
pub(crate) fn map_pixels<F>(input: &DynamicImage, f: F) -> DynamicImage
where
    F: Fn([u8; 4]) -> [u8; 4] + Send + Sync,
{
    let mut rgba = input.to_rgba8();
    rgba.par_chunks_exact_mut(4).for_each(|px| {
        let out = f([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    });
    DynamicImage::ImageRgba8(rgba)
}

/// Fill an image of the given size from a per-coordinate function, rows in
/// parallel.
pub(crate) fn generate<F>(width: u32, height: u32, f: F) -> RgbaImage
where
    F: Fn(u32, u32) -> [u8; 4] + Send + Sync,
{
    let mut out = RgbaImage::new(width, height);
    let row_len = width as usize * 4;
    out.par_chunks_exact_mut(row_len.max(4))
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                px.copy_from_slice(&f(x as u32, y as u32));
            }
        });
    out
}

/// Resize `image` to exactly `width` x `height` when it differs.
pub(crate) fn fit_to(image: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let rgba = image.to_rgba8();
    if rgba.dimensions() == (width, height) {
        rgba
    } else if rgba.width() == 0 || rgba.height() == 0 {
        // Nothing to sample; treat as fully transparent
        RgbaImage::new(width, height)
    } else {
        image::imageops::resize(&rgba, width, height, image::imageops::FilterType::Triangle)
    }
}

/// Convert a normalized channel back to a byte.
pub(crate) fn to_byte(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Rec. 709 luma of a normalized RGB triple.
pub(crate) fn luma(r: f64, g: f64, b: f64) -> f64 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}
