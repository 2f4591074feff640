//! Stylize filters: Pixellate, Edges

use super::{generate, to_byte, BuiltinFilter, Params};
use crate::core::error::FilterExecutionError;
use crate::core::kind::{Category, FilterKind};
use crate::core::parameter::ParameterSpec;
use crate::core::types::{ParameterType, Value};
use image::DynamicImage;

pub(super) fn filters() -> Vec<Box<dyn BuiltinFilter>> {
    vec![Box::new(Pixellate), Box::new(Edges)]
}

/// Makes an image blocky by mapping it to colored squares.
#[derive(Debug, Clone)]
pub struct Pixellate;

impl BuiltinFilter for Pixellate {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("Pixellate", "Pixellate")
            .description("Makes an image blocky by mapping the image to colored squares whose color is defined by the replaced pixels.")
            .category(Category::Stylize)
            .parameter(
                ParameterSpec::new("center", ParameterType::Vector, Value::Vector(vec![150.0, 150.0]))
                    .with_class("Vector")
                    .with_attribute_type("Position"),
            )
            .parameter(
                ParameterSpec::new("scale", ParameterType::Scalar, Value::Number(8.0))
                    .with_description("The scale determines the size of the squares.")
                    .with_class("Number")
                    .with_attribute_type("Distance")
                    .with_range(1.0, 100.0),
            )
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let (cx, cy) = params.point("center", (150.0, 150.0));
        let scale = params.number("scale", 8.0);
        if !(scale >= 1.0) {
            return Ok(input.clone());
        }

        let source = input.to_rgba8();
        let (max_x, max_y) = (source.width() as f64 - 1.0, source.height() as f64 - 1.0);

        // Blocks are aligned so that one block corner sits on the center point
        let block_center = |v: u32, origin: f64| {
            let cell = ((v as f64 - origin) / scale).floor();
            origin + cell * scale + scale / 2.0
        };

        let out = generate(source.width(), source.height(), |x, y| {
            let sx = block_center(x, cx).floor().clamp(0.0, max_x) as u32;
            let sy = block_center(y, cy).floor().clamp(0.0, max_y) as u32;
            source.get_pixel(sx, sy).0
        });
        Ok(DynamicImage::ImageRgba8(out))
    }
}

/// Finds all edges in an image.
#[derive(Debug, Clone)]
pub struct Edges;

impl BuiltinFilter for Edges {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("Edges", "Edges")
            .description("Finds all edges in an image and displays them in color.")
            .category(Category::Stylize)
            .parameter(
                ParameterSpec::new("intensity", ParameterType::Scalar, Value::Number(1.0))
                    .with_class("Number")
                    .with_attribute_type("Scalar")
                    .with_range(0.0, 10.0),
            )
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let intensity = params.number("intensity", 1.0).max(0.0);
        let gray = input.to_luma8();
        let alpha = input.to_rgba8();
        let gradients = imageproc::gradients::sobel_gradients(&gray);

        let out = generate(gray.width(), gray.height(), |x, y| {
            // Sobel magnitude tops out near 4 * 255 * sqrt(2)
            let magnitude = gradients.get_pixel(x, y)[0] as f64 / 1442.0;
            let v = to_byte(magnitude * intensity);
            [v, v, v, alpha.get_pixel(x, y)[3]]
        });
        Ok(DynamicImage::ImageRgba8(out))
    }
}
