//! Distortion filters driven by a displacement map

use super::{fit_to, generate, BuiltinFilter, Params};
use crate::core::error::FilterExecutionError;
use crate::core::kind::{Category, FilterKind};
use crate::core::parameter::ParameterSpec;
use crate::core::types::{ImageValue, ParameterType, Value};
use image::DynamicImage;

pub(super) fn filters() -> Vec<Box<dyn BuiltinFilter>> {
    vec![Box::new(DisplacementDistortion)]
}

/// Moves each pixel by an offset read from a displacement map.
///
/// The red channel drives horizontal offset and the green channel vertical
/// offset, both centered on mid-gray. A fully transparent map leaves the
/// image untouched.
#[derive(Debug, Clone)]
pub struct DisplacementDistortion;

impl BuiltinFilter for DisplacementDistortion {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("DisplacementDistortion", "Displacement Distortion")
            .description("Applies the grayscale values of the second image to the first image.")
            .category(Category::Distortion)
            .parameter(
                ParameterSpec::new(
                    "displacement_image",
                    ParameterType::DistortionData,
                    Value::Image(ImageValue::transparent(1, 1)),
                )
                .with_class("Image"),
            )
            .parameter(
                ParameterSpec::new("scale", ParameterType::Scalar, Value::Number(50.0))
                    .with_description("The amount of texturing of the resulting image.")
                    .with_class("Number")
                    .with_attribute_type("Distance")
                    .with_range(0.0, 200.0),
            )
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let map = params
            .image("displacement_image")
            .ok_or_else(|| params.invalid("missing displacement image"))?;
        let scale = params.number("scale", 50.0);

        let (width, height) = (input.width(), input.height());
        let source = input.to_rgba8();
        let map = fit_to(map.image(), width, height);
        let (max_x, max_y) = (width as f64 - 1.0, height as f64 - 1.0);

        let out = generate(width, height, |x, y| {
            let m = map.get_pixel(x, y);
            // Alpha gates the displacement so the default map is neutral
            let strength = m[3] as f64 / 255.0;
            let dx = (m[0] as f64 / 255.0 - 0.5) * scale * strength;
            let dy = (m[1] as f64 / 255.0 - 0.5) * scale * strength;

            let sx = (x as f64 + dx).round().clamp(0.0, max_x) as u32;
            let sy = (y as f64 + dy).round().clamp(0.0, max_y) as u32;
            source.get_pixel(sx, sy).0
        });
        Ok(DynamicImage::ImageRgba8(out))
    }
}
