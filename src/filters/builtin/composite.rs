//! Composite filters: source-over compositing

use super::{fit_to, generate, BuiltinFilter, Params};
use crate::core::error::FilterExecutionError;
use crate::core::kind::{Category, FilterKind};
use crate::core::parameter::ParameterSpec;
use crate::core::types::{ImageValue, ParameterType, Value};
use image::{DynamicImage, Rgba};

pub(super) fn filters() -> Vec<Box<dyn BuiltinFilter>> {
    vec![Box::new(SourceOverCompositing)]
}

/// Places the input image over a background image.
#[derive(Debug, Clone)]
pub struct SourceOverCompositing;

impl BuiltinFilter for SourceOverCompositing {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("SourceOverCompositing", "Source Over Compositing")
            .description("Places the input image over the background image.")
            .category(Category::CompositeOperation)
            .parameter(
                ParameterSpec::new(
                    "background_image",
                    ParameterType::Image,
                    Value::Image(ImageValue::transparent(1, 1)),
                )
                .with_description("The image to use as a background image.")
                .with_class("Image"),
            )
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let background = params
            .image("background_image")
            .ok_or_else(|| params.invalid("missing background image"))?;

        let (width, height) = (input.width(), input.height());
        let source = input.to_rgba8();
        let backdrop = fit_to(background.image(), width, height);

        let out = generate(width, height, |x, y| {
            source_over(source.get_pixel(x, y), backdrop.get_pixel(x, y))
        });
        Ok(DynamicImage::ImageRgba8(out))
    }
}

/// Porter-Duff source-over on straight alpha pixels.
fn source_over(src: &Rgba<u8>, dst: &Rgba<u8>) -> [u8; 4] {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }

    let channel = |i: usize| {
        let s = src[i] as f32 / 255.0;
        let d = dst[i] as f32 / 255.0;
        let c = (s * sa + d * da * (1.0 - sa)) / out_a;
        (c * 255.0).round().clamp(0.0, 255.0) as u8
    };

    [
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}
