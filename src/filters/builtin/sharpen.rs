//! Sharpening filters

use super::blur::MAX_RADIUS;
use super::{BuiltinFilter, Params};
use crate::core::error::FilterExecutionError;
use crate::core::kind::{Category, FilterKind};
use crate::core::parameter::ParameterSpec;
use crate::core::types::{ParameterType, Value};
use image::{DynamicImage, RgbaImage};

pub(super) fn filters() -> Vec<Box<dyn BuiltinFilter>> {
    vec![Box::new(UnsharpMask), Box::new(SharpenLuminance)]
}

/// Add `intensity` times the difference from a blurred copy. Alpha is kept.
fn unsharp(input: &DynamicImage, sigma: f32, intensity: f32) -> DynamicImage {
    let original = input.to_rgba8();
    if !(sigma.is_finite() && sigma > 0.0) || !intensity.is_finite() || intensity == 0.0 {
        return DynamicImage::ImageRgba8(original);
    }
    let sigma = sigma.min(MAX_RADIUS as f32);

    let blurred = imageproc::filter::gaussian_blur_f32(&original, sigma);
    let out = RgbaImage::from_fn(original.width(), original.height(), |x, y| {
        let o = original.get_pixel(x, y);
        let b = blurred.get_pixel(x, y);
        let sharpen = |i: usize| {
            let v = o[i] as f32 + intensity * (o[i] as f32 - b[i] as f32);
            v.round().clamp(0.0, 255.0) as u8
        };
        image::Rgba([sharpen(0), sharpen(1), sharpen(2), o[3]])
    });
    DynamicImage::ImageRgba8(out)
}

/// Increases the contrast of the edges between pixels of different colors.
#[derive(Debug, Clone)]
pub struct UnsharpMask;

impl BuiltinFilter for UnsharpMask {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("UnsharpMask", "Unsharp Mask")
            .description("Increases the contrast of the edges between pixels of different colors in an image.")
            .category(Category::Sharpen)
            .parameter(
                ParameterSpec::new("radius", ParameterType::Scalar, Value::Number(2.5))
                    .with_description("The radius around a given pixel to apply the unsharp mask.")
                    .with_class("Number")
                    .with_attribute_type("Distance")
                    .with_range(0.0, MAX_RADIUS),
            )
            .parameter(
                ParameterSpec::new("intensity", ParameterType::Scalar, Value::Number(0.5))
                    .with_description("The intensity of the effect.")
                    .with_class("Number")
                    .with_attribute_type("Scalar")
                    .with_range(0.0, 1.0),
            )
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let radius = params.number("radius", 2.5) as f32;
        let intensity = params.number("intensity", 0.5) as f32;
        Ok(unsharp(input, radius, intensity))
    }
}

/// Sharpens fine detail with a fixed small radius.
#[derive(Debug, Clone)]
pub struct SharpenLuminance;

impl BuiltinFilter for SharpenLuminance {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("SharpenLuminance", "Sharpen Luminance")
            .description("Increases image detail by sharpening.")
            .category(Category::Sharpen)
            .parameter(
                ParameterSpec::new("sharpness", ParameterType::Scalar, Value::Number(0.4))
                    .with_class("Number")
                    .with_attribute_type("Scalar")
                    .with_range(0.0, 2.0),
            )
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let sharpness = params.number("sharpness", 0.4) as f32;
        Ok(unsharp(input, 1.0, sharpness))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_flat_image_is_unchanged() {
        let input = DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 6, Rgba([90, 90, 90, 255])));
        let out = unsharp(&input, 2.0, 1.0).to_rgba8();
        for px in out.pixels() {
            assert!((89..=91).contains(&px[0]), "{:?}", px);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn test_edge_contrast_increases() {
        let input = DynamicImage::ImageRgba8(RgbaImage::from_fn(8, 1, |x, _| {
            if x < 4 {
                Rgba([100, 100, 100, 255])
            } else {
                Rgba([150, 150, 150, 255])
            }
        }));
        let out = unsharp(&input, 1.0, 1.0).to_rgba8();
        assert!(out.get_pixel(3, 0)[0] < 100);
        assert!(out.get_pixel(4, 0)[0] > 150);
    }

    #[test]
    fn test_non_finite_radius_is_identity() {
        let input = DynamicImage::ImageRgba8(RgbaImage::from_fn(6, 6, |x, _| Rgba([(x * 40) as u8, 0, 0, 255])));
        for sigma in [f32::INFINITY, f32::NAN, -1.0] {
            assert_eq!(unsharp(&input, sigma, 1.0), input);
        }
    }

    #[test]
    fn test_huge_radius_is_clamped() {
        let input = DynamicImage::ImageRgba8(RgbaImage::from_fn(6, 6, |x, _| Rgba([(x * 40) as u8, 0, 0, 255])));
        let out = unsharp(&input, 1e30, 0.5);
        assert_eq!(out, unsharp(&input, MAX_RADIUS as f32, 0.5));
    }
}
