//! Blur filters: Gaussian, Box blur

use super::{BuiltinFilter, Params};
use crate::core::error::FilterExecutionError;
use crate::core::kind::{Category, FilterKind};
use crate::core::parameter::ParameterSpec;
use crate::core::types::{ParameterType, Value};
use image::DynamicImage;

/// Largest radius either blur renders; larger values are clamped.
pub(super) const MAX_RADIUS: f64 = 100.0;

pub(super) fn filters() -> Vec<Box<dyn BuiltinFilter>> {
    vec![Box::new(GaussianBlur), Box::new(BoxBlur)]
}

/// Spreads source pixels by an amount specified by a Gaussian distribution.
#[derive(Debug, Clone)]
pub struct GaussianBlur;

impl BuiltinFilter for GaussianBlur {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("GaussianBlur", "Gaussian Blur")
            .description("Spreads source pixels by an amount specified by a Gaussian distribution.")
            .category(Category::Blur)
            .parameter(
                ParameterSpec::new("radius", ParameterType::Scalar, Value::Number(10.0))
                    .with_description("The standard deviation of the blur, in pixels.")
                    .with_class("Number")
                    .with_attribute_type("Distance")
                    .with_range(0.0, MAX_RADIUS),
            )
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let sigma = params.number("radius", 10.0);

        // imageproc rejects a non-positive sigma
        if !(sigma.is_finite() && sigma > 0.0) {
            return Ok(input.clone());
        }
        let sigma = sigma.min(MAX_RADIUS) as f32;

        let rgba = input.to_rgba8();
        let blurred = imageproc::filter::gaussian_blur_f32(&rgba, sigma);
        Ok(DynamicImage::ImageRgba8(blurred))
    }
}

/// Averages each pixel with its neighbours inside a square window.
#[derive(Debug, Clone)]
pub struct BoxBlur;

impl BuiltinFilter for BoxBlur {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("BoxBlur", "Box Blur")
            .description("Blurs an image using a box-shaped convolution kernel.")
            .category(Category::Blur)
            .parameter(
                ParameterSpec::new("radius", ParameterType::Scalar, Value::Number(10.0))
                    .with_description("Half the width of the square window, in pixels.")
                    .with_class("Number")
                    .with_attribute_type("Distance")
                    .with_range(1.0, MAX_RADIUS),
            )
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let radius = params.number("radius", 10.0).round();
        if !(radius.is_finite() && radius >= 1.0) {
            return Ok(input.clone());
        }
        let radius = radius.min(MAX_RADIUS);

        // Separable box kernel
        let size = 2 * radius as usize + 1;
        let kernel = vec![1.0 / size as f32; size];

        let rgba = input.to_rgba8();
        let blurred = imageproc::filter::separable_filter(&rgba, &kernel, &kernel);
        Ok(DynamicImage::ImageRgba8(blurred))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instance::ParameterMap;
    use image::{Rgba, RgbaImage};

    fn run(filter: &dyn BuiltinFilter, radius: f64, input: &DynamicImage) -> DynamicImage {
        let mut values = ParameterMap::new();
        values.insert("radius".to_string(), Value::Number(radius));
        filter.execute(&Params::new("Test", &values), input).unwrap()
    }

    fn checker() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        }))
    }

    #[test]
    fn test_gaussian_blur_metadata() {
        let kind = GaussianBlur.kind();
        assert_eq!(kind.id, "GaussianBlur");
        assert_eq!(kind.category, Category::Blur);
        assert_eq!(kind.parameter_names(), vec!["radius"]);
    }

    #[test]
    fn test_gaussian_zero_radius_is_identity() {
        let input = checker();
        assert_eq!(run(&GaussianBlur, 0.0, &input), input);
    }

    #[test]
    fn test_blur_smooths_checkerboard() {
        let input = checker();
        for filter in [&GaussianBlur as &dyn BuiltinFilter, &BoxBlur] {
            let output = run(filter, 2.0, &input).to_rgba8();
            let px = output.get_pixel(4, 4)[0];
            assert!(px > 60 && px < 200, "pixel {} not smoothed", px);
        }
    }

    #[test]
    fn test_huge_radius_is_clamped() {
        let input = checker();
        for filter in [&GaussianBlur as &dyn BuiltinFilter, &BoxBlur] {
            assert_eq!(run(filter, 1e30, &input), run(filter, MAX_RADIUS, &input));
        }
    }

    #[test]
    fn test_non_finite_radius_is_identity() {
        let input = checker();
        for filter in [&GaussianBlur as &dyn BuiltinFilter, &BoxBlur] {
            for radius in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
                assert_eq!(run(filter, radius, &input), input);
            }
        }
    }
}
