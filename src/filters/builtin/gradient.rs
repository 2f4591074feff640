//! Gradient generators

use super::{generate, BuiltinFilter, Params};
use crate::core::error::FilterExecutionError;
use crate::core::kind::{Category, FilterKind};
use crate::core::parameter::ParameterSpec;
use crate::core::types::{Color, ParameterType, Value};
use image::DynamicImage;

pub(super) fn filters() -> Vec<Box<dyn BuiltinFilter>> {
    vec![Box::new(LinearGradient), Box::new(RadialGradient)]
}

fn position(name: &str, x: f64, y: f64) -> ParameterSpec {
    ParameterSpec::new(name, ParameterType::Vector, Value::Vector(vec![x, y]))
        .with_class("Vector")
        .with_attribute_type("Position")
}

fn color(name: &str, default: Color) -> ParameterSpec {
    ParameterSpec::new(name, ParameterType::Color, Value::Color(default)).with_class("Color")
}

fn lerp(a: Color, b: Color, t: f64) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    [mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a)]
}

/// Generates a gradient that varies along a line between two points.
///
/// The output has the size of the input; input pixels are ignored.
#[derive(Debug, Clone)]
pub struct LinearGradient;

impl BuiltinFilter for LinearGradient {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("LinearGradient", "Linear Gradient")
            .description("Generates a gradient that varies along a linear axis between two defined endpoints.")
            .category(Category::Gradient)
            .parameter(position("point0", 0.0, 0.0))
            .parameter(position("point1", 200.0, 200.0))
            .parameter(color("color0", Color::WHITE))
            .parameter(color("color1", Color::BLACK))
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let (x0, y0) = params.point("point0", (0.0, 0.0));
        let (x1, y1) = params.point("point1", (200.0, 200.0));
        let c0 = params.color("color0", Color::WHITE);
        let c1 = params.color("color1", Color::BLACK);

        let (dx, dy) = (x1 - x0, y1 - y0);
        let length_sq = dx * dx + dy * dy;

        let out = generate(input.width(), input.height(), |x, y| {
            if length_sq <= f64::EPSILON {
                return lerp(c0, c1, 0.0);
            }
            let t = ((x as f64 - x0) * dx + (y as f64 - y0) * dy) / length_sq;
            lerp(c0, c1, t)
        });
        Ok(DynamicImage::ImageRgba8(out))
    }
}

/// Generates a gradient that varies radially between two circles.
#[derive(Debug, Clone)]
pub struct RadialGradient;

impl BuiltinFilter for RadialGradient {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("RadialGradient", "Radial Gradient")
            .description("Generates a gradient that varies radially between two circles having the same center.")
            .category(Category::Gradient)
            .parameter(position("center", 150.0, 150.0))
            .parameter(
                ParameterSpec::new("radius0", ParameterType::Scalar, Value::Number(5.0))
                    .with_class("Number")
                    .with_attribute_type("Distance")
                    .with_range(0.0, 800.0),
            )
            .parameter(
                ParameterSpec::new("radius1", ParameterType::Scalar, Value::Number(100.0))
                    .with_class("Number")
                    .with_attribute_type("Distance")
                    .with_range(0.0, 800.0),
            )
            .parameter(color("color0", Color::WHITE))
            .parameter(color("color1", Color::BLACK))
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let (cx, cy) = params.point("center", (150.0, 150.0));
        let r0 = params.number("radius0", 5.0);
        let r1 = params.number("radius1", 100.0);
        let c0 = params.color("color0", Color::WHITE);
        let c1 = params.color("color1", Color::BLACK);
        let span = r1 - r0;

        let out = generate(input.width(), input.height(), |x, y| {
            let distance = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
            if span.abs() <= f64::EPSILON {
                let t = if distance < r0 { 0.0 } else { 1.0 };
                return lerp(c0, c1, t);
            }
            lerp(c0, c1, (distance - r0) / span)
        });
        Ok(DynamicImage::ImageRgba8(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instance::ParameterMap;

    #[test]
    fn test_linear_gradient_endpoints() {
        let mut values = ParameterMap::new();
        values.insert("point0".to_string(), Value::Vector(vec![0.0, 0.0]));
        values.insert("point1".to_string(), Value::Vector(vec![10.0, 0.0]));
        let input = DynamicImage::new_rgba8(11, 2);

        let out = LinearGradient
            .execute(&Params::new("LinearGradient", &values), &input)
            .unwrap()
            .to_rgba8();

        assert_eq!(out.dimensions(), (11, 2));
        assert_eq!(out.get_pixel(0, 1).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(10, 0).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(5, 0)[0], 128);
    }

    #[test]
    fn test_radial_gradient_center_is_color0() {
        let mut values = ParameterMap::new();
        values.insert("center".to_string(), Value::Vector(vec![2.0, 2.0]));
        let input = DynamicImage::new_rgba8(5, 5);

        let out = RadialGradient
            .execute(&Params::new("RadialGradient", &values), &input)
            .unwrap()
            .to_rgba8();
        assert_eq!(out.get_pixel(2, 2).0, [255, 255, 255, 255]);
    }
}
