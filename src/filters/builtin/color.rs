//! Color adjustment and color effect filters

use super::{luma, map_pixels, to_byte, BuiltinFilter, Params};
use crate::core::error::FilterExecutionError;
use crate::core::kind::{Category, FilterKind};
use crate::core::parameter::ParameterSpec;
use crate::core::types::{Color, ParameterType, Value};
use image::DynamicImage;

pub(super) fn filters() -> Vec<Box<dyn BuiltinFilter>> {
    vec![
        Box::new(ColorControls),
        Box::new(ExposureAdjust),
        Box::new(GammaAdjust),
        Box::new(ColorInvert),
        Box::new(Monochrome),
        Box::new(SepiaTone),
    ]
}

fn scalar(name: &str, default: f64, min: f64, max: f64) -> ParameterSpec {
    ParameterSpec::new(name, ParameterType::Scalar, Value::Number(default))
        .with_class("Number")
        .with_attribute_type("Scalar")
        .with_range(min, max)
}

fn channels(px: [u8; 4]) -> (f64, f64, f64) {
    (
        px[0] as f64 / 255.0,
        px[1] as f64 / 255.0,
        px[2] as f64 / 255.0,
    )
}

/// Adjusts saturation, brightness, and contrast.
#[derive(Debug, Clone)]
pub struct ColorControls;

impl BuiltinFilter for ColorControls {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("ColorControls", "Color Controls")
            .description("Adjusts saturation, brightness, and contrast values.")
            .category(Category::ColorAdjustment)
            .parameter(scalar("saturation", 1.0, 0.0, 2.0))
            .parameter(scalar("brightness", 0.0, -1.0, 1.0))
            .parameter(scalar("contrast", 1.0, 0.25, 4.0))
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let saturation = params.number("saturation", 1.0);
        let brightness = params.number("brightness", 0.0);
        let contrast = params.number("contrast", 1.0);

        Ok(map_pixels(input, |px| {
            let (r, g, b) = channels(px);
            let l = luma(r, g, b);
            let adjust = |c: f64| {
                let saturated = l + (c - l) * saturation;
                (saturated + brightness - 0.5) * contrast + 0.5
            };
            [to_byte(adjust(r)), to_byte(adjust(g)), to_byte(adjust(b)), px[3]]
        }))
    }
}

/// Adjusts exposure by a number of f-stops.
#[derive(Debug, Clone)]
pub struct ExposureAdjust;

impl BuiltinFilter for ExposureAdjust {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("ExposureAdjust", "Exposure Adjust")
            .description("Adjusts the exposure setting for an image similar to the way you control exposure for a camera.")
            .category(Category::ColorAdjustment)
            .parameter(scalar("ev", 0.0, -10.0, 10.0).with_display_name("EV"))
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let gain = 2f64.powf(params.number("ev", 0.0));
        Ok(map_pixels(input, |px| {
            let (r, g, b) = channels(px);
            [to_byte(r * gain), to_byte(g * gain), to_byte(b * gain), px[3]]
        }))
    }
}

/// Applies a power curve to every color channel.
#[derive(Debug, Clone)]
pub struct GammaAdjust;

impl BuiltinFilter for GammaAdjust {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("GammaAdjust", "Gamma Adjust")
            .description("Adjusts midtone brightness.")
            .category(Category::ColorAdjustment)
            .parameter(
                ParameterSpec::new("power", ParameterType::Scalar, Value::Number(1.0))
                    .with_class("Number")
                    .with_range(0.25, 4.0),
            )
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let power = params.number("power", 1.0);
        if !(power > 0.0) {
            return Err(params.invalid(format!("power must be positive, got {}", power)));
        }

        Ok(map_pixels(input, |px| {
            let (r, g, b) = channels(px);
            [
                to_byte(r.powf(power)),
                to_byte(g.powf(power)),
                to_byte(b.powf(power)),
                px[3],
            ]
        }))
    }
}

/// Inverts the colors in an image.
#[derive(Debug, Clone)]
pub struct ColorInvert;

impl BuiltinFilter for ColorInvert {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("ColorInvert", "Color Invert")
            .description("Inverts the colors in an image.")
            .category(Category::ColorEffect)
            .build()
    }

    fn execute(
        &self,
        _params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        Ok(map_pixels(input, |px| [255 - px[0], 255 - px[1], 255 - px[2], px[3]]))
    }
}

/// Remaps colors so they fall within shades of a single color.
#[derive(Debug, Clone)]
pub struct Monochrome;

impl BuiltinFilter for Monochrome {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("Monochrome", "Color Monochrome")
            .description("Remaps colors so they fall within shades of a single color.")
            .category(Category::ColorEffect)
            .parameter(
                ParameterSpec::new("color", ParameterType::Color, Value::Color(Color::GRAY))
                    .with_description("The monochrome color to apply to the image.")
                    .with_class("Color")
                    .with_attribute_type("OpaqueColor"),
            )
            .parameter(scalar("intensity", 1.0, 0.0, 1.0))
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let tint = params.color("color", Color::GRAY);
        let intensity = params.number("intensity", 1.0).clamp(0.0, 1.0);
        let (tr, tg, tb) = channels([tint.r, tint.g, tint.b, 255]);

        Ok(map_pixels(input, |px| {
            let (r, g, b) = channels(px);
            let l = luma(r, g, b);
            let mix = |orig: f64, toned: f64| orig + (toned - orig) * intensity;
            [
                to_byte(mix(r, l * tr * 2.0)),
                to_byte(mix(g, l * tg * 2.0)),
                to_byte(mix(b, l * tb * 2.0)),
                px[3],
            ]
        }))
    }
}

/// Maps the colors of an image to various shades of brown.
#[derive(Debug, Clone)]
pub struct SepiaTone;

impl BuiltinFilter for SepiaTone {
    fn kind(&self) -> FilterKind {
        FilterKind::builder("SepiaTone", "Sepia Tone")
            .description("Maps the colors of an image to various shades of brown.")
            .category(Category::ColorEffect)
            .parameter(scalar("intensity", 1.0, 0.0, 1.0))
            .build()
    }

    fn execute(
        &self,
        params: &Params<'_>,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        let intensity = params.number("intensity", 1.0).clamp(0.0, 1.0);

        Ok(map_pixels(input, |px| {
            let (r, g, b) = channels(px);
            let sr = 0.393 * r + 0.769 * g + 0.189 * b;
            let sg = 0.349 * r + 0.686 * g + 0.168 * b;
            let sb = 0.272 * r + 0.534 * g + 0.131 * b;
            let mix = |orig: f64, toned: f64| orig + (toned - orig) * intensity;
            [
                to_byte(mix(r, sr)),
                to_byte(mix(g, sg)),
                to_byte(mix(b, sb)),
                px[3],
            ]
        }))
    }
}
