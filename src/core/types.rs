//! Parameter value types and supporting primitives.
//!
//! Parameter values are a closed tagged variant checked against each
//! parameter's declared [`ParameterType`] when an instance is edited.

use image::DynamicImage;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// A parameter value held by a filter instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Scalar number
    Number(f64),
    /// Fixed-length numeric vector (points, offsets, rectangles)
    Vector(Vec<f64>),
    /// RGBA color value
    Color(Color),
    /// Image input (backgrounds, masks, displacement maps)
    Image(ImageValue),
    /// Value the core does not interpret, carried as text
    Opaque(String),
}

/// Declared type of a filter parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    Scalar,
    Vector,
    Color,
    Image,
    /// Displacement or distortion map, supplied as an image
    DistortionData,
    /// Anything else; accepts only opaque values
    Unsupported,
}

/// Shared, immutable bitmap used as a parameter value.
///
/// Equality first compares pointers and falls back to comparing pixels.
#[derive(Debug, Clone)]
pub struct ImageValue {
    data: Arc<DynamicImage>,
}

/// RGBA color value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Encoded output type chosen for an export.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Gif,
    WebP,
}

// ============================================================================
// Value Implementation
// ============================================================================

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Vector(_) => "Vector",
            Value::Color(_) => "Color",
            Value::Image(_) => "Image",
            Value::Opaque(_) => "Opaque",
        }
    }

    /// Try to get this value as a number.
    pub fn as_number(&self) -> Option<f64> {
        if let Value::Number(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    /// Try to get this value as a vector slice.
    pub fn as_vector(&self) -> Option<&[f64]> {
        if let Value::Vector(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// Try to get this value as a color.
    pub fn as_color(&self) -> Option<Color> {
        if let Value::Color(c) = self {
            Some(*c)
        } else {
            None
        }
    }

    /// Try to get this value as an image reference.
    pub fn as_image(&self) -> Option<&ImageValue> {
        if let Value::Image(img) = self {
            Some(img)
        } else {
            None
        }
    }

    /// Try to get this value as opaque text.
    pub fn as_opaque(&self) -> Option<&str> {
        if let Value::Opaque(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Parse a textual value for a parameter of the given type.
    ///
    /// Scalars are plain numbers, vectors comma separated numbers, colors
    /// hex strings, and images file paths.
    pub fn parse(param_type: ParameterType, text: &str) -> Result<Self, String> {
        let text = text.trim();
        match param_type {
            ParameterType::Scalar => text
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|e| format!("'{}' is not a number: {}", text, e)),
            ParameterType::Vector => text
                .trim_start_matches('[')
                .trim_end_matches(']')
                .split(',')
                .map(|part| {
                    part.trim()
                        .parse::<f64>()
                        .map_err(|e| format!("'{}' is not a number: {}", part.trim(), e))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Vector),
            ParameterType::Color => Color::from_hex(text).map(Value::Color),
            ParameterType::Image | ParameterType::DistortionData => ImageValue::from_path(text)
                .map(Value::Image)
                .map_err(|e| format!("cannot load image '{}': {}", text, e)),
            ParameterType::Unsupported => Ok(Value::Opaque(text.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Vector(v) => {
                let parts: Vec<String> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Color(c) => write!(f, "{}", c),
            Value::Image(img) => write!(f, "Image({}x{})", img.width(), img.height()),
            Value::Opaque(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<Color> for Value {
    fn from(value: Color) -> Self {
        Value::Color(value)
    }
}

// ============================================================================
// ParameterType Implementation
// ============================================================================

impl ParameterType {
    /// Check if a value's variant is acceptable for this declared type.
    ///
    /// Vector dimensions are checked separately against the default.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ParameterType::Scalar, Value::Number(_))
                | (ParameterType::Vector, Value::Vector(_))
                | (ParameterType::Color, Value::Color(_))
                | (ParameterType::Image, Value::Image(_))
                | (ParameterType::DistortionData, Value::Image(_))
                | (ParameterType::Unsupported, Value::Opaque(_))
        )
    }

    /// Whether numeric bounds are meaningful for this type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ParameterType::Scalar)
    }

    /// Get a human-readable name for this type.
    pub fn display_name(&self) -> &'static str {
        match self {
            ParameterType::Scalar => "Scalar",
            ParameterType::Vector => "Vector",
            ParameterType::Color => "Color",
            ParameterType::Image => "Image",
            ParameterType::DistortionData => "DistortionData",
            ParameterType::Unsupported => "Unsupported",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// ImageValue Implementation
// ============================================================================

impl ImageValue {
    /// Wrap a decoded image.
    pub fn new(image: DynamicImage) -> Self {
        Self {
            data: Arc::new(image),
        }
    }

    /// Wrap an already shared image without copying pixels.
    pub fn from_shared(data: Arc<DynamicImage>) -> Self {
        Self { data }
    }

    /// Load an image from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        Ok(Self::new(image::open(path)?))
    }

    /// A fully transparent RGBA image.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::new(DynamicImage::ImageRgba8(image::RgbaImage::new(
            width.max(1),
            height.max(1),
        )))
    }

    /// Borrow the underlying image.
    pub fn image(&self) -> &DynamicImage {
        &self.data
    }

    /// Clone the shared handle to the underlying image.
    pub fn shared(&self) -> Arc<DynamicImage> {
        Arc::clone(&self.data)
    }

    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }
}

impl PartialEq for ImageValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
            || (self.data.color() == other.data.color()
                && self.width() == other.width()
                && self.height() == other.height()
                && self.data.as_bytes() == other.data.as_bytes())
    }
}

impl Serialize for ImageValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ImageValue", 2)?;
        state.serialize_field("width", &self.width())?;
        state.serialize_field("height", &self.height())?;
        state.end()
    }
}

// ============================================================================
// Color Implementation
// ============================================================================

impl Color {
    /// Create a new color from RGBA components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from RGB components (alpha = 255).
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a hex color string.
    ///
    /// Supports formats: "#RGB", "#RGBA", "#RRGGBB", "#RRGGBBAA"
    pub fn from_hex(hex: &str) -> Result<Self, String> {
        let hex = hex.trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>, scale: u8| -> Result<u8, String> {
            hex.get(range)
                .ok_or_else(|| format!("Invalid hex color '{}'", hex))
                .and_then(|s| u8::from_str_radix(s, 16).map_err(|e| e.to_string()))
                .map(|v| v * scale)
        };

        match hex.len() {
            3 => Ok(Self::rgb(channel(0..1, 17)?, channel(1..2, 17)?, channel(2..3, 17)?)),
            4 => Ok(Self::new(
                channel(0..1, 17)?,
                channel(1..2, 17)?,
                channel(2..3, 17)?,
                channel(3..4, 17)?,
            )),
            6 => Ok(Self::rgb(channel(0..2, 1)?, channel(2..4, 1)?, channel(4..6, 1)?)),
            8 => Ok(Self::new(
                channel(0..2, 1)?,
                channel(2..4, 1)?,
                channel(4..6, 1)?,
                channel(6..8, 1)?,
            )),
            _ => Err(format!(
                "Invalid hex color format: expected 3, 4, 6, or 8 characters, got {}",
                hex.len()
            )),
        }
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// Convert to image crate's Rgba type.
    pub fn to_rgba(&self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GRAY: Color = Color::rgb(153, 153, 153);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ============================================================================
// ExportFormat Implementation
// ============================================================================

impl ExportFormat {
    /// Determine the output type from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// Convert to image crate's ImageFormat.
    pub fn to_image_format(&self) -> image::ImageFormat {
        match self {
            ExportFormat::Png => image::ImageFormat::Png,
            ExportFormat::Jpeg => image::ImageFormat::Jpeg,
            ExportFormat::Tiff => image::ImageFormat::Tiff,
            ExportFormat::Bmp => image::ImageFormat::Bmp,
            ExportFormat::Gif => image::ImageFormat::Gif,
            ExportFormat::WebP => image::ImageFormat::WebP,
        }
    }

    /// Get the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Tiff => "tiff",
            ExportFormat::Bmp => "bmp",
            ExportFormat::Gif => "gif",
            ExportFormat::WebP => "webp",
        }
    }

    /// Whether encoding preserves every pixel exactly.
    pub fn is_lossless(&self) -> bool {
        !matches!(self, ExportFormat::Jpeg)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "tif" | "tiff" => Ok(ExportFormat::Tiff),
            "bmp" => Ok(ExportFormat::Bmp),
            "gif" => Ok(ExportFormat::Gif),
            "webp" => Ok(ExportFormat::WebP),
            other => Err(format!(
                "Unsupported output format: {}. Use: png, jpg, tiff, bmp, gif, or webp",
                other
            )),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Png => write!(f, "PNG"),
            ExportFormat::Jpeg => write!(f, "JPEG"),
            ExportFormat::Tiff => write!(f, "TIFF"),
            ExportFormat::Bmp => write!(f, "BMP"),
            ExportFormat::Gif => write!(f, "GIF"),
            ExportFormat::WebP => write!(f, "WebP"),
        }
    }
}
