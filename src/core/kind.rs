//! Filter kinds and the categories that group them.
//!
//! A [`FilterKind`] is immutable once registered; every instance in a chain
//! shares its kind through an `Arc`.

use crate::core::parameter::{ParameterRow, ParameterSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category for organizing filters in the catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Blur,
    ColorAdjustment,
    ColorEffect,
    CompositeOperation,
    Distortion,
    Gradient,
    Halftone,
    Reduction,
    Sharpen,
    Stylize,
    TileEffect,
    Transition,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Blur => "Blur",
            Category::ColorAdjustment => "Color Adjustment",
            Category::ColorEffect => "Color Effect",
            Category::CompositeOperation => "Composite Operation",
            Category::Distortion => "Distortion Effect",
            Category::Gradient => "Gradient",
            Category::Halftone => "Halftone Effect",
            Category::Reduction => "Reduction",
            Category::Sharpen => "Sharpen",
            Category::Stylize => "Stylize",
            Category::TileEffect => "Tile Effect",
            Category::Transition => "Transition",
        }
    }

    /// Get all categories in listing order.
    pub fn all() -> &'static [Category] {
        &[
            Category::Blur,
            Category::ColorAdjustment,
            Category::ColorEffect,
            Category::CompositeOperation,
            Category::Distortion,
            Category::Gradient,
            Category::Halftone,
            Category::Reduction,
            Category::Sharpen,
            Category::Stylize,
            Category::TileEffect,
            Category::Transition,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Metadata describing one kind of filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterKind {
    /// Unique identifier (e.g. "GaussianBlur")
    pub id: String,
    /// Human-readable name (e.g. "Gaussian Blur")
    pub name: String,
    /// Category the kind is listed under
    pub category: Category,
    /// Detailed description
    pub description: String,
    /// Parameters in declaration order
    pub parameters: Vec<ParameterSpec>,
}

impl FilterKind {
    /// Create a new kind builder.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> FilterKindBuilder {
        FilterKindBuilder::new(id, name)
    }

    /// Find a parameter by name.
    pub fn get_parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Get all parameter names in declaration order.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Render every parameter as an inspector row.
    pub fn rows(&self) -> Vec<ParameterRow> {
        self.parameters.iter().map(ParameterSpec::to_row).collect()
    }
}

/// Builder for FilterKind.
pub struct FilterKindBuilder {
    id: String,
    name: String,
    category: Category,
    description: String,
    parameters: Vec<ParameterSpec>,
}

impl FilterKindBuilder {
    /// Create a new builder with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: Category::Stylize,
            description: String::new(),
            parameters: Vec::new(),
        }
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a parameter.
    pub fn parameter(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Build the kind.
    pub fn build(self) -> FilterKind {
        FilterKind {
            id: self.id,
            name: self.name,
            category: self.category,
            description: self.description,
            parameters: self.parameters,
        }
    }
}
