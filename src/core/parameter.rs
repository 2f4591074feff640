//! Parameter specifications and their tabular rendering.
//!
//! A [`ParameterSpec`] belongs to exactly one filter kind and never changes
//! after the catalog is populated. [`ParameterRow`] is the textual form shown
//! in a parameter inspector, with fixed sentinels for fields a kind does not
//! supply.

use crate::core::error::ParameterError;
use crate::core::types::{ParameterType, Value};
use serde::Serialize;

/// Shown when a parameter has no description.
pub const NO_DESCRIPTION: &str = "No Description";
/// Shown when a parameter has no value class.
pub const NO_ATTRIBUTE_NAME: &str = "No AttributeName";
/// Shown when a parameter has no semantic type hint.
pub const NO_ATTRIBUTE_TYPE: &str = "No AttributeType";
/// Rendering of an absent default or bound.
pub const ABSENT_VALUE: &str = "nil";

/// Definition of one named filter parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    /// Key used to read and write the value
    pub name: String,
    /// Human-readable name
    pub display_name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Class of value the kind expects (e.g. "Number", "Vector")
    pub attribute_class: Option<String>,
    /// Semantic hint (e.g. "Distance", "Angle", "Position")
    pub attribute_type: Option<String>,
    /// Declared value type, checked on every edit
    pub param_type: ParameterType,
    /// Value a fresh instance starts with
    pub default_value: Value,
    /// Lower slider bound for scalars
    pub min: Option<f64>,
    /// Upper slider bound for scalars
    pub max: Option<f64>,
}

impl ParameterSpec {
    /// Create a new parameter specification.
    pub fn new(name: impl Into<String>, param_type: ParameterType, default_value: Value) -> Self {
        let name = name.into();
        Self {
            display_name: name_to_display(&name),
            name,
            description: None,
            attribute_class: None,
            attribute_type: None,
            param_type,
            default_value,
            min: None,
            max: None,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the value class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.attribute_class = Some(class.into());
        self
    }

    /// Set the semantic type hint.
    pub fn with_attribute_type(mut self, attribute_type: impl Into<String>) -> Self {
        self.attribute_type = Some(attribute_type.into());
        self
    }

    /// Set slider bounds.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Check that `value` may be stored under this parameter.
    ///
    /// Bounds are advisory and not enforced. Vectors must keep the
    /// dimension of the default.
    pub fn validate(&self, kind: &str, value: &Value) -> Result<(), ParameterError> {
        let mismatch = || ParameterError::TypeMismatch {
            kind: kind.to_string(),
            name: self.name.clone(),
            expected: self.param_type,
            got: value.type_name().to_string(),
        };

        if !self.param_type.accepts(value) {
            return Err(mismatch());
        }

        if let (Some(expected), Some(got)) = (self.default_value.as_vector(), value.as_vector()) {
            if expected.len() != got.len() {
                return Err(ParameterError::TypeMismatch {
                    kind: kind.to_string(),
                    name: self.name.clone(),
                    expected: self.param_type,
                    got: format!("Vector of {} components (expected {})", got.len(), expected.len()),
                });
            }
        }

        Ok(())
    }

    /// Render this parameter as an inspector row.
    pub fn to_row(&self) -> ParameterRow {
        ParameterRow::from_spec(self)
    }
}

/// Column identifiers of the parameter inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterColumn {
    Name,
    Description,
    AttributeName,
    AttributeType,
    DefaultValue,
    MinValue,
    MaxValue,
}

impl ParameterColumn {
    /// All columns in display order.
    pub fn all() -> &'static [ParameterColumn] {
        &[
            ParameterColumn::Name,
            ParameterColumn::Description,
            ParameterColumn::AttributeName,
            ParameterColumn::AttributeType,
            ParameterColumn::DefaultValue,
            ParameterColumn::MinValue,
            ParameterColumn::MaxValue,
        ]
    }

    /// Look up a column by its identifier (e.g. "defaultValue").
    pub fn from_identifier(id: &str) -> Option<Self> {
        match id {
            "name" => Some(ParameterColumn::Name),
            "description" => Some(ParameterColumn::Description),
            "attributeName" => Some(ParameterColumn::AttributeName),
            "attributeType" => Some(ParameterColumn::AttributeType),
            "defaultValue" => Some(ParameterColumn::DefaultValue),
            "minValue" => Some(ParameterColumn::MinValue),
            "maxValue" => Some(ParameterColumn::MaxValue),
            _ => None,
        }
    }

    /// Column header text.
    pub fn title(&self) -> &'static str {
        match self {
            ParameterColumn::Name => "Name",
            ParameterColumn::Description => "Description",
            ParameterColumn::AttributeName => "Attribute Name",
            ParameterColumn::AttributeType => "Attribute Type",
            ParameterColumn::DefaultValue => "Default",
            ParameterColumn::MinValue => "Min",
            ParameterColumn::MaxValue => "Max",
        }
    }
}

/// Fully rendered inspector row; every field is display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterRow {
    pub name: String,
    pub description: String,
    pub attribute_name: String,
    pub attribute_type: String,
    pub default_value: String,
    pub min_value: String,
    pub max_value: String,
}

impl ParameterRow {
    /// Render a spec, substituting sentinels for absent fields.
    pub fn from_spec(spec: &ParameterSpec) -> Self {
        let bound = |b: Option<f64>| b.map_or_else(|| ABSENT_VALUE.to_string(), |v| v.to_string());

        Self {
            name: spec.name.clone(),
            description: spec
                .description
                .clone()
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            attribute_name: spec
                .attribute_class
                .clone()
                .unwrap_or_else(|| NO_ATTRIBUTE_NAME.to_string()),
            attribute_type: spec
                .attribute_type
                .clone()
                .unwrap_or_else(|| NO_ATTRIBUTE_TYPE.to_string()),
            default_value: spec.default_value.to_string(),
            min_value: bound(spec.min),
            max_value: bound(spec.max),
        }
    }

    /// Text for a single column.
    pub fn column(&self, column: ParameterColumn) -> &str {
        match column {
            ParameterColumn::Name => &self.name,
            ParameterColumn::Description => &self.description,
            ParameterColumn::AttributeName => &self.attribute_name,
            ParameterColumn::AttributeType => &self.attribute_type,
            ParameterColumn::DefaultValue => &self.default_value,
            ParameterColumn::MinValue => &self.min_value,
            ParameterColumn::MaxValue => &self.max_value,
        }
    }
}

/// Convert snake_case name to Title Case display name.
pub(crate) fn name_to_display(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
