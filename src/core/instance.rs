//! Filter instances: a kind bound to its current parameter values.

use crate::core::error::{FilterExecutionError, ParameterError};
use crate::core::executor::FilterExecutor;
use crate::core::kind::FilterKind;
use crate::core::types::Value;
use image::DynamicImage;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Current parameter values keyed by parameter name, in declaration order.
pub type ParameterMap = IndexMap<String, Value>;

/// Unique identifier for a filter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    /// Create a new random instance ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// An independently configurable occurrence of a filter kind.
///
/// The key set of the value map always equals the kind's parameter names;
/// only the values change.
#[derive(Debug, Clone)]
pub struct FilterInstance {
    id: InstanceId,
    kind: Arc<FilterKind>,
    values: ParameterMap,
}

impl FilterInstance {
    /// Create an instance with every parameter at its default.
    pub fn create(kind: Arc<FilterKind>) -> Self {
        let values = kind
            .parameters
            .iter()
            .map(|spec| (spec.name.clone(), spec.default_value.clone()))
            .collect();

        Self {
            id: InstanceId::new(),
            kind,
            values,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The kind this instance was created from.
    pub fn kind(&self) -> &Arc<FilterKind> {
        &self.kind
    }

    pub fn kind_id(&self) -> &str {
        &self.kind.id
    }

    /// Human-readable name of the kind.
    pub fn display_name(&self) -> &str {
        &self.kind.name
    }

    /// All current values.
    pub fn parameters(&self) -> &ParameterMap {
        &self.values
    }

    /// Current value of one parameter.
    pub fn parameter_value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Replace the value of a declared parameter.
    ///
    /// Fails without touching the map when `name` is not declared by the
    /// kind or `value` does not match the declared type.
    pub fn set_parameter(&mut self, name: &str, value: Value) -> Result<(), ParameterError> {
        let spec = self
            .kind
            .get_parameter(name)
            .ok_or_else(|| ParameterError::UnknownParameter {
                kind: self.kind.id.clone(),
                name: name.to_string(),
            })?;

        spec.validate(&self.kind.id, &value)?;

        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        }
        Ok(())
    }

    /// Apply this instance to `input` through `executor`.
    pub fn apply(
        &self,
        executor: &dyn FilterExecutor,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        executor.apply(&self.kind, &self.values, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::FnExecutor;
    use crate::core::kind::Category;
    use crate::core::parameter::ParameterSpec;
    use crate::core::types::{Color, ParameterType};

    fn monochrome() -> Arc<FilterKind> {
        Arc::new(
            FilterKind::builder("Monochrome", "Color Monochrome")
                .category(Category::ColorEffect)
                .parameter(ParameterSpec::new("color", ParameterType::Color, Value::Color(Color::GRAY)))
                .parameter(
                    ParameterSpec::new("intensity", ParameterType::Scalar, Value::Number(1.0))
                        .with_range(0.0, 1.0),
                )
                .build(),
        )
    }

    #[test]
    fn test_create_uses_defaults() {
        let kind = monochrome();
        let instance = FilterInstance::create(kind.clone());

        for spec in &kind.parameters {
            assert_eq!(instance.parameter_value(&spec.name), Some(&spec.default_value));
        }
        assert_eq!(instance.parameters().len(), 2);
        assert_eq!(instance.display_name(), "Color Monochrome");
    }

    #[test]
    fn test_set_parameter() {
        let mut instance = FilterInstance::create(monochrome());
        instance.set_parameter("intensity", Value::Number(0.25)).unwrap();
        assert_eq!(instance.parameter_value("intensity"), Some(&Value::Number(0.25)));
    }

    #[test]
    fn test_set_unknown_parameter_leaves_map_unchanged() {
        let mut instance = FilterInstance::create(monochrome());
        let before = instance.parameters().clone();

        let err = instance.set_parameter("radius", Value::Number(3.0)).unwrap_err();
        assert!(matches!(err, ParameterError::UnknownParameter { .. }));
        assert_eq!(instance.parameters(), &before);
    }

    #[test]
    fn test_set_mismatched_type_leaves_map_unchanged() {
        let mut instance = FilterInstance::create(monochrome());
        let before = instance.parameters().clone();

        let err = instance.set_parameter("color", Value::Number(3.0)).unwrap_err();
        assert!(matches!(err, ParameterError::TypeMismatch { .. }));
        assert_eq!(instance.parameters(), &before);
    }

    #[test]
    fn test_apply_forwards_parameters() {
        let mut instance = FilterInstance::create(monochrome());
        instance.set_parameter("intensity", Value::Number(0.5)).unwrap();

        let executor = FnExecutor::new("probe", |kind, params, input| {
            assert_eq!(kind.id, "Monochrome");
            assert_eq!(params.get("intensity"), Some(&Value::Number(0.5)));
            Ok(input.clone())
        });

        let input = DynamicImage::new_rgba8(1, 1);
        assert!(instance.apply(&executor, &input).is_ok());
    }
}
