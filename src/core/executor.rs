//! The filter execution capability.
//!
//! Pixel work is delegated to a [`FilterExecutor`]. The chain, preview and
//! export pipelines only ever call `apply`, so a real backend and a test
//! fake are interchangeable.

use crate::core::error::FilterExecutionError;
use crate::core::instance::ParameterMap;
use crate::core::kind::FilterKind;
use image::DynamicImage;
use std::sync::Arc;

/// Applies one filter kind to an image.
///
/// # Thread Safety
///
/// `Send + Sync` bounds let the preview and export pipelines share one
/// executor and run exports on a worker thread.
pub trait FilterExecutor: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &str {
        "executor"
    }

    /// Apply `kind` with `parameters` to `input`, producing a new image.
    ///
    /// Must not retain or mutate `input`.
    fn apply(
        &self,
        kind: &FilterKind,
        parameters: &ParameterMap,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError>;
}

/// Shared executor handle.
pub type SharedExecutor = Arc<dyn FilterExecutor>;

type ApplyFn = dyn Fn(&FilterKind, &ParameterMap, &DynamicImage) -> Result<DynamicImage, FilterExecutionError>
    + Send
    + Sync;

/// Executor backed by a closure.
///
/// Handy for embedding custom backends and for deterministic fakes.
pub struct FnExecutor {
    name: String,
    apply: Box<ApplyFn>,
}

impl FnExecutor {
    /// Create an executor from a closure.
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&FilterKind, &ParameterMap, &DynamicImage) -> Result<DynamicImage, FilterExecutionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            apply: Box::new(apply),
        }
    }

    /// Executor that returns its input unchanged.
    pub fn identity() -> Self {
        Self::new("identity", |_, _, input| Ok(input.clone()))
    }

    /// Executor that fails every application with `NoOutput`.
    pub fn failing() -> Self {
        Self::new("failing", |kind, _, _| {
            Err(FilterExecutionError::NoOutput {
                kind: kind.id.clone(),
            })
        })
    }
}

impl std::fmt::Debug for FnExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnExecutor")
            .field("name", &self.name)
            .field("apply", &"<closure>")
            .finish()
    }
}

impl FilterExecutor for FnExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        kind: &FilterKind,
        parameters: &ParameterMap,
        input: &DynamicImage,
    ) -> Result<DynamicImage, FilterExecutionError> {
        (self.apply)(kind, parameters, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kind::Category;

    fn kind() -> FilterKind {
        FilterKind::builder("Test", "Test").category(Category::Stylize).build()
    }

    #[test]
    fn test_identity_executor() {
        let input = DynamicImage::new_rgba8(2, 2);
        let output = FnExecutor::identity()
            .apply(&kind(), &ParameterMap::new(), &input)
            .unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_failing_executor() {
        let input = DynamicImage::new_rgba8(2, 2);
        let err = FnExecutor::failing()
            .apply(&kind(), &ParameterMap::new(), &input)
            .unwrap_err();
        assert_eq!(err.kind(), "Test");
        assert_eq!(FnExecutor::failing().name(), "failing");
    }
}
