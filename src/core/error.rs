//! Error types for FilterShop.
//!
//! Uses thiserror for structured errors with context. Each concern gets its
//! own enum so callers can match on exactly the failures an operation can
//! produce; [`FilterShopError`] aggregates them for top-level reporting.

use crate::core::types::{ExportFormat, ParameterType};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for FilterShop.
#[derive(Error, Debug)]
pub enum FilterShopError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Filter execution error: {0}")]
    Execution(#[from] FilterExecutionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Image error: {0}")]
    ImageLoad(#[from] ImageLoadError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from filter catalog lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Filter kind '{0}' not found")]
    NotFound(String),
}

/// Invalid parameter edits on a filter instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Parameter '{name}' is not declared by filter '{kind}'")]
    UnknownParameter { kind: String, name: String },

    #[error("Parameter '{name}' of filter '{kind}' expects {expected}, got {got}")]
    TypeMismatch {
        kind: String,
        name: String,
        expected: ParameterType,
        got: String,
    },
}

/// Errors from chain mutations and indexed lookups.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    #[error("Index {index} is out of range for a chain of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid parameter edit on chain entry {index}: {source}")]
    Parameter {
        index: usize,
        #[source]
        source: ParameterError,
    },
}

/// Failure of a single filter application.
///
/// The executor behind a filter is an opaque capability; these variants
/// only classify what it reported.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterExecutionError {
    #[error("Filter '{kind}' produced no output")]
    NoOutput { kind: String },

    #[error("Filter '{kind}' rejected its input: {reason}")]
    InvalidInput { kind: String, reason: String },

    #[error("Filter '{kind}' is not supported by this executor")]
    Unsupported { kind: String },

    #[error("Filter '{kind}' failed: {reason}")]
    Failed { kind: String, reason: String },
}

/// Errors surfaced by the export pipeline.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No source image is loaded")]
    NoSourceImage,

    #[error("Chain entry {index} ('{kind}') produced no output: {source}")]
    NoOutput {
        index: usize,
        kind: String,
        #[source]
        source: FilterExecutionError,
    },

    #[error("Failed to encode image as {format}: {reason}")]
    Encode { format: ExportFormat, reason: String },

    #[error("Failed to finalize {path}: {reason}")]
    Finalize { path: PathBuf, reason: String },

    #[error("I/O error during export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export worker stopped before reporting a result")]
    Abandoned,
}

/// Errors loading a source image.
#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("Unsupported image type '{extension}' for {path}")]
    UnsupportedType { path: PathBuf, extension: String },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Dropped items contain no supported image file")]
    EmptyDrop,
}

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

// ============================================================================
// Error Utilities
// ============================================================================

impl ChainError {
    /// The chain index this error refers to.
    pub fn index(&self) -> usize {
        match self {
            ChainError::IndexOutOfRange { index, .. } | ChainError::Parameter { index, .. } => {
                *index
            }
        }
    }
}

impl FilterExecutionError {
    /// Identifier of the filter kind that failed.
    pub fn kind(&self) -> &str {
        match self {
            FilterExecutionError::NoOutput { kind }
            | FilterExecutionError::InvalidInput { kind, .. }
            | FilterExecutionError::Unsupported { kind }
            | FilterExecutionError::Failed { kind, .. } => kind,
        }
    }
}

impl ExportError {
    /// Whether the failure happened while writing the file rather than
    /// while producing the bitmap.
    pub fn is_encode_failure(&self) -> bool {
        matches!(
            self,
            ExportError::Encode { .. } | ExportError::Finalize { .. } | ExportError::Io(_)
        )
    }

    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            ExportError::NoSourceImage => Some("Open or drop an image before exporting".to_string()),
            ExportError::NoOutput { index, kind, .. } => Some(format!(
                "Adjust the parameters of '{}' or remove it (position {})",
                kind,
                index + 1
            )),
            ExportError::Encode { format, .. } => Some(format!(
                "Try a different output type than {}",
                format
            )),
            ExportError::Finalize { path, .. } => Some(format!(
                "Check that '{}' is writable",
                path.display()
            )),
            _ => None,
        }
    }
}

/// Result type alias for FilterShop operations.
pub type FilterShopResult<T> = Result<T, FilterShopError>;

/// Result type alias for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_error_index() {
        let error = ChainError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(error.index(), 4);
        assert_eq!(
            error.to_string(),
            "Index 4 is out of range for a chain of length 2"
        );
    }

    #[test]
    fn test_export_error_classification() {
        let no_output = ExportError::NoOutput {
            index: 0,
            kind: "GaussianBlur".to_string(),
            source: FilterExecutionError::NoOutput {
                kind: "GaussianBlur".to_string(),
            },
        };
        assert!(!no_output.is_encode_failure());
        assert!(no_output.suggested_fix().unwrap().contains("GaussianBlur"));

        let encode = ExportError::Encode {
            format: ExportFormat::Png,
            reason: "disk full".to_string(),
        };
        assert!(encode.is_encode_failure());
        assert!(!ExportError::NoSourceImage.is_encode_failure());
    }

    #[test]
    fn test_top_level_conversion() {
        let error: FilterShopError = CatalogError::NotFound("Nope".to_string()).into();
        assert!(matches!(error, FilterShopError::Catalog(_)));
        assert!(error.to_string().contains("Nope"));
    }
}
