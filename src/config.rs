//! Runtime configuration loaded from TOML.
//!
//! Every key is optional; a missing file section falls back to defaults.
//!
//! ```toml
//! log_level = "debug"
//!
//! [preview]
//! max_dimension = 1024
//!
//! [export]
//! default_format = "jpeg"
//! jpeg_quality = 85
//!
//! [document]
//! chain_policy = "clear_on_open"
//! ```

use crate::core::error::ConfigError;
use crate::core::types::ExportFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a config file for the CLI.
pub const CONFIG_ENV_VAR: &str = "FILTERSHOP_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterShopConfig {
    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub log_level: String,
    pub preview: PreviewConfig,
    pub export: ExportConfig,
    pub document: DocumentConfig,
}

/// Live preview settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Longest edge of the downscaled preview source, in pixels
    pub max_dimension: u32,
    /// Number of rendered previews kept for instant redisplay
    pub cache_capacity: usize,
    /// Whether chain edits trigger preview renders at all
    pub enabled: bool,
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output type used when a path has no recognised extension
    pub default_format: ExportFormat,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
}

/// Document session settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub chain_policy: ChainPolicy,
}

/// What happens to the chain when a new image replaces the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainPolicy {
    /// Keep the chain and apply it to the new image.
    #[default]
    Retain,
    /// Start the new image with an empty chain.
    ClearOnOpen,
}

impl Default for FilterShopConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            preview: PreviewConfig::default(),
            export: ExportConfig::default(),
            document: DocumentConfig::default(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_dimension: 512,
            cache_capacity: 16,
            enabled: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: ExportFormat::Png,
            jpeg_quality: 90,
        }
    }
}

impl FilterShopConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate config text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from `FILTERSHOP_CONFIG`, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match std::env::var_os(CONFIG_ENV_VAR) {
                Some(path) => Self::load(Path::new(&path)),
                None => Ok(Self::default()),
            },
        }
    }

    /// Check value ranges serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preview.max_dimension == 0 {
            return Err(invalid("preview.max_dimension", "must be at least 1"));
        }
        if self.preview.cache_capacity == 0 {
            return Err(invalid("preview.cache_capacity", "must be at least 1"));
        }
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(invalid(
                "export.jpeg_quality",
                format!("must be between 1 and 100, got {}", self.export.jpeg_quality),
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(invalid("log_level", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.into(),
    }
}
