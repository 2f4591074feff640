//! Source images opened from disk or dropped onto a document.
//!
//! A [`SourceImage`] is never mutated; opening or dropping another file
//! replaces it wholesale.

use crate::core::error::ImageLoadError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// File extensions that can be opened.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Extensions an open dialog may offer that have no decoder here.
pub const UNDECODABLE_EXTENSIONS: &[&str] = &["pdf", "pct"];

/// Identity of one loaded image, distinct for every open or drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub Uuid);

impl SourceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// An immutable decoded bitmap plus where it came from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    id: SourceId,
    image: Arc<DynamicImage>,
    origin: Option<PathBuf>,
}

impl SourceImage {
    /// Wrap an in-memory image.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            id: SourceId::new(),
            image: Arc::new(image),
            origin: None,
        }
    }

    /// Open and decode an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageLoadError> {
        let path = path.as_ref();
        let extension = extension_of(path);

        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ImageLoadError::UnsupportedType {
                path: path.to_path_buf(),
                extension,
            });
        }

        let image = image::open(path).map_err(|source| ImageLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!(
            "Opened {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );

        Ok(Self {
            id: SourceId::new(),
            image: Arc::new(image),
            origin: Some(path.to_path_buf()),
        })
    }

    /// Whether a path names a file type that can be opened.
    pub fn is_supported_path(path: &Path) -> bool {
        SUPPORTED_EXTENSIONS.contains(&extension_of(path).as_str())
    }

    /// Whether a dropped payload contains at least one openable file.
    pub fn accepts_drop(paths: &[PathBuf]) -> bool {
        paths.iter().any(|p| Self::is_supported_path(p))
    }

    /// Open the first openable file of a dropped payload.
    pub fn from_drop(paths: &[PathBuf]) -> Result<Self, ImageLoadError> {
        let path = paths
            .iter()
            .find(|p| Self::is_supported_path(p))
            .ok_or(ImageLoadError::EmptyDrop)?;
        Self::open(path)
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Borrow the decoded bitmap.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Clone the shared handle to the bitmap.
    pub fn shared(&self) -> Arc<DynamicImage> {
        Arc::clone(&self.image)
    }

    /// File the image was opened from, if any.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
