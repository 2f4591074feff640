//! Live preview rendering.
//!
//! The preview runs the chain over a downscaled copy of the source image
//! and keeps the latest result for display. It re-renders whenever the
//! source changes or the chain reports a mutation. Preview is advisory: a
//! stage that fails is skipped with a warning and its input passes through.

use crate::chain::observer::{ChainEvent, ChainListener};
use crate::config::PreviewConfig;
use crate::core::executor::SharedExecutor;
use crate::core::instance::FilterInstance;
use crate::core::source::{SourceId, SourceImage};
use crate::core::types::Value;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::DynamicImage;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// One rendered preview, ready for display.
#[derive(Debug, Clone)]
pub struct PreviewSurface {
    image: Arc<DynamicImage>,
    source_id: SourceId,
    scale: f64,
    generation: u64,
    skipped: Vec<usize>,
}

impl PreviewSurface {
    /// The rendered bitmap.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Identity of the source image this was rendered from.
    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    /// Preview size relative to the full-resolution source (at most 1.0).
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Render request number that produced this surface.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Chain indices whose stage failed and was passed through.
    pub fn skipped_stages(&self) -> &[usize] {
        &self.skipped
    }

    /// Encode as a base64 PNG data URL.
    pub fn to_data_url(&self) -> Result<String, image::ImageError> {
        let mut buffer = Cursor::new(Vec::new());
        self.image.write_to(&mut buffer, image::ImageFormat::Png)?;
        Ok(format!(
            "data:image/png;base64,{}",
            BASE64.encode(buffer.into_inner())
        ))
    }
}

/// Downscaled source the preview renders from.
struct PreviewSource {
    id: SourceId,
    image: Arc<DynamicImage>,
    scale: f64,
}

/// Cached outcome of one render.
#[derive(Clone)]
struct CachedRender {
    image: Arc<DynamicImage>,
    skipped: Vec<usize>,
}

struct PreviewState {
    executor: SharedExecutor,
    config: PreviewConfig,
    source: RwLock<Option<PreviewSource>>,
    latest: RwLock<Option<Arc<PreviewSurface>>>,
    cache: Mutex<LruCache<u64, CachedRender>>,
    generation: AtomicU64,
    cache_hits: AtomicU64,
}

/// Renders and holds the live preview.
///
/// Cheap to clone; clones share state, so the listener handed to a chain
/// updates the same preview the caller reads.
#[derive(Clone)]
pub struct PreviewPipeline {
    state: Arc<PreviewState>,
}

impl std::fmt::Debug for PreviewPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewPipeline")
            .field("executor", &self.state.executor.name())
            .field("config", &self.state.config)
            .field("generation", &self.generation())
            .finish()
    }
}

impl PreviewPipeline {
    /// Create a pipeline with no source.
    pub fn new(executor: SharedExecutor, config: PreviewConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Arc::new(PreviewState {
                executor,
                config,
                source: RwLock::new(None),
                latest: RwLock::new(None),
                cache: Mutex::new(LruCache::new(capacity)),
                generation: AtomicU64::new(0),
                cache_hits: AtomicU64::new(0),
            }),
        }
    }

    /// Replace the source image and re-render with `instances`.
    ///
    /// `None` clears the preview.
    pub fn set_source(
        &self,
        source: Option<&SourceImage>,
        instances: &[FilterInstance],
    ) -> Option<Arc<PreviewSurface>> {
        let prepared = source.map(|s| self.downscale(s));
        *self.state.source.write() = prepared;
        self.render(instances)
    }

    /// Render `instances` over the current source and publish the result.
    pub fn render(&self, instances: &[FilterInstance]) -> Option<Arc<PreviewSurface>> {
        let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let surface = if self.state.config.enabled {
            let source = self.state.source.read();
            source
                .as_ref()
                .map(|source| Arc::new(self.render_from(source, instances, generation)))
        } else {
            None
        };

        *self.state.latest.write() = surface.clone();
        surface
    }

    /// Listener that re-renders on every chain mutation.
    pub fn listener(&self) -> ChainListener {
        let pipeline = self.clone();
        Box::new(move |event: &ChainEvent, instances: &[FilterInstance]| {
            log::debug!("Preview refresh after chain {}", event.label());
            pipeline.render(instances);
        })
    }

    /// Most recent surface, if a source is set.
    pub fn latest(&self) -> Option<Arc<PreviewSurface>> {
        self.state.latest.read().clone()
    }

    /// Number of render requests so far.
    pub fn generation(&self) -> u64 {
        self.state.generation.load(Ordering::SeqCst)
    }

    /// Number of renders served from the cache.
    pub fn cache_hits(&self) -> u64 {
        self.state.cache_hits.load(Ordering::SeqCst)
    }

    pub fn cache_len(&self) -> usize {
        self.state.cache.lock().len()
    }

    pub fn clear_cache(&self) {
        self.state.cache.lock().clear();
    }

    fn downscale(&self, source: &SourceImage) -> PreviewSource {
        let max = self.state.config.max_dimension.max(1);
        let (width, height) = (source.width(), source.height());
        let longest = width.max(height);

        if longest <= max {
            return PreviewSource {
                id: source.id(),
                image: source.shared(),
                scale: 1.0,
            };
        }

        let thumbnail = source.image().thumbnail(max, max);
        let scale = thumbnail.width().max(thumbnail.height()) as f64 / longest as f64;
        PreviewSource {
            id: source.id(),
            image: Arc::new(thumbnail),
            scale,
        }
    }

    fn render_from(
        &self,
        source: &PreviewSource,
        instances: &[FilterInstance],
        generation: u64,
    ) -> PreviewSurface {
        let key = fingerprint(source.id, instances);

        let cached = self.state.cache.lock().get(&key).cloned();
        let render = match cached {
            Some(hit) => {
                self.state.cache_hits.fetch_add(1, Ordering::SeqCst);
                hit
            }
            None => {
                let render = self.run_stages(&source.image, instances);
                self.state.cache.lock().put(key, render.clone());
                render
            }
        };

        PreviewSurface {
            image: render.image,
            source_id: source.id,
            scale: source.scale,
            generation,
            skipped: render.skipped,
        }
    }

    fn run_stages(&self, input: &Arc<DynamicImage>, instances: &[FilterInstance]) -> CachedRender {
        let start = Instant::now();
        let executor = self.state.executor.as_ref();
        let mut current = Arc::clone(input);
        let mut skipped = Vec::new();

        for (index, instance) in instances.iter().enumerate() {
            match instance.apply(executor, &current) {
                Ok(output) => current = Arc::new(output),
                Err(e) => {
                    log::warn!("Preview skipped stage {} ({}): {}", index, instance.kind_id(), e);
                    skipped.push(index);
                }
            }
        }

        log::debug!(
            "Preview rendered {} stages in {:?}",
            instances.len(),
            start.elapsed()
        );

        CachedRender {
            image: current,
            skipped,
        }
    }
}

/// Hash of the source identity and every stage's kind and values.
fn fingerprint(source: SourceId, instances: &[FilterInstance]) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    instances.len().hash(&mut hasher);

    for instance in instances {
        instance.kind_id().hash(&mut hasher);
        for (name, value) in instance.parameters() {
            name.hash(&mut hasher);
            hash_value(value, &mut hasher);
        }
    }

    hasher.finish()
}

/// Hash a Value for caching purposes.
fn hash_value<H: Hasher>(value: &Value, hasher: &mut H) {
    std::mem::discriminant(value).hash(hasher);

    match value {
        Value::Number(n) => n.to_bits().hash(hasher),
        Value::Vector(v) => {
            v.len().hash(hasher);
            for x in v {
                x.to_bits().hash(hasher);
            }
        }
        Value::Color(c) => c.hash(hasher),
        Value::Image(img) => {
            img.width().hash(hasher);
            img.height().hash(hasher);
            img.image().as_bytes().hash(hasher);
        }
        Value::Opaque(s) => s.hash(hasher),
    }
}
