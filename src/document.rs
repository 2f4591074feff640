//! A document session: one source image, one chain, live preview and export.
//!
//! The document owns the chain behind a lock. The preview pipeline is
//! subscribed to the chain, so every successful edit re-renders the preview
//! before the edit call returns. Exports work on a snapshot taken under the
//! read lock, so the chain can keep changing while an export runs.

use crate::chain::observer::{ChainListener, SubscriptionId};
use crate::chain::structure::FilterChain;
use crate::config::{ChainPolicy, FilterShopConfig};
use crate::core::error::{
    CatalogError, ChainError, ExportResult, FilterShopResult, ImageLoadError,
};
use crate::core::executor::SharedExecutor;
use crate::core::instance::FilterInstance;
use crate::core::parameter::ParameterRow;
use crate::core::source::SourceImage;
use crate::core::types::{ExportFormat, Value};
use crate::execution::export::{ExportHandle, ExportOutput, ExportPipeline, ExportTarget};
use crate::execution::preview::{PreviewPipeline, PreviewSurface};
use crate::filters::builtin::BuiltinExecutor;
use crate::filters::registry::FilterCatalog;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// No image has been opened.
    Empty,
    /// An image is open and the chain has not changed since.
    Loaded,
    /// The chain has been edited over the current image.
    Previewing,
    /// An export is running.
    Exporting,
}

/// Title and rows for a parameter inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSheet {
    /// Display name of the filter kind
    pub title: String,
    pub rows: Vec<ParameterRow>,
}

/// An open document.
pub struct Document {
    catalog: Arc<FilterCatalog>,
    chain: RwLock<FilterChain>,
    source: RwLock<Option<SourceImage>>,
    preview: PreviewPipeline,
    export: ExportPipeline,
    policy: ChainPolicy,
    default_format: ExportFormat,
    edited: Arc<AtomicBool>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("state", &self.state())
            .field("chain", &*self.chain.read())
            .field("policy", &self.policy)
            .finish()
    }
}

impl Document {
    /// Create an empty document.
    pub fn new(
        catalog: Arc<FilterCatalog>,
        executor: SharedExecutor,
        config: &FilterShopConfig,
    ) -> Self {
        let preview = PreviewPipeline::new(Arc::clone(&executor), config.preview.clone());
        let export = ExportPipeline::new(executor).with_jpeg_quality(config.export.jpeg_quality);
        let edited = Arc::new(AtomicBool::new(false));

        let mut chain = FilterChain::new();
        chain.subscribe(preview.listener());
        chain.subscribe({
            let edited = Arc::clone(&edited);
            Box::new(move |_, _| edited.store(true, Ordering::SeqCst))
        });

        Self {
            catalog,
            chain: RwLock::new(chain),
            source: RwLock::new(None),
            preview,
            export,
            policy: config.document.chain_policy,
            default_format: config.export.default_format,
            edited,
        }
    }

    /// Document over the built-in catalog and executor.
    pub fn with_builtins(config: &FilterShopConfig) -> Self {
        Self::new(
            Arc::new(FilterCatalog::with_builtins()),
            Arc::new(BuiltinExecutor::new()),
            config,
        )
    }

    pub fn catalog(&self) -> &Arc<FilterCatalog> {
        &self.catalog
    }

    pub fn policy(&self) -> ChainPolicy {
        self.policy
    }

    pub fn state(&self) -> DocumentState {
        if self.export.is_busy() {
            DocumentState::Exporting
        } else if self.source.read().is_none() {
            DocumentState::Empty
        } else if self.edited.load(Ordering::SeqCst) {
            DocumentState::Previewing
        } else {
            DocumentState::Loaded
        }
    }

    /// The current source image.
    pub fn source(&self) -> Option<SourceImage> {
        self.source.read().clone()
    }

    // ------------------------------------------------------------------
    // Source image
    // ------------------------------------------------------------------

    /// Open an image file, replacing the current source.
    pub fn open_image(&self, path: impl AsRef<Path>) -> Result<(), ImageLoadError> {
        let image = SourceImage::open(path)?;
        self.replace_source(image);
        Ok(())
    }

    /// Open the first acceptable file of a drop payload.
    pub fn drop_files(&self, paths: &[PathBuf]) -> Result<(), ImageLoadError> {
        let image = SourceImage::from_drop(paths)?;
        self.replace_source(image);
        Ok(())
    }

    /// Replace the source with an in-memory image.
    pub fn replace_source(&self, image: SourceImage) {
        let mut chain = self.chain.write();

        if self.policy == ChainPolicy::ClearOnOpen {
            let removed = chain.clear();
            if removed > 0 {
                log::info!("Cleared {} filters for new image", removed);
            }
        }

        self.preview.set_source(Some(&image), chain.instances());
        self.edited.store(!chain.is_empty(), Ordering::SeqCst);
        *self.source.write() = Some(image);
    }

    // ------------------------------------------------------------------
    // Chain editing
    // ------------------------------------------------------------------

    /// Append a fresh instance of `kind_id` and return its index.
    pub fn add_filter(&self, kind_id: &str) -> Result<usize, CatalogError> {
        let instance = self.catalog.create_instance(kind_id)?;
        Ok(self.chain.write().append(instance))
    }

    /// Append a new instance of `kind_id` with `values` already applied.
    ///
    /// The chain sees a single append, so subscribers and the preview run
    /// once. Nothing is added if any value is rejected.
    pub fn add_configured_filter<I>(&self, kind_id: &str, values: I) -> FilterShopResult<usize>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut instance = self.catalog.create_instance(kind_id)?;
        for (name, value) in values {
            instance.set_parameter(&name, value)?;
        }
        Ok(self.push_instance(instance))
    }

    /// Append an already configured instance.
    pub fn push_instance(&self, instance: FilterInstance) -> usize {
        self.chain.write().append(instance)
    }

    pub fn remove_filter(&self, index: usize) -> Result<FilterInstance, ChainError> {
        self.chain.write().remove_at(index)
    }

    pub fn move_filter(&self, from: usize, to: usize) -> Result<(), ChainError> {
        self.chain.write().reorder(from, to)
    }

    pub fn set_parameter(&self, index: usize, name: &str, value: Value) -> Result<(), ChainError> {
        self.chain.write().set_parameter(index, name, value)
    }

    /// Parameter inspector contents for the instance at `index`.
    pub fn parameters(&self, index: usize) -> Result<ParameterSheet, ChainError> {
        let chain = self.chain.read();
        let instance = chain.get(index)?;
        Ok(ParameterSheet {
            title: self.catalog.display_name(instance.kind_id()).to_string(),
            rows: instance.kind().rows(),
        })
    }

    /// Current value of one parameter of the instance at `index`.
    pub fn parameter_value(&self, index: usize, name: &str) -> Result<Option<Value>, ChainError> {
        let chain = self.chain.read();
        Ok(chain.get(index)?.parameter_value(name).cloned())
    }

    /// Display names of the chain entries, in order.
    pub fn chain_names(&self) -> Vec<String> {
        self.chain
            .read()
            .instances()
            .iter()
            .map(|i| self.catalog.display_name(i.kind_id()).to_string())
            .collect()
    }

    pub fn chain_len(&self) -> usize {
        self.chain.read().len()
    }

    /// Observe chain mutations.
    ///
    /// The listener runs while the chain is locked and must not call back
    /// into this document.
    pub fn subscribe(&self, listener: ChainListener) -> SubscriptionId {
        self.chain.write().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.chain.write().unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Preview and export
    // ------------------------------------------------------------------

    /// Latest preview, if an image is open.
    pub fn preview(&self) -> Option<Arc<PreviewSurface>> {
        self.preview.latest()
    }

    pub fn preview_pipeline(&self) -> &PreviewPipeline {
        &self.preview
    }

    /// Full-resolution result of the current chain.
    pub fn export(&self) -> ExportResult<ExportOutput> {
        let (snapshot, source) = self.snapshot();
        self.export.export(&snapshot, source.as_ref())
    }

    /// Export and encode to `path`.
    ///
    /// Without an explicit format the path extension decides, falling back
    /// to the configured default.
    pub fn export_to(
        &self,
        path: impl Into<PathBuf>,
        format: Option<ExportFormat>,
    ) -> ExportResult<ExportOutput> {
        let target = self.target(path.into(), format);
        let (snapshot, source) = self.snapshot();
        self.export.export_to(&snapshot, source.as_ref(), &target)
    }

    /// Start an export on a worker thread, optionally encoding to `path`.
    pub fn export_in_background(
        &self,
        path: Option<PathBuf>,
        format: Option<ExportFormat>,
    ) -> ExportHandle {
        let target = path.map(|p| self.target(p, format));
        let (snapshot, source) = self.snapshot();
        self.export.spawn(snapshot, source, target)
    }

    fn target(&self, path: PathBuf, format: Option<ExportFormat>) -> ExportTarget {
        match format {
            Some(format) => ExportTarget { path, format },
            None => ExportTarget::from_path(path, self.default_format),
        }
    }

    /// Chain and source captured together.
    fn snapshot(&self) -> (crate::chain::structure::ChainSnapshot, Option<SourceImage>) {
        let chain = self.chain.read();
        let source = self.source.read().clone();
        (chain.snapshot(), source)
    }
}
