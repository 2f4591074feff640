//! Authoritative full-resolution export.
//!
//! Export feeds the source image through every chain entry in order and
//! optionally encodes the result to disk. It always works on a
//! [`ChainSnapshot`], so edits made while an export runs are not observed.
//! Only one export runs at a time per pipeline; later requests wait.

use crate::chain::structure::ChainSnapshot;
use crate::core::error::{ExportError, ExportResult};
use crate::core::executor::{FilterExecutor, SharedExecutor};
use crate::core::instance::FilterInstance;
use crate::core::source::SourceImage;
use crate::core::types::ExportFormat;
use crossbeam::channel::{self, Receiver, TryRecvError};
use image::DynamicImage;
use parking_lot::Mutex;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Apply `instances` in order, each consuming the previous output.
///
/// An empty sequence returns a copy of `source`.
pub fn apply_chain(
    executor: &dyn FilterExecutor,
    instances: &[FilterInstance],
    source: &DynamicImage,
) -> ExportResult<DynamicImage> {
    let mut current = source.clone();

    for (index, instance) in instances.iter().enumerate() {
        current = instance
            .apply(executor, &current)
            .map_err(|source| ExportError::NoOutput {
                index,
                kind: instance.kind_id().to_string(),
                source,
            })?;
    }

    Ok(current)
}

/// Encode `image` and atomically place it at `path`.
///
/// The bitmap is written to a temporary file beside the destination and
/// renamed over it only once encoding succeeded, so a failed export never
/// leaves a partial file behind.
pub fn encode_to(
    image: &DynamicImage,
    path: &Path,
    format: ExportFormat,
    jpeg_quality: u8,
) -> ExportResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }

    let mut temp = tempfile::Builder::new()
        .prefix(".filtershop-")
        .suffix(&format!(".{}", format.extension()))
        .tempfile_in(&dir)?;

    {
        let mut output = BufWriter::new(temp.as_file_mut());
        encode(image, &mut output, format, jpeg_quality)?;
        output.flush()?;
    }

    temp.persist(path).map_err(|e| ExportError::Finalize {
        path: path.to_path_buf(),
        reason: e.error.to_string(),
    })?;
    Ok(())
}

fn encode<W: Write + std::io::Seek>(
    image: &DynamicImage,
    output: &mut W,
    format: ExportFormat,
    jpeg_quality: u8,
) -> ExportResult<()> {
    let to_error = |e: image::ImageError| ExportError::Encode {
        format,
        reason: e.to_string(),
    };

    match format {
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image.to_rgb8();
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(output, jpeg_quality.clamp(1, 100));
            encoder
                .encode(&rgb, rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
                .map_err(to_error)
        }
        ExportFormat::Gif | ExportFormat::WebP => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_to(output, format.to_image_format())
            .map_err(to_error),
        _ => image.write_to(output, format.to_image_format()).map_err(to_error),
    }
}

/// Result of a completed export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    /// Final full-resolution bitmap
    pub image: Arc<DynamicImage>,
    /// Where it was written, if it was encoded
    pub path: Option<PathBuf>,
    pub format: Option<ExportFormat>,
    /// Chain revision the export was taken from
    pub revision: u64,
    pub elapsed: Duration,
}

/// Destination for an encoded export.
#[derive(Debug, Clone)]
pub struct ExportTarget {
    pub path: PathBuf,
    pub format: ExportFormat,
}

impl ExportTarget {
    /// Target whose format follows the path extension, else `fallback`.
    pub fn from_path(path: impl Into<PathBuf>, fallback: ExportFormat) -> Self {
        let path = path.into();
        let format = ExportFormat::from_path(&path).unwrap_or(fallback);
        Self { path, format }
    }
}

/// Completion handle for a background export.
pub struct ExportHandle {
    receiver: Receiver<ExportResult<ExportOutput>>,
}

impl ExportHandle {
    /// Block until the export finishes.
    pub fn wait(self) -> ExportResult<ExportOutput> {
        self.receiver.recv().unwrap_or(Err(ExportError::Abandoned))
    }

    /// The result if the export has finished, without blocking.
    ///
    /// Yields the result once; after that the handle reports `Abandoned`.
    pub fn try_result(&self) -> Option<ExportResult<ExportOutput>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ExportError::Abandoned)),
        }
    }
}

impl std::fmt::Debug for ExportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportHandle")
            .field("ready", &!self.receiver.is_empty())
            .finish()
    }
}

/// Runs exports one at a time against a shared executor.
#[derive(Clone)]
pub struct ExportPipeline {
    executor: SharedExecutor,
    jpeg_quality: u8,
    gate: Arc<Mutex<()>>,
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("executor", &self.executor.name())
            .field("jpeg_quality", &self.jpeg_quality)
            .field("busy", &self.is_busy())
            .finish()
    }
}

impl ExportPipeline {
    pub fn new(executor: SharedExecutor) -> Self {
        Self {
            executor,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Set the JPEG quality (clamped to 1-100).
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Whether an export is currently running.
    pub fn is_busy(&self) -> bool {
        self.gate.is_locked()
    }

    /// Produce the final bitmap for `snapshot` over `source`.
    pub fn export(
        &self,
        snapshot: &ChainSnapshot,
        source: Option<&SourceImage>,
    ) -> ExportResult<ExportOutput> {
        self.run(snapshot, source, None)
    }

    /// Produce the final bitmap and encode it to `target`.
    pub fn export_to(
        &self,
        snapshot: &ChainSnapshot,
        source: Option<&SourceImage>,
        target: &ExportTarget,
    ) -> ExportResult<ExportOutput> {
        self.run(snapshot, source, Some(target))
    }

    /// Run an export on a worker thread.
    pub fn spawn(
        &self,
        snapshot: ChainSnapshot,
        source: Option<SourceImage>,
        target: Option<ExportTarget>,
    ) -> ExportHandle {
        let (sender, receiver) = channel::bounded(1);
        let pipeline = self.clone();

        let spawned = std::thread::Builder::new()
            .name("filtershop-export".to_string())
            .spawn({
                let sender = sender.clone();
                move || {
                    let result = pipeline.run(&snapshot, source.as_ref(), target.as_ref());
                    // Receiver may have been dropped; nothing left to report to
                    let _ = sender.send(result);
                }
            });

        if let Err(e) = spawned {
            log::error!("Failed to start export worker: {}", e);
            let _ = sender.send(Err(ExportError::Io(e)));
        }

        ExportHandle { receiver }
    }

    fn run(
        &self,
        snapshot: &ChainSnapshot,
        source: Option<&SourceImage>,
        target: Option<&ExportTarget>,
    ) -> ExportResult<ExportOutput> {
        let _guard = self.gate.lock();
        let start = Instant::now();

        let result = self.render_and_encode(snapshot, source, target);
        match &result {
            Ok(output) => log::info!(
                "Exported {} stages{} in {:?}",
                snapshot.len(),
                output
                    .path
                    .as_ref()
                    .map(|p| format!(" to {}", p.display()))
                    .unwrap_or_default(),
                start.elapsed()
            ),
            Err(e) => log::error!("Export failed: {}", e),
        }
        result
    }

    fn render_and_encode(
        &self,
        snapshot: &ChainSnapshot,
        source: Option<&SourceImage>,
        target: Option<&ExportTarget>,
    ) -> ExportResult<ExportOutput> {
        let start = Instant::now();
        let source = source.ok_or(ExportError::NoSourceImage)?;
        let image = apply_chain(self.executor.as_ref(), snapshot.instances(), source.image())?;

        if let Some(target) = target {
            encode_to(&image, &target.path, target.format, self.jpeg_quality)?;
        }

        Ok(ExportOutput {
            image: Arc::new(image),
            path: target.map(|t| t.path.clone()),
            format: target.map(|t| t.format),
            revision: snapshot.revision(),
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FilterExecutionError;
    use crate::core::executor::FnExecutor;
    use crate::core::kind::{Category, FilterKind};
    use image::{Rgba, RgbaImage};

    fn instance(id: &str) -> FilterInstance {
        FilterInstance::create(Arc::new(
            FilterKind::builder(id, id).category(Category::ColorEffect).build(),
        ))
    }

    /// "Invert" inverts, "Darken" halves red, "Broken" fails.
    fn executor() -> SharedExecutor {
        Arc::new(FnExecutor::new("fake", |kind, _, input| {
            let mut out = input.to_rgba8();
            match kind.id.as_str() {
                "Invert" => image::imageops::invert(&mut out),
                "Darken" => out.pixels_mut().for_each(|p| p[0] /= 2),
                _ => {
                    return Err(FilterExecutionError::NoOutput {
                        kind: kind.id.clone(),
                    })
                }
            }
            Ok(DynamicImage::ImageRgba8(out))
        }))
    }

    fn source() -> SourceImage {
        SourceImage::from_image(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            3,
            2,
            Rgba([200, 100, 50, 255]),
        )))
    }

    fn red(output: &ExportOutput) -> u8 {
        output.image.to_rgba8().get_pixel(0, 0)[0]
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let src = source();
        let output = ExportPipeline::new(executor())
            .export(&ChainSnapshot::default(), Some(&src))
            .unwrap();
        assert_eq!(output.image.as_ref(), src.image());
    }

    #[test]
    fn test_missing_source() {
        let err = ExportPipeline::new(executor())
            .export(&ChainSnapshot::default(), None)
            .unwrap_err();
        assert!(matches!(err, ExportError::NoSourceImage));
    }

    #[test]
    fn test_order_matters() {
        let pipeline = ExportPipeline::new(executor());
        let src = source();
        let ab = ChainSnapshot::from_instances(vec![instance("Invert"), instance("Darken")]);
        let ba = ChainSnapshot::from_instances(vec![instance("Darken"), instance("Invert")]);

        // 200 -> 55 -> 27 versus 200 -> 100 -> 155
        assert_eq!(red(&pipeline.export(&ab, Some(&src)).unwrap()), 27);
        assert_eq!(red(&pipeline.export(&ba, Some(&src)).unwrap()), 155);
    }

    #[test]
    fn test_failing_stage_reports_index() {
        let snapshot = ChainSnapshot::from_instances(vec![instance("Invert"), instance("Broken")]);
        let err = ExportPipeline::new(executor())
            .export(&snapshot, Some(&source()))
            .unwrap_err();

        match err {
            ExportError::NoOutput { index, kind, .. } => {
                assert_eq!(index, 1);
                assert_eq!(kind, "Broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_source_is_not_mutated() {
        let src = source();
        let before = src.image().clone();
        let snapshot = ChainSnapshot::from_instances(vec![instance("Invert")]);
        ExportPipeline::new(executor()).export(&snapshot, Some(&src)).unwrap();
        assert_eq!(src.image(), &before);
    }

    #[test]
    fn test_export_to_png_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let snapshot = ChainSnapshot::from_instances(vec![instance("Invert")]);

        let output = ExportPipeline::new(executor())
            .export_to(&snapshot, Some(&source()), &ExportTarget::from_path(&path, ExportFormat::Png))
            .unwrap();

        let reread = image::open(&path).unwrap();
        assert_eq!(reread.to_rgba8(), output.image.to_rgba8());
        assert_eq!(output.format, Some(ExportFormat::Png));

        // Only the final file remains in the directory
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_export_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jpg");
        ExportPipeline::new(executor())
            .with_jpeg_quality(80)
            .export_to(
                &ChainSnapshot::default(),
                Some(&source()),
                &ExportTarget::from_path(&path, ExportFormat::Png),
            )
            .unwrap();

        let reread = image::open(&path).unwrap();
        assert_eq!((reread.width(), reread.height()), (3, 2));
    }

    #[test]
    fn test_failed_render_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let snapshot = ChainSnapshot::from_instances(vec![instance("Broken")]);

        let err = ExportPipeline::new(executor())
            .export_to(&snapshot, Some(&source()), &ExportTarget::from_path(&path, ExportFormat::Png))
            .unwrap_err();

        assert!(!err.is_encode_failure());
        assert!(!path.exists());
    }

    #[test]
    fn test_finalize_failure_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way of the destination
        let path = dir.path().join("taken.png");
        std::fs::create_dir(&path).unwrap();

        let err = ExportPipeline::new(executor())
            .export_to(
                &ChainSnapshot::default(),
                Some(&source()),
                &ExportTarget::from_path(&path, ExportFormat::Png),
            )
            .unwrap_err();
        assert!(err.is_encode_failure());
    }

    #[test]
    fn test_background_export() {
        let pipeline = ExportPipeline::new(executor());
        let snapshot = ChainSnapshot::from_instances(vec![instance("Invert")]);
        let handle = pipeline.spawn(snapshot, Some(source()), None);

        let output = handle.wait().unwrap();
        assert_eq!(red(&output), 55);
        assert!(!pipeline.is_busy());
    }

    #[test]
    fn test_background_export_errors_propagate() {
        let handle = ExportPipeline::new(executor()).spawn(ChainSnapshot::default(), None, None);
        assert!(matches!(handle.wait(), Err(ExportError::NoSourceImage)));
    }
}
