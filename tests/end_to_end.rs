//! End-to-end scenarios over a document with deterministic fake filters.

use filtershop::prelude::*;
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// Catalog of three tiny kinds the fake executor understands.
fn catalog() -> Arc<FilterCatalog> {
    let mut catalog = FilterCatalog::new();
    catalog.register(
        FilterKind::builder("Brighten", "Brighten")
            .category(Category::ColorAdjustment)
            .parameter(
                ParameterSpec::new("amount", ParameterType::Scalar, Value::Number(100.0))
                    .with_range(0.0, 255.0),
            )
            .build(),
    );
    catalog.register(
        FilterKind::builder("Halve", "Halve")
            .category(Category::ColorAdjustment)
            .build(),
    );
    catalog.register(
        FilterKind::builder("Broken", "Broken")
            .category(Category::Stylize)
            .build(),
    );
    Arc::new(catalog)
}

fn executor() -> SharedExecutor {
    Arc::new(FnExecutor::new("fake", |kind, params, input| {
        let mut out = input.to_rgba8();
        match kind.id.as_str() {
            "Brighten" => {
                let amount = params.get("amount").and_then(Value::as_number).unwrap_or(0.0);
                for p in out.pixels_mut() {
                    p[0] = (p[0] as f64 + amount).min(255.0) as u8;
                }
            }
            "Halve" => {
                for p in out.pixels_mut() {
                    p[0] /= 2;
                }
            }
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
    let image = RgbaImage::from_fn(8, 6, |x, y| Rgba([100, (x * 20) as u8, (y * 30) as u8, 255]));
    SourceImage::from_image(DynamicImage::ImageRgba8(image))
}

fn document(policy: ChainPolicy) -> Document {
    let mut config = FilterShopConfig::default();
    config.document.chain_policy = policy;
    Document::new(catalog(), executor(), &config)
}

fn red_channel(image: &DynamicImage) -> u8 {
    image.to_rgba8().get_pixel(0, 0)[0]
}

#[test]
fn test_catalog_lists_headers_before_members() {
    let mut catalog = FilterCatalog::new();
    catalog.register(
        FilterKind::builder("GaussianBlur", "Gaussian Blur")
            .category(Category::Blur)
            .build(),
    );

    let entries = catalog.list_available();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], CatalogEntry::CategoryHeader(Category::Blur));
    assert_eq!(entries[1].label(), "GaussianBlur");
    assert!(!entries[1].is_header());
}

#[test]
fn test_removing_first_filter_leaves_second() {
    let doc = document(ChainPolicy::Retain);
    doc.replace_source(source());
    doc.add_filter("Halve").unwrap();
    doc.add_filter("Brighten").unwrap();

    doc.remove_filter(0).unwrap();
    assert_eq!(doc.chain_len(), 1);
    assert_eq!(doc.chain_names(), vec!["Brighten".to_string()]);

    let output = doc.export().unwrap();
    assert_eq!(red_channel(&output.image), 200);
}

#[test]
fn test_order_matters() {
    let forward = document(ChainPolicy::Retain);
    forward.replace_source(source());
    forward.add_filter("Brighten").unwrap();
    forward.add_filter("Halve").unwrap();

    let reversed = document(ChainPolicy::Retain);
    reversed.replace_source(source());
    reversed.add_filter("Halve").unwrap();
    reversed.add_filter("Brighten").unwrap();

    assert_eq!(red_channel(&forward.export().unwrap().image), 100);
    assert_eq!(red_channel(&reversed.export().unwrap().image), 150);

    reversed.move_filter(1, 0).unwrap();
    assert_eq!(red_channel(&reversed.export().unwrap().image), 100);
}

#[test]
fn test_empty_chain_is_identity() {
    let doc = document(ChainPolicy::Retain);
    let src = source();
    doc.replace_source(src.clone());

    let output = doc.export().unwrap();
    assert_eq!(output.image.to_rgba8(), src.image().to_rgba8());
}

#[test]
fn test_fresh_instance_holds_defaults() {
    let doc = document(ChainPolicy::Retain);
    let index = doc.add_filter("Brighten").unwrap();

    assert_eq!(
        doc.parameter_value(index, "amount").unwrap(),
        Some(Value::Number(100.0))
    );

    let sheet = doc.parameters(index).unwrap();
    assert_eq!(sheet.rows.len(), 1);
    assert_eq!(sheet.rows[0].name, "amount");
}

#[test]
fn test_unknown_parameter_is_rejected() {
    let doc = document(ChainPolicy::Retain);
    let index = doc.add_filter("Brighten").unwrap();

    let err = doc
        .set_parameter(index, "nope", Value::Number(1.0))
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::Parameter {
            source: ParameterError::UnknownParameter { .. },
            ..
        }
    ));
    assert_eq!(
        doc.parameter_value(index, "amount").unwrap(),
        Some(Value::Number(100.0))
    );
}

#[test]
fn test_unknown_kind_is_rejected() {
    let doc = document(ChainPolicy::Retain);
    assert!(doc.add_filter("Nope").is_err());
    assert_eq!(doc.chain_len(), 0);
}

#[test]
fn test_export_writes_decodable_png() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    source().image().save(&input).unwrap();

    let doc = document(ChainPolicy::Retain);
    doc.open_image(&input).unwrap();
    doc.add_filter("Halve").unwrap();

    let path = dir.path().join("output.png");
    let output = doc.export_to(&path, None).unwrap();
    assert_eq!(output.path.as_deref(), Some(path.as_path()));

    let written = image::open(&path).unwrap();
    assert_eq!(written.to_rgba8(), output.image.to_rgba8());
    assert_eq!(red_channel(&written), 50);
}

#[test]
fn test_background_export_matches_foreground() {
    let doc = document(ChainPolicy::Retain);
    doc.replace_source(source());
    doc.add_filter("Brighten").unwrap();

    let expected = doc.export().unwrap();
    let handle = doc.export_in_background(None, None);

    // Edits after the snapshot do not reach the running export.
    doc.add_filter("Halve").unwrap();

    let output = handle.wait().unwrap();
    assert_eq!(output.image.to_rgba8(), expected.image.to_rgba8());
}

#[test]
fn test_failing_stage_skipped_in_preview_but_fails_export() {
    let doc = document(ChainPolicy::Retain);
    doc.replace_source(source());
    doc.add_filter("Brighten").unwrap();
    doc.add_filter("Broken").unwrap();

    let preview = doc.preview().unwrap();
    assert_eq!(preview.skipped_stages(), &[1]);
    assert_eq!(red_channel(preview.image()), 200);

    let err = doc.export().unwrap_err();
    assert!(matches!(err, ExportError::NoOutput { index: 1, .. }));
}

#[test]
fn test_export_without_source_fails() {
    let doc = document(ChainPolicy::Retain);
    doc.add_filter("Halve").unwrap();
    assert!(matches!(doc.export(), Err(ExportError::NoSourceImage)));
}

#[test]
fn test_retain_policy_keeps_chain_on_open() {
    let doc = document(ChainPolicy::Retain);
    assert_eq!(doc.state(), DocumentState::Empty);

    doc.replace_source(source());
    assert_eq!(doc.state(), DocumentState::Loaded);

    doc.add_filter("Halve").unwrap();
    assert_eq!(doc.state(), DocumentState::Previewing);

    doc.replace_source(source());
    assert_eq!(doc.chain_len(), 1);
    assert_eq!(doc.state(), DocumentState::Previewing);
}

#[test]
fn test_clear_on_open_policy_empties_chain() {
    let doc = document(ChainPolicy::ClearOnOpen);
    doc.replace_source(source());
    doc.add_filter("Halve").unwrap();
    doc.add_filter("Brighten").unwrap();

    doc.replace_source(source());
    assert_eq!(doc.chain_len(), 0);
    assert_eq!(doc.state(), DocumentState::Loaded);
}

#[test]
fn test_subscribers_see_every_edit() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let doc = document(ChainPolicy::Retain);
    let seen = Arc::new(AtomicUsize::new(0));
    let id = doc.subscribe({
        let seen = Arc::clone(&seen);
        Box::new(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    });

    doc.add_filter("Brighten").unwrap();
    doc.set_parameter(0, "amount", Value::Number(10.0)).unwrap();
    doc.add_filter("Halve").unwrap();
    doc.move_filter(0, 1).unwrap();
    doc.remove_filter(0).unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 5);

    assert!(doc.unsubscribe(id));
    doc.add_filter("Halve").unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 5);
}

#[test]
fn test_builtin_blur_with_huge_radius_still_exports() {
    let doc = Document::with_builtins(&FilterShopConfig::default());
    doc.replace_source(source());
    doc.add_filter("BoxBlur").unwrap();
    doc.add_filter("GaussianBlur").unwrap();
    doc.set_parameter(0, "radius", Value::Number(1e30)).unwrap();
    doc.set_parameter(1, "radius", Value::Number(1e30)).unwrap();

    let preview = doc.preview().unwrap();
    assert!(preview.skipped_stages().is_empty());

    let output = doc.export().unwrap();
    assert_eq!((output.image.width(), output.image.height()), (8, 6));
}

#[test]
fn test_builtin_non_finite_radius_degrades_preview_and_fails_export() {
    let doc = Document::with_builtins(&FilterShopConfig::default());
    doc.replace_source(source());
    doc.add_filter("GaussianBlur").unwrap();
    doc.add_filter("ColorInvert").unwrap();
    doc.set_parameter(0, "radius", Value::Number(f64::INFINITY)).unwrap();

    let preview = doc.preview().unwrap();
    assert_eq!(preview.skipped_stages(), &[0]);
    assert_eq!((preview.width(), preview.height()), (8, 6));

    let err = doc.export().unwrap_err();
    assert!(matches!(err, ExportError::NoOutput { index: 0, .. }));
    assert!(!err.is_encode_failure());
}
