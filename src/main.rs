//! FilterShop CLI - Ordered Image Filter Chains
//!
//! A small driver for the FilterShop library: browse the catalog, inspect a
//! filter, and run a chain over an image file.

use anyhow::{anyhow, bail, Context, Result};
use filtershop::prelude::*;
use std::path::{Path, PathBuf};

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ {:#}", e);
        if let Some(fix) = e.downcast_ref::<ExportError>().and_then(ExportError::suggested_fix) {
            eprintln!("   Hint: {}", fix);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args: Vec<String> = std::env::args().collect();
    let program = args.remove(0);
    let config_path = take_option(&mut args, "--config")?.map(PathBuf::from);

    let config = FilterShopConfig::discover(config_path.as_deref())
        .context("Failed to load configuration")?;
    init_logger(&config);

    if args.is_empty() {
        print_usage(&program);
        return Ok(());
    }
    let mut rest = args.split_off(1);
    let command = args.remove(0);
    let rest = &mut rest;

    match command.as_str() {
        "list" => list_filters(),
        "info" => {
            let json = take_flag(rest, "--json");
            let kind = rest
                .first()
                .ok_or_else(|| anyhow!("Please specify a filter ID"))?;
            filter_info(kind, json)
        }
        "process" => process_image(rest, &config, false),
        "preview" => process_image(rest, &config, true),
        "help" | "--help" | "-h" => {
            print_usage(&program);
            Ok(())
        }
        other => {
            print_usage(&program);
            bail!("Unknown command: {}", other)
        }
    }
}

fn init_logger(config: &FilterShopConfig) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .format_timestamp_millis()
    .init();
}

fn print_usage(program: &str) {
    println!("🎨 FilterShop v{}", filtershop::VERSION);
    println!();
    println!("Usage: {} [--config <file>] <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list                              List all available filters");
    println!("  info <filter> [--json]            Show parameters of a filter");
    println!("  process <in> <out> [options]      Apply a chain and export");
    println!("  preview <in> <out> [options]      Render the downscaled live preview");
    println!("  help                              Show this help message");
    println!();
    println!("Chain options:");
    println!("  --filter KIND[:name=value;...]    Append a filter (repeatable, applied in order)");
    println!("  --format <type>                   png, jpg, tiff, bmp, gif or webp");
    println!();
    println!("Values: numbers, vectors as 1,2  colors as #RRGGBB[AA]  images as file paths");
    println!("The config file may also be named by {}.", filtershop::config::CONFIG_ENV_VAR);
}

fn list_filters() -> Result<()> {
    let catalog = FilterCatalog::with_builtins();

    println!("Available filters ({} total):", catalog.len());
    for entry in catalog.list_available() {
        match entry {
            CatalogEntry::CategoryHeader(category) => {
                println!();
                println!("  📁 {}", category);
            }
            CatalogEntry::FilterRef(kind) => {
                println!("      • {} - {}", kind.id, kind.name);
            }
        }
    }
    Ok(())
}

fn filter_info(kind_id: &str, json: bool) -> Result<()> {
    let catalog = FilterCatalog::with_builtins();
    let kind = catalog
        .describe(kind_id)
        .context("Use 'list' to see available filters")?;

    if json {
        let rows = kind.rows();
        let value = serde_json::json!({ "kind": kind.as_ref(), "rows": rows });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Filter: {}", kind.name);
    println!("ID: {}", kind.id);
    println!("Category: {}", kind.category);
    println!();
    println!("Description:");
    println!("  {}", kind.description);
    println!();

    if kind.parameters.is_empty() {
        println!("No parameters.");
        return Ok(());
    }

    println!("Parameters:");
    for row in kind.rows() {
        println!("  • {} = {}", row.name, row.default_value);
        for column in &ParameterColumn::all()[1..] {
            if *column == ParameterColumn::DefaultValue {
                continue;
            }
            println!("      {:<15} {}", column.title(), row.column(*column));
        }
    }
    Ok(())
}

fn process_image(args: &mut Vec<String>, config: &FilterShopConfig, preview_only: bool) -> Result<()> {
    let format = take_option(args, "--format")?
        .map(|f| f.parse::<ExportFormat>().map_err(|e| anyhow!(e)))
        .transpose()?;

    let mut filters = Vec::new();
    while let Some(spec) = take_option(args, "--filter")? {
        filters.push(spec);
    }

    let [input, output] = args.as_slice() else {
        bail!("Please specify input and output paths");
    };

    let doc = Document::with_builtins(config);
    doc.open_image(input)
        .with_context(|| format!("Cannot open {}", input))?;

    for spec in &filters {
        add_filter_spec(&doc, spec)?;
    }

    if !filters.is_empty() {
        println!("🔗 Chain: {}", doc.chain_names().join(" → "));
    }

    if preview_only {
        let surface = doc
            .preview()
            .ok_or_else(|| anyhow!("Preview is disabled in the configuration"))?;
        for index in surface.skipped_stages() {
            println!("⚠️  Stage {} was skipped in the preview", index + 1);
        }
        surface
            .image()
            .save(output)
            .with_context(|| format!("Cannot write {}", output))?;
        println!(
            "🖼️  Preview {}x{} (scale {:.2}) saved to: {}",
            surface.width(),
            surface.height(),
            surface.scale(),
            output
        );
        return Ok(());
    }

    println!("⚙️  Processing {} -> {}", input, output);
    let result = doc.export_to(Path::new(output), format)?;
    println!(
        "✅ Complete in {}ms ({}x{})",
        result.elapsed.as_millis(),
        result.image.width(),
        result.image.height()
    );
    println!("🎉 Image saved to: {}", output);
    Ok(())
}

/// Append `KIND[:name=value;...]` to the document's chain.
fn add_filter_spec(doc: &Document, spec: &str) -> Result<()> {
    let (kind_id, assignments) = match spec.split_once(':') {
        Some((kind, rest)) => (kind.trim(), rest),
        None => (spec.trim(), ""),
    };

    let kind = doc.catalog().describe(kind_id)?;

    let mut values = Vec::new();
    for assignment in assignments.split(';').filter(|a| !a.trim().is_empty()) {
        let (name, text) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected name=value, got '{}'", assignment))?;
        let name = name.trim();

        let param = kind
            .get_parameter(name)
            .ok_or_else(|| anyhow!("'{}' has no parameter '{}'", kind_id, name))?;
        let value = Value::parse(param.param_type, text)
            .map_err(|e| anyhow!("{}.{}: {}", kind_id, name, e))?;
        values.push((name.to_string(), value));
    }

    doc.add_configured_filter(kind_id, values)?;
    Ok(())
}

/// Remove `--name <value>` from `args`, returning the value.
fn take_option(args: &mut Vec<String>, name: &str) -> Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        bail!("{} requires a value", name);
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

/// Remove `--name` from `args`, returning whether it was present.
fn take_flag(args: &mut Vec<String>, name: &str) -> bool {
    match args.iter().position(|a| a == name) {
        Some(pos) => {
            args.remove(pos);
            true
        }
        None => false,
    }
}
