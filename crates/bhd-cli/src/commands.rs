use std::io::{self, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use comfy_table::Table;

use bhd_cli::pipeline::{RunOptions, run_pipeline};
use bhd_cli::types::RunResult;
use bhd_standards::{DatasetRegistry, PipelineConfig};
use bhd_transform::standard_pipeline;

use crate::cli::{RunArgs, SchemaArgs, SourcesArgs};
use crate::summary::apply_table_style;

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path).context("load config"),
        None => Ok(PipelineConfig::default()),
    }
}

pub fn run(args: &RunArgs) -> Result<RunResult> {
    let config = load_config(args.config.as_deref())?;
    let registry = DatasetRegistry::embedded()
        .context("load dataset registry")?
        .with_locator_overrides(&config.sources)
        .context("apply locator overrides")?
        .select(&args.datasets)
        .context("select datasets")?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir());
    let formats = if args.formats.is_empty() {
        config.formats()
    } else {
        let mut formats = args.formats.clone();
        formats.sort();
        formats.dedup();
        formats
    };
    let options = RunOptions {
        downloads_dir: args
            .downloads_dir
            .clone()
            .unwrap_or_else(|| config.downloads_dir()),
        layout: config.output_layout(&output_dir),
        output_dir,
        formats,
        quality_report: args.quality_report.clone(),
        show_progress: !args.no_progress && io::stderr().is_terminal(),
    };
    run_pipeline(&registry, &options)
}

pub fn run_sources(args: &SourcesArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let registry = DatasetRegistry::embedded()
        .context("load dataset registry")?
        .with_locator_overrides(&config.sources)
        .context("apply locator overrides")?;

    let mut table = Table::new();
    table.set_header(vec!["Dataset", "Kind", "Location", "Columns", "Filter"]);
    apply_table_style(&mut table);
    for descriptor in registry.iter() {
        let columns = descriptor
            .schema
            .as_ref()
            .map_or_else(|| "-".to_string(), |s| s.len().to_string());
        let filter = descriptor.filter.as_ref().map_or_else(
            || "-".to_string(),
            |f| format!("{} in {}", f.column, f.accepted.join(" | ")),
        );
        table.add_row(vec![
            descriptor.id.clone(),
            descriptor.locator.kind_label().to_string(),
            descriptor.locator.location(),
            columns,
            filter,
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_schema(args: &SchemaArgs) -> Result<()> {
    let registry = DatasetRegistry::embedded().context("load dataset registry")?;
    let descriptor = registry
        .get(&args.dataset_id)
        .ok_or_else(|| anyhow!("unknown dataset: {}", args.dataset_id))?;

    println!("Dataset: {}", descriptor.id);
    if !descriptor.description.is_empty() {
        println!("Description: {}", descriptor.description);
    }
    println!("Locator: {}", descriptor.locator);

    match &descriptor.schema {
        Some(schema) => {
            let mut table = Table::new();
            table.set_header(vec!["Column", "Type", "Nullable"]);
            apply_table_style(&mut table);
            for column in &schema.columns {
                table.add_row(vec![
                    column.name.clone(),
                    column.logical_type.to_string(),
                    if column.nullable { "yes" } else { "no" }.to_string(),
                ]);
            }
            println!("{table}");
        }
        None => println!("Schema: none registered"),
    }

    match &descriptor.filter {
        Some(filter) => println!(
            "Filter: {} in [{}]",
            filter.column,
            filter.accepted.join(", ")
        ),
        None => println!("Filter: none"),
    }

    let pipeline = standard_pipeline(&descriptor.id);
    let mut table = Table::new();
    table.set_header(vec!["Stage", "Rule"]);
    apply_table_style(&mut table);
    for rule in pipeline.rules_ordered() {
        table.add_row(vec![rule.stage.as_str().to_string(), rule.kind.to_string()]);
    }
    println!("Cleaning rules:");
    println!("{table}");
    Ok(())
}
