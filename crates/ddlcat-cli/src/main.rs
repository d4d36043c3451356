use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

use ddlcat_core::Config;
use ddlcat_engine::{FsReader, Ingestion, Ingestor};
use ddlcat_sql::ResolveOptions;

const DEFAULT_CONFIG: &str = "ddlcat.toml";

/// ddlcat - Build a schema catalog from SQL DDL files
#[derive(Parser)]
#[command(name = "ddlcat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// DDL files, or directories to search for *.sql
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Path to config file (default: ddlcat.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Schema for unqualified names
    #[arg(short, long)]
    schema: Option<String>,

    /// Apply COMMENT ON statements
    #[arg(long)]
    comments: bool,

    /// Write the catalog JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write report.json here
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(cli.config.as_deref(), cli.verbose)?;
    let options = ResolveOptions::new(
        cli.schema.clone().unwrap_or_else(|| config.default_schema.clone()),
        cli.comments || config.extract_comments,
    );

    let files = expand_paths(&cli.paths, &config);
    if cli.verbose {
        eprintln!(
            "{} {} files (schema: {}, comments: {})",
            "Resolving".cyan(),
            files.len(),
            options.default_schema,
            options.extract_comments
        );
    }

    let ingestion = Ingestor::new(FsReader, options).ingest(&files);

    let json = serde_json::to_string_pretty(&ingestion.catalog)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("{} {}", "Catalog saved to:".green(), path.display());
        }
        None => println!("{}", json),
    }

    if let Some(path) = &cli.report {
        ingestion
            .report()
            .save_to_file(path)
            .with_context(|| format!("writing {}", path.display()))?;
        eprintln!("{} {}", "Report saved to:".green(), path.display());
    }

    print_summary(&ingestion);

    if ingestion.has_errors() {
        anyhow::bail!("{} of {} files failed", ingestion.files_failed, ingestion.files_processed);
    }
    Ok(())
}

/// Explicit config, then ./ddlcat.toml, then defaults
fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path).with_context(|| format!("loading {}", path.display()));
    }

    let default = Path::new(DEFAULT_CONFIG);
    if default.exists() {
        return Config::from_file(default).with_context(|| format!("loading {}", DEFAULT_CONFIG));
    }

    if verbose {
        eprintln!("{}", "No config file found, using defaults".yellow());
    }
    Ok(Config::default())
}

/// Files are kept as given; directories are searched for `*.sql` in name
/// order, skipping excluded paths
fn expand_paths(paths: &[PathBuf], config: &Config) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry under {}: {}", path.display(), e);
                    continue;
                }
            };

            let file = entry.path();
            if !entry.file_type().is_file() || file.extension().map_or(true, |ext| ext != "sql") {
                continue;
            }
            if config.is_excluded(&file.display().to_string()) {
                tracing::debug!("excluded {}", file.display());
                continue;
            }
            files.push(file.to_path_buf());
        }
    }

    files
}

fn print_summary(ingestion: &Ingestion) {
    let catalog = &ingestion.catalog;

    eprintln!();
    eprintln!("{}", "Catalog summary".bold());
    eprintln!("  {:<16} {}", "Tables:", catalog.tables.len());
    eprintln!("  {:<16} {}", "Enums:", catalog.enums.len());
    eprintln!("  {:<16} {}", "Functions:", catalog.functions.len());
    eprintln!("  {:<16} {}", "Composite types:", catalog.composite_types.len());
    eprintln!("  {:<16} {}", "Views:", catalog.views.len());
    eprintln!("  {:<16} {}", "Indexes:", catalog.index_count());
    eprintln!("  {:<16} {}", "Relationships:", catalog.relationship_count());
    eprintln!();

    if ingestion.files_failed == 0 {
        eprintln!("{} {} files processed", "✓".green(), ingestion.files_processed);
    } else {
        for diagnostic in ingestion.diagnostics.iter().filter(|d| d.is_error()) {
            eprintln!("  {} {}", "✗".red(), diagnostic.message);
        }
        eprintln!(
            "{} of {} files failed",
            ingestion.files_failed.to_string().red(),
            ingestion.files_processed
        );
    }
}
