//! Daily sales generator - produces one processing day of chain sales
//!
//! Usage:
//!   sales-generator --config config/default.toml --date 2024-01-01

use anyhow::Context;
use chrono::{Datelike, Local, NaiveDate, Weekday};
use clap::Parser;
use sales_generator::infra::logging::init_logging;
use sales_generator::infra::{Config, Metrics, OutputFormat};
use sales_generator::io::{FileSalesWriter, SalesSink};
use sales_generator::services::{generate_day, Catalog};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Daily sales generator for a retail chain
#[derive(Parser, Debug)]
#[command(name = "sales-generator", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/default.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Processing date (YYYY-MM-DD); defaults to yesterday
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Override the output directory
    #[arg(short, long)]
    output: Option<String>,

    /// Override the output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Also write the receipt and receipt_line tables
    #[arg(long)]
    tables: bool,

    /// Generate even if the processing date is a day off
    #[arg(long)]
    force: bool,

    /// Generate without writing any files
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let started = Instant::now();

    let config_path = args.config.clone().unwrap_or_else(|| Config::resolve_config_path(&[]));
    let mut config = Config::load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    if args.output.is_some() || args.format.is_some() {
        let path = args.output.clone().unwrap_or_else(|| config.output_path().to_string());
        let format = args.format.unwrap_or_else(|| config.output_format());
        config = config.with_output(&path, format);
    }
    if args.tables {
        config = config.with_output_tables(true);
    }

    init_logging(&config);
    info!("sales-generator starting");
    if config.uses_defaults() {
        warn!(config_file = %config_path, "config_file_missing_using_defaults");
    }

    let processing_date = match args.date {
        Some(date) => date,
        None => Local::now()
            .date_naive()
            .pred_opt()
            .context("Failed to compute yesterday's date")?,
    };

    info!(
        config_file = %config.config_file(),
        processing_date = %processing_date,
        stores = %config.stores().len(),
        catalog_size = %config.goods().catalog_size(),
        output_path = %config.output_path(),
        output_format = %config.output_format().extension(),
        output_tables = %config.output_tables(),
        "config_loaded"
    );

    if config.skip_sundays() && processing_date.weekday() == Weekday::Sun {
        if args.force {
            warn!(processing_date = %processing_date, "day_off_forced");
        } else {
            info!(processing_date = %processing_date, "day_off");
            return Ok(());
        }
    }

    let config = Arc::new(config);
    let catalog = Arc::new(
        Catalog::build(config.goods(), config.catalog_seed()).context("Failed to build catalog")?,
    );
    let metrics = Arc::new(Metrics::new());

    let day = generate_day(config.clone(), catalog, metrics.clone(), processing_date)
        .await
        .with_context(|| format!("Sales generation failed for {}", processing_date))?;

    if args.dry_run {
        info!(rows = %day.rows.len(), "dry_run_no_output");
    } else {
        let writer = FileSalesWriter::new(config.output_path(), config.output_format())
            .with_tables(config.output_tables());
        writer
            .write_day(Arc::new(day))
            .await
            .with_context(|| format!("Failed to store sales for {}", processing_date))?;
    }

    metrics.report().log();
    info!(
        processing_date = %processing_date,
        elapsed_secs = format!("{:.2}", started.elapsed().as_secs_f64()),
        "sales-generator completed"
    );
    Ok(())
}
