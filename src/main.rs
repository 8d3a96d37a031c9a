use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use partner_ledger::config::{Config, MappingConfig, DEFAULT_CONFIG_FILE};
use partner_ledger::export::{remove_stale_file, write_bronze_file, write_silver_file};
use partner_ledger::report::{kpis, monthly_totals, RunReport, SourceSummary};
use partner_ledger::temporal::iso_timestamp;
use partner_ledger::{logging, pipeline, CsvSourceReader, SourceBatch, SystemClock};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, info_span};
use uuid::Uuid;

/// Normalize transaction CSVs into bronze and aggregate them into monthly partner totals
#[derive(Parser, Debug)]
#[command(name = "partner-ledger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source CSV files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Configuration file (defaults to ./partner-ledger.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source column holding the transaction date
    #[arg(long)]
    date_col: Option<String>,

    /// Source column holding the partner name
    #[arg(long)]
    partner_col: Option<String>,

    /// Source column holding the amount
    #[arg(long)]
    amount_col: Option<String>,

    /// Output directory for bronze.csv / silver.csv
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Config::load(Path::new(DEFAULT_CONFIG_FILE))?,
        None => Config::default(),
    };

    // Flags override both [mapping] and [sources."..."]
    let mut config = config.with_flags(MappingConfig {
        date: cli.date_col.clone(),
        partner: cli.partner_col.clone(),
        amount: cli.amount_col.clone(),
    });

    if let Some(dir) = &cli.out_dir {
        config.output.dir = dir.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = load_config(&cli)?;
    let run_id = Uuid::new_v4();
    let started_at = iso_timestamp(Utc::now());
    let span = info_span!("run", %run_id);
    let _enter = span.enter();

    // 1. Read sources
    let mut reader = CsvSourceReader::new();
    if let Some(delimiter) = config.delimiter()? {
        reader = reader.with_delimiter(delimiter);
    }

    let mut batches = Vec::new();
    let mut summaries = Vec::new();
    for path in &cli.inputs {
        let raw = reader.read(path)?;
        info!(source = %raw.name, sha256 = %raw.sha256, rows = raw.table.height(), "loaded source");

        summaries.push(SourceSummary {
            name: raw.name.clone(),
            rows: raw.table.height(),
            sha256: Some(raw.sha256.clone()),
            encoding: Some(raw.encoding.name().to_string()),
        });
        let mapping = config.mapping_for(&raw.name);
        batches.push(SourceBatch::from_raw(raw, mapping));
    }

    // 2. Run the pipeline
    let outcome = pipeline::run(&batches, &SystemClock)?;

    // 3. Exports
    fs::create_dir_all(&config.output.dir).with_context(|| {
        format!("Failed to create output dir: {}", config.output.dir.display())
    })?;
    write_bronze_file(&config.output.dir.join(&config.output.bronze_file), &outcome.bronze)?;
    let silver_path = config.output.dir.join(&config.output.silver_file);
    match &outcome.silver {
        Some(silver) => write_silver_file(&silver_path, silver)?,
        None => remove_stale_file(&silver_path)?,
    }

    // 4. Report
    let report = RunReport {
        run_id,
        started_at,
        sources: summaries,
        bronze_rows: outcome.bronze.len(),
        violations: outcome.violations.clone(),
        silver_rows: outcome.silver.as_ref().map(|s| s.len()),
        kpis: outcome.silver.as_ref().map(|s| kpis(&outcome.bronze, s)),
        monthly_totals: outcome.silver.as_deref().map(monthly_totals).unwrap_or_default(),
    };

    let report_path = cli
        .report
        .clone()
        .or_else(|| config.output.report_file.as_ref().map(|f| config.output.dir.join(f)));
    if let Some(path) = report_path {
        fs::write(&path, report.to_json()?)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!(path = %path.display(), "wrote run report");
    }

    println!("{}", report.summary());
    if !report.passed() {
        eprintln!("❌ Validation failed:");
        for v in &report.violations {
            eprintln!("   - {}", v);
        }
        std::process::exit(2);
    }

    println!("✅ Validation OK");
    Ok(())
}
