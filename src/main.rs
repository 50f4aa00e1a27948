//! Last-Mile Report - shipment performance summaries from CSV exports
//!
//! Reads the punctuality monitoring export and, optionally, the logistics
//! order export, then prints the summary tables and chart series.

use anyhow::{Context, Result};
use clap::Parser;
use lastmile_report::data::RowFilter;
use lastmile_report::logging::init_logging;
use lastmile_report::pipeline::{self, PipelineInput};
use lastmile_report::report::{write_records_csv, TextRenderer};
use lastmile_report::settings::{OutputFormat, ReportConfig, Settings};
use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    let settings = Settings::parse();
    if let Err(e) = settings.validate() {
        e.exit();
    }
    init_logging(&settings.log_level);

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<()> {
    let config = ReportConfig::load(settings.config.as_deref())?;
    let input = PipelineInput {
        tracking: settings.tracking.clone(),
        orders: settings.orders.clone(),
        filter: RowFilter::new(
            &settings.postal_prefixes,
            &settings.delivery_points,
            &settings.states,
            &settings.customers,
        ),
        config,
    };

    tracing::info!("Last-Mile Report v{} starting", env!("CARGO_PKG_VERSION"));
    let report = pipeline::run(&input)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match settings.format {
        OutputFormat::Table => {
            write!(out, "{}", TextRenderer::render(&report.summaries, &report.charts))?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
    }

    if settings.records {
        write_records_csv(&report.shipments, &mut out).context("Failed to write records")?;
    }
    out.flush()?;
    Ok(())
}
