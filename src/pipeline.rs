//! Report pipeline
//! Load, join, filter, derive and aggregate one pair of exports.

use crate::data::{
    joiner, record, DataLoader, DataProcessor, EnrichedShipment, LoaderError, RecordError,
    RowFilter, TimestampParser,
};
use crate::settings::{ReportConfig, SettingsError};
use crate::stats::{ChartSeries, StatsCalculator, Summaries};
use polars::prelude::PolarsError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("Failed to join exports: {0}")]
    Join(#[from] PolarsError),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub tracking: PathBuf,
    pub orders: Option<PathBuf>,
    pub filter: RowFilter,
    pub config: ReportConfig,
}

/// Output of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub rows_loaded: usize,
    pub rows_reported: usize,
    pub summaries: Summaries,
    pub charts: ChartSeries,
    #[serde(skip)]
    pub shipments: Vec<EnrichedShipment>,
}

pub fn run(input: &PipelineInput) -> Result<Report, PipelineError> {
    let columns = &input.config.columns;
    let loader = DataLoader::new(input.config.separator_byte()?);

    let tracking = loader.load_tracking(&input.tracking, columns)?;
    let rows_loaded = tracking.height();

    let joined = match &input.orders {
        Some(path) => {
            let orders = loader.load_orders(path, columns)?;
            joiner::left_join(&tracking, &orders, columns)?
        }
        None => {
            info!("No order export given; destination columns come from the tracking export only");
            tracking
        }
    };

    let rows = record::extract_rows(&joined, columns)?;
    if rows.first().is_some_and(|r| r.postal_prefix.is_none()) {
        warn!(
            "Column {:?} not found; postal-prefix grouping is unavailable",
            columns.postal_code
        );
    }

    let rows = input.filter.apply(rows);
    if !input.filter.is_empty() {
        info!("Filters kept {} of {} rows", rows.len(), joined.height());
    }

    let parser = TimestampParser::new(input.config.day_first);
    let records = rows
        .into_iter()
        .map(|row| row.parse(&parser, columns))
        .collect::<Result<Vec<_>, _>>()?;

    let shipments = DataProcessor::enrich(records);
    let summaries = StatsCalculator::summarize(&shipments);
    let charts = StatsCalculator::chart_series(&shipments, &input.config.in_transit_statuses);
    info!("Built summaries over {} shipments", shipments.len());

    Ok(Report {
        rows_loaded,
        rows_reported: shipments.len(),
        summaries,
        charts,
        shipments,
    })
}
