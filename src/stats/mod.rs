//! Stats module - pivot summaries and chart series

mod calculator;
mod pivot;

pub use calculator::{ChartSeries, SeriesPoint, StatsCalculator, Summaries};
pub use pivot::{PivotRow, PivotTable, TOTAL};
