//! Last-mile performance report.
//!
//! Joins a shipment tracking export with an order export, derives per-shipment
//! timing metrics and summarises them into pivot tables and chart series.

pub mod data;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod settings;
pub mod stats;
