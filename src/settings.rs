//! Settings Module
//! Command line arguments and the JSON report configuration.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("CSV separator must be a single ASCII character, got {0:?}")]
    Separator(char),
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text tables
    #[default]
    Table,
    /// One JSON document
    Json,
}

/// Last-mile performance report from tracking and order exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "lastmile-report",
    about = "Last-mile performance report from tracking and order CSV exports",
    version
)]
pub struct Settings {
    /// Punctuality monitoring export (mandatory)
    #[arg(long, short = 't')]
    pub tracking: PathBuf,

    /// Logistics order export carrying destination postal code and city
    #[arg(long, short = 'o')]
    pub orders: Option<PathBuf>,

    /// Keep only these postal-code prefixes (repeatable)
    #[arg(long = "postal-prefix")]
    pub postal_prefixes: Vec<String>,

    /// Keep only these delivery points (repeatable)
    #[arg(long = "delivery-point")]
    pub delivery_points: Vec<String>,

    /// Keep only these states (repeatable)
    #[arg(long = "state")]
    pub states: Vec<String>,

    /// Keep only these customers (repeatable)
    #[arg(long = "customer")]
    pub customers: Vec<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Append the derived record set as CSV (table format only)
    #[arg(long)]
    pub records: bool,

    /// JSON report configuration (column names, separator, statuses)
    #[arg(long, env = "LASTMILE_REPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: String,
}

impl Settings {
    /// Reject flag combinations clap cannot express on its own.
    pub fn validate(&self) -> Result<(), clap::Error> {
        if self.records && self.format == OutputFormat::Json {
            return Err(Settings::command().error(
                ErrorKind::ArgumentConflict,
                "--records cannot be combined with --format json; the CSV would follow the JSON document on stdout",
            ));
        }
        Ok(())
    }
}

/// Column headers of the two exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub waybill: String,
    pub postal_code: String,
    pub city: String,
    pub delivery_point: String,
    pub state: String,
    pub customer: String,
    pub status: String,
    pub latest_status: String,
    pub order_created: String,
    pub dispatched: String,
    pub picked_up: String,
    pub hub_inbound: String,
    pub hub_loaded: String,
    pub unloaded: String,
    pub point_inbound: String,
    pub point_delivery: String,
    pub signed: String,
    pub first_deadline: String,
    pub scheduled_deadline: String,
    pub hub_outbound: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            waybill: "Número do Waybill".to_string(),
            postal_code: "CEP do destinatário".to_string(),
            city: "Cidade do destinatário".to_string(),
            delivery_point: "Ponto previsto de entrega".to_string(),
            state: "estado".to_string(),
            customer: "Nome do cliente".to_string(),
            status: "Status do Waybill".to_string(),
            latest_status: "Hora do status mais recente".to_string(),
            order_created: "Tempo de criação de pedido".to_string(),
            dispatched: "Hora de Saída da Encomenda".to_string(),
            picked_up: "Tempo de recolha".to_string(),
            hub_inbound: "tempo de inbound em armazém de transferência".to_string(),
            hub_loaded: "tempo de carregamento".to_string(),
            unloaded: "Tempo de descarregamento".to_string(),
            point_inbound: "tempo de inbound no ponto".to_string(),
            point_delivery: "Horário de Entrega do Ponto".to_string(),
            signed: "Tempo de assinatura".to_string(),
            first_deadline: "Primeiro prazo de entrega".to_string(),
            scheduled_deadline: "Horário em que deve ser entregue".to_string(),
            // Two spaces before "em", as exported.
            hub_outbound: "tempo de outbound  em armazém de transferência".to_string(),
        }
    }
}

impl ColumnMap {
    /// The 13 milestone timestamp columns, in record field order.
    pub fn timestamp_columns(&self) -> [&str; 13] {
        [
            self.latest_status.as_str(),
            self.order_created.as_str(),
            self.dispatched.as_str(),
            self.picked_up.as_str(),
            self.hub_inbound.as_str(),
            self.hub_loaded.as_str(),
            self.unloaded.as_str(),
            self.point_inbound.as_str(),
            self.point_delivery.as_str(),
            self.signed.as_str(),
            self.first_deadline.as_str(),
            self.scheduled_deadline.as_str(),
            self.hub_outbound.as_str(),
        ]
    }

    /// Columns the tracking export must carry.
    pub fn required_tracking_columns(&self) -> Vec<&str> {
        let mut columns = vec![
            self.waybill.as_str(),
            self.delivery_point.as_str(),
            self.state.as_str(),
            self.customer.as_str(),
            self.status.as_str(),
        ];
        columns.extend(self.timestamp_columns());
        columns
    }

    /// Columns taken from the order export.
    pub fn destination_columns(&self) -> [&str; 2] {
        [self.postal_code.as_str(), self.city.as_str()]
    }
}

/// Report configuration, loaded from JSON. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub columns: ColumnMap,
    pub separator: char,
    /// Read `a/b/yyyy` dates as day/month instead of month/day.
    pub day_first: bool,
    /// Statuses shown in the in-transit distribution.
    pub in_transit_statuses: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            separator: ',',
            day_first: false,
            in_transit_statuses: vec![
                "A recolher".to_string(),
                "Transbordo para armazenamento".to_string(),
                "Coletados".to_string(),
                "Objeto colatdo em LM".to_string(),
            ],
        }
    }
}

impl ReportConfig {
    /// Load from `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.separator_byte()?;
        Ok(config)
    }

    /// Separator as the byte polars expects.
    pub fn separator_byte(&self) -> Result<u8, SettingsError> {
        if self.separator.is_ascii() {
            Ok(self.separator as u8)
        } else {
            Err(SettingsError::Separator(self.separator))
        }
    }
}
