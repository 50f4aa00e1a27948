//! Shipment rows
//! Typed views over the joined frame: raw categorical/timestamp strings
//! first, parsed milestones once the filters have run.

use super::loader::has_column;
use crate::settings::ColumnMap;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Row {row} has no waybill number")]
    MissingWaybill { row: usize },
    #[error("Row {row}: cannot parse {value:?} in column {column:?} as a timestamp")]
    TimestampParse {
        row: usize,
        column: String,
        value: String,
    },
}

/// Width the postal code is zero-padded to.
pub const POSTAL_CODE_WIDTH: usize = 8;
/// Length of the postal-code prefix used for grouping.
pub const POSTAL_PREFIX_LEN: usize = 3;

/// One joined row, before timestamp parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRow {
    pub row: usize,
    pub waybill: String,
    pub delivery_point: Option<String>,
    /// Zero-padded destination postal code.
    pub postal_code: Option<String>,
    pub postal_prefix: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub customer: Option<String>,
    pub status: Option<String>,
    pub timestamps: [Option<String>; 13],
}

/// The 13 lifecycle instants of a shipment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Milestones {
    pub latest_status: Option<NaiveDateTime>,
    pub order_created: Option<NaiveDateTime>,
    pub dispatched: Option<NaiveDateTime>,
    pub picked_up: Option<NaiveDateTime>,
    pub hub_inbound: Option<NaiveDateTime>,
    pub hub_loaded: Option<NaiveDateTime>,
    pub unloaded: Option<NaiveDateTime>,
    pub point_inbound: Option<NaiveDateTime>,
    pub point_delivery: Option<NaiveDateTime>,
    pub signed: Option<NaiveDateTime>,
    pub first_deadline: Option<NaiveDateTime>,
    pub scheduled_deadline: Option<NaiveDateTime>,
    pub hub_outbound: Option<NaiveDateTime>,
}

impl Milestones {
    /// Build from values ordered as [`ColumnMap::timestamp_columns`].
    fn from_array(v: [Option<NaiveDateTime>; 13]) -> Self {
        Self {
            latest_status: v[0],
            order_created: v[1],
            dispatched: v[2],
            picked_up: v[3],
            hub_inbound: v[4],
            hub_loaded: v[5],
            unloaded: v[6],
            point_inbound: v[7],
            point_delivery: v[8],
            signed: v[9],
            first_deadline: v[10],
            scheduled_deadline: v[11],
            hub_outbound: v[12],
        }
    }
}

/// A shipment with parsed milestones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentRecord {
    pub waybill: String,
    pub delivery_point: Option<String>,
    /// Zero-padded destination postal code.
    pub postal_code: Option<String>,
    pub postal_prefix: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub customer: Option<String>,
    pub status: Option<String>,
    pub milestones: Milestones,
}

/// Left-pad with zeros to eight characters. A missing code pads from the
/// empty string.
pub fn padded_postal_code(code: Option<&str>) -> String {
    let code = code.unwrap_or("");
    let width = code.chars().count();
    if width < POSTAL_CODE_WIDTH {
        format!("{}{}", "0".repeat(POSTAL_CODE_WIDTH - width), code)
    } else {
        code.to_string()
    }
}

/// First three characters of the padded code, so always exactly three.
pub fn postal_prefix(code: Option<&str>) -> String {
    padded_postal_code(code)
        .chars()
        .take(POSTAL_PREFIX_LEN)
        .collect()
}

/// Read a column as strings, values kept verbatim; empty cells become `None`.
fn string_column(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}

/// Like [`string_column`], but a column the frame does not carry yields `None`.
fn optional_column(df: &DataFrame, name: &str) -> PolarsResult<Option<Vec<Option<String>>>> {
    if has_column(df, name) {
        string_column(df, name).map(Some)
    } else {
        Ok(None)
    }
}

/// Extract typed rows from the joined frame.
pub fn extract_rows(df: &DataFrame, columns: &ColumnMap) -> Result<Vec<ShipmentRow>, RecordError> {
    let waybills = string_column(df, &columns.waybill)?;
    let mut delivery_points = string_column(df, &columns.delivery_point)?.into_iter();
    let mut states = string_column(df, &columns.state)?.into_iter();
    let mut customers = string_column(df, &columns.customer)?.into_iter();
    let mut statuses = string_column(df, &columns.status)?.into_iter();
    let postal_codes = optional_column(df, &columns.postal_code)?;
    let cities = optional_column(df, &columns.city)?;

    let mut timestamps = columns
        .timestamp_columns()
        .iter()
        .map(|name| string_column(df, name).map(Vec::into_iter))
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(df.height());
    for (row, waybill) in waybills.into_iter().enumerate() {
        let waybill = waybill.ok_or(RecordError::MissingWaybill { row })?;
        let stamps: [Option<String>; 13] =
            std::array::from_fn(|i| timestamps[i].next().flatten());
        let postal_code = postal_codes
            .as_ref()
            .map(|codes| padded_postal_code(codes[row].as_deref()));

        rows.push(ShipmentRow {
            row,
            waybill,
            delivery_point: delivery_points.next().flatten(),
            postal_prefix: postal_code.as_deref().map(|c| postal_prefix(Some(c))),
            postal_code,
            city: cities.as_ref().and_then(|c| c[row].clone()),
            state: states.next().flatten(),
            customer: customers.next().flatten(),
            status: statuses.next().flatten(),
            timestamps: stamps,
        });
    }
    Ok(rows)
}

/// Parses timestamp strings in the formats the exports use.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampParser {
    day_first: bool,
}

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

impl TimestampParser {
    pub fn new(day_first: bool) -> Self {
        Self { day_first }
    }

    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();

        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
            return Some(dt.naive_local());
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
                return Some(dt);
            }
        }

        let (slash_datetime, slash_minutes, slash_date) = if self.day_first {
            ("%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M", "%d/%m/%Y")
        } else {
            ("%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M", "%m/%d/%Y")
        };
        for format in [slash_datetime, slash_minutes] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
                return Some(dt);
            }
        }
        for format in ["%Y-%m-%d", slash_date] {
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return date.and_hms_opt(0, 0, 0);
            }
        }
        None
    }
}

impl ShipmentRow {
    /// Parse the raw timestamps; any unparseable value fails the row.
    pub fn parse(
        self,
        parser: &TimestampParser,
        columns: &ColumnMap,
    ) -> Result<ShipmentRecord, RecordError> {
        let names = columns.timestamp_columns();
        let mut parsed = [None; 13];
        for (i, raw) in self.timestamps.iter().enumerate() {
            if let Some(raw) = raw {
                parsed[i] = Some(parser.parse(raw).ok_or_else(|| RecordError::TimestampParse {
                    row: self.row,
                    column: names[i].to_string(),
                    value: raw.clone(),
                })?);
            }
        }

        Ok(ShipmentRecord {
            waybill: self.waybill,
            delivery_point: self.delivery_point,
            postal_code: self.postal_code,
            postal_prefix: self.postal_prefix,
            city: self.city,
            state: self.state,
            customer: self.customer,
            status: self.status,
            milestones: Milestones::from_array(parsed),
        })
    }
}
