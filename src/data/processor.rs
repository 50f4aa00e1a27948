//! Data Processor Module
//! Derives per-shipment timing and status metrics from the milestones.

use super::record::ShipmentRecord;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Elapsed-day bucket of the last-mile leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LastMileBucket {
    D0,
    D1,
    D2,
    #[serde(rename = "Above D2")]
    AboveD2,
    Open,
}

impl LastMileBucket {
    /// Classify a whole-day count, `None` when the leg has not finished.
    ///
    /// The D1 arm takes every count of one day or more, so D2 and AboveD2
    /// are never produced. Left unchanged until the report owners confirm
    /// the intended cut-offs.
    pub fn from_days(days: Option<i64>) -> Self {
        match days {
            None => LastMileBucket::Open,
            Some(d) if d < 1 => LastMileBucket::D0,
            Some(d) if d >= 1 => LastMileBucket::D1,
            Some(d) if d <= 2 => LastMileBucket::D2,
            Some(_) => LastMileBucket::AboveD2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LastMileBucket::D0 => "D0",
            LastMileBucket::D1 => "D1",
            LastMileBucket::D2 => "D2",
            LastMileBucket::AboveD2 => "Above D2",
            LastMileBucket::Open => "Open",
        }
    }
}

impl fmt::Display for LastMileBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Delivery against the scheduled deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DeliveryStatus {
    Late,
    #[serde(rename = "On time")]
    OnTime,
}

impl DeliveryStatus {
    /// Negative whole days of slack is late. A missing endpoint counts as
    /// on time.
    pub fn from_days(days: Option<i64>) -> Self {
        match days {
            Some(d) if d < 0 => DeliveryStatus::Late,
            _ => DeliveryStatus::OnTime,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryStatus::Late => "Late",
            DeliveryStatus::OnTime => "On time",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Time spent at the transfer hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HubDwell {
    Hours(i64),
    /// The shipment has not left the hub.
    NotProcessed,
}

impl HubDwell {
    pub fn label(&self) -> String {
        match self {
            HubDwell::Hours(h) => format!("{}.0 hrs", h),
            HubDwell::NotProcessed => NOT_PROCESSED.to_string(),
        }
    }
}

pub const NOT_PROCESSED: &str = "Not processed";

/// Derived columns of one shipment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    /// ISO week of the scheduled deadline.
    pub due_week: Option<u32>,
    pub dispatch_date: Option<NaiveDate>,
    pub pickup_date: Option<NaiveDate>,
    pub pickup_lead_hours: Option<f64>,
    pub hub_received: bool,
    pub transfer_start: Option<NaiveDate>,
    /// `None` when the hub outbound exists without a hub inbound.
    pub hub_dwell: Option<HubDwell>,
    pub last_mile: LastMileBucket,
    pub inbound_leg_hours: Option<f64>,
    pub hub_leg_hours: Option<f64>,
    pub transfer_leg_hours: Option<f64>,
    pub last_mile_leg_hours: Option<f64>,
    pub inbound_plus_last_mile_hours: Option<f64>,
    pub delivery: DeliveryStatus,
}

/// A shipment with its derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedShipment {
    #[serde(flatten)]
    pub record: ShipmentRecord,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}

/// Round half to even at `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Hours from `start` to `end`; undefined if either is missing.
pub fn hours_between(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Option<f64> {
    let delta = end?.signed_duration_since(start?);
    Some(delta.num_milliseconds() as f64 / MILLIS_PER_HOUR)
}

/// Whole days from `start` to `end`, floored.
pub fn days_between(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Option<i64> {
    let delta = end?.signed_duration_since(start?);
    Some(delta.num_milliseconds().div_euclid(MILLIS_PER_DAY))
}

/// Computes derived metrics.
pub struct DataProcessor;

impl DataProcessor {
    pub fn derive(record: &ShipmentRecord) -> DerivedMetrics {
        let m = &record.milestones;
        let leg = |start, end| hours_between(start, end).map(|h| round_to(h, 1));

        let hub_dwell = match m.hub_outbound {
            None => Some(HubDwell::NotProcessed),
            Some(_) => hours_between(m.hub_inbound, m.hub_outbound)
                .map(|h| HubDwell::Hours(h.round_ties_even() as i64)),
        };

        let inbound_leg_hours = leg(m.dispatched, m.hub_inbound);
        let last_mile_leg_hours = leg(m.point_inbound, m.signed);
        let inbound_plus_last_mile_hours = match (inbound_leg_hours, last_mile_leg_hours) {
            (Some(a), Some(b)) => Some(round_to(a + b, 1)),
            _ => None,
        };

        DerivedMetrics {
            due_week: m.scheduled_deadline.map(|d| d.date().iso_week().week()),
            dispatch_date: m.dispatched.map(|d| d.date()),
            pickup_date: m.picked_up.map(|d| d.date()),
            pickup_lead_hours: hours_between(m.dispatched, m.picked_up),
            hub_received: m.hub_inbound.is_some(),
            transfer_start: m.hub_loaded.map(|d| d.date()),
            hub_dwell,
            last_mile: LastMileBucket::from_days(days_between(m.point_inbound, m.signed)),
            inbound_leg_hours,
            hub_leg_hours: leg(m.hub_inbound, m.hub_loaded),
            transfer_leg_hours: leg(m.hub_loaded, m.point_inbound),
            last_mile_leg_hours,
            inbound_plus_last_mile_hours,
            delivery: DeliveryStatus::from_days(days_between(m.signed, m.scheduled_deadline)),
        }
    }

    pub fn enrich(records: Vec<ShipmentRecord>) -> Vec<EnrichedShipment> {
        records
            .into_iter()
            .map(|record| {
                let metrics = Self::derive(&record);
                EnrichedShipment { record, metrics }
            })
            .collect()
    }
}
