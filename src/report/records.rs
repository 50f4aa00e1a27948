//! Enriched record export
//! Builds a Polars frame of the shipments and their derived columns and
//! writes it as CSV.

use crate::data::processor::{EnrichedShipment, NOT_PROCESSED};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::io::Write;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn dates(values: impl Iterator<Item = Option<NaiveDate>>) -> Vec<Option<String>> {
    values.map(|d| d.map(|d| d.to_string())).collect()
}

fn datetimes(values: impl Iterator<Item = Option<NaiveDateTime>>) -> Vec<Option<String>> {
    values
        .map(|d| d.map(|d| d.format(DATETIME_FORMAT).to_string()))
        .collect()
}

/// One row per shipment, input columns first, derived columns after.
pub fn records_frame(shipments: &[EnrichedShipment]) -> PolarsResult<DataFrame> {
    let text = |f: fn(&EnrichedShipment) -> Option<String>| -> Vec<Option<String>> {
        shipments.iter().map(f).collect()
    };
    let hours = |f: fn(&EnrichedShipment) -> Option<f64>| -> Vec<Option<f64>> {
        shipments.iter().map(f).collect()
    };
    let stamp = |f: fn(&EnrichedShipment) -> Option<NaiveDateTime>| {
        datetimes(shipments.iter().map(f))
    };

    DataFrame::new(vec![
        Column::new(
            "waybill".into(),
            shipments.iter().map(|s| s.record.waybill.clone()).collect::<Vec<_>>(),
        ),
        Column::new("delivery_point".into(), text(|s| s.record.delivery_point.clone())),
        Column::new("postal_code".into(), text(|s| s.record.postal_code.clone())),
        Column::new("postal_prefix".into(), text(|s| s.record.postal_prefix.clone())),
        Column::new("city".into(), text(|s| s.record.city.clone())),
        Column::new("state".into(), text(|s| s.record.state.clone())),
        Column::new("customer".into(), text(|s| s.record.customer.clone())),
        Column::new("status".into(), text(|s| s.record.status.clone())),
        Column::new("latest_status".into(), stamp(|s| s.record.milestones.latest_status)),
        Column::new("order_created".into(), stamp(|s| s.record.milestones.order_created)),
        Column::new("dispatched".into(), stamp(|s| s.record.milestones.dispatched)),
        Column::new("picked_up".into(), stamp(|s| s.record.milestones.picked_up)),
        Column::new("hub_inbound".into(), stamp(|s| s.record.milestones.hub_inbound)),
        Column::new("hub_loaded".into(), stamp(|s| s.record.milestones.hub_loaded)),
        Column::new("unloaded".into(), stamp(|s| s.record.milestones.unloaded)),
        Column::new("point_inbound".into(), stamp(|s| s.record.milestones.point_inbound)),
        Column::new(
            "point_delivery".into(),
            stamp(|s| s.record.milestones.point_delivery),
        ),
        Column::new("signed".into(), stamp(|s| s.record.milestones.signed)),
        Column::new(
            "first_deadline".into(),
            stamp(|s| s.record.milestones.first_deadline),
        ),
        Column::new(
            "scheduled_deadline".into(),
            stamp(|s| s.record.milestones.scheduled_deadline),
        ),
        Column::new("hub_outbound".into(), stamp(|s| s.record.milestones.hub_outbound)),
        Column::new(
            "due_week".into(),
            shipments.iter().map(|s| s.metrics.due_week).collect::<Vec<_>>(),
        ),
        Column::new(
            "dispatch_date".into(),
            dates(shipments.iter().map(|s| s.metrics.dispatch_date)),
        ),
        Column::new(
            "pickup_date".into(),
            dates(shipments.iter().map(|s| s.metrics.pickup_date)),
        ),
        Column::new("pickup_lead_hours".into(), hours(|s| s.metrics.pickup_lead_hours)),
        Column::new(
            "hub_received".into(),
            text(|s| {
                let label = if s.metrics.hub_received {
                    "Received"
                } else {
                    "Not received"
                };
                Some(label.to_string())
            }),
        ),
        Column::new(
            "transfer_start".into(),
            text(|s| {
                Some(
                    s.metrics
                        .transfer_start
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| NOT_PROCESSED.to_string()),
                )
            }),
        ),
        Column::new(
            "hub_dwell".into(),
            text(|s| s.metrics.hub_dwell.map(|d| d.label())),
        ),
        Column::new(
            "last_mile".into(),
            text(|s| Some(s.metrics.last_mile.label().to_string())),
        ),
        Column::new("inbound_leg_hours".into(), hours(|s| s.metrics.inbound_leg_hours)),
        Column::new("hub_leg_hours".into(), hours(|s| s.metrics.hub_leg_hours)),
        Column::new("transfer_leg_hours".into(), hours(|s| s.metrics.transfer_leg_hours)),
        Column::new("last_mile_leg_hours".into(), hours(|s| s.metrics.last_mile_leg_hours)),
        Column::new(
            "inbound_plus_last_mile_hours".into(),
            hours(|s| s.metrics.inbound_plus_last_mile_hours),
        ),
        Column::new(
            "delivery".into(),
            text(|s| Some(s.metrics.delivery.label().to_string())),
        ),
    ])
}

/// Write the enriched records as CSV with a header row.
pub fn write_records_csv<W: Write>(
    shipments: &[EnrichedShipment],
    writer: &mut W,
) -> PolarsResult<()> {
    let mut df = records_frame(shipments)?;
    CsvWriter::new(writer).include_header(true).finish(&mut df)
}
