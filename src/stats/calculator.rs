//! Statistics Calculator Module
//! Builds the summary tables and chart series of a report run.

use super::pivot::{
    cumulative_share, row_share, unique_counts, unique_cross_tab, PivotTable, TOTAL,
};
use crate::data::processor::{round_to, EnrichedShipment, LastMileBucket};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// The cumulative last-mile share is scaled by 200. Its running sum includes
/// the `Total` margin, which doubles the denominator, so rows still top out
/// at 100.
pub const CUMULATIVE_SHARE_SCALE: f64 = 200.0;
pub const ROW_SHARE_SCALE: f64 = 100.0;

const DELIVERY_POINT: &str = "Delivery point";
const WAYBILLS: &str = "Waybills";

/// The six summary tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summaries {
    /// Delivery point × last-mile bucket.
    pub last_mile_volume: PivotTable<usize>,
    /// Cumulative bucket share per delivery point.
    pub last_mile_share: PivotTable<f64>,
    pub status_volume: PivotTable<usize>,
    pub hub_dwell_volume: PivotTable<usize>,
    /// Delivery point × on time / late.
    pub delivery_volume: PivotTable<usize>,
    pub delivery_share: PivotTable<f64>,
}

/// One bar or slice of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub count: usize,
    /// Percent of the series total, one decimal.
    pub share: f64,
}

/// Data behind the report charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub postal_prefixes: Vec<SeriesPoint>,
    pub in_transit_statuses: Vec<SeriesPoint>,
    pub delivery: Vec<SeriesPoint>,
}

/// Aggregations over enriched shipments.
pub struct StatsCalculator;

impl StatsCalculator {
    pub fn summarize(shipments: &[EnrichedShipment]) -> Summaries {
        let last_mile_volume = Self::last_mile_volume(shipments);
        let last_mile_share = cumulative_share(
            "Delivery percentage",
            &last_mile_volume,
            CUMULATIVE_SHARE_SCALE,
        )
        .without_columns(&[TOTAL, LastMileBucket::Open.label()]);

        let delivery_volume = Self::delivery_volume(shipments);
        let delivery_share = row_share("Delivery analysis %", &delivery_volume, ROW_SHARE_SCALE)
            .without_columns(&[TOTAL]);

        Summaries {
            last_mile_volume,
            last_mile_share,
            status_volume: Self::status_volume(shipments),
            hub_dwell_volume: Self::hub_dwell_volume(shipments),
            delivery_volume,
            delivery_share,
        }
    }

    pub fn last_mile_volume(shipments: &[EnrichedShipment]) -> PivotTable<usize> {
        unique_cross_tab(
            "Delivery volume",
            DELIVERY_POINT,
            shipments.iter().filter_map(|s| {
                let point = s.record.delivery_point.as_deref()?;
                Some((point, s.metrics.last_mile, s.record.waybill.as_str()))
            }),
            |point| point.to_string(),
            |bucket| bucket.label().to_string(),
        )
    }

    pub fn status_volume(shipments: &[EnrichedShipment]) -> PivotTable<usize> {
        unique_counts(
            "Order status",
            "Waybill status",
            WAYBILLS,
            shipments.iter().filter_map(|s| {
                let status = s.record.status.as_deref()?;
                Some((status, s.record.waybill.as_str()))
            }),
            |status| status.to_string(),
        )
    }

    pub fn hub_dwell_volume(shipments: &[EnrichedShipment]) -> PivotTable<usize> {
        unique_counts(
            "Time at hub",
            "Hub dwell",
            WAYBILLS,
            shipments
                .iter()
                .filter_map(|s| Some((s.metrics.hub_dwell?, s.record.waybill.as_str()))),
            |dwell| dwell.label(),
        )
    }

    pub fn delivery_volume(shipments: &[EnrichedShipment]) -> PivotTable<usize> {
        unique_cross_tab(
            "Delivery analysis",
            DELIVERY_POINT,
            shipments.iter().filter_map(|s| {
                let point = s.record.delivery_point.as_deref()?;
                Some((point, s.metrics.delivery, s.record.waybill.as_str()))
            }),
            |point| point.to_string(),
            |status| status.label().to_string(),
        )
    }

    pub fn chart_series(
        shipments: &[EnrichedShipment],
        in_transit_statuses: &[String],
    ) -> ChartSeries {
        let in_transit: HashSet<&str> = in_transit_statuses.iter().map(String::as_str).collect();

        ChartSeries {
            postal_prefixes: value_counts(
                shipments
                    .iter()
                    .filter_map(|s| s.record.postal_prefix.clone()),
            ),
            in_transit_statuses: value_counts(
                shipments
                    .iter()
                    .filter_map(|s| s.record.status.as_deref())
                    .filter(|status| in_transit.contains(status))
                    .map(str::to_string),
            ),
            delivery: value_counts(
                shipments
                    .iter()
                    .map(|s| s.metrics.delivery.label().to_string()),
            ),
        }
    }
}

/// Row counts per label, most frequent first, ties by label.
pub fn value_counts(labels: impl IntoIterator<Item = String>) -> Vec<SeriesPoint> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    let total: usize = counts.values().sum();

    let mut points: Vec<SeriesPoint> = counts
        .into_iter()
        .map(|(label, count)| SeriesPoint {
            label,
            count,
            share: round_to(count as f64 / total as f64 * 100.0, 1),
        })
        .collect();
    // Stable sort keeps the label order for equal counts.
    points.sort_by(|a, b| b.count.cmp(&a.count));
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::processor::{DataProcessor, DeliveryStatus, HubDwell};
    use crate::data::record::{Milestones, ShipmentRecord};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 3, day).and_then(|d| d.and_hms_opt(hour, 0, 0))
    }

    fn shipment(
        waybill: &str,
        point: Option<&str>,
        status: &str,
        milestones: Milestones,
    ) -> EnrichedShipment {
        let record = ShipmentRecord {
            waybill: waybill.to_string(),
            delivery_point: point.map(str::to_string),
            postal_code: None,
            postal_prefix: Some(if waybill < "W3" { "013" } else { "200" }.to_string()),
            city: None,
            state: None,
            customer: None,
            status: Some(status.to_string()),
            milestones,
        };
        DataProcessor::enrich(vec![record]).remove(0)
    }

    fn sample() -> Vec<EnrichedShipment> {
        vec![
            // Same-day last mile, on time, 6h at hub.
            shipment(
                "W1",
                Some("GRU"),
                "Entregue",
                Milestones {
                    hub_inbound: at(1, 2),
                    hub_outbound: at(1, 8),
                    point_inbound: at(2, 8),
                    signed: at(2, 15),
                    scheduled_deadline: at(3, 0),
                    ..Milestones::default()
                },
            ),
            // Two-day last mile, late.
            shipment(
                "W2",
                Some("GRU"),
                "Entregue",
                Milestones {
                    point_inbound: at(2, 8),
                    signed: at(4, 9),
                    scheduled_deadline: at(3, 0),
                    ..Milestones::default()
                },
            ),
            // Still open, not processed at hub.
            shipment(
                "W3",
                Some("GIG"),
                "Coletados",
                Milestones {
                    point_inbound: at(2, 8),
                    ..Milestones::default()
                },
            ),
            // No delivery point: only in the status/hub tables.
            shipment("W4", None, "A recolher", Milestones::default()),
        ]
    }

    #[test]
    fn test_last_mile_volume_and_share() {
        let summaries = StatsCalculator::summarize(&sample());

        let volume = &summaries.last_mile_volume;
        assert_eq!(volume.columns, vec!["D0", "D1", "Open", "Total"]);
        assert_eq!(volume.get("GRU", "D0"), Some(1));
        assert_eq!(volume.get("GRU", "D1"), Some(1));
        assert_eq!(volume.get("GIG", "Open"), Some(1));
        assert_eq!(volume.get("Total", "Total"), Some(3));
        assert!(volume.row("W4").is_none());

        let share = &summaries.last_mile_share;
        assert_eq!(share.columns, vec!["D0", "D1"]);
        // GRU: 1,1,-,2 -> running 1,2,-,4; ×200/4.
        assert_eq!(share.get("GRU", "D0"), Some(50.0));
        assert_eq!(share.get("GRU", "D1"), Some(100.0));
        assert_eq!(share.get("GIG", "D0"), None);
    }

    #[test]
    fn test_status_and_hub_tables() {
        let summaries = StatsCalculator::summarize(&sample());

        let status = &summaries.status_volume;
        assert_eq!(status.get("Entregue", WAYBILLS), Some(2));
        assert_eq!(status.get("A recolher", WAYBILLS), Some(1));
        assert_eq!(status.get(TOTAL, WAYBILLS), Some(4));

        let hub = &summaries.hub_dwell_volume;
        let labels: Vec<_> = hub.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["6.0 hrs", "Not processed", "Total"]);
        assert_eq!(hub.get("Not processed", WAYBILLS), Some(3));
        assert_eq!(HubDwell::Hours(6).label(), "6.0 hrs");
    }

    #[test]
    fn test_delivery_tables() {
        let summaries = StatsCalculator::summarize(&sample());

        let volume = &summaries.delivery_volume;
        assert_eq!(volume.columns, vec!["Late", "On time", "Total"]);
        assert_eq!(volume.get("GRU", "Late"), Some(1));
        assert_eq!(volume.get("GRU", "On time"), Some(1));
        // Open shipment with no signature counts as on time.
        assert_eq!(volume.get("GIG", "On time"), Some(1));

        let share = &summaries.delivery_share;
        assert_eq!(share.columns, vec!["Late", "On time"]);
        assert_eq!(share.get("GRU", "Late"), Some(50.0));
        assert_eq!(share.get("GIG", "On time"), Some(100.0));
        assert_eq!(share.get("Total", "Late"), Some(33.3));
    }

    #[test]
    fn test_chart_series() {
        let statuses = vec!["A recolher".to_string(), "Coletados".to_string()];
        let series = StatsCalculator::chart_series(&sample(), &statuses);

        assert_eq!(series.postal_prefixes[0].label, "013");
        assert_eq!(series.postal_prefixes[0].count, 2);
        assert_eq!(series.postal_prefixes[0].share, 50.0);

        let labels: Vec<_> = series
            .in_transit_statuses
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(labels, vec!["A recolher", "Coletados"]);

        assert_eq!(series.delivery[0].label, DeliveryStatus::OnTime.label());
        assert_eq!(series.delivery[0].count, 3);
        assert_eq!(series.delivery[1].share, 25.0);
    }

    #[test]
    fn test_value_counts_order() {
        let points = value_counts(
            ["b", "a", "b", "c", "a", "b"].iter().map(|s| s.to_string()),
        );
        let labels: Vec<_> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
        assert_eq!(points[0].share, 50.0);
        assert!(value_counts(Vec::new()).is_empty());
    }
}
