//! Row filters on the categorical columns.

use super::record::ShipmentRow;
use std::collections::HashSet;

/// Multi-value filters. An empty set keeps every row; a non-empty set keeps
/// rows whose value is in the set, and a missing value never matches.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub postal_prefixes: HashSet<String>,
    pub delivery_points: HashSet<String>,
    pub states: HashSet<String>,
    pub customers: HashSet<String>,
}

fn keeps(allowed: &HashSet<String>, value: Option<&str>) -> bool {
    allowed.is_empty() || value.is_some_and(|v| allowed.contains(v))
}

impl RowFilter {
    pub fn new(
        postal_prefixes: &[String],
        delivery_points: &[String],
        states: &[String],
        customers: &[String],
    ) -> Self {
        let set = |values: &[String]| values.iter().cloned().collect::<HashSet<_>>();
        Self {
            postal_prefixes: set(postal_prefixes),
            delivery_points: set(delivery_points),
            states: set(states),
            customers: set(customers),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.postal_prefixes.is_empty()
            && self.delivery_points.is_empty()
            && self.states.is_empty()
            && self.customers.is_empty()
    }

    pub fn matches(&self, row: &ShipmentRow) -> bool {
        keeps(&self.postal_prefixes, row.postal_prefix.as_deref())
            && keeps(&self.delivery_points, row.delivery_point.as_deref())
            && keeps(&self.states, row.state.as_deref())
            && keeps(&self.customers, row.customer.as_deref())
    }

    pub fn apply(&self, rows: Vec<ShipmentRow>) -> Vec<ShipmentRow> {
        if self.is_empty() {
            return rows;
        }
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(waybill: &str, prefix: Option<&str>, point: Option<&str>, state: &str) -> ShipmentRow {
        ShipmentRow {
            row: 0,
            waybill: waybill.to_string(),
            delivery_point: point.map(str::to_string),
            postal_code: None,
            postal_prefix: prefix.map(str::to_string),
            city: None,
            state: Some(state.to_string()),
            customer: Some("ACME".to_string()),
            status: None,
            timestamps: Default::default(),
        }
    }

    fn sample() -> Vec<ShipmentRow> {
        vec![
            row("W1", Some("013"), Some("GRU"), "SP"),
            row("W2", Some("200"), Some("GIG"), "RJ"),
            row("W3", None, None, "SP"),
        ]
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = RowFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(sample()).len(), 3);
    }

    #[test]
    fn test_filters_combine() {
        let filter = RowFilter::new(&[], &[], &["SP".to_string()], &[]);
        let kept: Vec<_> = filter.apply(sample()).into_iter().map(|r| r.waybill).collect();
        assert_eq!(kept, vec!["W1", "W3"]);

        let filter = RowFilter::new(&["013".to_string()], &[], &["SP".to_string()], &[]);
        let kept: Vec<_> = filter.apply(sample()).into_iter().map(|r| r.waybill).collect();
        assert_eq!(kept, vec!["W1"]);
    }

    #[test]
    fn test_missing_value_never_matches() {
        let filter = RowFilter::new(&[], &["GRU".to_string(), "GIG".to_string()], &[], &[]);
        let kept: Vec<_> = filter.apply(sample()).into_iter().map(|r| r.waybill).collect();
        assert_eq!(kept, vec!["W1", "W2"]);
    }

    #[test]
    fn test_match_is_exact() {
        let filter = RowFilter::new(&[], &[], &["SP".to_string()], &[]);
        assert!(!filter.matches(&row("W4", None, None, " SP")));
        assert!(filter.matches(&row("W5", None, None, "SP")));
    }
}
