//! Left join of the order export onto the tracking export.

use super::loader::has_column;
use crate::settings::ColumnMap;
use polars::prelude::*;
use tracing::{info, warn};

const ROW_INDEX: &str = "__tracking_row";

/// Left-merge `orders` into `tracking` on the waybill column.
///
/// Every tracking row survives, in its original order. Destination columns
/// already present in `tracking` are replaced by the order export's values.
/// Duplicate waybills in `orders` fan out the matching tracking rows.
pub fn left_join(
    tracking: &DataFrame,
    orders: &DataFrame,
    columns: &ColumnMap,
) -> PolarsResult<DataFrame> {
    let key = columns.waybill.as_str();

    let mut left = tracking.clone();
    for name in columns.destination_columns() {
        if has_column(orders, name) && has_column(&left, name) {
            left = left.drop(name)?;
        }
    }

    let duplicates = duplicate_keys(orders, key)?;
    if duplicates > 0 {
        warn!(
            "Order export repeats {} waybill(s); matching tracking rows will be duplicated",
            duplicates
        );
    }

    // Both sides as strings so "001" never meets an integer key.
    let joined = left
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .with_column(col(key).cast(DataType::String))
        .join(
            orders.clone().lazy().with_column(col(key).cast(DataType::String)),
            [col(key)],
            [col(key)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .collect()?
        .drop(ROW_INDEX)?;

    let unmatched = unmatched_rows(&joined, orders, columns)?;
    info!(
        "Joined {} tracking rows with {} order rows: {} rows, {} without destination",
        tracking.height(),
        orders.height(),
        joined.height(),
        unmatched
    );
    Ok(joined)
}

/// Number of distinct keys that occur more than once.
fn duplicate_keys(df: &DataFrame, key: &str) -> PolarsResult<usize> {
    let keys = df.column(key)?.cast(&DataType::String)?;
    let mut seen = std::collections::HashMap::new();
    for value in keys.str()?.into_iter().flatten() {
        *seen.entry(value).or_insert(0usize) += 1;
    }
    Ok(seen.values().filter(|&&n| n > 1).count())
}

/// Rows whose destination columns all came back null.
fn unmatched_rows(joined: &DataFrame, orders: &DataFrame, columns: &ColumnMap) -> PolarsResult<usize> {
    let carried: Vec<&str> = columns
        .destination_columns()
        .into_iter()
        .filter(|name| has_column(orders, name))
        .collect();
    if carried.is_empty() {
        return Ok(0);
    }

    let mut unmatched = 0;
    let nulls: Vec<_> = carried
        .iter()
        .map(|name| joined.column(name).map(|c| c.is_null()))
        .collect::<PolarsResult<_>>()?;
    for row in 0..joined.height() {
        if nulls.iter().all(|mask| mask.get(row).unwrap_or(false)) {
            unmatched += 1;
        }
    }
    Ok(unmatched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> ColumnMap {
        ColumnMap {
            waybill: "waybill".to_string(),
            postal_code: "cep".to_string(),
            city: "city".to_string(),
            ..ColumnMap::default()
        }
    }

    fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_left_join_keeps_every_tracking_row() {
        let tracking = df!(
            "waybill" => ["W3", "W1", "W2"],
            "status" => ["a", "b", "c"],
        )
        .unwrap();
        let orders = df!(
            "waybill" => ["W1", "W3", "W9"],
            "cep" => ["01310100", "20040002", "99999999"],
            "city" => ["São Paulo", "Rio", "Nowhere"],
        )
        .unwrap();

        let joined = left_join(&tracking, &orders, &columns()).unwrap();
        assert_eq!(joined.height(), 3);
        assert_eq!(
            strings(&joined, "waybill"),
            vec![Some("W3".into()), Some("W1".into()), Some("W2".into())]
        );
        assert_eq!(
            strings(&joined, "cep"),
            vec![Some("20040002".into()), Some("01310100".into()), None]
        );
        assert!(!super::has_column(&joined, ROW_INDEX));
    }

    #[test]
    fn test_order_values_replace_tracking_destination() {
        let tracking = df!(
            "waybill" => ["W1"],
            "cep" => ["00000000"],
        )
        .unwrap();
        let orders = df!(
            "waybill" => ["W1"],
            "cep" => ["01310100"],
        )
        .unwrap();

        let joined = left_join(&tracking, &orders, &columns()).unwrap();
        assert_eq!(strings(&joined, "cep"), vec![Some("01310100".into())]);
        assert_eq!(joined.width(), 2);
    }

    #[test]
    fn test_duplicate_order_keys_fan_out() {
        let tracking = df!("waybill" => ["W1", "W2"]).unwrap();
        let orders = df!(
            "waybill" => ["W1", "W1"],
            "city" => ["A", "B"],
        )
        .unwrap();

        assert_eq!(duplicate_keys(&orders, "waybill").unwrap(), 1);
        let joined = left_join(&tracking, &orders, &columns()).unwrap();
        assert_eq!(joined.height(), 3);
        assert_eq!(unmatched_rows(&joined, &orders, &columns()).unwrap(), 1);
    }
}
