//! Pivot tables over unique waybill counts.

use crate::data::processor::round_to;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Label of the margin row and column.
pub const TOTAL: &str = "Total";

/// One labelled row of a pivot table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow<T> {
    pub label: String,
    pub cells: Vec<Option<T>>,
}

/// A labelled grid; `None` marks a combination with no shipments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable<T> {
    pub title: String,
    pub index_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow<T>>,
}

impl<T: Copy> PivotTable<T> {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row(&self, label: &str) -> Option<&PivotRow<T>> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Cell at (`row`, `column`), `None` when either label is unknown or
    /// the cell is empty.
    pub fn get(&self, row: &str, column: &str) -> Option<T> {
        let col = self.column_index(column)?;
        self.row(row)?.cells.get(col).copied().flatten()
    }

    /// Copy of the table without the named columns; unknown names are ignored.
    pub fn without_columns(&self, names: &[&str]) -> Self {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i].as_str()))
            .collect();
        PivotTable {
            title: self.title.clone(),
            index_name: self.index_name.clone(),
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| PivotRow {
                    label: r.label.clone(),
                    cells: keep.iter().map(|&i| r.cells[i]).collect(),
                })
                .collect(),
        }
    }
}

/// Unique waybills per (row, column), with a `Total` margin row and column.
///
/// Rows are ordered by key and columns by key, each only if observed.
/// Margins count unique waybills over the whole row/column, not the sum
/// of its cells.
pub fn unique_cross_tab<'a, R, C>(
    title: &str,
    index_name: &str,
    entries: impl IntoIterator<Item = (R, C, &'a str)>,
    row_label: impl Fn(&R) -> String,
    column_label: impl Fn(&C) -> String,
) -> PivotTable<usize>
where
    R: Ord,
    C: Ord + Clone,
{
    let mut cells: BTreeMap<R, BTreeMap<C, HashSet<&'a str>>> = BTreeMap::new();
    let mut column_totals: BTreeMap<C, HashSet<&'a str>> = BTreeMap::new();
    let mut grand_total: HashSet<&'a str> = HashSet::new();

    for (row, column, waybill) in entries {
        column_totals
            .entry(column.clone())
            .or_default()
            .insert(waybill);
        grand_total.insert(waybill);
        cells
            .entry(row)
            .or_default()
            .entry(column)
            .or_default()
            .insert(waybill);
    }

    let keys: Vec<&C> = column_totals.keys().collect();
    let mut columns: Vec<String> = keys.iter().map(|c| column_label(c)).collect();
    columns.push(TOTAL.to_string());

    let mut rows: Vec<PivotRow<usize>> = cells
        .iter()
        .map(|(row, by_column)| {
            let mut row_total: HashSet<&str> = HashSet::new();
            let mut values: Vec<Option<usize>> = keys
                .iter()
                .map(|c| {
                    by_column.get(*c).map(|waybills| {
                        row_total.extend(waybills.iter().copied());
                        waybills.len()
                    })
                })
                .collect();
            values.push(Some(row_total.len()));
            PivotRow {
                label: row_label(row),
                cells: values,
            }
        })
        .collect();

    let mut totals: Vec<Option<usize>> = column_totals.values().map(|w| Some(w.len())).collect();
    totals.push(Some(grand_total.len()));
    rows.push(PivotRow {
        label: TOTAL.to_string(),
        cells: totals,
    });

    PivotTable {
        title: title.to_string(),
        index_name: index_name.to_string(),
        columns,
        rows,
    }
}

/// Unique waybills per key, one value column, with a `Total` row.
pub fn unique_counts<'a, K: Ord>(
    title: &str,
    index_name: &str,
    value_name: &str,
    entries: impl IntoIterator<Item = (K, &'a str)>,
    label: impl Fn(&K) -> String,
) -> PivotTable<usize> {
    let mut groups: BTreeMap<K, HashSet<&'a str>> = BTreeMap::new();
    let mut all: HashSet<&'a str> = HashSet::new();
    for (key, waybill) in entries {
        groups.entry(key).or_default().insert(waybill);
        all.insert(waybill);
    }

    let mut rows: Vec<PivotRow<usize>> = groups
        .iter()
        .map(|(key, waybills)| PivotRow {
            label: label(key),
            cells: vec![Some(waybills.len())],
        })
        .collect();
    rows.push(PivotRow {
        label: TOTAL.to_string(),
        cells: vec![Some(all.len())],
    });

    PivotTable {
        title: title.to_string(),
        index_name: index_name.to_string(),
        columns: vec![value_name.to_string()],
        rows,
    }
}

/// Running sum across each row, divided by the row's last running value and
/// multiplied by `scale`, rounded to one decimal.
///
/// Empty cells stay empty but do not interrupt the running sum. The last
/// column of a cross tab is its `Total` margin, so it is part of the sum.
pub fn cumulative_share(title: &str, table: &PivotTable<usize>, scale: f64) -> PivotTable<f64> {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut running = 0.0;
            let cumulative: Vec<Option<f64>> = row
                .cells
                .iter()
                .map(|cell| {
                    cell.map(|v| {
                        running += v as f64;
                        running
                    })
                })
                .collect();
            let denominator = cumulative.last().copied().flatten();
            PivotRow {
                label: row.label.clone(),
                cells: cumulative
                    .into_iter()
                    .map(|c| share(c, denominator, scale))
                    .collect(),
            }
        })
        .collect();

    PivotTable {
        title: title.to_string(),
        index_name: table.index_name.clone(),
        columns: table.columns.clone(),
        rows,
    }
}

/// Each cell divided by the row's `Total` cell and multiplied by `scale`,
/// rounded to one decimal.
pub fn row_share(title: &str, table: &PivotTable<usize>, scale: f64) -> PivotTable<f64> {
    let total_col = table.column_index(TOTAL);
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let denominator = total_col
                .and_then(|i| row.cells[i])
                .map(|v| v as f64);
            PivotRow {
                label: row.label.clone(),
                cells: row
                    .cells
                    .iter()
                    .map(|cell| share(cell.map(|v| v as f64), denominator, scale))
                    .collect(),
            }
        })
        .collect();

    PivotTable {
        title: title.to_string(),
        index_name: table.index_name.clone(),
        columns: table.columns.clone(),
        rows,
    }
}

fn share(value: Option<f64>, denominator: Option<f64>, scale: f64) -> Option<f64> {
    match (value, denominator) {
        (Some(v), Some(d)) if d != 0.0 => Some(round_to(v / d * scale, 1)),
        _ => None,
    }
}
