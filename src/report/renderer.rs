//! Text Report Renderer
//! Prints the summary tables and chart series as aligned plain-text tables.
//!
//! Layout:
//! 1. The six summary tables, in the order the dashboard shows them
//! 2. The three chart series as label / count / share tables

use crate::stats::{ChartSeries, PivotTable, SeriesPoint, Summaries};

/// Renders report structures to text.
pub struct TextRenderer;

impl TextRenderer {
    pub fn render(summaries: &Summaries, charts: &ChartSeries) -> String {
        let mut out = String::new();

        out.push_str(&Self::render_counts(&summaries.last_mile_volume));
        out.push_str(&Self::render_percentages(&summaries.last_mile_share));
        out.push_str(&Self::render_counts(&summaries.status_volume));
        out.push_str(&Self::render_counts(&summaries.hub_dwell_volume));
        out.push_str(&Self::render_counts(&summaries.delivery_volume));
        out.push_str(&Self::render_percentages(&summaries.delivery_share));

        out.push_str(&Self::render_series(
            "Postal prefix distribution",
            "Postal prefix",
            &charts.postal_prefixes,
        ));
        out.push_str(&Self::render_series(
            "In-transit status distribution",
            "Waybill status",
            &charts.in_transit_statuses,
        ));
        out.push_str(&Self::render_series(
            "Delivery analysis distribution",
            "Delivery",
            &charts.delivery,
        ));
        out
    }

    pub fn render_counts(table: &PivotTable<usize>) -> String {
        Self::render_table(table, |v| v.to_string())
    }

    /// Percent cells as `"<value>%"` with one decimal.
    pub fn render_percentages(table: &PivotTable<f64>) -> String {
        Self::render_table(table, |v| format!("{:.1}%", v))
    }

    fn render_table<T: Copy>(table: &PivotTable<T>, cell: impl Fn(T) -> String) -> String {
        let mut grid: Vec<Vec<String>> = Vec::with_capacity(table.rows.len() + 1);
        let mut header = vec![table.index_name.clone()];
        header.extend(table.columns.iter().cloned());
        grid.push(header);
        for row in &table.rows {
            let mut line = vec![row.label.clone()];
            line.extend(row.cells.iter().map(|c| c.map(&cell).unwrap_or_default()));
            grid.push(line);
        }
        format_grid(&table.title, &grid)
    }

    fn render_series(title: &str, label: &str, points: &[SeriesPoint]) -> String {
        let mut grid = vec![vec![label.to_string(), "Count".to_string(), "Share".to_string()]];
        grid.extend(points.iter().map(|p| {
            vec![
                p.label.clone(),
                p.count.to_string(),
                format!("{:.1}%", p.share),
            ]
        }));
        format_grid(title, &grid)
    }
}

/// First column left-aligned, the rest right-aligned.
fn format_grid(title: &str, grid: &[Vec<String>]) -> String {
    let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            grid.iter()
                .filter_map(|row| row.get(i))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = format!("{}\n{}\n", title, "=".repeat(title.chars().count()));
    for (n, row) in grid.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let pad = widths[i].saturating_sub(s.chars().count());
                if i == 0 {
                    format!("{}{}", s, " ".repeat(pad))
                } else {
                    format!("{}{}", " ".repeat(pad), s)
                }
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
        if n == 0 {
            let rule: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
            out.push_str(&"-".repeat(rule));
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{PivotRow, TOTAL};

    fn table() -> PivotTable<f64> {
        PivotTable {
            title: "Delivery analysis %".to_string(),
            index_name: "Delivery point".to_string(),
            columns: vec!["Late".to_string(), "On time".to_string()],
            rows: vec![
                PivotRow {
                    label: "GRU".to_string(),
                    cells: vec![Some(50.0), Some(50.0)],
                },
                PivotRow {
                    label: TOTAL.to_string(),
                    cells: vec![None, Some(100.0)],
                },
            ],
        }
    }

    #[test]
    fn test_percent_cells() {
        let text = TextRenderer::render_percentages(&table());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Delivery analysis %");
        assert!(lines[2].starts_with("Delivery point"));
        assert!(lines[4].contains("50.0%"));
        // Empty cell renders blank, not "nan%".
        assert!(lines[5].starts_with("Total"));
        assert!(!lines[5].contains("nan"));
        assert!(lines[5].ends_with("100.0%"));
    }

    #[test]
    fn test_columns_aligned() {
        let text = TextRenderer::render_percentages(&table());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[4].len(), lines[5].len());
    }

    #[test]
    fn test_grid_layout() {
        let grid = vec![
            vec!["Point".to_string(), "N".to_string()],
            vec!["GRU".to_string(), "12".to_string()],
        ];
        assert_eq!(
            format_grid("Volume", &grid),
            "Volume\n======\nPoint   N\n---------\nGRU    12\n\n"
        );
    }

    #[test]
    fn test_series() {
        let points = vec![SeriesPoint {
            label: "On time".to_string(),
            count: 3,
            share: 75.0,
        }];
        let text =
            TextRenderer::render_series("Delivery analysis distribution", "Delivery", &points);
        assert!(text.contains("On time"));
        assert!(text.contains("75.0%"));
    }
}
