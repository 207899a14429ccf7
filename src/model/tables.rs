//! Grouped summary tables: cell text, sort order, row sorting.

use crate::artifacts::{Cell, Table};
use crate::format;

use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Text shown in a cell: display value, else value; null shows `-`, numbers
/// are rounded to 3 decimals.
pub fn cell_text(cell: &Cell) -> String {
    let value = match &cell.display_value {
        Some(v) if !v.is_null() && v != &Value::String(String::new()) => v,
        _ => &cell.value,
    };
    match value {
        Value::Null => "-".to_string(),
        Value::Number(n) => n
            .as_f64()
            .map(|f| format::round(f, 3))
            .unwrap_or_else(|| n.to_string()),
        other => format::value_text(other),
    }
}

/// Header cells carry an arrow telling which direction is better: `↑` sorts
/// descending, `↓` ascending. Other columns are not sortable.
pub fn sort_order(header: &Cell) -> Option<SortOrder> {
    let text = format::value_text(&header.value);
    if text.contains('\u{2191}') {
        Some(SortOrder::Desc)
    } else if text.contains('\u{2193}') {
        Some(SortOrder::Asc)
    } else {
        None
    }
}

/// Rows sorted by a numeric column. Rows without a numeric value in that
/// column always come last; ties keep their original order.
pub fn sort_rows(table: &Table, column: usize, order: SortOrder) -> Vec<Vec<Cell>> {
    let mut rows = table.rows.clone();
    rows.sort_by(|a, b| {
        let va = a.get(column).and_then(Cell::numeric_value);
        let vb = b.get(column).and_then(Cell::numeric_value);
        match (va, vb) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            }
        }
    });
    rows
}

/// File name of the LaTeX rendering of a table.
pub fn latex_name(title: &str) -> String {
    title.replace(' ', "_").replacen('/', "_", 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> Table {
        serde_json::from_str(
            r#"{
              "title": "Accuracy / core",
              "header": [{"value": "Model"}, {"value": "EM ↑"}, {"value": "Runtime ↓"}],
              "rows": [
                [{"value": "a"}, {"value": 0.5}, {"value": 2.0}],
                [{"value": "b"}, {"value": null}, {"value": 1.0}],
                [{"value": "c"}, {"value": 0.9, "display_value": "0.90 (best)"}, {}],
                [{"value": "d"}, {"value": 0.5}, {"value": 0.5}]
              ],
              "links": [{"text": "all", "href": "?runSpecRegex=.*"}]
            }"#,
        )
        .unwrap()
    }

    fn names(rows: &[Vec<Cell>]) -> Vec<String> {
        rows.iter().map(|r| cell_text(&r[0])).collect()
    }

    #[test]
    fn header_arrows_pick_order() {
        let t = table();
        assert_eq!(sort_order(&t.header[0]), None);
        assert_eq!(sort_order(&t.header[1]), Some(SortOrder::Desc));
        assert_eq!(sort_order(&t.header[2]), Some(SortOrder::Asc));
    }

    #[test]
    fn missing_values_sort_last_both_ways() {
        let t = table();
        assert_eq!(names(&sort_rows(&t, 1, SortOrder::Desc)), vec!["c", "a", "d", "b"]);
        assert_eq!(names(&sort_rows(&t, 2, SortOrder::Asc)), vec!["d", "b", "a", "c"]);
        assert_eq!(names(&sort_rows(&t, 1, SortOrder::Asc)), vec!["a", "d", "c", "b"]);
    }

    #[test]
    fn cell_text_prefers_display_value() {
        let t = table();
        assert_eq!(cell_text(&t.rows[2][1]), "0.90 (best)");
        assert_eq!(cell_text(&t.rows[1][1]), "-");
        assert_eq!(cell_text(&t.rows[2][2]), "-");
        assert_eq!(cell_text(&t.rows[0][1]), "0.5");
    }

    #[test]
    fn latex_name_replaces_first_slash() {
        assert_eq!(latex_name("Accuracy / core / x"), "Accuracy___core_/_x");
    }
}
