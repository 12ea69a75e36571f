//! FILENAME: pivot-crosstab/src/render.rs
//! Plain-text snapshot of a result, for logs and golden tests.

use std::fmt::Write;

use crate::result::PivotResult;
use crate::value::PivotValue;

const SEPARATOR: &str = "======";

/// Renders `result` as comma separated lines:
/// - a header of `"{caption}: {column group value}"` per column
/// - one line per row, each cell followed by a comma
/// - the grand totals in the same format, if there are any
///
/// Absent cells render as `null`.
pub fn to_csv<T>(result: &PivotResult<T>) -> String {
    let mut out = String::new();
    let header: Vec<String> = result
        .columns
        .iter()
        .map(|c| {
            let group = c
                .column_group_value
                .as_ref()
                .map_or(PivotValue::Empty, |g| g.as_value());
            format!("{}: {}", c.caption(), group)
        })
        .collect();
    out.push_str(&header.join(","));
    out.push('\n');
    out.push_str(SEPARATOR);
    out.push('\n');

    for row in &result.rows {
        for column in &result.columns {
            let _ = write!(out, "{},", row.value(&column.id));
        }
        out.push('\n');
    }

    if result.has_grand_totals() {
        out.push_str(SEPARATOR);
        out.push('\n');
        for column in &result.columns {
            let value = result.grand_total(&column.id).unwrap_or(&PivotValue::Empty);
            let _ = write!(out, "{},", value);
        }
        out.push('\n');
    }
    out
}
