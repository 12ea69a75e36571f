//! FILENAME: pivot-crosstab/src/result.rs
//! Pivot Result - the display-agnostic output of one computation.
//!
//! Rows are maps from column id to value. Columns describe what each id is:
//! either a dimension (group-by) column or a measure (aggregate) column,
//! optionally tagged with the column-group value it was synthesized for.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::{Aggregate, GroupBy};
use crate::value::PivotValue;

static EMPTY: PivotValue = PivotValue::Empty;

/// Records behind a row. Each record is allocated once per computation and
/// shared by every row, collapsed row and summary row it contributes to.
pub type SourceBeans<T> = Arc<[Arc<T>]>;

// ============================================================================
// ROW
// ============================================================================

/// One output row.
pub struct Row<T> {
    values: FxHashMap<String, PivotValue>,
    /// The records that contributed to this row. `None` once they can no
    /// longer be traced, which forces approximate grand totals.
    source_beans: Option<SourceBeans<T>>,
}

impl<T> Row<T> {
    pub fn new(values: FxHashMap<String, PivotValue>, source_beans: Option<SourceBeans<T>>) -> Self {
        Row { values, source_beans }
    }

    pub fn get(&self, column_id: &str) -> Option<&PivotValue> {
        self.values.get(column_id)
    }

    /// Like `get`, with absent cells read as `Empty`.
    pub fn value(&self, column_id: &str) -> &PivotValue {
        self.values.get(column_id).unwrap_or(&EMPTY)
    }

    pub fn insert(&mut self, column_id: impl Into<String>, value: PivotValue) -> Option<PivotValue> {
        self.values.insert(column_id.into(), value)
    }

    pub fn values(&self) -> &FxHashMap<String, PivotValue> {
        &self.values
    }

    pub fn source_beans(&self) -> Option<&[Arc<T>]> {
        self.source_beans.as_deref()
    }

    pub fn has_source_beans(&self) -> bool {
        self.source_beans.is_some()
    }
}

impl<T> Clone for Row<T> {
    fn clone(&self) -> Self {
        Row {
            values: self.values.clone(),
            source_beans: self.source_beans.clone(),
        }
    }
}

/// Rows compare by their cells only.
impl<T> PartialEq for Row<T> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<T> std::fmt::Debug for Row<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row")
            .field("values", &self.values)
            .field("source_beans", &self.source_beans.as_ref().map(|b| b.len()))
            .finish()
    }
}

// ============================================================================
// COLUMN
// ============================================================================

/// What a column shows.
pub enum ColumnKind<T> {
    /// A group-by value.
    Dimension(GroupBy<T>),
    /// An aggregated value.
    Measure(Aggregate<T>),
}

impl<T> Clone for ColumnKind<T> {
    fn clone(&self) -> Self {
        match self {
            ColumnKind::Dimension(g) => ColumnKind::Dimension(g.clone()),
            ColumnKind::Measure(a) => ColumnKind::Measure(a.clone()),
        }
    }
}

/// The horizontal group a synthesized measure column belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnGroupValue {
    /// One distinct value of the column-grouping clause.
    Value(PivotValue),
    /// The synthetic grand-total column, carrying its caption.
    GrandTotal(String),
}

impl ColumnGroupValue {
    /// The header value; the grand-total column shows its caption.
    pub fn as_value(&self) -> PivotValue {
        match self {
            ColumnGroupValue::Value(v) => v.clone(),
            ColumnGroupValue::GrandTotal(caption) => PivotValue::text(caption.as_str()),
        }
    }
}

pub struct PivotColumn<T> {
    pub id: String,
    pub kind: ColumnKind<T>,
    pub column_group_value: Option<ColumnGroupValue>,
}

impl<T> PivotColumn<T> {
    pub fn dimension(group_by: &GroupBy<T>) -> Self {
        PivotColumn {
            id: group_by.id.clone(),
            kind: ColumnKind::Dimension(group_by.clone()),
            column_group_value: None,
        }
    }

    pub fn measure(aggregate: &Aggregate<T>) -> Self {
        PivotColumn {
            id: aggregate.id.clone(),
            kind: ColumnKind::Measure(aggregate.clone()),
            column_group_value: None,
        }
    }

    /// A measure column synthesized by column grouping.
    pub fn grouped_measure(id: String, aggregate: &Aggregate<T>, group: ColumnGroupValue) -> Self {
        PivotColumn {
            id,
            kind: ColumnKind::Measure(aggregate.clone()),
            column_group_value: Some(group),
        }
    }

    pub fn caption(&self) -> String {
        match &self.kind {
            ColumnKind::Dimension(g) => g.caption().to_string(),
            ColumnKind::Measure(a) => a.caption(),
        }
    }

    pub fn group_by(&self) -> Option<&GroupBy<T>> {
        match &self.kind {
            ColumnKind::Dimension(g) => Some(g),
            ColumnKind::Measure(_) => None,
        }
    }

    pub fn aggregate(&self) -> Option<&Aggregate<T>> {
        match &self.kind {
            ColumnKind::Dimension(_) => None,
            ColumnKind::Measure(a) => Some(a),
        }
    }

    pub fn is_row_group(&self) -> bool {
        matches!(self.kind, ColumnKind::Dimension(_))
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.kind, ColumnKind::Measure(_))
    }

    pub fn is_filter_enabled(&self) -> bool {
        match &self.kind {
            ColumnKind::Dimension(g) => g.is_filter_enabled(),
            ColumnKind::Measure(a) => a.is_filter_enabled(),
        }
    }
}

impl<T> Clone for PivotColumn<T> {
    fn clone(&self) -> Self {
        PivotColumn {
            id: self.id.clone(),
            kind: self.kind.clone(),
            column_group_value: self.column_group_value.clone(),
        }
    }
}

/// Columns compare by id, kind and group value.
impl<T> PartialEq for PivotColumn<T> {
    fn eq(&self, other: &Self) -> bool {
        let same_kind = match (&self.kind, &other.kind) {
            (ColumnKind::Dimension(a), ColumnKind::Dimension(b)) => a == b,
            (ColumnKind::Measure(a), ColumnKind::Measure(b)) => a == b,
            _ => false,
        };
        same_kind && self.id == other.id && self.column_group_value == other.column_group_value
    }
}

impl<T> std::fmt::Debug for PivotColumn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            ColumnKind::Dimension(g) => format!("Dimension({})", g.id),
            ColumnKind::Measure(a) => format!("Measure({})", a.id),
        };
        f.debug_struct("PivotColumn")
            .field("id", &self.id)
            .field("kind", &kind)
            .field("column_group_value", &self.column_group_value)
            .finish()
    }
}

// ============================================================================
// RESULT
// ============================================================================

pub struct PivotResult<T> {
    pub rows: Vec<Row<T>>,
    pub columns: Vec<PivotColumn<T>>,
    /// Footer values, keyed by column id.
    pub grand_total_values: FxHashMap<String, PivotValue>,
    top_group: Option<GroupBy<T>>,
}

impl<T> PivotResult<T> {
    pub fn new(
        rows: Vec<Row<T>>,
        columns: Vec<PivotColumn<T>>,
        grand_total_values: FxHashMap<String, PivotValue>,
    ) -> Self {
        PivotResult {
            rows,
            columns,
            grand_total_values,
            top_group: None,
        }
    }

    pub fn column(&self, id: &str) -> Option<&PivotColumn<T>> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.id.as_str())
    }

    pub fn has_grand_totals(&self) -> bool {
        !self.grand_total_values.is_empty()
    }

    pub fn grand_total(&self, column_id: &str) -> Option<&PivotValue> {
        self.grand_total_values.get(column_id)
    }

    /// The column-grouping clause, if the caller marked one.
    pub fn top_group(&self) -> Option<&GroupBy<T>> {
        self.top_group.as_ref()
    }

    pub fn set_top_group(&mut self, top_group: Option<GroupBy<T>>) {
        self.top_group = top_group;
    }

    /// Sorted distinct non-empty values of a column across the rows; the
    /// choices a filter on that column can offer.
    pub fn filter_options(&self, column_id: &str) -> Vec<PivotValue> {
        let distinct: FxHashSet<&PivotValue> = self
            .rows
            .iter()
            .filter_map(|row| row.get(column_id))
            .filter(|v| !v.is_empty())
            .collect();
        let mut options: Vec<PivotValue> = distinct.into_iter().cloned().collect();
        options.sort();
        options
    }
}

impl<T> std::fmt::Debug for PivotResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PivotResult")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("grand_total_values", &self.grand_total_values)
            .field("top_group", &self.top_group.as_ref().map(|g| &g.id))
            .finish()
    }
}
