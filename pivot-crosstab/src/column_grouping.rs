//! FILENAME: pivot-crosstab/src/column_grouping.rs
//! Column (horizontal) grouping on top of another pivot source.
//!
//! One group-by clause may be marked as column grouping. Its distinct values
//! become measure columns `dynamic-{value}-{aggregate id}` instead of rows.
//! The data is computed by the delegate with that clause demoted to a plain
//! row grouping, then the delegate's rows are collapsed in memory.
//!
//! Optionally a final "Grand Total" column per aggregate is appended, computed
//! by the aggregate's function over the row's horizontally grouped values.

use std::sync::Arc;

use log::{debug, trace, warn};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{PivotError, Result};
use crate::filter::PivotFilter;
use crate::model::{Aggregate, GroupBy};
use crate::result::{ColumnGroupValue, PivotColumn, PivotResult, Row, SourceBeans};
use crate::source::{resolve_grand_totals, PivotSource};
use crate::value::PivotValue;

/// Prefix of every column synthesized per column-group value.
pub const DYNAMIC_COLUMN_PREFIX: &str = "dynamic-";

/// Id of the cell holding `aggregate_id` for one column-group value.
pub fn dynamic_column_id(column_group_value: &PivotValue, aggregate_id: &str) -> String {
    format!("{}{}-{}", DYNAMIC_COLUMN_PREFIX, column_group_value, aggregate_id)
}

/// Id of the grand-total column cell for `aggregate_id`.
pub fn grand_total_column_id(caption: &str, aggregate_id: &str) -> String {
    format!("{}-{}", caption, aggregate_id)
}

type GroupKey = SmallVec<[PivotValue; 4]>;

pub struct ColumnGroupingPivot<S> {
    delegate: S,
    grand_total_column_caption: Option<String>,
}

impl<S> ColumnGroupingPivot<S> {
    /// `grand_total_column_caption`: if set, a final grand-total column per
    /// aggregate is appended under this caption.
    ///
    /// Fails if `delegate` performs column grouping itself; chaining is not
    /// supported.
    pub fn new<T>(delegate: S, grand_total_column_caption: Option<String>) -> Result<Self>
    where
        S: PivotSource<T>,
    {
        if delegate.is_column_grouping() {
            return Err(PivotError::InvalidArgument(
                "chaining ColumnGroupingPivot is not supported".to_string(),
            ));
        }
        Ok(ColumnGroupingPivot {
            delegate,
            grand_total_column_caption,
        })
    }

    pub fn has_grand_total_column(&self) -> bool {
        self.grand_total_column_caption.is_some()
    }

    pub fn grand_total_column_caption(&self) -> Option<&str> {
        self.grand_total_column_caption.as_deref()
    }

    /// Dynamic and grand-total columns do not exist before the collapse.
    fn is_synthetic_column_id(&self, column_id: &str) -> bool {
        if column_id.starts_with(DYNAMIC_COLUMN_PREFIX) {
            return true;
        }
        match &self.grand_total_column_caption {
            Some(caption) => column_id
                .strip_prefix(caption.as_str())
                .is_some_and(|rest| rest.starts_with('-')),
            None => false,
        }
    }
}

/// All contributing records, or `None` if any row lost track of them.
fn flatten_beans<T>(rows: &[&Row<T>]) -> Option<SourceBeans<T>> {
    let mut beans = Vec::new();
    for row in rows {
        beans.extend(row.source_beans()?.iter().cloned());
    }
    Some(Arc::from(beans))
}

impl<S> ColumnGroupingPivot<S> {
    /// Collapses the delegate's rows, one output row per remaining key.
    fn collapse_rows<T>(
        &self,
        rows: &[Row<T>],
        remaining: &[&GroupBy<T>],
        top_id: &str,
        aggregates: &[Aggregate<T>],
    ) -> Result<Vec<Row<T>>> {
        let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
        let mut groups: Vec<Vec<&Row<T>>> = Vec::new();
        for row in rows {
            let key: GroupKey = remaining.iter().map(|g| row.value(&g.id).clone()).collect();
            match index.get(&key) {
                Some(&i) => groups[i].push(row),
                None => {
                    index.insert(key, groups.len());
                    groups.push(vec![row]);
                }
            }
        }

        let mut collapsed = Vec::with_capacity(groups.len());
        for uncollapsed in groups {
            let mut values: FxHashMap<String, PivotValue> = FxHashMap::default();
            // the same for every row in the group
            for clause in remaining {
                values.insert(clause.id.clone(), uncollapsed[0].value(&clause.id).clone());
            }

            // per aggregate: the row's horizontally grouped values
            let mut per_aggregate: Vec<Vec<PivotValue>> = vec![Vec::new(); aggregates.len()];
            for row in &uncollapsed {
                let column_group_value = row.value(top_id);
                for (i, aggregate) in aggregates.iter().enumerate() {
                    let value = row.value(&aggregate.id).clone();
                    values.insert(dynamic_column_id(column_group_value, &aggregate.id), value.clone());
                    per_aggregate[i].push(value);
                }
            }

            if let Some(caption) = &self.grand_total_column_caption {
                for (aggregate, grouped) in aggregates.iter().zip(&per_aggregate) {
                    if !grouped.is_empty() {
                        let total = aggregate.function.compute(grouped)?;
                        values.insert(grand_total_column_id(caption, &aggregate.id), total);
                    }
                }
            }

            collapsed.push(Row::new(values, flatten_beans(&uncollapsed)));
        }
        Ok(collapsed)
    }

    /// Footer totals from the records themselves. Exact for every function.
    fn grand_totals_in_memory<T>(
        rows: &[Row<T>],
        top: &GroupBy<T>,
        grand_totals: &[&Aggregate<T>],
        top_values: &[PivotValue],
    ) -> Result<FxHashMap<String, PivotValue>> {
        let mut totals = FxHashMap::default();
        for column_group_value in top_values {
            let beans: Vec<&T> = rows
                .iter()
                .filter_map(|r| r.source_beans())
                .flat_map(|b| b.iter())
                .map(|bean| &**bean)
                .filter(|bean| top.value(bean) == *column_group_value)
                .collect();
            if beans.is_empty() {
                continue;
            }
            for aggregate in grand_totals {
                let value = aggregate.compute_aggregated_value(beans.iter().copied())?;
                totals.insert(dynamic_column_id(column_group_value, &aggregate.id), value);
            }
        }
        Ok(totals)
    }

    /// Footer totals recombined from the per-row cells. Functions that cannot
    /// recombine aggregated values get no footer cell.
    fn grand_totals_from_aggregates<T>(
        rows: &[Row<T>],
        grand_totals: &[&Aggregate<T>],
        top_values: &[PivotValue],
    ) -> Result<FxHashMap<String, PivotValue>> {
        let mut totals = FxHashMap::default();
        for aggregate in grand_totals {
            if !aggregate.function.can_compute_over_aggregated_values() {
                warn!(
                    target: "pivot",
                    "grand total '{}' skipped: {} cannot be computed without source records",
                    aggregate.id,
                    aggregate.function.caption()
                );
                continue;
            }
            for column_group_value in top_values {
                let column_id = dynamic_column_id(column_group_value, &aggregate.id);
                let aggregated: Vec<PivotValue> = rows
                    .iter()
                    .filter_map(|r| r.get(&column_id))
                    .filter(|v| !v.is_empty())
                    .cloned()
                    .collect();
                if !aggregated.is_empty() {
                    let value = aggregate.function.compute_over_aggregated_values(&aggregated)?;
                    totals.insert(column_id, value);
                }
            }
        }
        Ok(totals)
    }
}

impl<T, S: PivotSource<T>> PivotSource<T> for ColumnGroupingPivot<S> {
    fn compute_rows(
        &self,
        group_by: &[GroupBy<T>],
        aggregates: &[Aggregate<T>],
        grand_total_ids: &[String],
        items: &[T],
        filter: &PivotFilter,
    ) -> Result<PivotResult<T>> {
        let column_groups: Vec<&GroupBy<T>> = group_by.iter().filter(|g| g.column_grouping).collect();
        let top = match column_groups.as_slice() {
            [] => return self.delegate.compute_rows(group_by, aggregates, grand_total_ids, items, filter),
            [top] => (*top).clone(),
            many => {
                let ids: Vec<&str> = many.iter().map(|g| g.id.as_str()).collect();
                return Err(PivotError::InvalidArgument(format!(
                    "at most 1 column grouping is supported but got {:?}",
                    ids
                )));
            }
        };
        let grand_totals = resolve_grand_totals(aggregates, grand_total_ids)?;

        // Phase 1: the delegate groups by every clause, top included
        let demoted: Vec<GroupBy<T>> = group_by.iter().map(|g| g.with_column_group(false)).collect();
        let delegate_filter = filter.without_keys(|k| self.is_synthetic_column_id(k));
        let result = self
            .delegate
            .compute_rows(&demoted, aggregates, &[], items, &delegate_filter)?;

        // Phase 2: collapse by every clause except the top one
        let remaining: Vec<&GroupBy<T>> = demoted.iter().filter(|g| g.id != top.id).collect();
        let mut rows = self.collapse_rows(&result.rows, &remaining, &top.id, aggregates)?;
        rows.retain(|row| filter.accepts(row));
        trace!(
            target: "pivot",
            "collapsed {} delegate rows into {} rows",
            result.rows.len(),
            rows.len()
        );

        // Distinct column-group values, sorted
        let mut top_values: Vec<PivotValue> = result.rows.iter().map(|r| r.value(&top.id).clone()).collect();
        top_values.sort();
        top_values.dedup();

        let mut columns: Vec<PivotColumn<T>> = remaining.iter().map(|g| PivotColumn::dimension(g)).collect();
        for column_group_value in &top_values {
            for aggregate in aggregates {
                columns.push(PivotColumn::grouped_measure(
                    dynamic_column_id(column_group_value, &aggregate.id),
                    aggregate,
                    ColumnGroupValue::Value(column_group_value.clone()),
                ));
            }
        }
        if let Some(caption) = &self.grand_total_column_caption {
            for aggregate in aggregates {
                columns.push(PivotColumn::grouped_measure(
                    grand_total_column_id(caption, &aggregate.id),
                    aggregate,
                    ColumnGroupValue::GrandTotal(caption.clone()),
                ));
            }
        }

        // Footer: exact when every row still knows its records
        let has_beans = rows.iter().all(Row::has_source_beans);
        let grand_total_values = if has_beans {
            Self::grand_totals_in_memory(&rows, &top, &grand_totals, &top_values)?
        } else {
            Self::grand_totals_from_aggregates(&rows, &grand_totals, &top_values)?
        };

        debug!(
            target: "pivot",
            "column grouping by '{}': {} rows, {} columns, {} grand totals ({})",
            top.id,
            rows.len(),
            columns.len(),
            grand_total_values.len(),
            if has_beans { "in-memory" } else { "from aggregated values" }
        );
        let mut result = PivotResult::new(rows, columns, grand_total_values);
        result.set_top_group(Some(top));
        Ok(result)
    }

    fn is_column_grouping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::AggregateFunction;
    use crate::in_memory::InMemoryPivot;
    use crate::model::PivotProperty;

    fn identity() -> PivotProperty<i64> {
        PivotProperty::new("identity", |v: &i64| PivotValue::Integer(*v))
    }

    fn pivot() -> ColumnGroupingPivot<InMemoryPivot> {
        ColumnGroupingPivot::new::<i64>(InMemoryPivot, Some("Grand Total".to_string())).unwrap()
    }

    #[test]
    fn test_dynamic_ids() {
        assert_eq!(dynamic_column_id(&PivotValue::Integer(3), "sum"), "dynamic-3-sum");
        assert_eq!(grand_total_column_id("Grand Total", "sum"), "Grand Total-sum");
    }

    #[test]
    fn test_grand_total_column_caption() {
        assert_eq!(pivot().grand_total_column_caption(), Some("Grand Total"));
        let plain = ColumnGroupingPivot::new::<i64>(InMemoryPivot, None).unwrap();
        assert_eq!(plain.grand_total_column_caption(), None);
        assert!(!plain.has_grand_total_column());
    }

    #[test]
    fn test_result_is_marked_with_top_group() {
        let top = GroupBy::new("g", identity()).as_column_group();
        let sum = Aggregate::new("sum", identity(), AggregateFunction::Sum);
        let result = pivot()
            .compute_rows(&[top], &[sum.clone()], &[], &[1, 2], &PivotFilter::new())
            .unwrap();
        assert_eq!(result.top_group().map(|g| g.id.as_str()), Some("g"));

        let plain = pivot()
            .compute_rows(&[GroupBy::new("g", identity())], &[sum], &[], &[1, 2], &PivotFilter::new())
            .unwrap();
        assert!(plain.top_group().is_none());
    }

    #[test]
    fn test_collapsed_row_keeps_every_record() {
        let top = GroupBy::new("parity", PivotProperty::new("parity", |v: &i64| PivotValue::Integer(v % 2)))
            .as_column_group();
        let sum = Aggregate::new("sum", identity(), AggregateFunction::Sum);
        let collapsed = pivot()
            .compute_rows(&[top], &[sum], &[], &[1, 2, 3], &PivotFilter::new())
            .unwrap();

        let mut records: Vec<i64> = collapsed.rows[0]
            .source_beans()
            .unwrap()
            .iter()
            .map(|b| **b)
            .collect();
        records.sort();
        assert_eq!(records, vec![1, 2, 3]);
    }

    #[test]
    fn test_mixed_integer_and_number_top_values() {
        let top = GroupBy::new(
            "kind",
            PivotProperty::new("kind", |v: &i64| {
                if *v < 10 {
                    PivotValue::Integer(1)
                } else {
                    PivotValue::number(1.0)
                }
            }),
        )
        .as_column_group();
        let sum = Aggregate::new("sum", identity(), AggregateFunction::Sum);
        let result = pivot()
            .compute_rows(&[top], &[sum], &["sum".to_string()], &[1, 2, 10, 20], &PivotFilter::new())
            .unwrap();

        let ids: Vec<&str> = result.column_ids().collect();
        assert_eq!(ids, vec!["dynamic-1-sum", "dynamic-1.0-sum", "Grand Total-sum"]);
        assert_eq!(result.grand_total("dynamic-1-sum"), Some(&PivotValue::number(3.0)));
        assert_eq!(result.grand_total("dynamic-1.0-sum"), Some(&PivotValue::number(30.0)));
        assert_eq!(result.rows[0].value("Grand Total-sum"), &PivotValue::number(33.0));
    }

    #[test]
    fn test_rejects_nesting() {
        let nested = ColumnGroupingPivot::new::<i64>(pivot(), None);
        assert!(matches!(nested, Err(PivotError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_two_column_groups() {
        let a = GroupBy::new("a", identity()).as_column_group();
        let b = GroupBy::new("b", identity()).as_column_group();
        let sum = Aggregate::new("sum", identity(), AggregateFunction::Sum);
        let err = pivot()
            .compute_rows(&[a, b], &[sum], &[], &[1, 2], &PivotFilter::new())
            .unwrap_err();
        assert!(matches!(err, PivotError::InvalidArgument(_)));
    }

    #[test]
    fn test_without_column_group_delegates() {
        let g = GroupBy::new("g", identity());
        let sum = Aggregate::new("sum", identity(), AggregateFunction::Sum);
        let result = pivot()
            .compute_rows(&[g], &[sum], &["sum".to_string()], &[1, 2, 2], &PivotFilter::new())
            .unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.columns.len(), 2);
        assert_eq!(result.grand_total("sum"), Some(&PivotValue::number(5.0)));
    }

    #[test]
    fn test_synthetic_ids_are_stripped_before_delegating() {
        let p = pivot();
        assert!(p.is_synthetic_column_id("dynamic-1-sum"));
        assert!(p.is_synthetic_column_id("Grand Total-sum"));
        assert!(!p.is_synthetic_column_id("Grand Totals"));
        assert!(!p.is_synthetic_column_id("region"));
    }

    #[test]
    fn test_filter_on_dynamic_cell() {
        let top = GroupBy::new("parity", PivotProperty::new("parity", |v: &i64| PivotValue::Integer(v % 2)))
            .as_column_group();
        let rows_by = GroupBy::new("tens", PivotProperty::new("tens", |v: &i64| PivotValue::Integer(v / 10)));
        let count = Aggregate::new("count", identity(), AggregateFunction::Count);
        let items = [1, 2, 3, 11, 13, 21];

        let all = pivot()
            .compute_rows(&[rows_by.clone(), top.clone()], &[count.clone()], &[], &items, &PivotFilter::new())
            .unwrap();
        assert_eq!(all.rows.len(), 3);

        // keep rows with exactly two odd numbers
        let filter = PivotFilter::new().with_value("dynamic-1-count", 2i64);
        let filtered = pivot()
            .compute_rows(&[rows_by, top], &[count], &[], &items, &filter)
            .unwrap();
        assert_eq!(filtered.rows.len(), 2);
        assert!(filtered.rows.iter().all(|r| r.value("dynamic-1-count") == &PivotValue::Integer(2)));
    }
}
