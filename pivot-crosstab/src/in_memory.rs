//! FILENAME: pivot-crosstab/src/in_memory.rs
//! Base pivot engine - groups in-memory records and aggregates each group.
//!
//! Algorithm:
//! 1. Compute a composite key per record (one value per group-by clause)
//! 2. Partition records by key, keeping first-seen key order
//! 3. Build one row per group: key values plus one cell per aggregate
//! 4. Drop rows rejected by the filter
//! 5. Emit dimension columns, then measure columns, in declaration order
//! 6. Compute grand totals over all records, or over the surviving rows'
//!    records when a filter is active

use std::sync::Arc;

use log::{debug, trace};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{PivotError, Result};
use crate::filter::PivotFilter;
use crate::model::{Aggregate, GroupBy};
use crate::result::{PivotColumn, PivotResult, Row};
use crate::source::{resolve_grand_totals, validate_clause_ids, PivotSource};
use crate::value::PivotValue;

/// Values of one record for each group-by clause, in clause order.
/// An empty key puts every record into the same group.
type GroupKey = SmallVec<[PivotValue; 4]>;

/// Computes pivot rows from in-memory data. Does not support column
/// grouping; wrap it in `ColumnGroupingPivot` for that.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryPivot;

impl InMemoryPivot {
    pub fn new() -> Self {
        InMemoryPivot
    }

    fn group_key<T>(item: &T, group_by: &[GroupBy<T>]) -> GroupKey {
        group_by.iter().map(|clause| clause.value(item)).collect()
    }

    /// Partitions `items` by group key, preserving first-seen order. Each
    /// record is copied once into a shared allocation.
    fn partition<T: Clone>(items: &[T], group_by: &[GroupBy<T>]) -> Vec<(GroupKey, Vec<Arc<T>>)> {
        let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
        let mut groups: Vec<(GroupKey, Vec<Arc<T>>)> = Vec::new();
        for item in items {
            let key = Self::group_key(item, group_by);
            let member = Arc::new(item.clone());
            match index.get(&key) {
                Some(&i) => groups[i].1.push(member),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push((key, vec![member]));
                }
            }
        }
        groups
    }

    fn compute_row<T>(
        key: GroupKey,
        members: Vec<Arc<T>>,
        group_by: &[GroupBy<T>],
        aggregates: &[Aggregate<T>],
    ) -> Result<Row<T>> {
        let mut values: FxHashMap<String, PivotValue> =
            FxHashMap::with_capacity_and_hasher(group_by.len() + aggregates.len(), Default::default());
        for (clause, value) in group_by.iter().zip(key) {
            values.insert(clause.id.clone(), value);
        }
        for aggregate in aggregates {
            values.insert(
                aggregate.id.clone(),
                aggregate.compute_aggregated_value(members.iter().map(|m| &**m))?,
            );
        }
        Ok(Row::new(values, Some(Arc::from(members))))
    }
}

impl<T: Clone> PivotSource<T> for InMemoryPivot {
    fn compute_rows(
        &self,
        group_by: &[GroupBy<T>],
        aggregates: &[Aggregate<T>],
        grand_total_ids: &[String],
        items: &[T],
        filter: &PivotFilter,
    ) -> Result<PivotResult<T>> {
        // Parameter checking
        if let Some(column_group) = group_by.iter().find(|g| g.column_grouping) {
            return Err(PivotError::InvalidArgument(format!(
                "group by '{}': column grouping is not supported here, use ColumnGroupingPivot",
                column_group.id
            )));
        }
        validate_clause_ids(group_by, aggregates)?;
        let grand_totals = resolve_grand_totals(aggregates, grand_total_ids)?;

        // Group and aggregate
        let groups = Self::partition(items, group_by);
        trace!(target: "pivot", "{} items partitioned into {} groups", items.len(), groups.len());

        let mut rows = Vec::with_capacity(groups.len());
        for (key, members) in groups {
            let row = Self::compute_row(key, members, group_by, aggregates)?;
            if filter.accepts(&row) {
                rows.push(row);
            }
        }

        // Columns: dimensions first, then measures
        let columns: Vec<PivotColumn<T>> = group_by
            .iter()
            .map(PivotColumn::dimension)
            .chain(aggregates.iter().map(PivotColumn::measure))
            .collect();

        // Grand totals, only over records whose rows are shown
        let mut grand_total_values: FxHashMap<String, PivotValue> = FxHashMap::default();
        if !items.is_empty() {
            let row_items: Vec<&T> = if filter.is_empty() {
                items.iter().collect()
            } else {
                rows.iter()
                    .filter_map(|r| r.source_beans())
                    .flat_map(|beans| beans.iter())
                    .map(|bean| &**bean)
                    .collect()
            };
            if !row_items.is_empty() {
                for aggregate in grand_totals {
                    let value = aggregate.compute_aggregated_value(row_items.iter().copied())?;
                    grand_total_values.insert(aggregate.id.clone(), value);
                }
            }
        }

        debug!(
            target: "pivot",
            "in-memory pivot: {} rows, {} columns, {} grand totals",
            rows.len(),
            columns.len(),
            grand_total_values.len()
        );
        Ok(PivotResult::new(rows, columns, grand_total_values))
    }
}
