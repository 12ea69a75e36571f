//! FILENAME: pivot-crosstab/src/source.rs
//! The capability shared by the base engine and the column-grouping wrapper.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{PivotError, Result};
use crate::filter::PivotFilter;
use crate::model::{Aggregate, GroupBy};
use crate::result::PivotResult;

/// Something that turns records plus clauses into a pivot result.
pub trait PivotSource<T> {
    /// Groups `items` by `group_by`, aggregates each group with `aggregates`,
    /// drops rows rejected by `filter`, and computes grand totals for the
    /// aggregates named in `grand_total_ids`.
    fn compute_rows(
        &self,
        group_by: &[GroupBy<T>],
        aggregates: &[Aggregate<T>],
        grand_total_ids: &[String],
        items: &[T],
        filter: &PivotFilter,
    ) -> Result<PivotResult<T>>;

    /// True for sources that already perform column grouping.
    fn is_column_grouping(&self) -> bool {
        false
    }
}

impl<T, S: PivotSource<T> + ?Sized> PivotSource<T> for Box<S> {
    fn compute_rows(
        &self,
        group_by: &[GroupBy<T>],
        aggregates: &[Aggregate<T>],
        grand_total_ids: &[String],
        items: &[T],
        filter: &PivotFilter,
    ) -> Result<PivotResult<T>> {
        (**self).compute_rows(group_by, aggregates, grand_total_ids, items, filter)
    }

    fn is_column_grouping(&self) -> bool {
        (**self).is_column_grouping()
    }
}

/// Checks that every clause id is unique across group-by and aggregate
/// clauses; they share the namespace of row cells.
pub(crate) fn validate_clause_ids<T>(group_by: &[GroupBy<T>], aggregates: &[Aggregate<T>]) -> Result<()> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let ids = group_by
        .iter()
        .map(|g| g.id.as_str())
        .chain(aggregates.iter().map(|a| a.id.as_str()));
    for id in ids {
        if !seen.insert(id) {
            return Err(PivotError::InvalidArgument(format!(
                "clause id '{}' is used more than once",
                id
            )));
        }
    }
    Ok(())
}

/// Resolves grand-total ids to their aggregates, keeping declaration order.
/// Fails if an id names no aggregate.
pub(crate) fn resolve_grand_totals<'a, T>(
    aggregates: &'a [Aggregate<T>],
    grand_total_ids: &[String],
) -> Result<Vec<&'a Aggregate<T>>> {
    let by_id: FxHashMap<&str, &Aggregate<T>> =
        aggregates.iter().map(|a| (a.id.as_str(), a)).collect();
    let unknown: Vec<&str> = grand_total_ids
        .iter()
        .map(String::as_str)
        .filter(|id| !by_id.contains_key(id))
        .collect();
    if !unknown.is_empty() {
        return Err(PivotError::InvalidArgument(format!(
            "grand total ids {:?}: no aggregates found for these ids",
            unknown
        )));
    }
    let wanted: FxHashSet<&str> = grand_total_ids.iter().map(String::as_str).collect();
    Ok(aggregates.iter().filter(|a| wanted.contains(a.id.as_str())).collect())
}
