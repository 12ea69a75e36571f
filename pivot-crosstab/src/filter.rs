//! FILENAME: pivot-crosstab/src/filter.rs
//! Post-grouping filter: column id -> accepted values.
//!
//! A row passes when, for every entry, the row's cell at that column id
//! (absent cells count as `Empty`) is one of the accepted values.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::result::Row;
use crate::value::PivotValue;

/// Accepted values for one column. Usually a single selection.
pub type AcceptedValues = SmallVec<[PivotValue; 4]>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotFilter {
    values: FxHashMap<String, AcceptedValues>,
}

impl PivotFilter {
    pub fn new() -> Self {
        PivotFilter::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Replaces the accepted values for `column_id`.
    /// An empty set rejects every row.
    pub fn set<I>(&mut self, column_id: impl Into<String>, accepted: I)
    where
        I: IntoIterator<Item = PivotValue>,
    {
        let mut accepted: AcceptedValues = accepted.into_iter().collect();
        accepted.sort();
        accepted.dedup();
        self.values.insert(column_id.into(), accepted);
    }

    /// Accepts exactly one value for `column_id`.
    pub fn set_value(&mut self, column_id: impl Into<String>, value: impl Into<PivotValue>) {
        self.set(column_id, std::iter::once(value.into()));
    }

    /// Builder form of `set_value`.
    pub fn with_value(mut self, column_id: impl Into<String>, value: impl Into<PivotValue>) -> Self {
        self.set_value(column_id, value);
        self
    }

    pub fn remove(&mut self, column_id: &str) -> Option<AcceptedValues> {
        self.values.remove(column_id)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn get(&self, column_id: &str) -> Option<&[PivotValue]> {
        self.values.get(column_id).map(|v| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PivotValue])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Whether the row satisfies every entry.
    pub fn accepts<T>(&self, row: &Row<T>) -> bool {
        self.values
            .iter()
            .all(|(column_id, accepted)| accepted.contains(row.value(column_id)))
    }

    /// A copy without the entries whose column id matches `drop`.
    pub fn without_keys<F>(&self, drop: F) -> PivotFilter
    where
        F: Fn(&str) -> bool,
    {
        PivotFilter {
            values: self
                .values
                .iter()
                .filter(|(k, _)| !drop(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn row(cells: &[(&str, PivotValue)]) -> Row<()> {
        let values: FxHashMap<String, PivotValue> =
            cells.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        Row::new(values, None)
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = PivotFilter::new();
        assert!(filter.accepts(&row(&[("a", PivotValue::Integer(1))])));
    }

    #[test]
    fn test_membership() {
        let mut filter = PivotFilter::new();
        filter.set("region", [PivotValue::text("North"), PivotValue::text("South")]);
        assert!(filter.accepts(&row(&[("region", PivotValue::text("South"))])));
        assert!(!filter.accepts(&row(&[("region", PivotValue::text("East"))])));
        // absent cell is Empty
        assert!(!filter.accepts(&row(&[])));
    }

    #[test]
    fn test_every_entry_must_match() {
        let filter = PivotFilter::new()
            .with_value("a", 1i64)
            .with_value("b", "x");
        assert!(filter.accepts(&row(&[("a", PivotValue::Integer(1)), ("b", PivotValue::text("x"))])));
        assert!(!filter.accepts(&row(&[("a", PivotValue::Integer(1)), ("b", PivotValue::text("y"))])));
    }

    #[test]
    fn test_empty_set_rejects() {
        let mut filter = PivotFilter::new();
        filter.set("a", std::iter::empty());
        assert!(!filter.accepts(&row(&[("a", PivotValue::Integer(1))])));
    }

    #[test]
    fn test_without_keys() {
        let filter = PivotFilter::new()
            .with_value("dynamic-1-sum", 1i64)
            .with_value("region", "North");
        let stripped = filter.without_keys(|k| k.starts_with("dynamic-"));
        assert_eq!(stripped.len(), 1);
        assert!(stripped.get("region").is_some());
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn test_remove_clear_and_iter() {
        let mut filter = PivotFilter::new()
            .with_value("a", 1i64)
            .with_value("b", "x");
        let mut entries: Vec<(&str, usize)> = filter.iter().map(|(k, v)| (k, v.len())).collect();
        entries.sort();
        assert_eq!(entries, vec![("a", 1), ("b", 1)]);

        let removed = filter.remove("a").unwrap();
        assert_eq!(removed.as_slice(), &[PivotValue::Integer(1)]);
        assert!(filter.remove("a").is_none());
        assert!(filter.accepts(&row(&[("b", PivotValue::text("x"))])));

        filter.clear();
        assert!(filter.is_empty());
        assert!(filter.accepts(&row(&[("b", PivotValue::text("y"))])));
    }
}
