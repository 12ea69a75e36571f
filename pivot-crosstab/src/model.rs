//! FILENAME: pivot-crosstab/src/model.rs
//! Clause model - how a record is grouped and aggregated.
//!
//! These are immutable descriptors built by configuration code. "with"-style
//! methods return new values that keep the `id`, which is the identity used
//! for row cells, filter keys and column lookup.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{PivotError, Result};
use crate::function::AggregateFunction;
use crate::value::PivotValue;

/// Extracts one value out of a record.
pub type Extractor<T> = Arc<dyn Fn(&T) -> PivotValue + Send + Sync>;

// ============================================================================
// PROPERTY
// ============================================================================

/// One pivotable property: a caption plus the value extractor.
pub struct PivotProperty<T> {
    pub caption: String,
    extractor: Extractor<T>,
}

impl<T> PivotProperty<T> {
    pub fn new<F>(caption: impl Into<String>, extractor: F) -> Self
    where
        F: Fn(&T) -> PivotValue + Send + Sync + 'static,
    {
        PivotProperty {
            caption: caption.into(),
            extractor: Arc::new(extractor),
        }
    }

    /// Returns the value of this property for the given record.
    pub fn value(&self, item: &T) -> PivotValue {
        (self.extractor)(item)
    }
}

impl<T> Clone for PivotProperty<T> {
    fn clone(&self) -> Self {
        PivotProperty {
            caption: self.caption.clone(),
            extractor: Arc::clone(&self.extractor),
        }
    }
}

impl<T> fmt::Debug for PivotProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PivotProperty")
            .field("caption", &self.caption)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// GROUP BY
// ============================================================================

/// A grouping clause. All records with the same value of `property` land in
/// the same group.
pub struct GroupBy<T> {
    pub id: String,
    pub property: PivotProperty<T>,
    /// If true, the distinct values become output columns instead of rows.
    pub column_grouping: bool,
    filter_enabled: bool,
}

impl<T> GroupBy<T> {
    pub fn new(id: impl Into<String>, property: PivotProperty<T>) -> Self {
        GroupBy {
            id: id.into(),
            property,
            column_grouping: false,
            filter_enabled: false,
        }
    }

    pub fn caption(&self) -> &str {
        &self.property.caption
    }

    pub fn value(&self, item: &T) -> PivotValue {
        self.property.value(item)
    }

    pub fn as_column_group(&self) -> Self {
        self.with_column_group(true)
    }

    /// A column group cannot be filtered on, so enabling column grouping
    /// also disables the filter.
    pub fn with_column_group(&self, column_group: bool) -> Self {
        GroupBy {
            id: self.id.clone(),
            property: self.property.clone(),
            column_grouping: column_group,
            filter_enabled: !column_group && self.filter_enabled,
        }
    }

    pub fn with_filter_enabled(&self, enabled: bool) -> Self {
        GroupBy {
            id: self.id.clone(),
            property: self.property.clone(),
            column_grouping: self.column_grouping,
            filter_enabled: enabled,
        }
    }

    pub fn is_filter_enabled(&self) -> bool {
        self.filter_enabled
    }
}

impl<T> Clone for GroupBy<T> {
    fn clone(&self) -> Self {
        GroupBy {
            id: self.id.clone(),
            property: self.property.clone(),
            column_grouping: self.column_grouping,
            filter_enabled: self.filter_enabled,
        }
    }
}

impl<T> PartialEq for GroupBy<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for GroupBy<T> {}

impl<T> Hash for GroupBy<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for GroupBy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupBy")
            .field("id", &self.id)
            .field("column_grouping", &self.column_grouping)
            .field("property", &self.property)
            .finish()
    }
}

// ============================================================================
// AGGREGATE
// ============================================================================

/// An aggregate clause: computes one value out of a group of records.
pub struct Aggregate<T> {
    /// Key of the computed value in a `Row`.
    pub id: String,
    pub property: PivotProperty<T>,
    pub function: AggregateFunction,
    filter_enabled: bool,
}

impl<T> Aggregate<T> {
    pub fn new(id: impl Into<String>, property: PivotProperty<T>, function: AggregateFunction) -> Self {
        Aggregate {
            id: id.into(),
            property,
            function,
            filter_enabled: false,
        }
    }

    /// Computes the aggregated value over a non-empty list of records.
    pub fn compute_aggregated_value<'a, I>(&self, items: I) -> Result<PivotValue>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let values: Vec<PivotValue> = items.into_iter().map(|item| self.property.value(item)).collect();
        if values.is_empty() {
            return Err(PivotError::EmptyGroup);
        }
        self.function.compute(&values)
    }

    /// e.g. "Sales (Sum)".
    pub fn caption(&self) -> String {
        format!("{} ({})", self.property.caption, self.function.caption())
    }

    pub fn with_function(&self, function: AggregateFunction) -> Self {
        Aggregate {
            id: self.id.clone(),
            property: self.property.clone(),
            function,
            filter_enabled: self.filter_enabled,
        }
    }

    pub fn with_filter_enabled(&self, enabled: bool) -> Self {
        Aggregate {
            id: self.id.clone(),
            property: self.property.clone(),
            function: self.function,
            filter_enabled: enabled,
        }
    }

    pub fn is_filter_enabled(&self) -> bool {
        self.filter_enabled
    }
}

impl<T> Clone for Aggregate<T> {
    fn clone(&self) -> Self {
        Aggregate {
            id: self.id.clone(),
            property: self.property.clone(),
            function: self.function,
            filter_enabled: self.filter_enabled,
        }
    }
}

impl<T> PartialEq for Aggregate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Aggregate<T> {}

impl<T> Hash for Aggregate<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Aggregate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregate")
            .field("id", &self.id)
            .field("property", &self.property)
            .field("function", &self.function)
            .finish()
    }
}
