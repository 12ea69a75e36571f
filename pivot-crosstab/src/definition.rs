//! FILENAME: pivot-crosstab/src/definition.rs
//! Pivot Definition - the serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a pivot computation.
//! These structures are designed to be:
//! - Serializable (saved alongside a view, sent to a UI)
//! - Free of closures: properties are referenced by catalog key
//! - Immutable snapshots of user intent, replaced wholesale on change

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::column_grouping::ColumnGroupingPivot;
use crate::error::{PivotError, Result};
use crate::filter::PivotFilter;
use crate::function::AggregateFunction;
use crate::in_memory::InMemoryPivot;
use crate::model::{Aggregate, GroupBy, PivotProperty};
use crate::result::PivotResult;
use crate::source::PivotSource;

/// Default caption of the synthetic grand-total column.
pub const DEFAULT_GRAND_TOTAL_CAPTION: &str = "Grand Total";

// ============================================================================
// PROPERTY CATALOG
// ============================================================================

/// Named properties a definition may refer to.
pub struct PropertyCatalog<T> {
    properties: FxHashMap<String, PivotProperty<T>>,
    /// Registration order, for listing.
    order: Vec<String>,
}

impl<T> Default for PropertyCatalog<T> {
    fn default() -> Self {
        PropertyCatalog {
            properties: FxHashMap::default(),
            order: Vec::new(),
        }
    }
}

impl<T> PropertyCatalog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `property` under `key`, replacing any previous one.
    pub fn register(&mut self, key: impl Into<String>, property: PivotProperty<T>) -> &mut Self {
        let key = key.into();
        if self.properties.insert(key.clone(), property).is_none() {
            self.order.push(key);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&PivotProperty<T>> {
        self.properties.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    fn resolve(&self, key: &str) -> Result<PivotProperty<T>> {
        self.get(key)
            .cloned()
            .ok_or_else(|| PivotError::InvalidArgument(format!("unknown property '{}'", key)))
    }
}

// ============================================================================
// CLAUSE DEFINITIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupByDefinition {
    /// Stable clause id; also the column id in the result.
    pub id: String,

    /// Catalog key of the grouped property.
    pub property: String,

    /// Whether this clause's values become columns.
    #[serde(default)]
    pub column_grouping: bool,

    #[serde(default)]
    pub filter_enabled: bool,
}

impl GroupByDefinition {
    pub fn new(id: impl Into<String>, property: impl Into<String>) -> Self {
        GroupByDefinition {
            id: id.into(),
            property: property.into(),
            column_grouping: false,
            filter_enabled: false,
        }
    }

    fn resolve<T>(&self, catalog: &PropertyCatalog<T>) -> Result<GroupBy<T>> {
        Ok(GroupBy::new(self.id.clone(), catalog.resolve(&self.property)?)
            .with_filter_enabled(self.filter_enabled)
            .with_column_group(self.column_grouping))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateDefinition {
    pub id: String,

    /// Catalog key of the aggregated property.
    pub property: String,

    #[serde(default)]
    pub function: AggregateFunction,

    #[serde(default)]
    pub filter_enabled: bool,
}

impl AggregateDefinition {
    pub fn new(id: impl Into<String>, property: impl Into<String>, function: AggregateFunction) -> Self {
        AggregateDefinition {
            id: id.into(),
            property: property.into(),
            function,
            filter_enabled: false,
        }
    }

    fn resolve<T>(&self, catalog: &PropertyCatalog<T>) -> Result<Aggregate<T>> {
        Ok(Aggregate::new(self.id.clone(), catalog.resolve(&self.property)?, self.function)
            .with_filter_enabled(self.filter_enabled))
    }
}

/// Which aggregates get a footer grand total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GrandTotals {
    #[default]
    All,
    None,
    Only(Vec<String>),
}

fn default_grand_total_column() -> Option<String> {
    Some(DEFAULT_GRAND_TOTAL_CAPTION.to_string())
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete, serializable definition of one pivot computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotDefinition {
    /// Group-by clauses, outer to inner.
    #[serde(default)]
    pub group_by: Vec<GroupByDefinition>,

    #[serde(default)]
    pub aggregates: Vec<AggregateDefinition>,

    #[serde(default)]
    pub grand_totals: GrandTotals,

    /// Caption of the synthetic grand-total column; `None` hides it.
    #[serde(default = "default_grand_total_column")]
    pub grand_total_column: Option<String>,

    #[serde(default)]
    pub filter: PivotFilter,
}

impl Default for PivotDefinition {
    fn default() -> Self {
        PivotDefinition {
            group_by: Vec::new(),
            aggregates: Vec::new(),
            grand_totals: GrandTotals::All,
            grand_total_column: default_grand_total_column(),
            filter: PivotFilter::new(),
        }
    }
}

impl PivotDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The column-grouping clause definition, if any.
    pub fn top_group(&self) -> Option<&GroupByDefinition> {
        self.group_by.iter().find(|g| g.column_grouping)
    }

    pub fn grand_total_ids(&self) -> Vec<String> {
        match &self.grand_totals {
            GrandTotals::All => self.aggregates.iter().map(|a| a.id.clone()).collect(),
            GrandTotals::None => Vec::new(),
            GrandTotals::Only(ids) => ids.clone(),
        }
    }

    /// Turns the definition into clauses, looking properties up in `catalog`.
    pub fn resolve<T>(&self, catalog: &PropertyCatalog<T>) -> Result<(Vec<GroupBy<T>>, Vec<Aggregate<T>>)> {
        let group_by = self
            .group_by
            .iter()
            .map(|g| g.resolve(catalog))
            .collect::<Result<Vec<_>>>()?;
        let aggregates = self
            .aggregates
            .iter()
            .map(|a| a.resolve(catalog))
            .collect::<Result<Vec<_>>>()?;
        Ok((group_by, aggregates))
    }

    /// Runs the full pipeline: column grouping over the in-memory engine.
    pub fn compute<T: Clone>(&self, catalog: &PropertyCatalog<T>, items: &[T]) -> Result<PivotResult<T>> {
        let (group_by, aggregates) = self.resolve(catalog)?;
        let pivot = ColumnGroupingPivot::new::<T>(InMemoryPivot::new(), self.grand_total_column.clone())?;
        pivot.compute_rows(&group_by, &aggregates, &self.grand_total_ids(), items, &self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PivotValue;

    #[test]
    fn test_defaults_from_minimal_json() {
        let def = PivotDefinition::from_json(r#"{ "aggregates": [ { "id": "s", "property": "x" } ] }"#).unwrap();
        assert_eq!(def.aggregates[0].function, AggregateFunction::Sum);
        assert_eq!(def.grand_totals, GrandTotals::All);
        assert_eq!(def.grand_total_column.as_deref(), Some("Grand Total"));
        assert_eq!(def.grand_total_ids(), vec!["s".to_string()]);
    }

    #[test]
    fn test_json_round_trip_keeps_filter() {
        let mut def = PivotDefinition::new();
        def.group_by.push(GroupByDefinition::new("g", "x"));
        def.filter.set_value("g", 3i64);
        def.grand_totals = GrandTotals::None;
        let back = PivotDefinition::from_json(&def.to_json().unwrap()).unwrap();
        assert_eq!(back, def);
        assert_eq!(back.filter.get("g"), Some(&[PivotValue::Integer(3)][..]));
    }

    #[test]
    fn test_grand_totals_selection() {
        let mut def = PivotDefinition::new();
        def.aggregates.push(AggregateDefinition::new("s", "x", AggregateFunction::Sum));
        def.aggregates.push(AggregateDefinition::new("c", "x", AggregateFunction::Count));

        def.grand_totals = GrandTotals::Only(vec!["c".to_string()]);
        assert_eq!(def.grand_total_ids(), vec!["c".to_string()]);

        let mut catalog: PropertyCatalog<i64> = PropertyCatalog::new();
        catalog.register("x", PivotProperty::new("X", |v: &i64| PivotValue::Integer(*v)));
        let result = def.compute(&catalog, &[1, 2, 3]).unwrap();
        assert_eq!(result.grand_total_values.len(), 1);
        assert_eq!(result.grand_total("c"), Some(&PivotValue::Integer(3)));

        def.grand_totals = GrandTotals::None;
        assert!(def.grand_total_ids().is_empty());
        assert!(!def.compute(&catalog, &[1, 2, 3]).unwrap().has_grand_totals());
    }

    #[test]
    fn test_unknown_property() {
        let catalog: PropertyCatalog<i64> = PropertyCatalog::new();
        let mut def = PivotDefinition::new();
        def.group_by.push(GroupByDefinition::new("g", "missing"));
        let err = def.resolve(&catalog).unwrap_err();
        assert!(matches!(err, PivotError::InvalidArgument(msg) if msg.contains("missing")));
    }

    #[test]
    fn test_catalog_keeps_registration_order() {
        let mut catalog: PropertyCatalog<i64> = PropertyCatalog::new();
        catalog
            .register("b", PivotProperty::new("B", |v: &i64| PivotValue::Integer(*v)))
            .register("a", PivotProperty::new("A", |v: &i64| PivotValue::Integer(*v)))
            .register("b", PivotProperty::new("B2", |v: &i64| PivotValue::Integer(*v)));
        assert_eq!(catalog.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(catalog.get("b").map(|p| p.caption.as_str()), Some("B2"));
    }

    #[test]
    fn test_bad_json_is_serialization_error() {
        assert!(matches!(
            PivotDefinition::from_json("{ nope"),
            Err(PivotError::Serialization(_))
        ));
    }
}
