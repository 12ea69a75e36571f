//! FILENAME: tests/common/mod.rs
//! Fixtures shared by the pivot integration tests.

#![allow(dead_code)]

use pivot_crosstab::{
    Aggregate, AggregateFunction, GroupBy, PivotFilter, PivotProperty, PivotResult, PivotSource,
    PivotValue, Result, Row,
};
use pivot_crosstab::InMemoryPivot;

/// Builds an owned-string id list.
pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// NUMBERS
// ============================================================================

pub fn numbers() -> Vec<i64> {
    vec![0, 1, 2, 3, 4]
}

pub fn identity() -> PivotProperty<i64> {
    PivotProperty::new("identity", |v: &i64| PivotValue::Integer(*v))
}

// ============================================================================
// ASSET EXCEPTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AssetException {
    pub exception_number: i64,
    pub asset_class: &'static str,
    pub coupon_type: &'static str,
}

pub fn asset_exceptions() -> Vec<AssetException> {
    let data = [
        ("Common Stock", "N/A"),
        ("Common Stock", "N/A"),
        ("Muni", "Fixed"),
        ("Muni", "Floating"),
        ("Muni", "Floating"),
        ("Corp Debt", "Fixed"),
        ("Corp Debt", "Fixed"),
        ("Corp Debt", "Floating"),
        ("Corp Debt", "Floating"),
    ];
    data.iter()
        .enumerate()
        .map(|(i, &(asset_class, coupon_type))| AssetException {
            exception_number: i as i64 + 1,
            asset_class,
            coupon_type,
        })
        .collect()
}

pub fn exceptions_count() -> Aggregate<AssetException> {
    Aggregate::new(
        "count",
        PivotProperty::new("Exceptions", |e: &AssetException| PivotValue::Integer(e.exception_number)),
        AggregateFunction::Count,
    )
}

pub fn by_coupon_type() -> GroupBy<AssetException> {
    GroupBy::new(
        "coupon",
        PivotProperty::new("Coupon Type", |e: &AssetException| PivotValue::from(e.coupon_type)),
    )
}

pub fn by_asset_class() -> GroupBy<AssetException> {
    GroupBy::new(
        "asset",
        PivotProperty::new("Asset Class", |e: &AssetException| PivotValue::from(e.asset_class)),
    )
}

// ============================================================================
// SALES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub region: &'static str,
    pub product: &'static str,
    pub quarter: &'static str,
    pub amount: f64,
}

pub fn sales() -> Vec<Sale> {
    let data = [
        ("North", "Apples", "Q1", 100.0),
        ("North", "Apples", "Q2", 120.0),
        ("North", "Oranges", "Q1", 150.0),
        ("South", "Apples", "Q1", 200.0),
        ("South", "Oranges", "Q2", 250.0),
        ("South", "Oranges", "Q3", 50.0),
        ("East", "Pears", "Q3", 75.0),
        ("East", "Apples", "Q1", 10.0),
    ];
    data.iter()
        .map(|&(region, product, quarter, amount)| Sale { region, product, quarter, amount })
        .collect()
}

pub fn by_region() -> GroupBy<Sale> {
    GroupBy::new("region", PivotProperty::new("Region", |s: &Sale| PivotValue::from(s.region)))
}

pub fn by_product() -> GroupBy<Sale> {
    GroupBy::new("product", PivotProperty::new("Product", |s: &Sale| PivotValue::from(s.product)))
}

pub fn by_quarter() -> GroupBy<Sale> {
    GroupBy::new("quarter", PivotProperty::new("Quarter", |s: &Sale| PivotValue::from(s.quarter)))
}

pub fn amount(id: &str, function: AggregateFunction) -> Aggregate<Sale> {
    Aggregate::new(id, PivotProperty::new("Amount", |s: &Sale| PivotValue::from(s.amount)), function)
}

// ============================================================================
// SOURCES
// ============================================================================

/// Delegates to `InMemoryPivot` but forgets the rows' source records, like
/// a source backed by pre-aggregated data would.
pub struct BeanlessPivot;

impl<T: Clone> PivotSource<T> for BeanlessPivot {
    fn compute_rows(
        &self,
        group_by: &[GroupBy<T>],
        aggregates: &[Aggregate<T>],
        grand_total_ids: &[String],
        items: &[T],
        filter: &PivotFilter,
    ) -> Result<PivotResult<T>> {
        let result = InMemoryPivot.compute_rows(group_by, aggregates, grand_total_ids, items, filter)?;
        let rows = result
            .rows
            .iter()
            .map(|r| Row::new(r.values().clone(), None))
            .collect();
        Ok(PivotResult::new(rows, result.columns, result.grand_total_values))
    }
}
