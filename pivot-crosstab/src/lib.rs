//! FILENAME: pivot-crosstab/src/lib.rs
//! In-memory pivot engine.
//!
//! Groups a list of records, aggregates every group, optionally turns one
//! grouping clause into columns (crosstab) and computes grand totals.
//! The output is display-agnostic; ordering and rendering are left to the
//! caller.
//!
//! Layers:
//! - `value` / `model` / `function`: how values are extracted, grouped, aggregated
//! - `in_memory`: the base engine (rows only)
//! - `column_grouping`: horizontal grouping on top of another source
//! - `result` / `hierarchy` / `render`: what the caller gets back
//! - `definition`: serializable configuration resolved against a catalog

pub mod error;
pub mod value;
pub mod function;
pub mod model;
pub mod filter;
pub mod result;
pub mod source;
pub mod in_memory;
pub mod column_grouping;
pub mod definition;
pub mod hierarchy;
pub mod render;

pub use error::{PivotError, Result};
pub use value::{OrderedFloat, PivotValue};
pub use function::AggregateFunction;
pub use model::{Aggregate, Extractor, GroupBy, PivotProperty};
pub use filter::{AcceptedValues, PivotFilter};
pub use result::{ColumnGroupValue, ColumnKind, PivotColumn, PivotResult, Row, SourceBeans};
pub use source::PivotSource;
pub use in_memory::InMemoryPivot;
pub use column_grouping::{
    dynamic_column_id, grand_total_column_id, ColumnGroupingPivot, DYNAMIC_COLUMN_PREFIX,
};
pub use definition::{
    AggregateDefinition, GrandTotals, GroupByDefinition, PivotDefinition, PropertyCatalog,
    DEFAULT_GRAND_TOTAL_CAPTION,
};
pub use hierarchy::{build_row_tree, RowNode};
pub use render::to_csv;
