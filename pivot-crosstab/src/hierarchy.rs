//! FILENAME: pivot-crosstab/src/hierarchy.rs
//! Row tree for hierarchical rendering.
//!
//! The flat rows of a result are nested by its dimension columns, outer to
//! inner. Every level but the innermost gets a summary row whose measure
//! cells are recomputed for the whole subtree; the innermost level holds
//! the result rows themselves as leaves.

use std::sync::Arc;

use log::warn;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::model::{Aggregate, GroupBy};
use crate::result::{ColumnGroupValue, PivotColumn, PivotResult, Row, SourceBeans};
use crate::value::PivotValue;

/// A node in the row tree.
pub struct RowNode<T> {
    /// A summary row for inner nodes, the result row itself for leaves.
    pub row: Row<T>,
    pub children: Vec<RowNode<T>>,
    /// 0 = outermost dimension.
    pub depth: usize,
}

impl<T> RowNode<T> {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(RowNode::node_count).sum::<usize>()
    }
}

impl<T> std::fmt::Debug for RowNode<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowNode")
            .field("row", &self.row)
            .field("children", &self.children)
            .field("depth", &self.depth)
            .finish()
    }
}

/// Builds the row tree of `result`. Without dimension columns every row is a
/// root leaf.
pub fn build_row_tree<T>(result: &PivotResult<T>) -> Result<Vec<RowNode<T>>> {
    let dimensions: Vec<&PivotColumn<T>> = result.columns.iter().filter(|c| c.is_row_group()).collect();
    let rows: Vec<&Row<T>> = result.rows.iter().collect();
    let has_dynamic_columns = result
        .columns
        .iter()
        .any(|c| matches!(c.column_group_value, Some(ColumnGroupValue::Value(_))));
    if has_dynamic_columns && result.top_group().is_none() {
        warn!(
            target: "pivot",
            "row tree: result has column-grouped cells but no top group; summary cells are recombined from row cells"
        );
    }
    let builder = TreeBuilder {
        dimensions,
        measures: result.columns.iter().filter(|c| c.is_aggregate()).collect(),
        top_group: result.top_group(),
    };
    if builder.dimensions.is_empty() {
        return Ok(rows.into_iter().map(|r| leaf(r, 0)).collect());
    }
    builder.build_level(0, &rows)
}

fn leaf<T>(row: &Row<T>, depth: usize) -> RowNode<T> {
    RowNode {
        row: row.clone(),
        children: Vec::new(),
        depth,
    }
}

struct TreeBuilder<'a, T> {
    dimensions: Vec<&'a PivotColumn<T>>,
    measures: Vec<&'a PivotColumn<T>>,
    top_group: Option<&'a GroupBy<T>>,
}

impl<'a, T> TreeBuilder<'a, T> {
    fn build_level(&self, level: usize, rows: &[&Row<T>]) -> Result<Vec<RowNode<T>>> {
        let column_id = &self.dimensions[level].id;

        // group by this level's value, first-seen order
        let mut index: FxHashMap<&PivotValue, usize> = FxHashMap::default();
        let mut groups: Vec<Vec<&Row<T>>> = Vec::new();
        for &row in rows {
            let value = row.value(column_id);
            match index.get(value) {
                Some(&i) => groups[i].push(row),
                None => {
                    index.insert(value, groups.len());
                    groups.push(vec![row]);
                }
            }
        }

        if level + 1 == self.dimensions.len() {
            return Ok(groups.into_iter().flatten().map(|r| leaf(r, level)).collect());
        }

        let mut nodes = Vec::with_capacity(groups.len());
        for group in groups {
            let children = self.build_level(level + 1, &group)?;
            nodes.push(RowNode {
                row: self.summary_row(level, &group)?,
                children,
                depth: level,
            });
        }
        Ok(nodes)
    }

    /// The dimension values up to `level` plus recomputed measure cells.
    fn summary_row(&self, level: usize, rows: &[&Row<T>]) -> Result<Row<T>> {
        let mut values: FxHashMap<String, PivotValue> = FxHashMap::default();
        for dimension in &self.dimensions[..=level] {
            values.insert(dimension.id.clone(), rows[0].value(&dimension.id).clone());
        }

        let beans = all_beans(rows);

        // grand-total columns depend on the dynamic cells, so they go last
        let mut grand_total_columns = Vec::new();
        for column in &self.measures {
            let Some(aggregate) = column.aggregate() else {
                continue;
            };
            let value = match &column.column_group_value {
                Some(ColumnGroupValue::GrandTotal(_)) => {
                    grand_total_columns.push((*column, aggregate));
                    continue;
                }
                Some(ColumnGroupValue::Value(group_value)) => match (&beans, self.top_group) {
                    (Some(beans), Some(top)) => {
                        let matching: Vec<&T> = beans
                            .iter()
                            .map(|b| &**b)
                            .filter(|b| top.value(b) == *group_value)
                            .collect();
                        if matching.is_empty() {
                            None
                        } else {
                            Some(aggregate.compute_aggregated_value(matching)?)
                        }
                    }
                    _ => recombine(aggregate, &column.id, rows)?,
                },
                None => match &beans {
                    Some(beans) => Some(aggregate.compute_aggregated_value(beans.iter().map(|b| &**b))?),
                    None => recombine(aggregate, &column.id, rows)?,
                },
            };
            if let Some(value) = value {
                values.insert(column.id.clone(), value);
            }
        }

        // same rule as the collapsed rows: the function over the row's
        // horizontally grouped values
        for (column, aggregate) in grand_total_columns {
            let grouped: Vec<PivotValue> = self
                .measures
                .iter()
                .filter(|c| matches!(c.column_group_value, Some(ColumnGroupValue::Value(_))))
                .filter(|c| c.aggregate().is_some_and(|a| a.id == aggregate.id))
                .filter_map(|c| values.get(&c.id).cloned())
                .collect();
            if !grouped.is_empty() {
                values.insert(column.id.clone(), aggregate.function.compute(&grouped)?);
            }
        }

        Ok(Row::new(values, beans))
    }
}

fn all_beans<T>(rows: &[&Row<T>]) -> Option<SourceBeans<T>> {
    let mut beans = Vec::new();
    for row in rows {
        beans.extend(row.source_beans()?.iter().cloned());
    }
    Some(Arc::from(beans))
}

/// Recombines the rows' cells when records are not available. `None` when
/// the function cannot do that or there is nothing to recombine.
fn recombine<T>(aggregate: &Aggregate<T>, column_id: &str, rows: &[&Row<T>]) -> Result<Option<PivotValue>> {
    if !aggregate.function.can_compute_over_aggregated_values() {
        return Ok(None);
    }
    let cells: Vec<PivotValue> = rows
        .iter()
        .filter_map(|r| r.get(column_id))
        .filter(|v| !v.is_empty())
        .cloned()
        .collect();
    if cells.is_empty() {
        return Ok(None);
    }
    aggregate.function.compute_over_aggregated_values(&cells).map(Some)
}
