//! FILENAME: pivot-crosstab/src/function.rs
//! Aggregate functions - reduce a list of values into one value.
//!
//! Every function works in two modes:
//! - `compute`: over the raw per-record values of a group
//! - `compute_over_aggregated_values`: over values that were already
//!   aggregated by this same function (used for fast grand totals)
//!
//! The second mode only exists for functions where recombining partial
//! results gives the same answer as aggregating the whole population.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{PivotError, Result};
use crate::value::PivotValue;

/// The standard set of aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunction {
    Sum,
    Average,
    Count,
    Min,
    Max,
    Median,
}

impl Default for AggregateFunction {
    fn default() -> Self {
        AggregateFunction::Sum
    }
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 6] = [
        AggregateFunction::Sum,
        AggregateFunction::Average,
        AggregateFunction::Count,
        AggregateFunction::Min,
        AggregateFunction::Max,
        AggregateFunction::Median,
    ];

    pub fn caption(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "Sum",
            AggregateFunction::Average => "Average",
            AggregateFunction::Count => "Count",
            AggregateFunction::Min => "Min",
            AggregateFunction::Max => "Max",
            AggregateFunction::Median => "Median",
        }
    }

    /// Performs the calculation on the raw values, one per record.
    ///
    /// SUM, AVERAGE and MEDIAN coerce every value to f64 and fail on
    /// anything non-numeric, including `Empty`. COUNT accepts any value.
    /// MIN and MAX return the selected input value unchanged.
    pub fn compute(&self, values: &[PivotValue]) -> Result<PivotValue> {
        let name = self.caption();
        match self {
            AggregateFunction::Sum => {
                let mut total = 0.0;
                for v in values {
                    total += v.to_f64(name)?;
                }
                Ok(PivotValue::number(total))
            }
            AggregateFunction::Average => {
                if values.is_empty() {
                    return Ok(PivotValue::number(0.0));
                }
                let mut total = 0.0;
                for v in values {
                    total += v.to_f64(name)?;
                }
                Ok(PivotValue::number(total / values.len() as f64))
            }
            AggregateFunction::Count => Ok(PivotValue::Integer(values.len() as i64)),
            AggregateFunction::Min => select_extreme(values, Ordering::Less),
            AggregateFunction::Max => select_extreme(values, Ordering::Greater),
            AggregateFunction::Median => {
                let numbers = values
                    .iter()
                    .map(|v| v.to_f64(name))
                    .collect::<Result<Vec<f64>>>()?;
                median(numbers).map(PivotValue::number)
            }
        }
    }

    /// Whether `compute_over_aggregated_values` is available.
    ///
    /// AVERAGE and MEDIAN cannot be recombined: the population size behind
    /// each partial result is unknown.
    pub fn can_compute_over_aggregated_values(&self) -> bool {
        !matches!(self, AggregateFunction::Average | AggregateFunction::Median)
    }

    /// Computes a grand total from values this function already produced.
    pub fn compute_over_aggregated_values(&self, values: &[PivotValue]) -> Result<PivotValue> {
        match self {
            AggregateFunction::Sum | AggregateFunction::Min | AggregateFunction::Max => {
                self.compute(values)
            }
            AggregateFunction::Count => {
                // counts add up; stay integral while every partial count is
                // and the total fits in i64
                let mut integral: Option<i64> = Some(0);
                let mut total = 0.0;
                for v in values {
                    total += v.to_f64("Count")?;
                    integral = match (integral, v) {
                        (Some(sum), PivotValue::Integer(i)) => sum.checked_add(*i),
                        _ => None,
                    };
                }
                Ok(integral.map_or(PivotValue::number(total), PivotValue::Integer))
            }
            AggregateFunction::Average | AggregateFunction::Median => Err(PivotError::Unsupported(
                format!("{} cannot be computed over aggregated values", self.caption()),
            )),
        }
    }
}

/// Picks the smallest (`Ordering::Less`) or largest (`Ordering::Greater`)
/// value under natural ordering; ties keep the first occurrence.
fn select_extreme(values: &[PivotValue], wanted: Ordering) -> Result<PivotValue> {
    let mut iter = values.iter();
    let mut best = iter.next().ok_or(PivotError::EmptyGroup)?;
    // a lone value still must be orderable
    best.natural_cmp(best)?;
    for v in iter {
        if v.natural_cmp(best)? == wanted {
            best = v;
        }
    }
    Ok(best.clone())
}

/// Middle value of the sorted numbers, or the mean of the two middle values
/// when the count is even.
pub fn median(mut numbers: Vec<f64>) -> Result<f64> {
    if numbers.is_empty() {
        return Err(PivotError::InvalidArgument(
            "cannot compute median on an empty collection of numbers".to_string(),
        ));
    }
    numbers.sort_by(|a, b| a.total_cmp(b));
    let middle = numbers.len() / 2;
    if numbers.len() % 2 == 0 {
        Ok(0.5 * (numbers[middle] + numbers[middle - 1]))
    } else {
        Ok(numbers[middle])
    }
}
