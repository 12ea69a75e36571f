//! FILENAME: pivot-crosstab/src/value.rs
//! Pivot Value - the dynamically typed value flowing through the engine.
//!
//! Property extractors produce a `PivotValue` per record. The same type is
//! used for grouping keys, aggregated cells and grand totals, so it must be:
//! - Hashable (composite grouping keys)
//! - Totally ordered (sorting distinct column-group values)
//! - Displayable (dynamic column ids embed the group value)

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PivotError, Result};

// ============================================================================
// ORDERED FLOAT
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // -0.0 == 0.0, so both must hash alike
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// Total order; NaN sorts after every other number.
    fn total_cmp(&self, other: &Self) -> Ordering {
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal),
        }
    }
}

// ============================================================================
// PIVOT VALUE
// ============================================================================

/// A single value extracted from a record or computed by an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PivotValue {
    /// Absent value.
    #[default]
    Empty,
    Integer(i64),
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
}

impl PivotValue {
    pub fn number(value: f64) -> Self {
        PivotValue::Number(OrderedFloat(value))
    }

    pub fn text(s: impl Into<String>) -> Self {
        PivotValue::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PivotValue::Empty)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PivotValue::Integer(_) | PivotValue::Number(_))
    }

    /// The numeric value, if this is an integer or a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PivotValue::Integer(i) => Some(*i as f64),
            PivotValue::Number(n) => Some(n.0),
            _ => None,
        }
    }

    /// Coerces to floating point for the numeric aggregates.
    /// `function` names the caller in the error.
    pub fn to_f64(&self, function: &'static str) -> Result<f64> {
        self.as_f64().ok_or_else(|| PivotError::TypeMismatch {
            function,
            value: self.clone(),
        })
    }

    /// Natural ordering between two values of comparable kinds.
    ///
    /// Integers and numbers compare numerically with each other; text and
    /// booleans only compare with their own kind. Empty compares with nothing.
    pub fn natural_cmp(&self, other: &PivotValue) -> Result<Ordering> {
        let incomparable = || PivotError::Incomparable {
            left: self.clone(),
            right: other.clone(),
        };
        match (self, other) {
            (PivotValue::Integer(a), PivotValue::Integer(b)) => Ok(a.cmp(b)),
            (PivotValue::Text(a), PivotValue::Text(b)) => Ok(a.cmp(b)),
            (PivotValue::Boolean(a), PivotValue::Boolean(b)) => Ok(a.cmp(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                x.partial_cmp(&y).ok_or_else(incomparable)
            }
            _ => Err(incomparable()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            PivotValue::Empty => 0,
            PivotValue::Integer(_) | PivotValue::Number(_) => 1,
            PivotValue::Text(_) => 2,
            PivotValue::Boolean(_) => 3,
        }
    }
}

/// Total order used for sorting: Empty < numbers < text < booleans.
impl Ord for PivotValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PivotValue::Empty, PivotValue::Empty) => Ordering::Equal,
            (PivotValue::Integer(a), PivotValue::Integer(b)) => a.cmp(b),
            (PivotValue::Number(a), PivotValue::Number(b)) => a.total_cmp(b),
            (PivotValue::Integer(a), PivotValue::Number(b)) => {
                OrderedFloat(*a as f64).total_cmp(b).then(Ordering::Less)
            }
            (PivotValue::Number(a), PivotValue::Integer(b)) => {
                a.total_cmp(&OrderedFloat(*b as f64)).then(Ordering::Greater)
            }
            (PivotValue::Text(a), PivotValue::Text(b)) => a.cmp(b),
            (PivotValue::Boolean(a), PivotValue::Boolean(b)) => a.cmp(b),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }
}

impl PartialOrd for PivotValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PivotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PivotValue::Empty => write!(f, "null"),
            PivotValue::Integer(i) => write!(f, "{}", i),
            // keeps the fraction of integral floats, so 1.0 and 1 differ
            PivotValue::Number(n) => write!(f, "{:?}", n.0),
            PivotValue::Text(s) => write!(f, "{}", s),
            PivotValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<i64> for PivotValue {
    fn from(value: i64) -> Self {
        PivotValue::Integer(value)
    }
}

impl From<i32> for PivotValue {
    fn from(value: i32) -> Self {
        PivotValue::Integer(value as i64)
    }
}

impl From<u32> for PivotValue {
    fn from(value: u32) -> Self {
        PivotValue::Integer(value as i64)
    }
}

impl From<usize> for PivotValue {
    fn from(value: usize) -> Self {
        PivotValue::Integer(value as i64)
    }
}

impl From<f64> for PivotValue {
    fn from(value: f64) -> Self {
        PivotValue::number(value)
    }
}

impl From<f32> for PivotValue {
    fn from(value: f32) -> Self {
        PivotValue::number(value as f64)
    }
}

impl From<bool> for PivotValue {
    fn from(value: bool) -> Self {
        PivotValue::Boolean(value)
    }
}

impl From<&str> for PivotValue {
    fn from(value: &str) -> Self {
        PivotValue::Text(value.to_string())
    }
}

impl From<String> for PivotValue {
    fn from(value: String) -> Self {
        PivotValue::Text(value)
    }
}

impl From<&String> for PivotValue {
    fn from(value: &String) -> Self {
        PivotValue::Text(value.clone())
    }
}

impl<V: Into<PivotValue>> From<Option<V>> for PivotValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(PivotValue::Empty, Into::into)
    }
}
