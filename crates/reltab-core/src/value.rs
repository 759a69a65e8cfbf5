//! Dynamic per-cell values and typed column storage.
//!
//! `Value` is the loosely-typed currency at the API boundary (row structs,
//! filter predicates, cell writes). `ColumnValues` is what a column
//! actually stores: flat numeric/bool arrays for matrix-shaped fields,
//! per-row strings/vectors/opaque cells for the rest. Field descriptors
//! decide which shape a column uses and how values are coerced into it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    Vector(Vec<f64>),
}

impl Value {
    /// Missing-data check. NaN numbers, empty strings, and empty vectors
    /// all count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Number(n) => n.is_nan(),
            Value::Bool(_) => false,
            Value::Text(s) => s.is_empty(),
            Value::Vector(v) => v.is_empty(),
        }
    }

    /// Numeric view: NaN for empty, 0/1 for bools, parsed for text.
    /// Vectors have no scalar view.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Empty => Some(f64::NAN),
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    Some(f64::NAN)
                } else {
                    t.parse::<f64>().ok()
                }
            }
            Value::Vector(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) if n.is_nan() => Ok(()),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "{}", s),
            Value::Vector(v) => {
                write!(f, "[")?;
                for (i, x) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", x)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Backing storage for one column. The variant is fixed by the column's
/// field descriptor at conversion time and never mixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValues {
    /// Flat matrix storage: scalars, booleans-as-needed, date encodings.
    Numeric(Vec<f64>),
    Bools(Vec<bool>),
    /// Per-row opaque storage.
    Text(Vec<String>),
    Vectors(Vec<Vec<f64>>),
    Cells(Vec<Value>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Bools(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Vectors(v) => v.len(),
            ColumnValues::Cells(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone out the value at `row`.
    pub fn value_at(&self, row: usize) -> Value {
        match self {
            ColumnValues::Numeric(v) => Value::Number(v[row]),
            ColumnValues::Bools(v) => Value::Bool(v[row]),
            ColumnValues::Text(v) => Value::Text(v[row].clone()),
            ColumnValues::Vectors(v) => Value::Vector(v[row].clone()),
            ColumnValues::Cells(v) => v[row].clone(),
        }
    }

    pub fn to_values(&self) -> Vec<Value> {
        (0..self.len()).map(|r| self.value_at(r)).collect()
    }

    /// Re-index: `out[k] = self[indices[k]]`. Drives both filtering and
    /// sorting; indices may repeat.
    pub fn select(&self, indices: &[usize]) -> ColumnValues {
        match self {
            ColumnValues::Numeric(v) => {
                ColumnValues::Numeric(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnValues::Bools(v) => ColumnValues::Bools(indices.iter().map(|&i| v[i]).collect()),
            ColumnValues::Text(v) => {
                ColumnValues::Text(indices.iter().map(|&i| v[i].clone()).collect())
            }
            ColumnValues::Vectors(v) => {
                ColumnValues::Vectors(indices.iter().map(|&i| v[i].clone()).collect())
            }
            ColumnValues::Cells(v) => {
                ColumnValues::Cells(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }

    /// Append another column of the same shape.
    pub fn append(&mut self, other: &ColumnValues) -> Result<()> {
        match (self, other) {
            (ColumnValues::Numeric(a), ColumnValues::Numeric(b)) => a.extend_from_slice(b),
            (ColumnValues::Bools(a), ColumnValues::Bools(b)) => a.extend_from_slice(b),
            (ColumnValues::Text(a), ColumnValues::Text(b)) => a.extend_from_slice(b),
            (ColumnValues::Vectors(a), ColumnValues::Vectors(b)) => a.extend_from_slice(b),
            (ColumnValues::Cells(a), ColumnValues::Cells(b)) => a.extend_from_slice(b),
            _ => {
                return Err(Error::Invariant(
                    "column append with mismatched storage shapes".into(),
                ))
            }
        }
        Ok(())
    }

    /// Overwrite the cell at `row` with an already-converted value.
    pub fn set(&mut self, row: usize, value: Value) -> Result<()> {
        if row >= self.len() {
            return Err(Error::Invariant(format!(
                "cell write at row {} past {} rows",
                row,
                self.len()
            )));
        }
        match (self, value) {
            (ColumnValues::Numeric(v), Value::Number(n)) => v[row] = n,
            (ColumnValues::Numeric(v), Value::Empty) => v[row] = f64::NAN,
            (ColumnValues::Bools(v), Value::Bool(b)) => v[row] = b,
            (ColumnValues::Text(v), Value::Text(s)) => v[row] = s,
            (ColumnValues::Text(v), Value::Empty) => v[row].clear(),
            (ColumnValues::Vectors(v), Value::Vector(x)) => v[row] = x,
            (ColumnValues::Vectors(v), Value::Empty) => v[row].clear(),
            (ColumnValues::Cells(v), value) => v[row] = value,
            (_, value) => {
                return Err(Error::TypeConversion(format!(
                    "value '{}' does not fit the column's storage shape",
                    value
                )))
            }
        }
        Ok(())
    }
}
