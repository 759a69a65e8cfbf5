//! The closed descriptor set and its capability methods.
//!
//! Every behavior the engine needs from a column goes through here:
//! conversion into typed storage, comparison against a reference value,
//! equality, stable sort ordering, uniqueness, cross-table match
//! matrices, and display rendering. Variants that forbid an operation
//! fail explicitly with `Unsupported` instead of guessing.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use reltab_core::error::{Error, Result};
use reltab_core::matrix::MatchMatrix;
use reltab_core::value::{ColumnValues, Value};

use crate::timecode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldDescriptor {
    /// Flat numeric column; NaN means empty.
    Scalar,
    /// Flat boolean column.
    Boolean,
    /// Per-row numeric arrays; sorts by first element, equality is deep.
    NumericVector,
    /// Per-row strings.
    Text,
    /// Epoch-second encoding floored to whole days before every
    /// comparison/sort/unique/match operation.
    Date { format: String },
    /// Epoch-second encoding, sub-day precision preserved.
    DateTime { format: String },
    /// Scalar specialization whose display buckets into significance
    /// ranges.
    PValue,
    /// Per-row opaque computed results; ordering operations forbidden.
    Output,
    /// Catch-all; sort/compare/unique/match all fail explicitly.
    Unspecified,
}

impl FieldDescriptor {
    pub fn date(format: impl Into<String>) -> Self {
        FieldDescriptor::Date {
            format: format.into(),
        }
    }

    pub fn datetime(format: impl Into<String>) -> Self {
        FieldDescriptor::DateTime {
            format: format.into(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldDescriptor::Scalar => "scalar",
            FieldDescriptor::Boolean => "boolean",
            FieldDescriptor::NumericVector => "numeric vector",
            FieldDescriptor::Text => "text",
            FieldDescriptor::Date { .. } => "date",
            FieldDescriptor::DateTime { .. } => "datetime",
            FieldDescriptor::PValue => "p-value",
            FieldDescriptor::Output => "output",
            FieldDescriptor::Unspecified => "unspecified",
        }
    }

    /// Whether the column stores as a flat matrix (numeric/bool array)
    /// rather than per-row opaque values.
    pub fn is_matrix(&self) -> bool {
        matches!(
            self,
            FieldDescriptor::Scalar
                | FieldDescriptor::Boolean
                | FieldDescriptor::Date { .. }
                | FieldDescriptor::DateTime { .. }
                | FieldDescriptor::PValue
        )
    }

    /// The fill value for rows that omit this field.
    pub fn empty_value(&self) -> Value {
        match self {
            FieldDescriptor::Boolean => Value::Bool(false),
            FieldDescriptor::Text => Value::Text(String::new()),
            FieldDescriptor::NumericVector => Value::Vector(Vec::new()),
            _ => Value::Empty,
        }
    }

    /// Type-inference predicate: can this variant represent every sample?
    pub fn can_describe(&self, values: &[Value]) -> bool {
        match self {
            FieldDescriptor::Scalar => values.iter().all(|v| match v {
                Value::Empty | Value::Number(_) | Value::Bool(_) => true,
                // Numeric strings count, so imported text columns can
                // come in typed.
                Value::Text(s) => s.is_empty() || s.trim().parse::<f64>().is_ok(),
                Value::Vector(_) => false,
            }),
            FieldDescriptor::Date { format } => values.iter().all(|v| match v {
                Value::Empty => true,
                Value::Text(s) => timecode::parse_date_strict(s, format).is_some(),
                _ => false,
            }),
            FieldDescriptor::DateTime { format } => values.iter().all(|v| match v {
                Value::Empty => true,
                Value::Text(s) => timecode::parse_timestamp(s, format).is_some(),
                _ => false,
            }),
            FieldDescriptor::NumericVector => values
                .iter()
                .all(|v| matches!(v, Value::Empty | Value::Number(_) | Value::Vector(_))),
            FieldDescriptor::Text => values
                .iter()
                .all(|v| matches!(v, Value::Empty | Value::Text(_))),
            // Never inferred; only assigned explicitly.
            FieldDescriptor::Boolean
            | FieldDescriptor::PValue
            | FieldDescriptor::Output
            | FieldDescriptor::Unspecified => false,
        }
    }

    /// Convert raw values into this descriptor's storage shape.
    pub fn convert(&self, values: &[Value]) -> Result<ColumnValues> {
        match self {
            FieldDescriptor::Scalar | FieldDescriptor::PValue => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    out.push(scalar_from_value(v)?);
                }
                Ok(ColumnValues::Numeric(out))
            }
            FieldDescriptor::Boolean => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    out.push(bool_from_value(v)?);
                }
                Ok(ColumnValues::Bools(out))
            }
            FieldDescriptor::Date { format } | FieldDescriptor::DateTime { format } => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    out.push(timestamp_from_value(v, format)?);
                }
                Ok(ColumnValues::Numeric(out))
            }
            FieldDescriptor::NumericVector => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    out.push(match v {
                        Value::Empty => Vec::new(),
                        Value::Number(n) => vec![*n],
                        Value::Vector(x) => x.clone(),
                        other => {
                            return Err(Error::TypeConversion(format!(
                                "cannot convert '{}' to a numeric vector",
                                other
                            )))
                        }
                    });
                }
                Ok(ColumnValues::Vectors(out))
            }
            FieldDescriptor::Text => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    out.push(match v {
                        Value::Empty => String::new(),
                        Value::Text(s) => s.clone(),
                        Value::Number(n) if n.is_nan() => String::new(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        Value::Vector(_) => {
                            return Err(Error::TypeConversion(
                                "cannot convert a numeric vector to text".into(),
                            ))
                        }
                    });
                }
                Ok(ColumnValues::Text(out))
            }
            FieldDescriptor::Output | FieldDescriptor::Unspecified => {
                Ok(ColumnValues::Cells(values.to_vec()))
            }
        }
    }

    /// Canonicalize a single cell through the same conversion path.
    pub fn convert_one(&self, value: &Value) -> Result<Value> {
        let col = self.convert(std::slice::from_ref(value))?;
        Ok(col.value_at(0))
    }

    /// Per-row three-way comparison against a reference: -1, 0, or 1.
    /// Incomparable pairs (either side empty) report 0.
    pub fn compare(&self, values: &ColumnValues, reference: &Value) -> Result<Vec<i8>> {
        match self {
            FieldDescriptor::Scalar | FieldDescriptor::PValue => {
                let r = numeric_reference(reference, self.kind_name())?;
                Ok(numeric_slice(values)?.iter().map(|&v| sign(v - r)).collect())
            }
            FieldDescriptor::Boolean => {
                let r = if bool_from_value(reference)? { 1.0 } else { 0.0 };
                Ok(bool_slice(values)?
                    .iter()
                    .map(|&b| sign(if b { 1.0 } else { 0.0 } - r))
                    .collect())
            }
            FieldDescriptor::Date { format } => {
                let r = timecode::floor_day(timestamp_from_value(reference, format)?);
                Ok(numeric_slice(values)?
                    .iter()
                    .map(|&v| sign(timecode::floor_day(v) - r))
                    .collect())
            }
            FieldDescriptor::DateTime { format } => {
                let r = timestamp_from_value(reference, format)?;
                Ok(numeric_slice(values)?.iter().map(|&v| sign(v - r)).collect())
            }
            FieldDescriptor::Text => {
                let r = text_reference(reference)?;
                Ok(text_slice(values)?
                    .iter()
                    .map(|v| match v.as_str().cmp(r) {
                        Ordering::Less => -1,
                        Ordering::Equal => 0,
                        Ordering::Greater => 1,
                    })
                    .collect())
            }
            FieldDescriptor::NumericVector
            | FieldDescriptor::Output
            | FieldDescriptor::Unspecified => Err(Error::Unsupported("compare", self.kind_name())),
        }
    }

    /// Per-row equality against a reference value.
    pub fn equal_to(&self, values: &ColumnValues, reference: &Value) -> Result<Vec<bool>> {
        match self {
            FieldDescriptor::Scalar | FieldDescriptor::PValue => {
                let r = numeric_reference(reference, self.kind_name())?;
                Ok(numeric_slice(values)?.iter().map(|&v| v == r).collect())
            }
            FieldDescriptor::Boolean => {
                let r = bool_from_value(reference)?;
                Ok(bool_slice(values)?.iter().map(|&b| b == r).collect())
            }
            FieldDescriptor::Date { format } => {
                let r = timecode::floor_day(timestamp_from_value(reference, format)?);
                Ok(numeric_slice(values)?
                    .iter()
                    .map(|&v| time_eq(timecode::floor_day(v), r))
                    .collect())
            }
            FieldDescriptor::DateTime { format } => {
                let r = timestamp_from_value(reference, format)?;
                Ok(numeric_slice(values)?
                    .iter()
                    .map(|&v| time_eq(v, r))
                    .collect())
            }
            FieldDescriptor::Text => {
                let r = text_reference(reference)?;
                Ok(text_slice(values)?.iter().map(|v| v == r).collect())
            }
            FieldDescriptor::NumericVector => {
                let r: &[f64] = match reference {
                    Value::Vector(v) => v,
                    Value::Empty => &[],
                    other => {
                        return Err(Error::TypeConversion(format!(
                            "reference '{}' is not a numeric vector",
                            other
                        )))
                    }
                };
                Ok(vector_slice(values)?
                    .iter()
                    .map(|v| v.as_slice() == r)
                    .collect())
            }
            FieldDescriptor::Output | FieldDescriptor::Unspecified => {
                Err(Error::Unsupported("equality", self.kind_name()))
            }
        }
    }

    /// Per-row sort keys; empty rows map to `SortKey::Missing` which
    /// sorts last in both directions.
    pub fn sort_keys(&self, values: &ColumnValues) -> Result<Vec<SortKey>> {
        match self {
            FieldDescriptor::Scalar | FieldDescriptor::PValue | FieldDescriptor::DateTime { .. } => {
                Ok(numeric_slice(values)?.iter().map(|&v| num_key(v)).collect())
            }
            FieldDescriptor::Date { .. } => Ok(numeric_slice(values)?
                .iter()
                .map(|&v| num_key(timecode::floor_day(v)))
                .collect()),
            FieldDescriptor::Boolean => Ok(bool_slice(values)?
                .iter()
                .map(|&b| SortKey::Flag(b))
                .collect()),
            FieldDescriptor::Text => Ok(text_slice(values)?
                .iter()
                .map(|v| SortKey::Text(v.clone()))
                .collect()),
            // Vectors sort by their first element.
            FieldDescriptor::NumericVector => Ok(vector_slice(values)?
                .iter()
                .map(|v| num_key(v.first().copied().unwrap_or(f64::NAN)))
                .collect()),
            FieldDescriptor::Output | FieldDescriptor::Unspecified => {
                Err(Error::Unsupported("sort", self.kind_name()))
            }
        }
    }

    /// Stable permutation that orders the column. Usable in both
    /// directions; missing values land last either way.
    pub fn sort_order(&self, values: &ColumnValues, ascending: bool) -> Result<Vec<usize>> {
        let keys = self.sort_keys(values)?;
        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|&a, &b| keys[a].compare(&keys[b], ascending));
        Ok(order)
    }

    /// Distinct values in first-occurrence order. Scalar-family uniqueness
    /// drops NaN; dates floor first.
    pub fn unique_of(&self, values: &ColumnValues) -> Result<Vec<Value>> {
        match self {
            FieldDescriptor::Scalar | FieldDescriptor::PValue | FieldDescriptor::DateTime { .. } => {
                Ok(unique_numeric(numeric_slice(values)?, |v| v))
            }
            FieldDescriptor::Date { .. } => {
                Ok(unique_numeric(numeric_slice(values)?, timecode::floor_day))
            }
            FieldDescriptor::Boolean => {
                let mut seen = [false; 2];
                let mut out = Vec::new();
                for &b in bool_slice(values)? {
                    if !seen[b as usize] {
                        seen[b as usize] = true;
                        out.push(Value::Bool(b));
                    }
                }
                Ok(out)
            }
            FieldDescriptor::Text => {
                let mut seen = HashSet::new();
                let mut out = Vec::new();
                for s in text_slice(values)? {
                    if seen.insert(s.clone()) {
                        out.push(Value::Text(s.clone()));
                    }
                }
                Ok(out)
            }
            FieldDescriptor::NumericVector => {
                let mut seen: HashSet<Vec<u64>> = HashSet::new();
                let mut out = Vec::new();
                for v in vector_slice(values)? {
                    let bits: Vec<u64> = v.iter().map(|x| x.to_bits()).collect();
                    if seen.insert(bits) {
                        out.push(Value::Vector(v.clone()));
                    }
                }
                Ok(out)
            }
            FieldDescriptor::Output | FieldDescriptor::Unspecified => {
                Err(Error::Unsupported("unique", self.kind_name()))
            }
        }
    }

    /// Pairwise cross-table match matrix: `M[i][j]` iff `left[i]` equals
    /// `right[j]` under this descriptor. Scalars never match on NaN;
    /// dates and datetimes treat NaN as equal to NaN.
    pub fn match_matrix(&self, left: &ColumnValues, right: &ColumnValues) -> Result<MatchMatrix> {
        match self {
            FieldDescriptor::Scalar | FieldDescriptor::PValue => {
                let (l, r) = (numeric_slice(left)?, numeric_slice(right)?);
                Ok(numeric_match(l, r, |a, b| a == b))
            }
            FieldDescriptor::Date { .. } => {
                let (l, r) = (numeric_slice(left)?, numeric_slice(right)?);
                Ok(numeric_match(l, r, |a, b| {
                    time_eq(timecode::floor_day(a), timecode::floor_day(b))
                }))
            }
            FieldDescriptor::DateTime { .. } => {
                let (l, r) = (numeric_slice(left)?, numeric_slice(right)?);
                Ok(numeric_match(l, r, time_eq))
            }
            FieldDescriptor::Boolean => {
                let (l, r) = (bool_slice(left)?, bool_slice(right)?);
                let mut m = MatchMatrix::new(l.len(), r.len());
                for (i, &a) in l.iter().enumerate() {
                    for (j, &b) in r.iter().enumerate() {
                        if a == b {
                            m.set(i, j, true);
                        }
                    }
                }
                Ok(m)
            }
            FieldDescriptor::Text => {
                let (l, r) = (text_slice(left)?, text_slice(right)?);
                let mut m = MatchMatrix::new(l.len(), r.len());
                for (i, a) in l.iter().enumerate() {
                    for (j, b) in r.iter().enumerate() {
                        if a == b {
                            m.set(i, j, true);
                        }
                    }
                }
                Ok(m)
            }
            FieldDescriptor::NumericVector => {
                let (l, r) = (vector_slice(left)?, vector_slice(right)?);
                let mut m = MatchMatrix::new(l.len(), r.len());
                for (i, a) in l.iter().enumerate() {
                    for (j, b) in r.iter().enumerate() {
                        if a == b {
                            m.set(i, j, true);
                        }
                    }
                }
                Ok(m)
            }
            FieldDescriptor::Output | FieldDescriptor::Unspecified => {
                Err(Error::Unsupported("match", self.kind_name()))
            }
        }
    }

    /// Render every row for display/export. Infallible: unexpected
    /// storage falls back to the generic value rendering.
    pub fn display_strings(&self, values: &ColumnValues) -> Vec<String> {
        match (self, values) {
            (FieldDescriptor::Scalar, ColumnValues::Numeric(v)) => v
                .iter()
                .map(|&n| if n.is_nan() { String::new() } else { n.to_string() })
                .collect(),
            (FieldDescriptor::PValue, ColumnValues::Numeric(v)) => {
                v.iter().map(|&p| pvalue_bucket(p)).collect()
            }
            (FieldDescriptor::Date { format }, ColumnValues::Numeric(v)) => v
                .iter()
                .map(|&n| timecode::format_timestamp(timecode::floor_day(n), format))
                .collect(),
            (FieldDescriptor::DateTime { format }, ColumnValues::Numeric(v)) => v
                .iter()
                .map(|&n| timecode::format_timestamp(n, format))
                .collect(),
            (FieldDescriptor::Boolean, ColumnValues::Bools(v)) => {
                v.iter().map(|b| b.to_string()).collect()
            }
            (FieldDescriptor::Text, ColumnValues::Text(v)) => v.clone(),
            _ => values.to_values().iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Comparable key for one row of one column, with missing-last ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Missing,
    Num(f64),
    Flag(bool),
    Text(String),
}

impl SortKey {
    /// Total order usable ascending and descending; `Missing` sorts last
    /// in both directions.
    pub fn compare(&self, other: &SortKey, ascending: bool) -> Ordering {
        use SortKey::*;
        match (self, other) {
            (Missing, Missing) => Ordering::Equal,
            (Missing, _) => Ordering::Greater,
            (_, Missing) => Ordering::Less,
            (a, b) => {
                let ord = match (a, b) {
                    (Num(x), Num(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
                    (Flag(x), Flag(y)) => x.cmp(y),
                    (Text(x), Text(y)) => x.cmp(y),
                    // Same descriptor yields one key variant per column.
                    _ => Ordering::Equal,
                };
                if ascending {
                    ord
                } else {
                    ord.reverse()
                }
            }
        }
    }
}

fn num_key(v: f64) -> SortKey {
    if v.is_nan() {
        SortKey::Missing
    } else {
        SortKey::Num(v)
    }
}

fn sign(d: f64) -> i8 {
    if d.is_nan() || d == 0.0 {
        0
    } else if d > 0.0 {
        1
    } else {
        -1
    }
}

fn time_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn scalar_from_value(v: &Value) -> Result<f64> {
    match v {
        Value::Vector(x) if x.len() == 1 => Ok(x[0]),
        Value::Vector(_) => Err(Error::TypeConversion(
            "cannot convert a multi-element vector to a scalar".into(),
        )),
        other => other.to_f64().ok_or_else(|| {
            Error::TypeConversion(format!("cannot convert '{}' to a scalar", other))
        }),
    }
}

fn bool_from_value(v: &Value) -> Result<bool> {
    match v {
        Value::Empty => Ok(false),
        Value::Bool(b) => Ok(*b),
        // NaN converts to false, any other non-zero numeric to true.
        Value::Number(n) => Ok(!n.is_nan() && *n != 0.0),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "n" | "no" | "false" | "0" => Ok(false),
            "y" | "yes" | "true" | "1" => Ok(true),
            other => Err(Error::TypeConversion(format!(
                "cannot convert '{}' to a boolean",
                other
            ))),
        },
        Value::Vector(_) => Err(Error::TypeConversion(
            "cannot convert a numeric vector to a boolean".into(),
        )),
    }
}

fn timestamp_from_value(v: &Value, format: &str) -> Result<f64> {
    match v {
        Value::Empty => Ok(f64::NAN),
        Value::Number(n) => Ok(*n),
        Value::Text(s) => timecode::parse_timestamp(s, format).ok_or_else(|| {
            Error::TypeConversion(format!("cannot parse '{}' as a timestamp", s))
        }),
        other => Err(Error::TypeConversion(format!(
            "cannot convert '{}' to a timestamp",
            other
        ))),
    }
}

fn numeric_reference(reference: &Value, kind: &'static str) -> Result<f64> {
    reference.to_f64().ok_or_else(|| {
        Error::TypeConversion(format!("reference '{}' is not a {} value", reference, kind))
    })
}

fn text_reference(reference: &Value) -> Result<&str> {
    match reference {
        Value::Text(s) => Ok(s.as_str()),
        Value::Empty => Ok(""),
        other => Err(Error::TypeConversion(format!(
            "reference '{}' is not text",
            other
        ))),
    }
}

fn numeric_slice(values: &ColumnValues) -> Result<&[f64]> {
    match values {
        ColumnValues::Numeric(v) => Ok(v),
        _ => Err(Error::TypeConversion(
            "column storage is not numeric".into(),
        )),
    }
}

fn bool_slice(values: &ColumnValues) -> Result<&[bool]> {
    match values {
        ColumnValues::Bools(v) => Ok(v),
        _ => Err(Error::TypeConversion(
            "column storage is not boolean".into(),
        )),
    }
}

fn text_slice(values: &ColumnValues) -> Result<&[String]> {
    match values {
        ColumnValues::Text(v) => Ok(v),
        _ => Err(Error::TypeConversion("column storage is not text".into())),
    }
}

fn vector_slice(values: &ColumnValues) -> Result<&[Vec<f64>]> {
    match values {
        ColumnValues::Vectors(v) => Ok(v),
        _ => Err(Error::TypeConversion(
            "column storage is not per-row vectors".into(),
        )),
    }
}

fn numeric_match(l: &[f64], r: &[f64], eq: impl Fn(f64, f64) -> bool) -> MatchMatrix {
    let mut m = MatchMatrix::new(l.len(), r.len());
    for (i, &a) in l.iter().enumerate() {
        for (j, &b) in r.iter().enumerate() {
            if eq(a, b) {
                m.set(i, j, true);
            }
        }
    }
    m
}

fn unique_numeric(values: &[f64], canon: impl Fn(f64) -> f64) -> Vec<Value> {
    let mut seen: HashSet<u64> = HashSet::new();
    let mut out = Vec::new();
    for &v in values {
        let v = canon(v);
        if v.is_nan() {
            continue;
        }
        let bits = if v == 0.0 { 0.0f64 } else { v }.to_bits();
        if seen.insert(bits) {
            out.push(Value::Number(v));
        }
    }
    out
}

fn pvalue_bucket(p: f64) -> String {
    if p.is_nan() {
        String::new()
    } else if p < 0.001 {
        "<0.001".to_string()
    } else if p < 0.01 {
        "<0.01".to_string()
    } else if p < 0.05 {
        "<0.05".to_string()
    } else {
        format!("{:.2}", p)
    }
}
