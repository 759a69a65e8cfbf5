//! Filter and sort specifications.
//!
//! A `FilterSpec` is a single-field predicate tagged keep/exclude; specs
//! apply left-to-right, AND-accumulating a row mask. A `SortSpec` is an
//! ordered list of (field, ascending) keys; the first entry is the
//! primary key.

use serde::{Deserialize, Serialize};

use reltab_core::error::Result;
use reltab_core::value::{ColumnValues, Value};
use reltab_fields::FieldDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Field value equals the reference under the field's descriptor.
    Equals(Value),
    /// Field value differs from the reference.
    NotEquals(Value),
    /// Field value equals any of the references.
    OneOf(Vec<Value>),
    /// Three-way comparison against the reference.
    Cmp(CmpOp, Value),
    /// Field value is non-empty (NaN, "", [] all count as empty).
    NonEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterAction {
    Keep,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub field: String,
    pub predicate: Predicate,
    pub action: FilterAction,
}

impl FilterSpec {
    pub fn keep(field: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            field: field.into(),
            predicate,
            action: FilterAction::Keep,
        }
    }

    pub fn exclude(field: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            field: field.into(),
            predicate,
            action: FilterAction::Exclude,
        }
    }

    /// Per-row hit mask over the one field the spec references. The
    /// keep/exclude tag is already folded in.
    pub fn evaluate(&self, descriptor: &FieldDescriptor, values: &ColumnValues) -> Result<Vec<bool>> {
        let mut hits = match &self.predicate {
            Predicate::Equals(r) => descriptor.equal_to(values, r)?,
            Predicate::NotEquals(r) => {
                let mut eq = descriptor.equal_to(values, r)?;
                for b in eq.iter_mut() {
                    *b = !*b;
                }
                eq
            }
            Predicate::OneOf(refs) => {
                let mut acc = vec![false; values.len()];
                for r in refs {
                    for (a, b) in acc.iter_mut().zip(descriptor.equal_to(values, r)?) {
                        *a |= b;
                    }
                }
                acc
            }
            Predicate::Cmp(op, r) => {
                let signs = descriptor.compare(values, r)?;
                signs
                    .into_iter()
                    .map(|s| match op {
                        CmpOp::Lt => s < 0,
                        CmpOp::Le => s <= 0,
                        CmpOp::Gt => s > 0,
                        CmpOp::Ge => s >= 0,
                    })
                    .collect()
            }
            Predicate::NonEmpty => (0..values.len())
                .map(|r| !values.value_at(r).is_empty())
                .collect(),
        };
        if self.action == FilterAction::Exclude {
            for b in hits.iter_mut() {
                *b = !*b;
            }
        }
        Ok(hits)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKeySpec {
    pub field: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub keys: Vec<SortKeySpec>,
}

impl SortSpec {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            keys: vec![SortKeySpec {
                field: field.into(),
                ascending: true,
            }],
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            keys: vec![SortKeySpec {
                field: field.into(),
                ascending: false,
            }],
        }
    }

    pub fn then_ascending(mut self, field: impl Into<String>) -> Self {
        self.keys.push(SortKeySpec {
            field: field.into(),
            ascending: true,
        });
        self
    }

    pub fn then_descending(mut self, field: impl Into<String>) -> Self {
        self.keys.push(SortKeySpec {
            field: field.into(),
            ascending: false,
        });
        self
    }
}
