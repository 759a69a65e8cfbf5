//! Relationship declarations and match-matrix computation.

use serde::{Deserialize, Serialize};

use reltab_core::error::{Error, Result};
use reltab_core::matrix::MatchMatrix;
use reltab_table::Table;

/// Default foreign-key naming: camelCase(otherEntryName + keyFieldName),
/// e.g. entry "sample" with key "id" references as "sampleId".
pub fn default_foreign_key(entry_name: &str, key_field: &str) -> String {
    let mut out = String::with_capacity(entry_name.len() + key_field.len());
    out.push_str(entry_name);
    let mut chars = key_field.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
    out
}

/// One side of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Singular entry name of the table on this side.
    pub entry_name: String,
    /// Key fields of the table on this side.
    pub key_fields: Vec<String>,
    /// Cardinality: true means "many" rows of this side per row of the
    /// other side.
    pub many: bool,
    /// Name by which lookups traverse *to* this side.
    pub reference_name: String,
}

/// Matching strategy, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// The left table stores the foreign key referencing right's keys;
    /// `fields` align positionally with `right.key_fields`.
    ForwardKey { fields: Vec<String> },
    /// The right table stores the foreign key referencing left's keys;
    /// `fields` align positionally with `left.key_fields`.
    ReverseKey { fields: Vec<String> },
    /// Bare one:one fallback: key fields match key fields positionally.
    KeyToKey,
    /// many:many through a junction table whose rows each encode one
    /// matched pair.
    Junction {
        entry_name: String,
        left_fields: Vec<String>,
        right_fields: Vec<String>,
    },
}

/// Declarative input for building a relationship; everything optional
/// falls back to defaults during resolution against the actual tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDef {
    pub left_entry: String,
    pub right_entry: String,
    pub left_many: bool,
    pub right_many: bool,
    /// Traversal name for the left side; defaults to `left_entry`.
    pub left_reference: Option<String>,
    /// Traversal name for the right side; defaults to `right_entry`.
    pub right_reference: Option<String>,
    /// Foreign-key fields on the right table referencing left's keys.
    pub key_fields_left_in_right: Option<Vec<String>>,
    /// Foreign-key fields on the left table referencing right's keys.
    pub key_fields_right_in_left: Option<Vec<String>>,
    /// Junction entry name; presence selects the junction strategy.
    pub junction_entry: Option<String>,
    /// Foreign-key fields in the junction referencing left's keys.
    pub junction_left_fields: Option<Vec<String>>,
    /// Foreign-key fields in the junction referencing right's keys.
    pub junction_right_fields: Option<Vec<String>>,
}

impl RelationshipDef {
    pub fn new(left_entry: impl Into<String>, right_entry: impl Into<String>) -> Self {
        Self {
            left_entry: left_entry.into(),
            right_entry: right_entry.into(),
            ..Default::default()
        }
    }

    pub fn one_to_many(left_entry: impl Into<String>, right_entry: impl Into<String>) -> Self {
        let mut def = Self::new(left_entry, right_entry);
        def.right_many = true;
        def
    }

    pub fn many_to_many(
        left_entry: impl Into<String>,
        right_entry: impl Into<String>,
        junction_entry: impl Into<String>,
    ) -> Self {
        let mut def = Self::new(left_entry, right_entry);
        def.left_many = true;
        def.right_many = true;
        def.junction_entry = Some(junction_entry.into());
        def
    }

    /// Resolve against the actual tables, picking the strategy and
    /// validating that the key mapping exists.
    pub fn resolve(
        &self,
        left: &Table,
        right: &Table,
        junction: Option<&Table>,
    ) -> Result<Relationship> {
        let left_keys = left.key_fields().to_vec();
        let right_keys = right.key_fields().to_vec();
        if left_keys.is_empty() || right_keys.is_empty() {
            return Err(Error::ReferentialIntegrity(format!(
                "relationship {}<->{} requires key fields on both tables",
                self.left_entry, self.right_entry
            )));
        }

        let strategy = if let Some(junction_entry) = &self.junction_entry {
            let junction = junction.ok_or_else(|| {
                Error::UnknownReference(format!("junction table '{}'", junction_entry))
            })?;
            let left_fields = self.junction_left_fields.clone().unwrap_or_else(|| {
                left_keys
                    .iter()
                    .map(|k| default_foreign_key(&self.left_entry, k))
                    .collect()
            });
            let right_fields = self.junction_right_fields.clone().unwrap_or_else(|| {
                right_keys
                    .iter()
                    .map(|k| default_foreign_key(&self.right_entry, k))
                    .collect()
            });
            for f in left_fields.iter().chain(right_fields.iter()) {
                if !junction.has_field(f) {
                    return Err(Error::ReferentialIntegrity(format!(
                        "junction '{}' lacks foreign-key field '{}'",
                        junction_entry, f
                    )));
                }
            }
            MatchStrategy::Junction {
                entry_name: junction_entry.clone(),
                left_fields,
                right_fields,
            }
        } else {
            let reverse = self.key_fields_left_in_right.clone().unwrap_or_else(|| {
                left_keys
                    .iter()
                    .map(|k| default_foreign_key(&self.left_entry, k))
                    .collect()
            });
            let forward = self.key_fields_right_in_left.clone().unwrap_or_else(|| {
                right_keys
                    .iter()
                    .map(|k| default_foreign_key(&self.right_entry, k))
                    .collect()
            });
            if reverse.iter().all(|f| right.has_field(f)) {
                MatchStrategy::ReverseKey { fields: reverse }
            } else if forward.iter().all(|f| left.has_field(f)) {
                MatchStrategy::ForwardKey { fields: forward }
            } else if !self.left_many && !self.right_many && left_keys.len() == right_keys.len() {
                // One:one relationships may rely on the key fields alone.
                MatchStrategy::KeyToKey
            } else {
                return Err(Error::ReferentialIntegrity(format!(
                    "no key-field mapping resolves between '{}' and '{}' in either direction",
                    self.left_entry, self.right_entry
                )));
            }
        };

        Ok(Relationship {
            left: Endpoint {
                entry_name: self.left_entry.clone(),
                key_fields: left_keys,
                many: self.left_many,
                reference_name: self
                    .left_reference
                    .clone()
                    .unwrap_or_else(|| self.left_entry.clone()),
            },
            right: Endpoint {
                entry_name: self.right_entry.clone(),
                key_fields: right_keys,
                many: self.right_many,
                reference_name: self
                    .right_reference
                    .clone()
                    .unwrap_or_else(|| self.right_entry.clone()),
            },
            strategy,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub left: Endpoint,
    pub right: Endpoint,
    pub strategy: MatchStrategy,
}

impl Relationship {
    /// Whether a lookup `(entry, reference)` traverses this relationship,
    /// and in which directions. Self-referential relationships can
    /// resolve both ways at once.
    pub fn directions(&self, entry: &str, reference: &str) -> (bool, bool) {
        let forward = self.left.entry_name == entry && self.right.reference_name == reference;
        let backward = self.right.entry_name == entry && self.left.reference_name == reference;
        (forward, backward)
    }

    pub fn junction_entry(&self) -> Option<&str> {
        match &self.strategy {
            MatchStrategy::Junction { entry_name, .. } => Some(entry_name.as_str()),
            _ => None,
        }
    }

    /// Cardinality of the traversal target: `from_left` means the lookup
    /// lands on the right side.
    pub fn target_is_one(&self, from_left: bool) -> bool {
        if from_left {
            !self.right.many
        } else {
            !self.left.many
        }
    }

    /// Left-rows x right-rows boolean match matrix under the strategy
    /// fixed at construction. Junction strategies require the junction
    /// table.
    pub fn match_matrix(
        &self,
        left: &Table,
        right: &Table,
        junction: Option<&Table>,
    ) -> Result<MatchMatrix> {
        match &self.strategy {
            MatchStrategy::ReverseKey { fields } => and_field_pairs(
                left,
                &self.left.key_fields,
                right,
                fields,
                KeySide::Left,
            ),
            MatchStrategy::ForwardKey { fields } => and_field_pairs(
                left,
                fields,
                right,
                &self.right.key_fields,
                KeySide::Right,
            ),
            MatchStrategy::KeyToKey => and_field_pairs(
                left,
                &self.left.key_fields,
                right,
                &self.right.key_fields,
                KeySide::Left,
            ),
            MatchStrategy::Junction {
                entry_name,
                left_fields,
                right_fields,
            } => {
                let junction = junction.ok_or_else(|| {
                    Error::UnknownReference(format!("junction table '{}'", entry_name))
                })?;
                let left_to_junction = and_field_pairs(
                    left,
                    &self.left.key_fields,
                    junction,
                    left_fields,
                    KeySide::Left,
                )?;
                let junction_to_right = and_field_pairs(
                    junction,
                    right_fields,
                    right,
                    &self.right.key_fields,
                    KeySide::Right,
                )?;
                left_to_junction.multiply(&junction_to_right)
            }
        }
    }
}

enum KeySide {
    Left,
    Right,
}

/// AND-combine per-field match matrices for positionally paired fields.
/// The key side's descriptor fixes the match semantics for the pair.
fn and_field_pairs(
    left: &Table,
    left_fields: &[String],
    right: &Table,
    right_fields: &[String],
    key_side: KeySide,
) -> Result<MatchMatrix> {
    if left_fields.len() != right_fields.len() {
        return Err(Error::ReferentialIntegrity(format!(
            "key mapping pairs {} fields with {}",
            left_fields.len(),
            right_fields.len()
        )));
    }
    let mut acc: Option<MatchMatrix> = None;
    for (lf, rf) in left_fields.iter().zip(right_fields) {
        let descriptor = match key_side {
            KeySide::Left => left.descriptor(lf)?,
            KeySide::Right => right.descriptor(rf)?,
        }
        .clone();
        let m = descriptor.match_matrix(&left.column(lf)?, &right.column(rf)?)?;
        match acc.as_mut() {
            Some(acc) => acc.and_assign(&m)?,
            None => acc = Some(m),
        }
    }
    acc.ok_or_else(|| Error::ReferentialIntegrity("key mapping pairs no fields".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reltab_core::value::Value;

    fn left() -> Table {
        Table::from_columns(vec![(
            "id".into(),
            vec![Value::Number(1.0), Value::Number(2.0)],
        )])
        .unwrap()
        .with_key_fields(&["id"])
        .unwrap()
    }

    fn right_with_fk() -> Table {
        Table::from_columns(vec![
            (
                "leftId".into(),
                vec![Value::Number(1.0), Value::Number(1.0), Value::Number(2.0)],
            ),
            (
                "y".into(),
                vec![
                    Value::Text("p".into()),
                    Value::Text("q".into()),
                    Value::Text("r".into()),
                ],
            ),
            (
                "rid".into(),
                vec![Value::Number(10.0), Value::Number(11.0), Value::Number(12.0)],
            ),
        ])
        .unwrap()
        .with_key_fields(&["rid"])
        .unwrap()
    }

    #[test]
    fn default_fk_naming_is_camel_case() {
        assert_eq!(default_foreign_key("left", "id"), "leftId");
        assert_eq!(default_foreign_key("sample", "runDate"), "sampleRunDate");
    }

    #[test]
    fn resolves_reverse_key_from_default_naming() {
        let rel = RelationshipDef::one_to_many("left", "right")
            .resolve(&left(), &right_with_fk(), None)
            .unwrap();
        assert_eq!(
            rel.strategy,
            MatchStrategy::ReverseKey {
                fields: vec!["leftId".into()]
            }
        );
    }

    #[test]
    fn unresolvable_mapping_fails_construction() {
        let bare_right = Table::from_columns(vec![(
            "rid".into(),
            vec![Value::Number(1.0)],
        )])
        .unwrap()
        .with_key_fields(&["rid"])
        .unwrap();
        let err = RelationshipDef::one_to_many("left", "right")
            .resolve(&left(), &bare_right, None)
            .unwrap_err();
        assert!(matches!(err, Error::ReferentialIntegrity(_)));
    }

    #[test]
    fn one_to_one_falls_back_to_key_to_key() {
        let bare_right = Table::from_columns(vec![(
            "rid".into(),
            vec![Value::Number(1.0)],
        )])
        .unwrap()
        .with_key_fields(&["rid"])
        .unwrap();
        let rel = RelationshipDef::new("left", "right")
            .resolve(&left(), &bare_right, None)
            .unwrap();
        assert_eq!(rel.strategy, MatchStrategy::KeyToKey);
    }

    #[test]
    fn reverse_key_matrix_matches_foreign_keys() {
        let rel = RelationshipDef::one_to_many("left", "right")
            .resolve(&left(), &right_with_fk(), None)
            .unwrap();
        let m = rel.match_matrix(&left(), &right_with_fk(), None).unwrap();
        assert_eq!(m.row_matches(0), vec![0, 1]);
        assert_eq!(m.row_matches(1), vec![2]);
    }
}
