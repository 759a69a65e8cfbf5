//! The Database registry.
//!
//! Tables live in a registry-owned arena addressed by generation-checked
//! `TableId`s; a stale id never silently resolves to a replaced table.
//! The canonical map is keyed by singular entry name, with a bijective
//! singular↔plural alias on top. Relationships are an unordered
//! collection validated against registered tables at insertion.

use std::collections::BTreeSet;

use reltab_core::config::EngineConfig;
use reltab_core::error::{Error, Result};
use reltab_core::id::TableId;
use reltab_core::matrix::MatchMatrix;
use reltab_core::value::Value;
use reltab_rel::{related_from_matrix, MatchOptions, RelatedIdx, Relationship, RelationshipDef};
use reltab_table::{StructOfArrays, Table};

#[derive(Debug, Clone)]
struct Entry {
    singular: String,
    plural: String,
    table: Table,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug, Clone)]
pub struct Database {
    slots: Vec<Slot>,
    relationships: Vec<Relationship>,
    config: EngineConfig,
}

impl Database {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            slots: Vec::new(),
            relationships: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a table under this registry's config: inference parses
    /// dates with the configured formats and the table starts in the
    /// configured apply mode.
    pub fn new_table(&self, columns: Vec<(String, Vec<Value>)>) -> Result<Table> {
        Table::from_columns_with_config(columns, &self.config)
    }

    // ---- name resolution -------------------------------------------------

    fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| {
            s.entry
                .as_ref()
                .map(|e| e.singular == name || e.plural == name)
                .unwrap_or(false)
        })
    }

    /// Canonical singular name for a singular-or-plural lookup.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.slot_index(name).and_then(|i| {
            self.slots[i]
                .entry
                .as_ref()
                .map(|e| e.singular.as_str())
        })
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter_map(|s| s.entry.as_ref().map(|e| e.singular.as_str()))
            .collect()
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        let idx = self
            .slot_index(name)
            .ok_or_else(|| Error::UnknownReference(name.to_string()))?;
        self.slots[idx]
            .entry
            .as_ref()
            .map(|e| &e.table)
            .ok_or_else(|| Error::UnknownReference(name.to_string()))
    }

    pub fn table_by_id(&self, id: TableId) -> Result<&Table> {
        let slot = self
            .slots
            .get(id.index() as usize)
            .ok_or_else(|| Error::UnknownReference(id.to_string()))?;
        if slot.generation != id.generation() {
            return Err(Error::UnknownReference(format!(
                "{} is stale (current generation {})",
                id, slot.generation
            )));
        }
        slot.entry
            .as_ref()
            .map(|e| &e.table)
            .ok_or_else(|| Error::UnknownReference(id.to_string()))
    }

    pub fn id_of(&self, name: &str) -> Option<TableId> {
        let idx = self.slot_index(name)?;
        Some(TableId::new(idx as u32, self.slots[idx].generation))
    }

    // ---- registration ----------------------------------------------------

    /// Register a table under its singular and plural entry names.
    ///
    /// Cross-entry name clashes fail with `NameCollision`; re-registering
    /// the same singular overwrites the existing table with a logged
    /// warning, the one deliberate swallow-and-continue here.
    pub fn add_table(&mut self, singular: &str, plural: &str, mut table: Table) -> Result<TableId> {
        let own = self.slot_index(singular).filter(|&i| {
            self.slots[i]
                .entry
                .as_ref()
                .map(|e| e.singular == singular)
                .unwrap_or(false)
        });
        for name in [singular, plural] {
            if let Some(idx) = self.slot_index(name) {
                if Some(idx) != own {
                    return Err(Error::NameCollision(format!(
                        "'{}' already names a registered table",
                        name
                    )));
                }
            }
        }

        let idx = match own {
            Some(idx) => {
                tracing::warn!(entry = singular, "table already registered; overwriting");
                idx
            }
            None => match self.slots.iter().position(|s| s.entry.is_none()) {
                Some(idx) => idx,
                None => {
                    self.slots.push(Slot {
                        generation: 0,
                        entry: None,
                    });
                    self.slots.len() - 1
                }
            },
        };

        self.slots[idx].generation += 1;
        let id = TableId::new(idx as u32, self.slots[idx].generation);
        table.set_registry_id(Some(id));
        self.slots[idx].entry = Some(Entry {
            singular: singular.to_string(),
            plural: plural.to_string(),
            table,
        });
        Ok(id)
    }

    /// Remove a table and every relationship touching it, keeping the
    /// invariant that relationship entries always resolve.
    pub fn remove_table(&mut self, name: &str) -> Result<Table> {
        let idx = self
            .slot_index(name)
            .ok_or_else(|| Error::UnknownReference(name.to_string()))?;
        let entry = self.slots[idx]
            .entry
            .take()
            .ok_or_else(|| Error::UnknownReference(name.to_string()))?;
        let singular = entry.singular.clone();
        self.relationships.retain(|r| {
            !(r.left.entry_name == singular
                || r.right.entry_name == singular
                || r.junction_entry() == Some(singular.as_str()))
        });
        let mut table = entry.table;
        table.set_registry_id(None);
        Ok(table)
    }

    /// Replace a registered table with an updated value. The replacement
    /// must keep the original's key fields. If the row set shrank, every
    /// table bound to this one by a to-one relationship is filtered to
    /// rows still referencing a surviving row, recursively.
    pub fn update_table(&mut self, name: &str, table: Table) -> Result<()> {
        let idx = self
            .slot_index(name)
            .ok_or_else(|| Error::UnknownReference(name.to_string()))?;
        let singular = {
            let entry = self.slots[idx]
                .entry
                .as_ref()
                .ok_or_else(|| Error::UnknownReference(name.to_string()))?;
            if entry.table.key_fields() != table.key_fields() {
                return Err(Error::ReferentialIntegrity(format!(
                    "replacement for '{}' changes its key fields",
                    entry.singular
                )));
            }
            entry.singular.clone()
        };
        self.replace_in_slot(idx, table);

        let mut visited = BTreeSet::new();
        visited.insert(singular.clone());
        self.cascade_from(&singular, &mut visited)
    }

    fn replace_in_slot(&mut self, idx: usize, mut table: Table) {
        self.slots[idx].generation += 1;
        let id = TableId::new(idx as u32, self.slots[idx].generation);
        table.set_registry_id(Some(id));
        if let Some(entry) = self.slots[idx].entry.as_mut() {
            entry.table = table;
        }
    }

    /// Filter every to-one-bound neighbor of `origin` to rows that still
    /// reference a surviving origin row; recurse into tables that shrank.
    fn cascade_from(&mut self, origin: &str, visited: &mut BTreeSet<String>) -> Result<()> {
        let rels = self.relationships.clone();
        for rel in rels {
            let (origin_is_left, other_entry, origin_is_one) =
                if rel.left.entry_name == origin && rel.right.entry_name != origin {
                    (true, rel.right.entry_name.clone(), !rel.left.many)
                } else if rel.right.entry_name == origin && rel.left.entry_name != origin {
                    (false, rel.left.entry_name.clone(), !rel.right.many)
                } else {
                    continue;
                };
            if !origin_is_one || visited.contains(&other_entry) {
                continue;
            }

            let origin_table = self.table(origin)?;
            let other_table = self.table(&other_entry)?;
            let junction = rel
                .junction_entry()
                .map(|j| self.table(j))
                .transpose()?;

            // Orient so matrix rows are the neighbor's rows.
            let matrix = if origin_is_left {
                rel.match_matrix(origin_table, other_table, junction)?
                    .transpose()
            } else {
                rel.match_matrix(other_table, origin_table, junction)?
            };

            let keep_flags = matrix.row_any();
            if keep_flags.iter().all(|&k| k) {
                continue;
            }
            let keep: Vec<usize> = keep_flags
                .iter()
                .enumerate()
                .filter_map(|(i, &k)| if k { Some(i) } else { None })
                .collect();

            tracing::debug!(
                from = origin,
                table = %other_entry,
                kept = keep.len(),
                of = keep_flags.len(),
                "referential cascade filtered rows"
            );
            let filtered = other_table.clone().select_rows(&keep)?;
            let other_idx = self
                .slot_index(&other_entry)
                .ok_or_else(|| Error::UnknownReference(other_entry.clone()))?;
            self.replace_in_slot(other_idx, filtered);

            visited.insert(other_entry.clone());
            self.cascade_from(&other_entry, visited)?;
        }
        Ok(())
    }

    // ---- relationships ---------------------------------------------------

    /// Resolve a declarative definition against the registered tables and
    /// add the relationship.
    pub fn add_relationship(&mut self, def: RelationshipDef) -> Result<()> {
        let left = self.table(&def.left_entry)?;
        let right = self.table(&def.right_entry)?;
        let junction = def
            .junction_entry
            .as_deref()
            .map(|j| self.table(j))
            .transpose()?;
        let rel = def.resolve(left, right, junction)?;
        self.relationships.push(rel);
        Ok(())
    }

    /// Remove the relationship(s) addressed by `(entry, reference)`.
    pub fn remove_relationship(&mut self, entry: &str, reference: &str) -> Result<()> {
        let before = self.relationships.len();
        self.relationships.retain(|r| {
            let (fwd, back) = r.directions(entry, reference);
            !(fwd || back)
        });
        if self.relationships.len() == before {
            return Err(Error::UnknownReference(format!(
                "no relationship from '{}' named '{}'",
                entry, reference
            )));
        }
        Ok(())
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    // ---- cross-table lookup ----------------------------------------------

    /// Union match matrix plus target metadata for an (entry, reference)
    /// pair. More than one relationship can resolve the same pair (e.g.
    /// self-referential junction half-relationships); their matrices OR
    /// together.
    fn union_matrix(&self, entry: &str, reference: &str) -> Result<(MatchMatrix, bool, String)> {
        let singular = self
            .resolve(entry)
            .ok_or_else(|| Error::UnknownReference(entry.to_string()))?
            .to_string();

        let mut acc: Option<(MatchMatrix, bool, String)> = None;
        for rel in &self.relationships {
            let (fwd, back) = rel.directions(&singular, reference);
            if !fwd && !back {
                continue;
            }

            let left = self.table(&rel.left.entry_name)?;
            let right = self.table(&rel.right.entry_name)?;
            let junction = rel
                .junction_entry()
                .map(|j| self.table(j))
                .transpose()?;
            let forward_matrix = rel.match_matrix(left, right, junction)?;

            let (mut matrix, target_one, target_entry) = if fwd {
                (
                    forward_matrix.clone(),
                    rel.target_is_one(true),
                    rel.right.entry_name.clone(),
                )
            } else {
                (
                    forward_matrix.transpose(),
                    rel.target_is_one(false),
                    rel.left.entry_name.clone(),
                )
            };
            // Self-referential relationships contribute both directions.
            if fwd && back {
                matrix.or_transpose(&forward_matrix)?;
            }

            match acc.as_mut() {
                Some((m, one, target)) => {
                    if *target != target_entry {
                        return Err(Error::Invariant(format!(
                            "reference '{}' resolves to both '{}' and '{}'",
                            reference, target, target_entry
                        )));
                    }
                    m.or_assign(&matrix)?;
                    *one = *one && target_one;
                }
                None => acc = Some((matrix, target_one, target_entry)),
            }
        }

        acc.ok_or_else(|| {
            Error::UnknownReference(format!("no relationship from '{}' named '{}'", entry, reference))
        })
    }

    /// Related-row indices for every row of `entry`, through the
    /// relationship(s) named `reference`.
    pub fn get_related_idx(
        &self,
        entry: &str,
        reference: &str,
        opts: MatchOptions,
    ) -> Result<RelatedIdx> {
        let (matrix, target_one, target) = self.union_matrix(entry, reference)?;
        let context = format!("{}->{}", entry, target);
        Ok(related_from_matrix(&matrix, target_one, opts, &context))
    }

    /// Materialize the lookup as a filtered table over the target entry.
    /// In the aligned fill-missing mode, unmatched source rows become
    /// all-empty placeholder rows so the output stays index-aligned.
    pub fn match_related(&self, entry: &str, reference: &str, opts: MatchOptions) -> Result<Table> {
        let (matrix, target_one, target) = self.union_matrix(entry, reference)?;
        let context = format!("{}->{}", entry, target);
        let related = related_from_matrix(&matrix, target_one, opts, &context);
        let target_table = self.table(&target)?;

        let table = match &related {
            RelatedIdx::Aligned(rows) => materialize_aligned(target_table, rows)?,
            other => target_table.clone().select_rows(&other.flattened())?,
        };
        let keys: Vec<&str> = target_table.key_fields().iter().map(String::as_str).collect();
        if keys.is_empty() {
            Ok(table)
        } else {
            table.with_key_fields(&keys)
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an index-aligned copy of `target` where `None` rows are filled
/// with each field's empty value.
fn materialize_aligned(target: &Table, rows: &[Option<usize>]) -> Result<Table> {
    let order = target.field_names()?.to_vec();
    let descriptors = target.descriptors()?.clone();
    let cols = target.columns(&order)?;
    let mut soa = StructOfArrays::new();
    for name in &order {
        let descriptor = &descriptors[name];
        let col = &cols[name];
        let values: Vec<Value> = rows
            .iter()
            .map(|r| match r {
                Some(i) => col.value_at(*i),
                None => descriptor.empty_value(),
            })
            .collect();
        soa.insert(name.clone(), values);
    }
    Table::from_parts(&order, &descriptors, &soa)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(names: &[(&str, Vec<Value>)], keys: &[&str]) -> Table {
        Table::from_columns(
            names
                .iter()
                .map(|(n, v)| (n.to_string(), v.clone()))
                .collect(),
        )
        .unwrap()
        .with_key_fields(keys)
        .unwrap()
    }

    fn nums(xs: &[f64]) -> Vec<Value> {
        xs.iter().map(|&x| Value::Number(x)).collect()
    }

    #[test]
    fn plural_alias_resolves_to_the_same_table() {
        let mut db = Database::new();
        db.add_table("sample", "samples", table(&[("id", nums(&[1.0]))], &["id"]))
            .unwrap();
        assert_eq!(db.resolve("samples"), Some("sample"));
        assert!(db.table("samples").is_ok());
    }

    #[test]
    fn cross_entry_name_clash_is_a_collision() {
        let mut db = Database::new();
        db.add_table("sample", "samples", table(&[("id", nums(&[1.0]))], &["id"]))
            .unwrap();
        let err = db
            .add_table("samples", "more", table(&[("id", nums(&[1.0]))], &["id"]))
            .unwrap_err();
        assert!(matches!(err, Error::NameCollision(_)));
    }

    #[test]
    fn re_registration_overwrites_and_bumps_generation() {
        let mut db = Database::new();
        let id1 = db
            .add_table("sample", "samples", table(&[("id", nums(&[1.0]))], &["id"]))
            .unwrap();
        let id2 = db
            .add_table(
                "sample",
                "samples",
                table(&[("id", nums(&[1.0, 2.0]))], &["id"]),
            )
            .unwrap();
        assert_eq!(id1.index(), id2.index());
        assert!(id2.generation() > id1.generation());
        assert_eq!(db.id_of("samples"), Some(id2));
        assert!(db.table_by_id(id1).is_err());
        assert_eq!(db.table_by_id(id2).unwrap().row_count().unwrap(), 2);
    }

    #[test]
    fn registry_config_reaches_new_tables() {
        let mut config = EngineConfig::default();
        config.auto_apply = false;
        config.date_format = "%d/%m/%Y".to_string();
        let db = Database::with_config(config);
        let t = db
            .new_table(vec![
                ("id".into(), nums(&[1.0])),
                ("day".into(), vec![Value::Text("02/01/2020".into())]),
            ])
            .unwrap();
        assert!(!t.auto_apply());
        assert_eq!(t.descriptor("day").unwrap().kind_name(), "date");
    }

    #[test]
    fn update_requires_same_key_fields() {
        let mut db = Database::new();
        db.add_table("sample", "samples", table(&[("id", nums(&[1.0]))], &["id"]))
            .unwrap();
        let replacement = table(&[("id", nums(&[1.0]))], &[]);
        assert!(matches!(
            db.update_table("sample", replacement),
            Err(Error::ReferentialIntegrity(_))
        ));
    }
}
