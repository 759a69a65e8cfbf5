//! The Table: ordered rows over named typed columns, value semantics,
//! and the three-stage deferred pipeline.
//!
//! Stage order is strict: Fields → Mask → Data. Mutators set pending
//! flags rather than recomputing immediately; `apply()` performs the
//! actual work once. In auto mode every mutator applies before
//! returning; in manual mode reading a derived property while its stage
//! is pending fails with `StaleState` rather than returning partial
//! results.

use std::collections::{BTreeMap, HashMap, HashSet};

use reltab_core::config::EngineConfig;
use reltab_core::error::{Error, Result};
use reltab_core::hash::{hash_key_tuple, Hash256};
use reltab_core::id::TableId;
use reltab_core::value::{ColumnValues, Value};
use reltab_fields::{infer_descriptor, infer_descriptor_with_formats, FieldDescriptor};

use crate::memory::MemoryBackend;
use crate::spec::{FilterSpec, SortSpec};
use crate::storage::{RowStruct, StorageBackend, StructOfArrays};

#[derive(Debug, Clone)]
pub struct Table {
    backend: Box<dyn StorageBackend>,
    key_fields: Vec<String>,
    auto_apply: bool,

    fields_pending: bool,
    mask_pending: bool,
    data_pending: bool,
    pending_filters: Vec<FilterSpec>,
    pending_sorts: Vec<SortSpec>,

    // Dispatch caches, rebuilt by the fields stage.
    field_order: Vec<String>,
    descriptors: BTreeMap<String, FieldDescriptor>,

    // Set by the registry at registration; generation-checked there.
    registry_id: Option<TableId>,
}

impl Table {
    /// Empty table over the in-memory backend.
    pub fn new() -> Self {
        Self {
            backend: Box::new(MemoryBackend::new()),
            key_fields: Vec::new(),
            auto_apply: true,
            fields_pending: false,
            mask_pending: false,
            data_pending: false,
            pending_filters: Vec::new(),
            pending_sorts: Vec::new(),
            field_order: Vec::new(),
            descriptors: BTreeMap::new(),
            registry_id: None,
        }
    }

    /// Wrap an existing backend; the fields stage runs immediately to
    /// build the dispatch caches.
    pub fn from_backend(backend: Box<dyn StorageBackend>) -> Result<Self> {
        let mut t = Self::new();
        t.backend = backend;
        t.fields_pending = true;
        t.apply()
    }

    /// Build a table from named raw columns, inferring each column's
    /// descriptor from its values under the default config.
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self> {
        Self::from_columns_with_config(columns, &EngineConfig::default())
    }

    /// Build a table from named raw columns under an engine config:
    /// inference parses dates with the configured formats and the table
    /// starts in the configured apply mode.
    pub fn from_columns_with_config(
        columns: Vec<(String, Vec<Value>)>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let mut backend = MemoryBackend::new();
        for (name, values) in &columns {
            let descriptor =
                infer_descriptor_with_formats(values, &config.date_format, &config.datetime_format);
            backend.set_field(name, values, descriptor, None)?;
        }
        let mut t = Self::from_backend(Box::new(backend))?;
        t.auto_apply = config.auto_apply;
        Ok(t)
    }

    /// Build a table from columns with explicit descriptors, in order.
    pub fn from_parts(
        order: &[String],
        descriptors: &BTreeMap<String, FieldDescriptor>,
        columns: &StructOfArrays,
    ) -> Result<Self> {
        let mut backend = MemoryBackend::new();
        for name in order {
            let descriptor = descriptors
                .get(name)
                .ok_or_else(|| Error::UnknownField(name.clone()))?;
            let values = columns
                .get(name)
                .ok_or_else(|| Error::UnknownField(name.clone()))?;
            backend.set_field(name, values, descriptor.clone(), None)?;
        }
        Self::from_backend(Box::new(backend))
    }

    // ---- pipeline guards -------------------------------------------------

    fn ensure_fields_fresh(&self) -> Result<()> {
        if self.fields_pending {
            return Err(Error::StaleState("field set"));
        }
        Ok(())
    }

    fn ensure_rows_fresh(&self) -> Result<()> {
        self.ensure_fields_fresh()?;
        if self.mask_pending {
            return Err(Error::StaleState("row set"));
        }
        Ok(())
    }

    fn ensure_data_fresh(&self) -> Result<()> {
        self.ensure_rows_fresh()?;
        if self.data_pending {
            return Err(Error::StaleState("column data"));
        }
        Ok(())
    }

    /// Pending flags (fields, mask, data), in pipeline order.
    pub fn pending_stages(&self) -> (bool, bool, bool) {
        (self.fields_pending, self.mask_pending, self.data_pending)
    }

    // ---- read API --------------------------------------------------------

    pub fn field_names(&self) -> Result<&[String]> {
        self.ensure_fields_fresh()?;
        Ok(&self.field_order)
    }

    pub fn descriptor(&self, name: &str) -> Result<&FieldDescriptor> {
        self.ensure_fields_fresh()?;
        self.descriptors
            .get(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    pub fn descriptors(&self) -> Result<&BTreeMap<String, FieldDescriptor>> {
        self.ensure_fields_fresh()?;
        Ok(&self.descriptors)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn row_count(&self) -> Result<usize> {
        self.ensure_rows_fresh()?;
        Ok(self.backend.row_count())
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    pub fn column(&self, name: &str) -> Result<ColumnValues> {
        self.ensure_data_fresh()?;
        if !self.descriptors.contains_key(name) {
            return Err(Error::UnknownField(name.to_string()));
        }
        let mut cols = self.backend.column_values(&[name.to_string()], None)?;
        cols.remove(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    pub fn columns(&self, names: &[String]) -> Result<BTreeMap<String, ColumnValues>> {
        self.ensure_data_fresh()?;
        for name in names {
            if !self.descriptors.contains_key(name) {
                return Err(Error::UnknownField(name.clone()));
            }
        }
        self.backend.column_values(names, None)
    }

    pub fn value_at(&self, row: usize, field: &str) -> Result<Value> {
        let col = self.column(field)?;
        if row >= col.len() {
            return Err(Error::Invariant(format!(
                "row {} past {} rows",
                row,
                col.len()
            )));
        }
        Ok(col.value_at(row))
    }

    /// Rendered strings for one field, per the field's descriptor.
    pub fn display_strings(&self, field: &str) -> Result<Vec<String>> {
        let descriptor = self.descriptor(field)?.clone();
        let col = self.column(field)?;
        Ok(descriptor.display_strings(&col))
    }

    /// Every row as a field→value struct, in row order.
    pub fn full_entries_as_struct(&self) -> Result<Vec<RowStruct>> {
        self.ensure_data_fresh()?;
        let cols = self.backend.column_values(&self.field_order, None)?;
        let rows = self.backend.row_count();
        let mut out = Vec::with_capacity(rows);
        for r in 0..rows {
            let mut entry = RowStruct::new();
            for name in &self.field_order {
                entry.insert(name.clone(), cols[name].value_at(r));
            }
            out.push(entry);
        }
        Ok(out)
    }

    /// Blake3 hash of each row's key-field tuple, in declared key order.
    pub fn key_hashes(&self) -> Result<Vec<Hash256>> {
        self.ensure_data_fresh()?;
        if self.key_fields.is_empty() {
            return Err(Error::Config("table has no key fields".into()));
        }
        let cols = self.backend.column_values(&self.key_fields, None)?;
        let rows = self.backend.row_count();
        let mut out = Vec::with_capacity(rows);
        for r in 0..rows {
            let tuple: Vec<Value> = self
                .key_fields
                .iter()
                .map(|f| cols[f].value_at(r))
                .collect();
            out.push(hash_key_tuple(&tuple));
        }
        Ok(out)
    }

    pub fn registry_id(&self) -> Option<TableId> {
        self.registry_id
    }

    /// Back-reference bookkeeping; called by the registry when the table
    /// is registered or replaced.
    pub fn set_registry_id(&mut self, id: Option<TableId>) {
        self.registry_id = id;
    }

    // ---- configuration ---------------------------------------------------

    pub fn with_key_fields(mut self, fields: &[&str]) -> Result<Self> {
        self.ensure_fields_fresh()?;
        for f in fields {
            if !self.descriptors.contains_key(*f) {
                return Err(Error::UnknownField(f.to_string()));
            }
        }
        self.key_fields = fields.iter().map(|f| f.to_string()).collect();
        Ok(self)
    }

    /// Switch auto-apply; turning it back on applies anything pending.
    pub fn with_auto_apply(mut self, auto: bool) -> Result<Self> {
        self.auto_apply = auto;
        if auto {
            self.apply()
        } else {
            Ok(self)
        }
    }

    pub fn auto_apply(&self) -> bool {
        self.auto_apply
    }

    // ---- pipeline --------------------------------------------------------

    /// Run every pending stage, in strict order.
    pub fn apply(mut self) -> Result<Self> {
        if self.fields_pending {
            self.apply_fields_stage();
        }
        if self.mask_pending {
            self.apply_mask_stage()?;
        }
        if self.data_pending {
            self.apply_data_stage()?;
        }
        Ok(self)
    }

    fn maybe_apply(self) -> Result<Self> {
        if self.auto_apply {
            self.apply()
        } else {
            Ok(self)
        }
    }

    /// Re-read the column set and descriptor map from storage; forces
    /// both downstream stages pending.
    fn apply_fields_stage(&mut self) {
        let (order, descriptors) = self.backend.fields();
        self.field_order = order;
        self.descriptors = descriptors;
        self.fields_pending = false;
        self.mask_pending = true;
        self.data_pending = true;
        tracing::debug!(fields = self.field_order.len(), "applied fields stage");
    }

    /// AND-combine pending filters, stack stable single-key sorts, and
    /// re-index storage through one `select_and_reorder`.
    fn apply_mask_stage(&mut self) -> Result<()> {
        let total = self.backend.row_count();
        let had_work = !self.pending_filters.is_empty() || !self.pending_sorts.is_empty();

        if had_work {
            let mut mask = vec![true; total];
            for spec in &self.pending_filters {
                let descriptor = self
                    .descriptors
                    .get(&spec.field)
                    .ok_or_else(|| Error::UnknownField(spec.field.clone()))?;
                // Each spec reads only the field it references.
                let cols = self
                    .backend
                    .column_values(std::slice::from_ref(&spec.field), None)?;
                let hits = spec.evaluate(descriptor, &cols[&spec.field])?;
                if hits.len() != total {
                    return Err(Error::Invariant(format!(
                        "filter over '{}' produced {} hits for {} rows",
                        spec.field,
                        hits.len(),
                        total
                    )));
                }
                for (m, h) in mask.iter_mut().zip(hits) {
                    *m &= h;
                }
            }

            let mut indices: Vec<usize> = mask
                .iter()
                .enumerate()
                .filter_map(|(i, &keep)| if keep { Some(i) } else { None })
                .collect();

            // Keys run in reverse declaration order, each a stable
            // single-key pass, so the first-declared key dominates and
            // later keys break ties within it.
            for sort in &self.pending_sorts {
                for key in sort.keys.iter().rev() {
                    let descriptor = self
                        .descriptors
                        .get(&key.field)
                        .ok_or_else(|| Error::UnknownField(key.field.clone()))?;
                    let cols = self
                        .backend
                        .column_values(std::slice::from_ref(&key.field), None)?;
                    let keys = descriptor.sort_keys(&cols[&key.field])?;
                    indices.sort_by(|&a, &b| keys[a].compare(&keys[b], key.ascending));
                }
            }

            let target = indices.len();
            self.backend.select_and_reorder(&indices)?;
            if self.backend.row_count() != target {
                return Err(Error::Invariant(format!(
                    "mask stage expected {} rows, storage reports {}",
                    target,
                    self.backend.row_count()
                )));
            }
            tracing::debug!(kept = target, of = total, "applied mask stage");
        }

        self.pending_filters.clear();
        self.pending_sorts.clear();
        self.mask_pending = false;
        self.data_pending = true;
        Ok(())
    }

    /// No-op hook at this layer; deferred loading lives in the backend.
    fn apply_data_stage(&mut self) -> Result<()> {
        self.backend.apply_data()?;
        self.data_pending = false;
        Ok(())
    }

    // ---- filtering and sorting ------------------------------------------

    pub fn filter(mut self, spec: FilterSpec) -> Result<Self> {
        self.ensure_fields_fresh()?;
        if !self.descriptors.contains_key(&spec.field) {
            return Err(Error::UnknownField(spec.field));
        }
        self.pending_filters.push(spec);
        self.mask_pending = true;
        self.maybe_apply()
    }

    pub fn sort(mut self, spec: SortSpec) -> Result<Self> {
        self.ensure_fields_fresh()?;
        for key in &spec.keys {
            if !self.descriptors.contains_key(&key.field) {
                return Err(Error::UnknownField(key.field.clone()));
            }
        }
        self.pending_sorts.push(spec);
        self.mask_pending = true;
        self.maybe_apply()
    }

    /// Immediate re-index; used by the registry's referential cascade
    /// and by `match_related` materialization.
    pub fn select_rows(mut self, indices: &[usize]) -> Result<Self> {
        self.ensure_data_fresh()?;
        let target = indices.len();
        self.backend.select_and_reorder(indices)?;
        if self.backend.row_count() != target {
            return Err(Error::Invariant(format!(
                "row selection expected {} rows, storage reports {}",
                target,
                self.backend.row_count()
            )));
        }
        Ok(self)
    }

    // ---- field mutation --------------------------------------------------

    pub fn add_field(
        self,
        name: &str,
        values: Vec<Value>,
        descriptor: Option<FieldDescriptor>,
    ) -> Result<Self> {
        self.add_field_at(name, values, descriptor, None)
    }

    pub fn add_field_at(
        mut self,
        name: &str,
        values: Vec<Value>,
        descriptor: Option<FieldDescriptor>,
        position: Option<usize>,
    ) -> Result<Self> {
        self.ensure_fields_fresh()?;
        if self.descriptors.contains_key(name) {
            return Err(Error::NameCollision(format!(
                "field '{}' already exists",
                name
            )));
        }
        let descriptor = descriptor.unwrap_or_else(|| infer_descriptor(&values));
        self.backend.set_field(name, &values, descriptor, position)?;
        self.fields_pending = true;
        self.maybe_apply()
    }

    /// Replace an existing field's values and descriptor in place.
    pub fn replace_field(
        mut self,
        name: &str,
        values: Vec<Value>,
        descriptor: Option<FieldDescriptor>,
    ) -> Result<Self> {
        self.ensure_fields_fresh()?;
        if !self.descriptors.contains_key(name) {
            return Err(Error::UnknownField(name.to_string()));
        }
        let descriptor = descriptor.unwrap_or_else(|| infer_descriptor(&values));
        self.backend.set_field(name, &values, descriptor, None)?;
        self.fields_pending = true;
        self.maybe_apply()
    }

    pub fn remove_field(mut self, name: &str) -> Result<Self> {
        self.ensure_fields_fresh()?;
        self.backend.remove_field(name)?;
        self.key_fields.retain(|f| f != name);
        self.fields_pending = true;
        self.maybe_apply()
    }

    // ---- row mutation ----------------------------------------------------

    /// Append rows, validating field names and filling missing fields
    /// with each descriptor's empty value. With `upsert`, rows whose
    /// key-field tuple matches an existing row overwrite it instead of
    /// appending.
    pub fn add_entries(mut self, rows: Vec<RowStruct>, upsert: bool) -> Result<Self> {
        self.ensure_data_fresh()?;
        for row in &rows {
            for name in row.keys() {
                if !self.descriptors.contains_key(name) {
                    return Err(Error::UnknownField(name.clone()));
                }
            }
        }

        let mut to_append = Vec::new();
        if upsert && !self.key_fields.is_empty() && self.backend.row_count() > 0 {
            let mut by_hash: HashMap<Hash256, usize> = HashMap::new();
            for (i, h) in self.key_hashes()?.into_iter().enumerate() {
                by_hash.entry(h).or_insert(i);
            }
            for row in rows {
                let hash = self.incoming_key_hash(&row)?;
                match by_hash.get(&hash) {
                    Some(&target) => {
                        for (field, value) in &row {
                            self.backend.set_cell_value(target, field, value)?;
                        }
                    }
                    None => to_append.push(row),
                }
            }
        } else {
            to_append = rows;
        }

        if !to_append.is_empty() {
            let n = to_append.len();
            let mut soa = StructOfArrays::new();
            for (i, row) in to_append.iter().enumerate() {
                for (field, value) in row {
                    let fill = self.descriptors[field].empty_value();
                    soa.entry(field.clone())
                        .or_insert_with(|| vec![fill; n])[i] = value.clone();
                }
            }
            self.backend.add_rows(&soa)?;
        }

        self.data_pending = true;
        self.maybe_apply()
    }

    fn incoming_key_hash(&self, row: &RowStruct) -> Result<Hash256> {
        let mut tuple = Vec::with_capacity(self.key_fields.len());
        for field in &self.key_fields {
            let descriptor = &self.descriptors[field];
            let raw = row.get(field).cloned().unwrap_or(descriptor.empty_value());
            tuple.push(descriptor.convert_one(&raw)?);
        }
        Ok(hash_key_tuple(&tuple))
    }

    /// Overwrite the rows selected by `mask` with column-major values.
    pub fn replace_entries(mut self, rows: &StructOfArrays, mask: &[bool]) -> Result<Self> {
        self.ensure_data_fresh()?;
        for name in rows.keys() {
            if !self.descriptors.contains_key(name) {
                return Err(Error::UnknownField(name.clone()));
            }
        }
        self.backend.replace_rows(rows, mask)?;
        self.data_pending = true;
        self.maybe_apply()
    }

    /// Fold another table's rows in through the add/upsert path.
    pub fn merge(self, other: &Table, upsert: bool) -> Result<Self> {
        let rows = other.full_entries_as_struct()?;
        self.add_entries(rows, upsert)
    }

    pub fn set_cell(mut self, row: usize, field: &str, value: Value) -> Result<Self> {
        self.ensure_data_fresh()?;
        if !self.descriptors.contains_key(field) {
            return Err(Error::UnknownField(field.to_string()));
        }
        self.backend.set_cell_value(row, field, &value)?;
        self.data_pending = true;
        self.maybe_apply()
    }

    /// Keep the first row per key-field hash, preserving relative order.
    pub fn deduplicate_by_key_fields(mut self) -> Result<Self> {
        let hashes = self.key_hashes()?;
        let mut seen = HashSet::new();
        let keep: Vec<usize> = hashes
            .iter()
            .enumerate()
            .filter_map(|(i, h)| if seen.insert(*h) { Some(i) } else { None })
            .collect();
        if keep.len() == hashes.len() {
            return Ok(self);
        }
        let target = keep.len();
        self.backend.select_and_reorder(&keep)?;
        if self.backend.row_count() != target {
            return Err(Error::Invariant(format!(
                "deduplication expected {} rows, storage reports {}",
                target,
                self.backend.row_count()
            )));
        }
        Ok(self)
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{CmpOp, Predicate};

    fn sample() -> Table {
        Table::from_columns(vec![
            (
                "id".into(),
                vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)],
            ),
            (
                "name".into(),
                vec![
                    Value::Text("ada".into()),
                    Value::Text("bo".into()),
                    Value::Text("cy".into()),
                ],
            ),
        ])
        .unwrap()
        .with_key_fields(&["id"])
        .unwrap()
    }

    #[test]
    fn filter_applies_in_auto_mode() {
        let t = sample()
            .filter(FilterSpec::keep(
                "id",
                Predicate::Cmp(CmpOp::Ge, Value::Number(2.0)),
            ))
            .unwrap();
        assert_eq!(t.row_count().unwrap(), 2);
        assert_eq!(t.column("id").unwrap(), ColumnValues::Numeric(vec![2.0, 3.0]));
    }

    #[test]
    fn manual_mode_defers_and_guards() {
        let t = sample()
            .with_auto_apply(false)
            .unwrap()
            .filter(FilterSpec::keep("id", Predicate::Equals(Value::Number(1.0))))
            .unwrap();
        assert_eq!(t.pending_stages(), (false, true, false));
        assert!(matches!(t.row_count(), Err(Error::StaleState(_))));
        let t = t.apply().unwrap();
        assert_eq!(t.pending_stages(), (false, false, false));
        assert_eq!(t.row_count().unwrap(), 1);
    }

    #[test]
    fn config_formats_reach_inference() {
        let mut config = EngineConfig::default();
        config.date_format = "%d/%m/%Y".to_string();
        let cols = vec![(
            "day".to_string(),
            vec![Value::Text("02/01/2020".into()), Value::Text("03/01/2020".into())],
        )];
        let t = Table::from_columns_with_config(cols.clone(), &config).unwrap();
        assert!(matches!(
            t.descriptor("day").unwrap(),
            FieldDescriptor::Date { .. }
        ));
        // The same cells stay text under the default format.
        let t = Table::from_columns(cols).unwrap();
        assert_eq!(t.descriptor("day").unwrap(), &FieldDescriptor::Text);
    }

    #[test]
    fn config_auto_apply_reaches_new_tables() {
        let mut config = EngineConfig::default();
        config.auto_apply = false;
        let t = Table::from_columns_with_config(
            vec![("id".to_string(), vec![Value::Number(1.0), Value::Number(2.0)])],
            &config,
        )
        .unwrap()
        .filter(FilterSpec::keep("id", Predicate::Equals(Value::Number(2.0))))
        .unwrap();
        assert!(!t.auto_apply());
        assert!(matches!(t.row_count(), Err(Error::StaleState(_))));
        assert_eq!(t.apply().unwrap().row_count().unwrap(), 1);
    }

    #[test]
    fn add_then_remove_field_restores_order() {
        let t = sample();
        let before: Vec<String> = t.field_names().unwrap().to_vec();
        let t = t
            .add_field("score", vec![Value::Number(0.0); 3], None)
            .unwrap()
            .remove_field("score")
            .unwrap();
        assert_eq!(t.field_names().unwrap(), before.as_slice());
    }

    #[test]
    fn duplicate_field_is_a_collision() {
        let err = sample()
            .add_field("id", vec![Value::Number(9.0); 3], None)
            .unwrap_err();
        assert!(matches!(err, Error::NameCollision(_)));
    }

    #[test]
    fn add_entries_rejects_unknown_field() {
        let mut row = RowStruct::new();
        row.insert("bogus".into(), Value::Number(1.0));
        let err = sample().add_entries(vec![row], false).unwrap_err();
        assert!(matches!(err, Error::UnknownField(name) if name == "bogus"));
    }

    #[test]
    fn upsert_overwrites_matching_key() {
        let mut row = RowStruct::new();
        row.insert("id".into(), Value::Number(2.0));
        row.insert("name".into(), Value::Text("beatrix".into()));
        let t = sample().add_entries(vec![row], true).unwrap();
        assert_eq!(t.row_count().unwrap(), 3);
        assert_eq!(t.value_at(1, "name").unwrap(), Value::Text("beatrix".into()));
    }

    #[test]
    fn replace_entries_overwrites_masked_rows_only() {
        let mut rows = StructOfArrays::new();
        rows.insert("name".into(), vec![Value::Text("beatrix".into())]);
        let t = sample().replace_entries(&rows, &[false, true, false]).unwrap();
        assert_eq!(
            t.column("name").unwrap(),
            ColumnValues::Text(vec!["ada".into(), "beatrix".into(), "cy".into()])
        );
        assert_eq!(t.column("id").unwrap(), ColumnValues::Numeric(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn replace_entries_rejects_unknown_field() {
        let mut rows = StructOfArrays::new();
        rows.insert("bogus".into(), vec![Value::Number(0.0)]);
        let err = sample().replace_entries(&rows, &[true, false, false]).unwrap_err();
        assert!(matches!(err, Error::UnknownField(name) if name == "bogus"));
    }

    #[test]
    fn merge_upserts_matches_and_appends_the_rest() {
        let other = Table::from_columns(vec![
            ("id".into(), vec![Value::Number(2.0), Value::Number(4.0)]),
            (
                "name".into(),
                vec![Value::Text("beatrix".into()), Value::Text("dara".into())],
            ),
        ])
        .unwrap();
        let t = sample().merge(&other, true).unwrap();
        assert_eq!(t.row_count().unwrap(), 4);
        assert_eq!(
            t.column("name").unwrap(),
            ColumnValues::Text(vec![
                "ada".into(),
                "beatrix".into(),
                "cy".into(),
                "dara".into()
            ])
        );
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let t = Table::from_columns(vec![
            (
                "k".into(),
                vec![Value::Number(1.0), Value::Number(2.0), Value::Number(1.0)],
            ),
            (
                "x".into(),
                vec![
                    Value::Text("a".into()),
                    Value::Text("b".into()),
                    Value::Text("c".into()),
                ],
            ),
        ])
        .unwrap()
        .with_key_fields(&["k"])
        .unwrap()
        .deduplicate_by_key_fields()
        .unwrap();
        assert_eq!(t.row_count().unwrap(), 2);
        assert_eq!(
            t.column("x").unwrap(),
            ColumnValues::Text(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn two_key_sort_first_key_dominates() {
        let t = Table::from_columns(vec![
            (
                "a".into(),
                vec![
                    Value::Number(1.0),
                    Value::Number(2.0),
                    Value::Number(1.0),
                    Value::Number(2.0),
                ],
            ),
            (
                "b".into(),
                vec![
                    Value::Number(10.0),
                    Value::Number(30.0),
                    Value::Number(20.0),
                    Value::Number(40.0),
                ],
            ),
        ])
        .unwrap()
        .sort(SortSpec::ascending("a").then_descending("b"))
        .unwrap();
        assert_eq!(
            t.column("b").unwrap(),
            ColumnValues::Numeric(vec![20.0, 10.0, 40.0, 30.0])
        );
    }

    #[test]
    fn stale_column_read_fails_not_partial() {
        let t = sample()
            .with_auto_apply(false)
            .unwrap()
            .sort(SortSpec::descending("id"))
            .unwrap();
        assert!(matches!(t.column("id"), Err(Error::StaleState(_))));
    }
}
