//! Storage backend contract.
//!
//! The in-memory backend is the reference implementation; a
//! lazily-loaded/cached backend must satisfy the same contract, deferring
//! field population until `column_values` actually requests that field
//! and doing its deferred work in `apply_data`.

use std::collections::BTreeMap;
use std::fmt;

use reltab_core::error::Result;
use reltab_core::value::{ColumnValues, Value};
use reltab_fields::FieldDescriptor;

/// One logical row at the API boundary.
pub type RowStruct = BTreeMap<String, Value>;

/// Column-major raw values keyed by field name.
pub type StructOfArrays = BTreeMap<String, Vec<Value>>;

pub trait StorageBackend: fmt::Debug + Send + Sync {
    /// Field names in column order plus the descriptor map.
    fn fields(&self) -> (Vec<String>, BTreeMap<String, FieldDescriptor>);

    fn row_count(&self) -> usize;

    /// Typed values for the requested fields, optionally masked by row.
    fn column_values(
        &self,
        fields: &[String],
        mask: Option<&[bool]>,
    ) -> Result<BTreeMap<String, ColumnValues>>;

    /// Re-index every column through one permutation/selection:
    /// `row k` of the result is `row indices[k]` of the input.
    fn select_and_reorder(&mut self, indices: &[usize]) -> Result<()>;

    /// Insert or replace a field. `position` places a new field within
    /// the column order; a replaced field keeps its position.
    fn set_field(
        &mut self,
        name: &str,
        values: &[Value],
        descriptor: FieldDescriptor,
        position: Option<usize>,
    ) -> Result<()>;

    fn remove_field(&mut self, name: &str) -> Result<()>;

    /// Append rows given column-major raw values. Fields absent from
    /// `rows` are filled with their descriptor's empty value; unknown
    /// field names fail.
    fn add_rows(&mut self, rows: &StructOfArrays) -> Result<()>;

    /// Overwrite the rows selected by `mask` (in row order) with the
    /// provided values.
    fn replace_rows(&mut self, rows: &StructOfArrays, mask: &[bool]) -> Result<()>;

    fn set_cell_value(&mut self, row: usize, field: &str, value: &Value) -> Result<()>;

    /// Deferred-data hook; the in-memory backend has nothing to do.
    fn apply_data(&mut self) -> Result<()> {
        Ok(())
    }

    fn boxed_clone(&self) -> Box<dyn StorageBackend>;
}

impl Clone for Box<dyn StorageBackend> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}
