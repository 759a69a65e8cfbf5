//! Reference in-memory storage backend.
//!
//! Column-major; every column holds its descriptor plus typed storage in
//! the shape the descriptor fixes. All mutation is synchronous, so
//! `apply_data` is the default no-op.

use std::collections::BTreeMap;

use reltab_core::error::{Error, Result};
use reltab_core::value::{ColumnValues, Value};
use reltab_fields::FieldDescriptor;

use crate::storage::{StorageBackend, StructOfArrays};

#[derive(Debug, Clone)]
struct ColumnSlot {
    descriptor: FieldDescriptor,
    values: ColumnValues,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    order: Vec<String>,
    columns: BTreeMap<String, ColumnSlot>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Result<&ColumnSlot> {
        self.columns
            .get(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    fn expect_len(&self, name: &str, len: usize) -> Result<()> {
        let rows = self.row_count();
        if !self.order.is_empty() && len != rows {
            return Err(Error::Invariant(format!(
                "field '{}' carries {} values for a table of {} rows",
                name, len, rows
            )));
        }
        Ok(())
    }
}

impl StorageBackend for MemoryBackend {
    fn fields(&self) -> (Vec<String>, BTreeMap<String, FieldDescriptor>) {
        let descriptors = self
            .columns
            .iter()
            .map(|(name, slot)| (name.clone(), slot.descriptor.clone()))
            .collect();
        (self.order.clone(), descriptors)
    }

    fn row_count(&self) -> usize {
        self.order
            .first()
            .and_then(|name| self.columns.get(name))
            .map(|slot| slot.values.len())
            .unwrap_or(0)
    }

    fn column_values(
        &self,
        fields: &[String],
        mask: Option<&[bool]>,
    ) -> Result<BTreeMap<String, ColumnValues>> {
        let picked: Option<Vec<usize>> = match mask {
            Some(mask) => {
                if mask.len() != self.row_count() {
                    return Err(Error::Invariant(format!(
                        "row mask of {} entries for {} rows",
                        mask.len(),
                        self.row_count()
                    )));
                }
                Some(
                    mask.iter()
                        .enumerate()
                        .filter_map(|(i, &keep)| if keep { Some(i) } else { None })
                        .collect(),
                )
            }
            None => None,
        };

        let mut out = BTreeMap::new();
        for name in fields {
            let slot = self.slot(name)?;
            let values = match &picked {
                Some(indices) => slot.values.select(indices),
                None => slot.values.clone(),
            };
            out.insert(name.clone(), values);
        }
        Ok(out)
    }

    fn select_and_reorder(&mut self, indices: &[usize]) -> Result<()> {
        let rows = self.row_count();
        if let Some(&bad) = indices.iter().find(|&&i| i >= rows) {
            return Err(Error::Invariant(format!(
                "select index {} past {} rows",
                bad, rows
            )));
        }
        for slot in self.columns.values_mut() {
            slot.values = slot.values.select(indices);
        }
        Ok(())
    }

    fn set_field(
        &mut self,
        name: &str,
        values: &[Value],
        descriptor: FieldDescriptor,
        position: Option<usize>,
    ) -> Result<()> {
        let converted = descriptor.convert(values)?;
        if self.columns.contains_key(name) {
            // Replacement keeps the column's position.
            self.expect_len(name, converted.len())?;
            self.columns.insert(
                name.to_string(),
                ColumnSlot {
                    descriptor,
                    values: converted,
                },
            );
        } else {
            self.expect_len(name, converted.len())?;
            let at = position.unwrap_or(self.order.len()).min(self.order.len());
            self.order.insert(at, name.to_string());
            self.columns.insert(
                name.to_string(),
                ColumnSlot {
                    descriptor,
                    values: converted,
                },
            );
        }
        Ok(())
    }

    fn remove_field(&mut self, name: &str) -> Result<()> {
        if self.columns.remove(name).is_none() {
            return Err(Error::UnknownField(name.to_string()));
        }
        self.order.retain(|n| n != name);
        Ok(())
    }

    fn add_rows(&mut self, rows: &StructOfArrays) -> Result<()> {
        for name in rows.keys() {
            if !self.columns.contains_key(name) {
                return Err(Error::UnknownField(name.clone()));
            }
        }
        let incoming = rows.values().map(Vec::len).max().unwrap_or(0);
        if let Some((name, vals)) = rows.iter().find(|(_, v)| v.len() != incoming) {
            return Err(Error::Invariant(format!(
                "ragged row block: field '{}' has {} of {} values",
                name,
                vals.len(),
                incoming
            )));
        }
        if incoming == 0 {
            return Ok(());
        }
        for name in &self.order {
            let slot = self.columns.get_mut(name).ok_or_else(|| {
                Error::Invariant(format!("column order lists unknown field '{}'", name))
            })?;
            let converted = match rows.get(name) {
                Some(raw) => slot.descriptor.convert(raw)?,
                None => {
                    let fill = vec![slot.descriptor.empty_value(); incoming];
                    slot.descriptor.convert(&fill)?
                }
            };
            slot.values.append(&converted)?;
        }
        Ok(())
    }

    fn replace_rows(&mut self, rows: &StructOfArrays, mask: &[bool]) -> Result<()> {
        if mask.len() != self.row_count() {
            return Err(Error::Invariant(format!(
                "row mask of {} entries for {} rows",
                mask.len(),
                self.row_count()
            )));
        }
        let targets: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &hit)| if hit { Some(i) } else { None })
            .collect();
        for (name, raw) in rows {
            if raw.len() != targets.len() {
                return Err(Error::Invariant(format!(
                    "field '{}' carries {} values for {} masked rows",
                    name,
                    raw.len(),
                    targets.len()
                )));
            }
            let slot = self
                .columns
                .get_mut(name)
                .ok_or_else(|| Error::UnknownField(name.clone()))?;
            for (&row, value) in targets.iter().zip(raw) {
                let canonical = slot.descriptor.convert_one(value)?;
                slot.values.set(row, canonical)?;
            }
        }
        Ok(())
    }

    fn set_cell_value(&mut self, row: usize, field: &str, value: &Value) -> Result<()> {
        let slot = self
            .columns
            .get_mut(field)
            .ok_or_else(|| Error::UnknownField(field.to_string()))?;
        let canonical = slot.descriptor.convert_one(value)?;
        slot.values.set(row, canonical)
    }

    fn boxed_clone(&self) -> Box<dyn StorageBackend> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> MemoryBackend {
        let mut b = MemoryBackend::new();
        b.set_field(
            "id",
            &[Value::Number(1.0), Value::Number(2.0)],
            FieldDescriptor::Scalar,
            None,
        )
        .unwrap();
        b.set_field(
            "name",
            &[Value::Text("a".into()), Value::Text("b".into())],
            FieldDescriptor::Text,
            None,
        )
        .unwrap();
        b
    }

    #[test]
    fn add_rows_fills_missing_fields() {
        let mut b = backend();
        let mut rows = StructOfArrays::new();
        rows.insert("id".into(), vec![Value::Number(3.0)]);
        b.add_rows(&rows).unwrap();
        assert_eq!(b.row_count(), 3);
        let cols = b.column_values(&["name".into()], None).unwrap();
        assert_eq!(
            cols["name"],
            ColumnValues::Text(vec!["a".into(), "b".into(), String::new()])
        );
    }

    #[test]
    fn add_rows_rejects_unknown_field() {
        let mut b = backend();
        let mut rows = StructOfArrays::new();
        rows.insert("missing".into(), vec![Value::Number(1.0)]);
        assert!(matches!(
            b.add_rows(&rows),
            Err(Error::UnknownField(name)) if name == "missing"
        ));
    }

    #[test]
    fn select_and_reorder_applies_to_every_column() {
        let mut b = backend();
        b.select_and_reorder(&[1]).unwrap();
        assert_eq!(b.row_count(), 1);
        let cols = b
            .column_values(&["id".into(), "name".into()], None)
            .unwrap();
        assert_eq!(cols["id"], ColumnValues::Numeric(vec![2.0]));
        assert_eq!(cols["name"], ColumnValues::Text(vec!["b".into()]));
    }

    #[test]
    fn replace_rows_targets_masked_rows_in_order() {
        let mut b = backend();
        let mut rows = StructOfArrays::new();
        rows.insert("name".into(), vec![Value::Text("z".into())]);
        b.replace_rows(&rows, &[false, true]).unwrap();
        let cols = b.column_values(&["name".into()], None).unwrap();
        assert_eq!(cols["name"], ColumnValues::Text(vec!["a".into(), "z".into()]));
    }

    #[test]
    fn masked_read_selects_rows() {
        let b = backend();
        let cols = b
            .column_values(&["id".into()], Some(&[true, false]))
            .unwrap();
        assert_eq!(cols["id"], ColumnValues::Numeric(vec![1.0]));
    }
}
