//! CSV export and import.
//!
//! Export renders cells through each field's display formatting, so
//! dates and p-values leave the engine the same way they print. Import
//! reads raw strings and lets descriptor inference type the columns.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use reltab_core::config::EngineConfig;
use reltab_core::value::Value;
use reltab_table::Table;

use crate::error::{Error, Result};

/// Write the table as CSV with a header row.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let names = table.field_names()?.to_vec();
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&names)?;

    let mut columns = Vec::with_capacity(names.len());
    for name in &names {
        columns.push(table.display_strings(name)?);
    }
    let rows = table.row_count()?;
    for r in 0..rows {
        wtr.write_record(columns.iter().map(|c| c[r].as_str()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_path<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let f = File::create(path)?;
    write_csv(table, f)
}

/// Read a CSV with a header row into a table, inferring each column's
/// descriptor from its cells. Empty cells come in as missing values.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    read_csv_with_config(reader, &EngineConfig::default())
}

/// Read a CSV under an engine config: inference parses dates with the
/// configured formats and the table starts in the configured apply mode.
pub fn read_csv_with_config<R: Read>(reader: R, config: &EngineConfig) -> Result<Table> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(Error::Format("csv input has no header row".into()));
    }

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(Error::Format(format!(
                "row {} has {} cells, header has {}",
                line + 1,
                record.len(),
                headers.len()
            )));
        }
        for (col, cell) in record.iter().enumerate() {
            let value = if cell.is_empty() {
                Value::Empty
            } else {
                Value::Text(cell.to_string())
            };
            columns[col].push(value);
        }
    }

    let table =
        Table::from_columns_with_config(headers.into_iter().zip(columns).collect(), config)?;
    Ok(table)
}

pub fn read_csv_path<P: AsRef<Path>>(path: P) -> Result<Table> {
    let f = File::open(path)?;
    read_csv(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            (
                "id".into(),
                vec![Value::Number(1.0), Value::Number(2.0)],
            ),
            (
                "name".into(),
                vec![Value::Text("ada".into()), Value::Text("grace".into())],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn export_writes_header_then_display_rows() {
        let mut out = Vec::new();
        write_csv(&sample(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,name"));
        assert_eq!(lines.next(), Some("1,ada"));
        assert_eq!(lines.next(), Some("2,grace"));
    }

    #[test]
    fn import_infers_numeric_and_text_columns() {
        let input = "id,name\n1,ada\n2,grace\n";
        let t = read_csv(input.as_bytes()).unwrap();
        assert_eq!(t.row_count().unwrap(), 2);
        assert_eq!(t.descriptor("id").unwrap().kind_name(), "scalar");
        assert_eq!(t.descriptor("name").unwrap().kind_name(), "text");
        assert_eq!(t.value_at(1, "id").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn import_rejects_ragged_rows() {
        let input = "a,b\n1\n";
        assert!(read_csv(input.as_bytes()).is_err());
    }

    #[test]
    fn import_respects_configured_date_format() {
        let mut config = EngineConfig::default();
        config.date_format = "%d/%m/%Y".to_string();
        let input = "day\n02/01/2020\n03/01/2020\n";
        let t = read_csv_with_config(input.as_bytes(), &config).unwrap();
        assert_eq!(t.descriptor("day").unwrap().kind_name(), "date");
        // The same cells stay text under the default format.
        let t = read_csv(input.as_bytes()).unwrap();
        assert_eq!(t.descriptor("day").unwrap().kind_name(), "text");
    }

    #[test]
    fn empty_cells_become_missing() {
        let input = "x,y\n1,a\n,b\n";
        let t = read_csv(input.as_bytes()).unwrap();
        assert!(t.value_at(1, "x").unwrap().is_empty());
        assert_eq!(t.value_at(1, "y").unwrap(), Value::Text("b".into()));
    }
}
