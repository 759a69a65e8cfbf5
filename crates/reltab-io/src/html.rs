//! HTML table export.

use std::io::Write;

use reltab_table::Table;

use crate::error::Result;

/// Write the table as a plain `<table>` element with a header row.
/// Cells are escaped; styling is the embedder's problem.
pub fn write_html<W: Write>(table: &Table, mut writer: W) -> Result<()> {
    let names = table.field_names()?.to_vec();
    let mut columns = Vec::with_capacity(names.len());
    for name in &names {
        columns.push(table.display_strings(name)?);
    }

    writeln!(writer, "<table>")?;
    writeln!(writer, "<thead><tr>")?;
    for name in &names {
        writeln!(writer, "<th>{}</th>", escape(name))?;
    }
    writeln!(writer, "</tr></thead>")?;
    writeln!(writer, "<tbody>")?;
    for r in 0..table.row_count()? {
        write!(writer, "<tr>")?;
        for col in &columns {
            write!(writer, "<td>{}</td>", escape(&col[r]))?;
        }
        writeln!(writer, "</tr>")?;
    }
    writeln!(writer, "</tbody>")?;
    writeln!(writer, "</table>")?;
    Ok(())
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reltab_core::value::Value;

    #[test]
    fn escapes_markup_in_cells() {
        let t = Table::from_columns(vec![(
            "note".into(),
            vec![Value::Text("<b>&".into())],
        )])
        .unwrap();
        let mut out = Vec::new();
        write_html(&t, &mut out).unwrap();
        let html = String::from_utf8(out).unwrap();
        assert!(html.contains("<td>&lt;b&gt;&amp;</td>"));
        assert!(html.contains("<th>note</th>"));
    }
}
