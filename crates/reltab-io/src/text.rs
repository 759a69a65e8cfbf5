//! Fixed-width terminal rendering.

use reltab_table::Table;

use crate::error::Result;

/// Render up to `max_rows` rows as a fixed-width text grid with a
/// header and separator line. A truncation notice is appended when rows
/// were cut.
pub fn render_text(table: &Table, max_rows: usize) -> Result<String> {
    let names = table.field_names()?.to_vec();
    let total_rows = table.row_count()?;
    let shown = total_rows.min(max_rows);

    let mut columns = Vec::with_capacity(names.len());
    let mut widths = Vec::with_capacity(names.len());
    for name in &names {
        let cells = table.display_strings(name)?;
        let width = cells[..shown]
            .iter()
            .map(|c| c.chars().count())
            .chain(std::iter::once(name.chars().count()))
            .max()
            .unwrap_or(0);
        widths.push(width);
        columns.push(cells);
    }

    let mut out = String::new();
    push_row(&mut out, names.iter().map(String::as_str), &widths);
    let rule_len: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');
    for r in 0..shown {
        push_row(&mut out, columns.iter().map(|c| c[r].as_str()), &widths);
    }
    if shown < total_rows {
        out.push_str(&format!("... {} more rows\n", total_rows - shown));
    }
    Ok(out)
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    for (i, (cell, width)) in cells.zip(widths).enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(cell);
        for _ in cell.chars().count()..*width {
            out.push(' ');
        }
    }
    // trailing pad spaces on the last column are noise
    while out.ends_with(' ') {
        out.pop();
    }
    out.push('\n');
}
