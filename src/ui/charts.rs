use std::fmt::{self, Display, Write};

use crate::data::aggregate::{CountTable, CrossTab};

/// Width of the longest bar, in characters.
const BAR_WIDTH: usize = 40;

const NO_DATA: &str = "  (no data for the current filters)";

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Bar chart
// ---------------------------------------------------------------------------

/// Horizontal bar chart of a count table, bars scaled to the largest count.
pub fn bar_chart<K: Display>(out: &mut impl Write, title: &str, table: &CountTable<K>) -> fmt::Result {
    writeln!(out, "{title}")?;
    if table.is_empty() {
        return writeln!(out, "{NO_DATA}");
    }

    let pairs = table.pairs();
    let label_width = pairs.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = pairs.iter().map(|(_, n)| *n).max().unwrap_or(0).max(1);

    for (label, count) in &pairs {
        // Non-zero counts always get at least one block.
        let len = (count * BAR_WIDTH).div_ceil(max);
        writeln!(
            out,
            "  {label:<label_width$}  {bar:<BAR_WIDTH$}  {count}",
            bar = "█".repeat(len),
            count = thousands(*count),
        )?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Grid (cross-tab / heatmap)
// ---------------------------------------------------------------------------

/// Count matrix with a header row of column labels and a total column.
pub fn grid<R: Display, C: Display>(
    out: &mut impl Write,
    title: &str,
    table: &CrossTab<R, C>,
) -> fmt::Result {
    writeln!(out, "{title}")?;
    if table.is_empty() {
        return writeln!(out, "{NO_DATA}");
    }

    let row_labels: Vec<String> = table.rows().iter().map(|r| r.to_string()).collect();
    let col_labels: Vec<String> = table.columns().iter().map(|c| c.to_string()).collect();
    let label_width = row_labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let cell_width = (0..row_labels.len())
        .flat_map(|ri| (0..col_labels.len()).map(move |ci| (ri, ci)))
        .map(|(ri, ci)| thousands(table.get(ri, ci)).len())
        .chain(col_labels.iter().map(|c| c.chars().count()))
        .max()
        .unwrap_or(1);

    write!(out, "  {:<label_width$}", "")?;
    for col in &col_labels {
        write!(out, " {col:>cell_width$}")?;
    }
    writeln!(out, " {:>cell_width$}", "total")?;

    for (ri, label) in row_labels.iter().enumerate() {
        write!(out, "  {label:<label_width$}")?;
        for ci in 0..col_labels.len() {
            write!(out, " {:>cell_width$}", thousands(table.get(ri, ci)))?;
        }
        writeln!(out, " {:>cell_width$}", thousands(table.row_total(ri)))?;
    }
    Ok(())
}
