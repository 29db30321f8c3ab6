//! Box drawn text tables for the command line summaries.

use std::fmt::{self, Display, Write};

use unicode_width::UnicodeWidthStr;

/// A table built column by column and rendered with box drawing characters.
#[derive(Default, Debug)]
pub struct SummaryTable {
    title: Option<String>,
    footer: Option<String>,
    column_names: Vec<String>,
    columns: Vec<Vec<String>>,
    fill: String,
}

impl SummaryTable {
    /// Create an empty table.
    pub fn new() -> Self {
        SummaryTable::default()
    }

    /// Set a title, centered above the columns.
    pub fn with_title<T: Display>(self, title: T) -> Self {
        SummaryTable {
            title: Some(title.to_string()),
            ..self
        }
    }

    /// Set a footer, left aligned below the columns.
    pub fn with_footer<T: Display>(self, footer: T) -> Self {
        SummaryTable {
            footer: Some(footer.to_string()),
            ..self
        }
    }

    /// Text shown in cells of columns shorter than the longest one.
    pub fn with_fill<T: AsRef<str>>(self, fill: T) -> Self {
        SummaryTable {
            fill: fill.as_ref().to_owned(),
            ..self
        }
    }

    /// Append a column.
    pub fn with_column<T, V>(mut self, name: T, vals: &[V]) -> Self
    where
        T: Display,
        V: Display,
    {
        self.column_names.push(name.to_string());
        self.columns.push(vals.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Render the table, one trailing newline included.
    pub fn render(&self) -> Result<String, fmt::Error> {
        let col_widths: Vec<usize> = self
            .column_names
            .iter()
            .zip(&self.columns)
            .map(|(name, vals)| {
                vals.iter()
                    .map(|v| UnicodeWidthStr::width(v.as_str()))
                    .chain(std::iter::once(UnicodeWidthStr::width(name.as_str())))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let cols_width = col_widths.iter().sum::<usize>() + col_widths.len().saturating_sub(1);
        let title_width = self
            .title
            .as_ref()
            .map(|t| UnicodeWidthStr::width(t.as_str()))
            .unwrap_or(0);
        let footer_width = self
            .footer
            .iter()
            .flat_map(|f| f.lines())
            .map(UnicodeWidthStr::width)
            .max()
            .unwrap_or(0);
        let table_width = cols_width.max(title_width).max(footer_width);

        let mut out = String::new();

        let (mut left, mut right) = ('\u{250c}', '\u{2510}');
        if let Some(ref title) = self.title {
            writeln!(out, "{}{}{}", left, "\u{2500}".repeat(table_width), right)?;
            writeln!(out, "\u{2502}{0:^1$}\u{2502}", title, table_width)?;
            left = '\u{251c}';
            right = '\u{2524}';
        }

        if col_widths.is_empty() {
            writeln!(out, "{}{}{}", left, "\u{2500}".repeat(table_width), right)?;
        } else {
            rule(&mut out, left, '\u{252c}', right, &col_widths)?;
            for (name, &width) in self.column_names.iter().zip(&col_widths) {
                write!(out, "\u{2502}{0:^1$}", name, width)?;
            }
            writeln!(out, "\u{2502}")?;
            rule(&mut out, '\u{251c}', '\u{253c}', '\u{2524}', &col_widths)?;

            let num_rows = self.columns.iter().map(Vec::len).max().unwrap_or(0);
            for i in 0..num_rows {
                for (col, &width) in self.columns.iter().zip(&col_widths) {
                    let val = col.get(i).unwrap_or(&self.fill);
                    write!(out, "\u{2502}{0:>1$}", val, width)?;
                }
                writeln!(out, "\u{2502}")?;
            }
        }

        match self.footer {
            Some(ref footer) => {
                if !col_widths.is_empty() {
                    rule(&mut out, '\u{251c}', '\u{2534}', '\u{2524}', &col_widths)?;
                }
                for line in footer.lines() {
                    writeln!(out, "\u{2502}{0:<1$}\u{2502}", line, table_width)?;
                }
                writeln!(out, "\u{2514}{}\u{2518}", "\u{2500}".repeat(table_width))?;
            }
            None if !col_widths.is_empty() => {
                rule(&mut out, '\u{2514}', '\u{2534}', '\u{2518}', &col_widths)?
            }
            None => {}
        }

        Ok(out)
    }

    /// Render to stdout.
    pub fn print(&self) -> Result<(), fmt::Error> {
        print!("{}", self.render()?);
        Ok(())
    }
}

// A horizontal border with a junction between each column.
fn rule(out: &mut String, left: char, mid: char, right: char, widths: &[usize]) -> fmt::Result {
    out.push(left);
    for (i, &width) in widths.iter().enumerate() {
        if i > 0 {
            out.push(mid);
        }
        out.push_str(&"\u{2500}".repeat(width));
    }
    out.push(right);
    out.push('\n');
    Ok(())
}
