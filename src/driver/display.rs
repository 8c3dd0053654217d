use std::fmt::Display;
use std::fmt::Formatter;

use crate::catalog::value::Value;

/// Renders rows as an ASCII table with a header line.
pub struct TabularDisplay<'a, 'b> {
    columns: &'a [String],
    rows: &'b [Vec<Value>],
}

impl<'a, 'b> TabularDisplay<'a, 'b> {
    pub fn new(columns: &'a [String], rows: &'b [Vec<Value>]) -> Self {
        Self { columns, rows }
    }
}

impl<'a, 'b> Display for TabularDisplay<'a, 'b> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "Empty result set");
        }

        // Calculate initial widths with column name
        let mut widths = self.columns.iter().map(|c| c.chars().count()).collect::<Vec<_>>();

        // Prepare row data with split lines and calculate widths
        let mut row_lines: Vec<Vec<Vec<String>>> = Vec::with_capacity(self.rows.len());
        let mut row_heights = Vec::with_capacity(self.rows.len());

        for row in self.rows {
            let mut cells: Vec<Vec<String>> = Vec::with_capacity(row.len());
            let mut height = 1;

            for (i, value) in row.iter().enumerate() {
                let lines: Vec<String> = match value {
                    Value::Null => vec!["NULL".to_string()],
                    Value::Varchar(s) => s.lines().map(|line| line.to_string()).collect(),
                    _ => vec![value.to_string()],
                };

                let longest = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(longest);
                }

                height = height.max(lines.len());
                cells.push(lines);
            }

            row_lines.push(cells);
            row_heights.push(height);
        }

        let print_border = |f: &mut Formatter<'_>| -> std::fmt::Result {
            write!(f, "+")?;
            for width in &widths {
                write!(f, "{:-<width$}+", "", width = width + 2)?;
            }
            writeln!(f)
        };

        print_border(f)?;
        write!(f, "|")?;
        for (i, name) in self.columns.iter().enumerate() {
            write!(f, " {:width$} |", name, width = widths[i])?;
        }
        writeln!(f)?;
        print_border(f)?;

        for (cells, height) in row_lines.iter().zip(row_heights) {
            for line_idx in 0..height {
                write!(f, "|")?;
                for (col_idx, lines) in cells.iter().enumerate() {
                    let line = lines.get(line_idx).map(|s| s.as_str()).unwrap_or("");
                    let width = widths.get(col_idx).copied().unwrap_or(0);
                    write!(f, " {:width$} |", line, width = width)?;
                }
                writeln!(f)?;
            }
        }
        print_border(f)?;

        Ok(())
    }
}
