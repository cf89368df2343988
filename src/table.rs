use anyhow::{Context, Result, bail};
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

/// Dense numeric table, rows = time steps, columns = observables.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    rows: Vec<Vec<f64>>,
}

impl Table {
    /// Build a table from equally long columns.
    pub fn from_columns(cols: &[Vec<f64>]) -> Result<Self> {
        let n_rows = cols.first().map_or(0, Vec::len);
        if cols.iter().any(|col| col.len() != n_rows) {
            bail!("all columns must have {n_rows} rows");
        }

        let rows = (0..n_rows)
            .map(|i_row| cols.iter().map(|col| col[i_row]).collect())
            .collect();
        Ok(Self { rows })
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Write the table as whitespace-separated text, one row per line.
    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        for row in &self.rows {
            let line: Vec<_> = row.iter().map(|&val| format_value(val)).collect();
            writeln!(writer, "{}", line.join(" ")).context("failed to write row")?;
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Read a table previously written by [`Table::save`].
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let reader =
            BufReader::new(File::open(file).with_context(|| format!("failed to open {file:?}"))?);

        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (i_line, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("failed to read line {}", i_line + 1))?;
            if line.trim().is_empty() {
                continue;
            }

            let row = line
                .split_whitespace()
                .map(|item| {
                    item.parse::<f64>()
                        .with_context(|| format!("invalid value {item:?} on line {}", i_line + 1))
                })
                .collect::<Result<Vec<_>>>()?;
            if rows.first().is_some_and(|first| first.len() != row.len()) {
                bail!("line {} of {file:?} has {} columns", i_line + 1, row.len());
            }
            rows.push(row);
        }

        Ok(Self { rows })
    }
}

/// Format a value as `%.18e` with a signed, at least two-digit exponent.
fn format_value(val: f64) -> String {
    if !val.is_finite() {
        return val.to_string();
    }

    let formatted = format!("{val:.18e}");
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}
