use anyhow::{Context, Result, bail};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Count data of one simulation seed.
///
/// Column 0 holds the simulation time, every other column one observable.
#[derive(Debug, Clone, PartialEq)]
pub struct CountData {
    rows: Vec<Vec<f64>>,
}

impl CountData {
    /// Load the count data of a seed file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, contains a non-numeric
    /// value, has rows of different lengths, or contains no data.
    pub fn from_file<P: AsRef<Path>>(file: P, have_header: bool) -> Result<Self> {
        let file = file.as_ref();
        let reader =
            BufReader::new(File::open(file).with_context(|| format!("failed to open {file:?}"))?);

        let rows = parse_rows(reader, have_header, None)
            .with_context(|| format!("failed to parse {file:?}"))?;
        if rows.is_empty() {
            bail!("{file:?} contains no data");
        }

        Ok(Self { rows })
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.rows[0].len()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn column(&self, i_col: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |row| row[i_col])
    }
}

/// Read only the first data row of a seed file and return its length.
pub fn detect_n_cols<P: AsRef<Path>>(file: P, have_header: bool) -> Result<usize> {
    let file = file.as_ref();
    let reader =
        BufReader::new(File::open(file).with_context(|| format!("failed to open {file:?}"))?);

    let rows = parse_rows(reader, have_header, Some(1))
        .with_context(|| format!("failed to parse {file:?}"))?;
    let n_cols = rows
        .first()
        .map(Vec::len)
        .with_context(|| format!("{file:?} contains no data"))?;
    if n_cols < 2 {
        bail!("{file:?} must have a time column and an observable, but has {n_cols} columns");
    }

    Ok(n_cols)
}

fn parse_rows<R: BufRead>(
    reader: R,
    have_header: bool,
    limit: Option<usize>,
) -> Result<Vec<Vec<f64>>> {
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (i_line, line) in reader.lines().enumerate().skip(have_header as usize) {
        if limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }

        let line = line.with_context(|| format!("failed to read line {}", i_line + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let row = line
            .split_whitespace()
            .map(|item| {
                item.parse::<f64>()
                    .with_context(|| format!("invalid value {item:?} on line {}", i_line + 1))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                bail!(
                    "line {} has {} columns, but the first data row has {}",
                    i_line + 1,
                    row.len(),
                    first.len()
                );
            }
        }

        rows.push(row);
    }

    Ok(rows)
}
