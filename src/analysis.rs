use crate::counts::CountData;
use crate::stats::reduce_rows;
use crate::table::Table;
use anyhow::{Context, Result, bail};
use std::path::Path;

/// Collects the count data of every seed and reduces it per observable.
pub struct Aggregator {
    n_cols: usize,
    have_header: bool,
    seeds: Vec<CountData>,
}

/// Per-row means and standard deviations of every observable.
pub struct Aggregate {
    pub means: Table,
    pub stds: Table,
}

impl Aggregator {
    pub fn new(n_cols: usize, have_header: bool) -> Self {
        Self {
            n_cols,
            have_header,
            seeds: Vec::new(),
        }
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let data = CountData::from_file(file, self.have_header)?;

        if data.n_cols() != self.n_cols {
            bail!(
                "{file:?} has {} columns, but the reference file has {}",
                data.n_cols(),
                self.n_cols
            );
        }
        if let Some(first) = self.seeds.first() {
            if data.n_rows() != first.n_rows() {
                bail!(
                    "{file:?} has {} rows, but the first seed file has {}",
                    data.n_rows(),
                    first.n_rows()
                );
            }
        }

        log::debug!("added {file:?} ({} rows)", data.n_rows());
        self.seeds.push(data);
        Ok(())
    }

    pub fn n_seeds(&self) -> usize {
        self.seeds.len()
    }

    /// Reduce every observable column over all seeds.
    pub fn reduce(&self) -> Result<Aggregate> {
        if self.seeds.is_empty() {
            bail!("no seed files were added");
        }

        let mut mean_cols = Vec::with_capacity(self.n_cols - 1);
        let mut std_cols = Vec::with_capacity(self.n_cols - 1);
        for i_obs in 1..self.n_cols {
            let mat = self.observable_matrix(i_obs);
            let (means, stds) = reduce_rows(&mat);
            mean_cols.push(means);
            std_cols.push(stds);
        }

        Ok(Aggregate {
            means: Table::from_columns(&mean_cols).context("failed to build means table")?,
            stds: Table::from_columns(&std_cols).context("failed to build stds table")?,
        })
    }

    /// Matrix of one observable, rows = time steps, columns = seeds.
    fn observable_matrix(&self, i_obs: usize) -> Vec<Vec<f64>> {
        let n_rows = self.seeds[0].n_rows();
        let mut mat = vec![Vec::with_capacity(self.seeds.len()); n_rows];
        for seed in &self.seeds {
            for (row, val) in mat.iter_mut().zip(seed.column(i_obs)) {
                row.push(val);
            }
        }
        mat
    }
}
