use crate::config::Config;
use crate::counts::CountData;
use crate::table::Table;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

pub const COUNT_MINMAX: &str = "COUNT_MINMAX";

/// Relative tolerance used when matching row times against a check window.
const TIME_TOL: f64 = 1e-9;

/// Significant digits of the emitted checkpoint times.
const TIME_DIGITS: usize = 6;

/// A `COUNT_MINMAX` check of the regression-test description.
///
/// Field order matches the layout expected by the test runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountMinMax {
    pub test_type: String,
    pub data_file: String,
    pub have_header: bool,
    pub min_time: f64,
    pub max_time: f64,
    pub count_minimum: Vec<i64>,
    pub count_maximum: Vec<i64>,
}

impl CountMinMax {
    /// Bounds spanning `n_sigma` standard deviations around the means of one row.
    ///
    /// Bounds are truncated toward zero, not rounded.
    pub fn from_row(time: f64, means: &[f64], stds: &[f64], cfg: &Config) -> Result<Self> {
        if means.len() != stds.len() {
            bail!(
                "means row has {} values, but stds row has {}",
                means.len(),
                stds.len()
            );
        }

        let mut count_minimum = Vec::with_capacity(means.len());
        let mut count_maximum = Vec::with_capacity(means.len());
        for (i_obs, (&mean, &std_dev)) in means.iter().zip(stds).enumerate() {
            let spread = cfg.n_sigma * std_dev;
            let min = truncate(mean - spread)
                .with_context(|| format!("invalid minimum of observable {i_obs}"))?;
            let max = truncate(mean + spread)
                .with_context(|| format!("invalid maximum of observable {i_obs}"))?;
            count_minimum.push(min);
            count_maximum.push(max);
        }

        Ok(Self {
            test_type: COUNT_MINMAX.into(),
            data_file: cfg.data_file.clone(),
            have_header: cfg.have_header,
            min_time: time,
            max_time: time,
            count_minimum,
            count_maximum,
        })
    }

    /// Check every row of `data` that falls in the time window against the bounds.
    ///
    /// A window bound of zero or less is ignored. A window containing no row
    /// is an error, since nothing would be checked.
    pub fn check(&self, data: &CountData) -> Result<()> {
        if self.test_type != COUNT_MINMAX {
            bail!("unsupported test type {:?}", self.test_type);
        }

        let n_obs = data.n_cols() - 1;
        if self.count_minimum.len() != n_obs {
            bail!("number of constraints in countMinimum does not match number of data columns");
        }
        if self.count_maximum.len() != n_obs {
            bail!("number of constraints in countMaximum does not match number of data columns");
        }

        let mut n_matched = 0;
        for row in data.rows() {
            let time = row[0];
            if (self.min_time > 0.0 && time < self.min_time * (1.0 - TIME_TOL))
                || (self.max_time > 0.0 && time > self.max_time * (1.0 + TIME_TOL))
            {
                continue;
            }
            n_matched += 1;

            for (i_obs, &count) in row[1..].iter().enumerate() {
                let max = self.count_maximum[i_obs];
                if count > max as f64 {
                    bail!("maximum exceeded at time {time}: data ({count}) > max({max})");
                }
                let min = self.count_minimum[i_obs];
                if count < min as f64 {
                    bail!("minimum undershot at time {time}: data ({count}) < min({min})");
                }
            }
        }

        if n_matched == 0 {
            bail!(
                "no data row falls in the time window [{}, {}]",
                self.min_time,
                self.max_time
            );
        }

        Ok(())
    }
}

/// Build one check for every positive multiple of the checkpoint stride.
pub fn checkpoints(means: &Table, stds: &Table, cfg: &Config) -> Result<Vec<CountMinMax>> {
    if means.n_rows() != stds.n_rows() || means.n_cols() != stds.n_cols() {
        bail!(
            "means table is {}x{}, but stds table is {}x{}",
            means.n_rows(),
            means.n_cols(),
            stds.n_rows(),
            stds.n_cols()
        );
    }

    let mut checks = Vec::new();
    for (idx, (mean_row, std_row)) in means.rows().iter().zip(stds.rows()).enumerate() {
        if idx == 0 || idx % cfg.checkpoint_stride != 0 {
            continue;
        }

        let time = round_sig(idx as f64 * cfg.time_step, TIME_DIGITS);
        let check = CountMinMax::from_row(time, mean_row, std_row, cfg)
            .with_context(|| format!("failed to build check for row {idx}"))?;
        log::debug!("row {idx}: {check:?}");
        checks.push(check);
    }

    Ok(checks)
}

/// Write the checks as a sequence of comma-terminated JSON objects.
///
/// The result is meant to be pasted into a test description, so it is not a
/// complete JSON document on its own.
pub fn save_fragment<P: AsRef<Path>>(checks: &[CountMinMax], file: P) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);

    for check in checks {
        serde_json::to_writer_pretty(&mut writer, check).context("failed to serialize check")?;
        writeln!(writer, ",").context("failed to write separator")?;
    }

    writer.flush().context("failed to flush writer stream")?;

    Ok(())
}

/// Read a fragment written by [`save_fragment`].
pub fn load_fragment<P: AsRef<Path>>(file: P) -> Result<Vec<CountMinMax>> {
    let file = file.as_ref();
    let text = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
    parse_fragment(&text).with_context(|| format!("failed to parse {file:?}"))
}

fn parse_fragment(text: &str) -> Result<Vec<CountMinMax>> {
    let body = text.trim();
    let body = body.strip_suffix(',').unwrap_or(body);
    if body.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&format!("[{body}]")).context("failed to deserialize checks")
}

fn truncate(val: f64) -> Result<i64> {
    if !val.is_finite() {
        bail!("bound must be finite, but is {val}");
    }
    Ok(val.trunc() as i64)
}

/// Round to `digits` significant digits, as `%g` prints.
fn round_sig(val: f64, digits: usize) -> f64 {
    format!("{val:.prec$e}", prec = digits.saturating_sub(1))
        .parse()
        .unwrap_or(val)
}
