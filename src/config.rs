use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Generator configuration parameters.
///
/// Every field has a default, so an empty (or absent) configuration file
/// reproduces the standard file layout of the regression-test directories.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name prefix shared by all seed count files.
    pub file_prefix: String,
    /// Seed file used to detect the number of columns.
    pub reference_file: String,
    /// Seed files start with a header line.
    pub have_header: bool,

    /// Simulation time between two consecutive rows.
    pub time_step: f64,
    /// Number of rows between two emitted checkpoints.
    pub checkpoint_stride: usize,
    /// Number of standard deviations spanned on each side of the mean.
    pub n_sigma: f64,

    /// Data file name written into every emitted check.
    pub data_file: String,

    /// Output file of the per-row means.
    pub means_file: String,
    /// Output file of the per-row standard deviations.
    pub stds_file: String,
    /// Output file of the test description fragment.
    pub fragment_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_prefix: "counts".into(),
            reference_file: "counts.00001.txt".into(),
            have_header: true,
            time_step: 1e-5,
            checkpoint_stride: 10,
            n_sigma: 3.0,
            data_file: "counts.txt".into(),
            means_file: "means.dat".into(),
            stds_file: "stds.dat".into(),
            fragment_file: "test_description_partial.json".into(),
        }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded; missing keys take their default value.
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.file_prefix.is_empty() {
            bail!("file prefix must not be empty");
        }
        if !self.reference_file.starts_with(&self.file_prefix) {
            bail!(
                "reference file {:?} must start with the file prefix {:?}",
                self.reference_file,
                self.file_prefix
            );
        }
        for output in [&self.means_file, &self.stds_file, &self.fragment_file] {
            if output.starts_with(&self.file_prefix) {
                bail!(
                    "output file {output:?} must not start with the file prefix {:?}",
                    self.file_prefix
                );
            }
        }

        check_num(self.time_step, f64::MIN_POSITIVE..1.0).context("invalid time step")?;
        check_num(self.checkpoint_stride, 1..1_000_000).context("invalid checkpoint stride")?;
        check_num(self.n_sigma, 0.0..=100.0).context("invalid number of sigmas")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
