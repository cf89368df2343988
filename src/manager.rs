use crate::analysis::Aggregator;
use crate::bounds::{self, CountMinMax};
use crate::config::Config;
use crate::counts::{self, CountData};
use crate::table::Table;
use anyhow::{Context, Result, bail};
use glob::{Pattern, glob};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct Manager {
    work_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(work_dir: P, cfg_file: Option<&Path>) -> Result<Self> {
        let work_dir = work_dir.as_ref().to_path_buf();

        let cfg = match cfg_file {
            Some(cfg_file) => Config::from_file(cfg_file).context("failed to construct cfg")?,
            None => Config::default(),
        };
        log::info!("{cfg:#?}");

        Ok(Self { work_dir, cfg })
    }

    pub fn generate(&self) -> Result<()> {
        self.aggregate().context("failed to aggregate seed files")?;
        self.emit().context("failed to emit bounds")?;
        Ok(())
    }

    pub fn aggregate(&self) -> Result<()> {
        let reference_file = self.work_dir.join(&self.cfg.reference_file);
        let n_cols = counts::detect_n_cols(&reference_file, self.cfg.have_header)
            .context("failed to detect number of columns")?;
        log::info!("detected {} observables in {reference_file:?}", n_cols - 1);

        let seed_files = self.seed_files().context("failed to discover seed files")?;
        log::info!("found {} seed files", seed_files.len());

        let mut aggregator = Aggregator::new(n_cols, self.cfg.have_header);
        for file in &seed_files {
            aggregator.add_file(file).context("failed to add file")?;
        }

        let aggregate = aggregator.reduce().context("failed to reduce seed files")?;
        log::info!(
            "reduced {} seeds to {} rows x {} observables",
            aggregator.n_seeds(),
            aggregate.means.n_rows(),
            aggregate.means.n_cols()
        );

        let means_file = self.work_dir.join(&self.cfg.means_file);
        aggregate
            .means
            .save(&means_file)
            .context("failed to save means")?;
        log::info!("saved {means_file:?}");

        let stds_file = self.work_dir.join(&self.cfg.stds_file);
        aggregate.stds.save(&stds_file).context("failed to save stds")?;
        log::info!("saved {stds_file:?}");

        Ok(())
    }

    pub fn emit(&self) -> Result<()> {
        let means = Table::load(self.work_dir.join(&self.cfg.means_file))
            .context("failed to load means")?;
        let stds =
            Table::load(self.work_dir.join(&self.cfg.stds_file)).context("failed to load stds")?;

        let checks = bounds::checkpoints(&means, &stds, &self.cfg)
            .context("failed to compute checkpoint bounds")?;

        let fragment_file = self.work_dir.join(&self.cfg.fragment_file);
        bounds::save_fragment(&checks, &fragment_file).context("failed to save fragment")?;
        log::info!("saved {} checks to {fragment_file:?}", checks.len());

        Ok(())
    }

    pub fn check(&self) -> Result<()> {
        let fragment_file = self.work_dir.join(&self.cfg.fragment_file);
        let checks = bounds::load_fragment(&fragment_file).context("failed to load fragment")?;

        let seed_files = self.seed_files().context("failed to discover seed files")?;
        let mut n_failed = 0;
        for file in &seed_files {
            let data = CountData::from_file(file, self.cfg.have_header)
                .context("failed to load seed file")?;
            if let Err(error) = first_violation(&checks, &data) {
                log::error!("{file:?}: {error:#}");
                n_failed += 1;
            }
        }

        if n_failed > 0 {
            bail!("{n_failed} of {} seed files violate the bounds", seed_files.len());
        }
        log::info!(
            "{} seed files satisfy {} checks",
            seed_files.len(),
            checks.len()
        );

        Ok(())
    }

    pub fn clean(&self) -> Result<()> {
        for name in [
            &self.cfg.means_file,
            &self.cfg.stds_file,
            &self.cfg.fragment_file,
        ] {
            let file = self.work_dir.join(name);
            if !file.exists() {
                continue;
            }
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }

        Ok(())
    }

    fn seed_files(&self) -> Result<Vec<PathBuf>> {
        let work_dir = self.work_dir.to_str().context("work dir is not valid UTF-8")?;
        let pattern = Path::new(&Pattern::escape(work_dir))
            .join(format!("{}*", Pattern::escape(&self.cfg.file_prefix)));
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;

        let mut files: Vec<_> = glob(pattern)
            .context("failed to glob seed files")?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        for file in &files {
            log::debug!("seed file {file:?}");
        }

        Ok(files)
    }
}

fn first_violation(checks: &[CountMinMax], data: &CountData) -> Result<()> {
    for check in checks {
        check
            .check(data)
            .with_context(|| format!("check at time {} failed", check.min_time))?;
    }
    Ok(())
}
