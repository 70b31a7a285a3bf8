use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use patchvote_classifiers::aggregation::AggregationMethod;
use patchvote_classifiers::config::{
    CalibrationConfig, Kernel, RuntimeConfig, SearchConfig, SearchStrategy,
};

use crate::util::default_cores;

pub const DEFAULT_EXTREMES: usize = 2;

/// Settings shared by every pipeline stage. Command line flags override
/// whatever the JSON file sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub search: SearchConfig,
    pub calibration: CalibrationConfig,
    pub runtime: RuntimeConfig,
    pub aggregation: AggregationMethod,
    /// Distances taken from each end of a target group by `scores`.
    pub n_extremes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            search: SearchConfig::default(),
            calibration: CalibrationConfig::default(),
            runtime: RuntimeConfig::new(default_cores()),
            aggregation: AggregationMethod::Mode,
            n_extremes: DEFAULT_EXTREMES,
        }
    }
}

pub fn load_pipeline_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: PipelineConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Value of `id` when the (sub)command defines it and it was given.
fn arg<'a, T: Clone + Send + Sync + 'static>(matches: &'a ArgMatches, id: &str) -> Option<&'a T> {
    matches.try_get_one::<T>(id).ok().flatten()
}

fn parsed<T>(matches: &ArgMatches, id: &str) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    match arg::<String>(matches, id) {
        Some(value) => T::from_str(value).map(Some).map_err(anyhow::Error::msg),
        None => Ok(None),
    }
}

impl PipelineConfig {
    /// Start from `config_path` (or defaults) and apply the flags of the
    /// global command and the selected subcommand, in that order.
    pub fn from_arguments(
        config_path: Option<&PathBuf>,
        global: &ArgMatches,
        sub: &ArgMatches,
    ) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => load_pipeline_config(path)?,
            None => PipelineConfig::default(),
        };

        config.apply_overrides(global)?;
        config.apply_overrides(sub)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, matches: &ArgMatches) -> Result<()> {
        if let Some(&cores) = arg::<usize>(matches, "cores") {
            self.runtime.cores = cores;
        }
        if let Some(kernel) = parsed::<Kernel>(matches, "kernel")? {
            self.search.kernel = kernel;
        }
        if let Some(search) = parsed::<SearchStrategy>(matches, "search")? {
            self.search.search = search;
        }
        if let Some(&iterations) = arg::<usize>(matches, "iterations") {
            self.search.iterations = iterations;
        }
        if let Some(&folds) = arg::<usize>(matches, "folds") {
            self.search.folds = folds;
        }
        if let Some(&folds) = arg::<usize>(matches, "calibration_folds") {
            self.calibration.folds = folds;
        }
        if let Some(&seed) = arg::<u64>(matches, "seed") {
            self.search.seed = Some(seed);
            self.calibration.seed = Some(seed);
        }
        if let Some(method) = parsed::<AggregationMethod>(matches, "aggregation")? {
            self.aggregation = method;
        }
        if let Some(&n) = arg::<usize>(matches, "n_extremes") {
            self.n_extremes = n;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.search.validate().context("Invalid search settings")?;
        self.calibration
            .validate()
            .context("Invalid calibration settings")?;
        if self.runtime.cores == 0 {
            anyhow::bail!("Number of cores must be at least 1");
        }
        if self.n_extremes == 0 {
            anyhow::bail!("At least one extreme distance per group is required");
        }
        Ok(())
    }
}
