//! Configuration for the post-processing pipeline.

use crate::error::{Error, Result};
use crate::reference::{DEFAULT_EPSILON, DEFAULT_ZERO_FALLBACK};
use crate::solution::Precision;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration settings for the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the instance files (`<name>.dat`)
    pub instances_dir: PathBuf,
    /// Directory holding one sub-directory of raw generation files per instance
    pub raw_dir: PathBuf,
    /// Directory of the cached front files and hypervolume summaries
    pub fronts_dir: PathBuf,
    /// Directory of the cached annotated-solution files
    pub annotated_dir: PathBuf,
    /// Hypervolume binary
    pub hv_executable: PathBuf,
    /// Upper bound on one hypervolume invocation
    pub hv_timeout: Option<Duration>,
    /// Optimizer binary
    pub optimizer_executable: PathBuf,
    /// Working directory of the optimizer
    pub optimizer_workdir: PathBuf,
    /// Rounding used for deduplication and for written coordinates
    pub precision: Precision,
    /// Relative margin of the reference point
    pub reference_epsilon: f64,
    /// Replacement for a reference `x` of exactly zero
    pub zero_reference_fallback: f64,
    /// Invalidate cached results when the raw generation files change
    pub auto_invalidate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instances_dir: PathBuf::from("datos/inst"),
            raw_dir: PathBuf::from("datos/res/raw_moead"),
            fronts_dir: PathBuf::from("datos/res/cache_procesada/frentes_pareto"),
            annotated_dir: PathBuf::from("datos/res/cache_procesada/aeds"),
            hv_executable: PathBuf::from("material/hv-1.3-src/hv"),
            hv_timeout: Some(Duration::from_secs(60)),
            optimizer_executable: PathBuf::from("EMO-D/MOEAD/MOEAD"),
            optimizer_workdir: PathBuf::from("EMO-D/MOEAD"),
            precision: Precision::Canonical,
            reference_epsilon: DEFAULT_EPSILON,
            zero_reference_fallback: DEFAULT_ZERO_FALLBACK,
            auto_invalidate: true,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Load a configuration from a JSON file. Missing fields keep their
    /// defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Prefix every relative path with `root`.
    pub fn with_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        let root = root.as_ref();
        for path in [
            &mut self.instances_dir,
            &mut self.raw_dir,
            &mut self.fronts_dir,
            &mut self.annotated_dir,
            &mut self.hv_executable,
            &mut self.optimizer_executable,
            &mut self.optimizer_workdir,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    /// Set the instances directory.
    pub fn with_instances_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.instances_dir = dir.into();
        self
    }

    /// Set the raw generation directory.
    pub fn with_raw_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.raw_dir = dir.into();
        self
    }

    /// Set the front/summary cache directory.
    pub fn with_fronts_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.fronts_dir = dir.into();
        self
    }

    /// Set the annotated-solution cache directory.
    pub fn with_annotated_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.annotated_dir = dir.into();
        self
    }

    /// Set the hypervolume binary.
    pub fn with_hv_executable<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.hv_executable = path.into();
        self
    }

    /// Set the hypervolume timeout.
    pub fn with_hv_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.hv_timeout = timeout;
        self
    }

    /// Set the optimizer binary and its working directory.
    pub fn with_optimizer<P: Into<PathBuf>, W: Into<PathBuf>>(
        mut self,
        executable: P,
        workdir: W,
    ) -> Self {
        self.optimizer_executable = executable.into();
        self.optimizer_workdir = workdir.into();
        self
    }

    /// Set the coordinate precision.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Set the reference point margin.
    pub fn with_reference_epsilon(mut self, epsilon: f64) -> Self {
        self.reference_epsilon = epsilon;
        self
    }

    /// Set the zero reference fallback.
    pub fn with_zero_reference_fallback(mut self, fallback: f64) -> Self {
        self.zero_reference_fallback = fallback;
        self
    }

    /// Enable or disable invalidation on raw file changes.
    pub fn with_auto_invalidate(mut self, enabled: bool) -> Self {
        self.auto_invalidate = enabled;
        self
    }
}
