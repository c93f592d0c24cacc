//! Invocation of the external evolutionary optimizer.

use crate::error::{Error, Result};
use log::info;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use crate::utils::format_duration;

/// The optimizer binary, run as `<exe> <instance> <seed> <num_vars>` from its
/// working directory. It writes the raw generation files of the instance.
#[derive(Debug, Clone)]
pub struct Optimizer {
    pub executable: PathBuf,
    pub workdir: PathBuf,
}

impl Optimizer {
    pub fn new<E: Into<PathBuf>, W: Into<PathBuf>>(executable: E, workdir: W) -> Self {
        Optimizer {
            executable: executable.into(),
            workdir: workdir.into(),
        }
    }

    /// Command line for one run. The instance path is made absolute since the
    /// optimizer runs from its own directory.
    pub fn command(&self, instance_path: &Path, seed: u64, num_vars: u32) -> Result<Command> {
        let instance_path = instance_path
            .canonicalize()
            .map_err(|_| Error::not_found(format!("instance file {}", instance_path.display())))?;

        let mut command = Command::new(&self.executable);
        command
            .arg(instance_path)
            .arg(seed.to_string())
            .arg(num_vars.to_string())
            .current_dir(&self.workdir);
        Ok(command)
    }

    /// Run the optimizer to completion.
    pub fn run(&self, instance_path: &Path, seed: u64, num_vars: u32) -> Result<()> {
        info!(
            "running optimizer on {} (seed {}, {} variables)",
            instance_path.display(),
            seed,
            num_vars
        );
        let start = Instant::now();

        let status = self
            .command(instance_path, seed, num_vars)?
            .status()
            .map_err(|e| {
                Error::Optimizer(format!("cannot run {}: {}", self.executable.display(), e))
            })?;

        if !status.success() {
            return Err(Error::Optimizer(format!(
                "{} exited with {}",
                self.executable.display(),
                status
            )));
        }

        info!("optimizer finished in {}", format_duration(start.elapsed()));
        Ok(())
    }
}
