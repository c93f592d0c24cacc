//! Hypervolume indicator of a front file relative to a reference point.

use crate::canonical;
use crate::error::{Error, Result};
use crate::reference::ReferencePoint;
use log::{debug, info, warn};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Computes the hypervolume of a front file.
pub trait HypervolumeOracle {
    fn compute(&self, front_file: &Path, reference: &ReferencePoint) -> Result<f64>;
}

/// Run the oracle for one generation. Any failure is logged and yields `0.0`
/// so the remaining generations are still processed.
pub fn hypervolume_or_zero<O: HypervolumeOracle + ?Sized>(
    oracle: &O,
    front_file: &Path,
    reference: &ReferencePoint,
    generation: u64,
) -> f64 {
    match oracle.compute(front_file, reference) {
        Ok(hv) => {
            info!("hypervolume for generation {}: {}", generation, hv);
            hv
        }
        Err(e) => {
            warn!(
                "hypervolume for generation {} degraded to 0: {}",
                generation, e
            );
            0.0
        }
    }
}

/// The external `hv` binary, invoked as `hv -r "refX refY" <front file>`.
#[derive(Debug, Clone)]
pub struct ExternalHypervolume {
    pub executable: PathBuf,
    /// Upper bound on a single invocation; the child is killed past it
    pub timeout: Option<Duration>,
}

impl ExternalHypervolume {
    pub fn new<P: Into<PathBuf>>(executable: P) -> Self {
        ExternalHypervolume {
            executable: executable.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn command(&self, front_file: &Path, reference: &ReferencePoint) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .arg("-r")
            .arg(reference.as_argument())
            .arg(front_file)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        command
    }

    fn run(&self, front_file: &Path, reference: &ReferencePoint) -> Result<String> {
        let spawn_error = |e: std::io::Error| {
            Error::Oracle(format!("cannot run {}: {}", self.executable.display(), e))
        };

        debug!(
            "running {} -r \"{}\" {}",
            self.executable.display(),
            reference.as_argument(),
            front_file.display()
        );

        let mut child = self
            .command(front_file, reference)
            .spawn()
            .map_err(spawn_error)?;

        if let Some(timeout) = self.timeout {
            let deadline = Instant::now() + timeout;
            loop {
                if child.try_wait().map_err(spawn_error)?.is_some() {
                    break;
                }
                if Instant::now() >= deadline {
                    if let Err(e) = child.kill() {
                        debug!("cannot kill {}: {}", self.executable.display(), e);
                    }
                    if let Err(e) = child.wait() {
                        debug!("cannot reap {}: {}", self.executable.display(), e);
                    }
                    return Err(Error::Oracle(format!(
                        "timed out after {:?} on {}",
                        timeout,
                        front_file.display()
                    )));
                }
                thread::sleep(Duration::from_millis(10));
            }
        }

        let mut stdout = String::new();
        if let Some(mut pipe) = child.stdout.take() {
            pipe.read_to_string(&mut stdout).map_err(spawn_error)?;
        }
        let status = child.wait().map_err(spawn_error)?;
        if !status.success() {
            return Err(Error::Oracle(format!("exited with {}", status)));
        }
        Ok(stdout)
    }
}

impl HypervolumeOracle for ExternalHypervolume {
    fn compute(&self, front_file: &Path, reference: &ReferencePoint) -> Result<f64> {
        let stdout = self.run(front_file, reference)?;
        parse_scalar(&stdout)
    }
}

/// Parse the oracle's standard output: a single floating-point value.
pub fn parse_scalar(stdout: &str) -> Result<f64> {
    let trimmed = stdout.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| Error::Oracle(format!("non-numeric output {:?}", trimmed)))
}

/// In-process two-objective hypervolume, reading the same front file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactHypervolume;

impl HypervolumeOracle for ExactHypervolume {
    fn compute(&self, front_file: &Path, reference: &ReferencePoint) -> Result<f64> {
        let points = canonical::read_front_file(front_file)?;
        Ok(hypervolume_2d(&points, reference))
    }
}

/// Area dominated by `points` and bounded by the reference point, both
/// objectives minimized. Points not strictly better than the reference on
/// both axes add nothing.
pub fn hypervolume_2d(points: &[(f64, f64)], reference: &ReferencePoint) -> f64 {
    let mut inside: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|&(x, y)| x < reference.x && y < reference.y)
        .collect();
    inside.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));

    let mut volume = 0.0;
    let mut ceiling = reference.y;
    for (x, y) in inside {
        if y < ceiling {
            volume += (reference.x - x) * (ceiling - y);
            ceiling = y;
        }
    }
    volume
}
