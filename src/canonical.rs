//! Canonicalization of a generation: merge solutions that share a rounded
//! objective pair and order the survivors.

use crate::error::{Error, Result};
use crate::reader::{self, RawSolution};
use crate::solution::{Precision, Solution};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output of [`Canonicalizer::canonicalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalFront {
    /// Every surviving solution, ordered by `f1` then `f2`
    pub annotated: Vec<Solution>,
    /// Coordinates of the Pareto-optimal survivors, same order
    pub front: Vec<(f64, f64)>,
}

impl CanonicalFront {
    pub fn is_empty(&self) -> bool {
        self.annotated.is_empty()
    }
}

/// Deduplicates solutions by rounded objective pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct Canonicalizer {
    pub precision: Precision,
}

impl Canonicalizer {
    pub fn new(precision: Precision) -> Self {
        Canonicalizer { precision }
    }

    /// Identity of a solution: its objectives rounded to the precision.
    ///
    /// The key is the formatted text that ends up in the output files, so
    /// reading a canonical file back yields the same keys.
    pub fn identity(&self, solution: &Solution) -> (String, String) {
        (
            self.precision.format(solution.f1),
            self.precision.format(solution.f2),
        )
    }

    /// Collapse duplicates and sort by `f1` ascending, then `f2` ascending.
    ///
    /// Among candidates with the same identity a Pareto-optimal one beats a
    /// dominated one, then the lexicographically smaller ID list wins, then
    /// the first one seen is kept.
    pub fn canonicalize(&self, solutions: Vec<Solution>) -> CanonicalFront {
        let mut slots: HashMap<(String, String), usize> = HashMap::new();
        let mut kept: Vec<Solution> = Vec::with_capacity(solutions.len());

        for candidate in solutions {
            let key = self.identity(&candidate);
            match slots.get(&key) {
                Some(&slot) => {
                    if replaces(&candidate, &kept[slot]) {
                        kept[slot] = candidate;
                    }
                }
                None => {
                    slots.insert(key, kept.len());
                    kept.push(candidate);
                }
            }
        }

        kept.sort_by(|a, b| compare_objectives(a, b));

        let front = kept
            .iter()
            .filter(|s| s.is_pareto_optimal)
            .map(Solution::objectives)
            .collect();

        CanonicalFront {
            annotated: kept,
            front,
        }
    }
}

/// Whether `candidate` should replace the `incumbent` sharing its identity.
fn replaces(candidate: &Solution, incumbent: &Solution) -> bool {
    match (candidate.is_pareto_optimal, incumbent.is_pareto_optimal) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.facility_ids < incumbent.facility_ids,
    }
}

fn compare_objectives(a: &Solution, b: &Solution) -> Ordering {
    a.f1.total_cmp(&b.f1).then_with(|| a.f2.total_cmp(&b.f2))
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

/// Write the annotated-solutions file: `#`, one line per solution, `#`.
pub fn write_annotated_file<P: AsRef<Path>>(
    path: P,
    solutions: &[Solution],
    precision: Precision,
) -> Result<()> {
    let path = path.as_ref();
    create_parent(path)?;

    let write = || -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "#")?;
        for solution in solutions {
            writeln!(out, "{}", solution.annotated_line(precision))?;
        }
        writeln!(out, "#")?;
        out.flush()
    };
    write().map_err(|e| Error::io(path, e))
}

/// Write the front file fed to the hypervolume oracle: `x y` per line, no
/// comment lines. Points are written in the given order.
pub fn write_front_file<P: AsRef<Path>>(
    path: P,
    points: &[(f64, f64)],
    precision: Precision,
) -> Result<()> {
    let path = path.as_ref();
    create_parent(path)?;

    let write = || -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for &(x, y) in points {
            writeln!(out, "{} {}", precision.format(x), precision.format(y))?;
        }
        out.flush()
    };
    write().map_err(|e| Error::io(path, e))
}

/// Read an annotated file back into solutions with their flags and coverage.
pub fn read_annotated_file<P: AsRef<Path>>(path: P) -> Result<Vec<Solution>> {
    Ok(reader::read_generation_file(path)?
        .into_iter()
        .map(RawSolution::into_annotated)
        .collect())
}

/// Read the coordinates of a front file.
pub fn read_front_file<P: AsRef<Path>>(path: P) -> Result<Vec<(f64, f64)>> {
    Ok(reader::read_generation_file(path)?
        .iter()
        .map(|raw| raw.objectives())
        .collect())
}
