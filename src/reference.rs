//! Global reference point for the hypervolume of an instance.

use crate::reader;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Relative margin added beyond the worst objective values.
pub const DEFAULT_EPSILON: f64 = 0.001;

/// Replacement for a reference `x` that would be exactly zero.
pub const DEFAULT_ZERO_FALLBACK: f64 = 0.1;

/// Point weakly dominated by every solution of every generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub x: f64,
    pub y: f64,
}

impl ReferencePoint {
    pub fn new(x: f64, y: f64) -> Self {
        ReferencePoint { x, y }
    }

    /// Compute `max + |max| * epsilon` on both axes. A resulting `x` of
    /// exactly zero becomes `zero_fallback`.
    ///
    /// With no points at all both maxima are taken as zero.
    pub fn compute<I>(points: I, epsilon: f64, zero_fallback: f64) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (max_x, max_y) = points.into_iter().fold(
            (f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(mx, my), (x, y)| (mx.max(x), my.max(y)),
        );

        let (max_x, max_y) = if max_x.is_finite() && max_y.is_finite() {
            (max_x, max_y)
        } else {
            warn!("no objective values to derive a reference point from");
            (0.0, 0.0)
        };

        let mut x = max_x + max_x.abs() * epsilon;
        let y = max_y + max_y.abs() * epsilon;
        if x == 0.0 {
            x = zero_fallback;
        }

        ReferencePoint { x, y }
    }

    /// Compute the reference point over every raw generation file of an
    /// instance, before any filtering. Unreadable files contribute nothing.
    pub fn from_generation_files<P: AsRef<Path>>(
        files: &[P],
        epsilon: f64,
        zero_fallback: f64,
    ) -> Self {
        let mut points = Vec::new();
        for file in files {
            match reader::read_generation_file(file) {
                Ok(solutions) => points.extend(solutions.iter().map(|raw| raw.objectives())),
                Err(e) => warn!("reference point: skipping {}: {}", file.as_ref().display(), e),
            }
        }

        let reference = Self::compute(points, epsilon, zero_fallback);
        info!("global reference point: ({}, {})", reference.x, reference.y);
        reference
    }

    /// Argument passed to the hypervolume binary: `"refX refY"`.
    pub fn as_argument(&self) -> String {
        format!("{} {}", self.x, self.y)
    }

    /// True if `point` dominates the reference.
    pub fn is_dominated_by(&self, point: (f64, f64)) -> bool {
        crate::dominance::dominates(point, (self.x, self.y))
    }
}

impl fmt::Display for ReferencePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}
