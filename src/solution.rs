//! Solution representation for one candidate of a generation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimals used both for deduplication identity and for writing
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    /// Four decimals, as written by older pipeline runs.
    Legacy,
    /// Ten decimals, the canonical format.
    Canonical,
}

impl Precision {
    /// Number of decimal places.
    pub fn decimals(self) -> usize {
        match self {
            Precision::Legacy => 4,
            Precision::Canonical => 10,
        }
    }

    /// Format a coordinate with this precision. Values that round to zero
    /// are written without a sign.
    pub fn format(self, value: f64) -> String {
        let text = format!("{:.*}", self.decimals(), value);
        match text.strip_prefix('-') {
            Some(magnitude) if magnitude.bytes().all(|b| b == b'0' || b == b'.') => {
                magnitude.to_string()
            }
            _ => text,
        }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Canonical
    }
}

/// Pareto status written in annotated files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParetoFlag {
    /// Non-dominated in its generation.
    P,
    /// Dominated by at least one other solution.
    D,
}

impl ParetoFlag {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "P" => Some(ParetoFlag::P),
            "D" => Some(ParetoFlag::D),
            _ => None,
        }
    }

    pub fn from_pareto(is_pareto_optimal: bool) -> Self {
        if is_pareto_optimal {
            ParetoFlag::P
        } else {
            ParetoFlag::D
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParetoFlag::P => "P",
            ParetoFlag::D => "D",
        }
    }
}

/// A candidate solution of one generation.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// First objective (minimized)
    pub f1: f64,
    /// Second objective (minimized)
    pub f2: f64,
    /// IDs of the facilities installed by this solution, in file order
    pub facility_ids: Vec<u32>,
    /// Not dominated by any other solution of the same generation
    pub is_pareto_optimal: bool,
    /// Weighted coverage percentage, once evaluated
    pub coverage_percent: Option<f64>,
}

impl Solution {
    /// Create an unevaluated solution.
    pub fn new(f1: f64, f2: f64, facility_ids: Vec<u32>) -> Self {
        Solution {
            f1,
            f2,
            facility_ids,
            is_pareto_optimal: false,
            coverage_percent: None,
        }
    }

    /// Objective pair `(f1, f2)`.
    pub fn objectives(&self) -> (f64, f64) {
        (self.f1, self.f2)
    }

    pub fn flag(&self) -> ParetoFlag {
        ParetoFlag::from_pareto(self.is_pareto_optimal)
    }

    /// Render as one annotated-file line: `x y FLAG ids... | coverage`.
    pub fn annotated_line(&self, precision: Precision) -> String {
        let mut line = format!(
            "{} {} {}",
            precision.format(self.f1),
            precision.format(self.f2),
            self.flag().as_str()
        );
        for id in &self.facility_ids {
            line.push(' ');
            line.push_str(&id.to_string());
        }
        if let Some(coverage) = self.coverage_percent {
            line.push_str(&format!(" | {:.4}", coverage));
        }
        line
    }
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Solution({:.4}, {:.4}) {} {:?}",
            self.f1,
            self.f2,
            self.flag().as_str(),
            self.facility_ids
        )?;
        if let Some(coverage) = self.coverage_percent {
            write!(f, " coverage {:.2}%", coverage)?;
        }
        Ok(())
    }
}
