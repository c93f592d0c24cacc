//! Utility functions and reports.

use crate::coverage::{self, CoverageReport};
use crate::instance::Instance;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Compress IDs into ranges: `[1,2,3,4,5,6,7,9,12,13,14,15]` → `1-7, 9, 12-15`.
/// Order and duplicates in the input do not matter.
pub fn compress_ranges(ids: &[u32]) -> String {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<String> = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };

    let (mut start, mut previous) = (first, first);
    let render = |start: u32, end: u32| {
        if start == end {
            start.to_string()
        } else {
            format!("{}-{}", start, end)
        }
    };

    for id in iter {
        if previous.checked_add(1) == Some(id) {
            previous = id;
            continue;
        }
        ranges.push(render(start, previous));
        start = id;
        previous = id;
    }
    ranges.push(render(start, previous));

    ranges.join(", ")
}

/// Statistics of one solution's facility set on an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionStats {
    pub instance: String,
    pub installed_count: usize,
    pub preinstalled_count: usize,
    pub installed_ids: String,
    pub coverage: CoverageReport,
}

impl SolutionStats {
    /// Compute the statistics for the installed IDs. Only listed sites count
    /// as facilities; preinstalled sites not listed are treated as removed.
    pub fn compute(instance: &Instance, ids: &[u32]) -> Self {
        let model = instance.demand_model();
        let coverage = coverage::evaluate_installed_only(&instance.resolve(ids), &model);

        SolutionStats {
            instance: instance.name.clone(),
            installed_count: ids.len(),
            preinstalled_count: instance.preinstalled_count(),
            installed_ids: compress_ranges(ids),
            coverage,
        }
    }

    /// Format the statistics as a string.
    pub fn format(&self) -> String {
        let ids = if self.installed_ids.is_empty() {
            "[]"
        } else {
            &self.installed_ids
        };
        format!(
            "Instance {} statistics:
- Installed facilities: {:<4} - Preinstalled facilities: {}
- Installed IDs: {}
- Demand nodes and probability: {:<4} - {:.4}
- Covered nodes and probability: {:<4} - {:.4} ({:.2}%)",
            self.instance,
            self.installed_count,
            self.preinstalled_count,
            ids,
            self.coverage.demand_count,
            self.coverage.total_weight,
            self.coverage.covered_count,
            self.coverage.covered_weight,
            self.coverage.percent
        )
    }
}
