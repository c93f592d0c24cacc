//! Weighted spatial coverage of a solution's facilities.

use crate::instance::{DemandModel, Instance};
use serde::{Deserialize, Serialize};

/// Coverage of the demand model by a set of facilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Number of demand points within the radius of some facility
    pub covered_count: usize,
    /// Sum of the weights of the covered demand points
    pub covered_weight: f64,
    /// Sum of all demand weights
    pub total_weight: f64,
    /// Number of demand points in the model
    pub demand_count: usize,
    /// `100 * covered_weight / total_weight`, or 0 when there is no weight
    pub percent: f64,
}

/// Evaluate coverage for facilities at the given coordinates.
///
/// Preinstalled facilities of the model always count. A demand point is
/// covered when its squared distance to any facility is at most the squared
/// radius.
pub fn evaluate(installed: &[(f64, f64)], model: &DemandModel) -> CoverageReport {
    evaluate_with(installed, &model.preinstalled_facilities, model)
}

/// Evaluate coverage using only the installed facilities, ignoring the
/// preinstalled ones unless they are listed explicitly.
pub fn evaluate_installed_only(installed: &[(f64, f64)], model: &DemandModel) -> CoverageReport {
    evaluate_with(installed, &[], model)
}

/// Resolve a solution's IDs against the instance and evaluate its coverage.
/// IDs missing from the coordinate table are ignored.
pub fn evaluate_ids(ids: &[u32], instance: &Instance, model: &DemandModel) -> CoverageReport {
    evaluate(&instance.resolve(ids), model)
}

fn evaluate_with(
    installed: &[(f64, f64)],
    preinstalled: &[(f64, f64)],
    model: &DemandModel,
) -> CoverageReport {
    let radius_squared = model.coverage_radius * model.coverage_radius;
    let covers = |px: f64, py: f64| {
        installed.iter().chain(preinstalled.iter()).any(|&(fx, fy)| {
            let dx = px - fx;
            let dy = py - fy;
            dx * dx + dy * dy <= radius_squared
        })
    };

    let mut covered_count = 0;
    let mut covered_weight = 0.0;
    for point in &model.demand_points {
        if covers(point.x, point.y) {
            covered_count += 1;
            covered_weight += point.weight;
        }
    }

    let total_weight = model.total_weight();
    let percent = if total_weight > 0.0 {
        100.0 * covered_weight / total_weight
    } else {
        0.0
    };

    CoverageReport {
        covered_count,
        covered_weight,
        total_weight,
        demand_count: model.demand_points.len(),
        percent,
    }
}
