//! Unit tests for the weighted coverage evaluator.

use pof_fronts::coverage::{evaluate, evaluate_ids, evaluate_installed_only};
use pof_fronts::instance::{DemandModel, DemandPoint, Instance, Site};

/// Creates a model with one unit-weight demand point at the origin.
fn create_single_point_model(radius: f64) -> DemandModel {
    DemandModel {
        demand_points: vec![DemandPoint {
            x: 0.0,
            y: 0.0,
            weight: 1.0,
        }],
        preinstalled_facilities: Vec::new(),
        coverage_radius: radius,
    }
}

/// Creates a small instance: three demand points, one preinstalled facility
/// and two candidate sites.
fn create_test_instance() -> Instance {
    let sites = vec![
        Site::new(1, 0.0, 0.0, 0, 0.5),
        Site::new(2, 100.0, 0.0, 0, 0.3),
        Site::new(3, 0.0, 100.0, 0, 0.2),
        Site::new(4, 0.0, 95.0, 1, 0.0),
        Site::new(5, 3.0, 4.0, 2, 0.0),
        Site::new(6, 98.0, 0.0, 2, 0.0),
    ];
    Instance::new("test".to_string(), sites, 10.0)
}

#[test]
fn test_facility_on_demand_point() {
    let report = evaluate(&[(0.0, 0.0)], &create_single_point_model(10.0));
    assert_eq!(report.covered_count, 1);
    assert_eq!(report.demand_count, 1);
    assert!((report.percent - 100.0).abs() < 1e-12);
}

#[test]
fn test_facility_out_of_range() {
    let report = evaluate(&[(20.0, 0.0)], &create_single_point_model(10.0));
    assert_eq!(report.covered_count, 0);
    assert_eq!(report.percent, 0.0);
}

#[test]
fn test_radius_boundary_is_covered() {
    // Distance exactly 5 with radius 5
    let report = evaluate(&[(3.0, 4.0)], &create_single_point_model(5.0));
    assert_eq!(report.covered_count, 1);
}

#[test]
fn test_zero_total_weight() {
    let mut model = create_single_point_model(10.0);
    model.demand_points[0].weight = 0.0;
    let report = evaluate(&[(0.0, 0.0)], &model);
    assert_eq!(report.covered_count, 1);
    assert_eq!(report.percent, 0.0);
}

#[test]
fn test_no_demand_points() {
    let model = DemandModel {
        demand_points: Vec::new(),
        preinstalled_facilities: Vec::new(),
        coverage_radius: 10.0,
    };
    let report = evaluate(&[(0.0, 0.0)], &model);
    assert_eq!(report.demand_count, 0);
    assert_eq!(report.percent, 0.0);
}

#[test]
fn test_preinstalled_facilities_count() {
    let instance = create_test_instance();
    let model = instance.demand_model();
    assert_eq!(model.demand_points.len(), 3);
    assert_eq!(model.preinstalled_facilities, vec![(0.0, 95.0)]);

    // No installed facility: only the preinstalled one covers point 3
    let report = evaluate(&[], &model);
    assert_eq!(report.covered_count, 1);
    assert!((report.percent - 20.0).abs() < 1e-9);

    // Ignoring preinstalled facilities covers nothing
    let report = evaluate_installed_only(&[], &model);
    assert_eq!(report.covered_count, 0);
}

#[test]
fn test_evaluate_ids_resolves_and_ignores_missing() {
    let instance = create_test_instance();
    let model = instance.demand_model();

    let report = evaluate_ids(&[5, 6, 999], &instance, &model);
    assert_eq!(report.covered_count, 3);
    assert!((report.covered_weight - 1.0).abs() < 1e-12);
    assert!((report.percent - 100.0).abs() < 1e-9);

    // Only unknown IDs: same as no installed facility
    let unknown = evaluate_ids(&[42, 43], &instance, &model);
    assert_eq!(unknown, evaluate(&[], &model));
}
