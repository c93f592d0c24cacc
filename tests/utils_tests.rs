//! Unit tests for utility functions and solution statistics.

use pof_fronts::instance::{Instance, Site};
use pof_fronts::utils::{compress_ranges, format_duration, SolutionStats};
use std::time::Duration;

/// Creates an instance with two demand points and one preinstalled site.
fn create_test_instance() -> Instance {
    let sites = vec![
        Site::new(1, 0.0, 0.0, 0, 0.25),
        Site::new(2, 50.0, 0.0, 0, 0.75),
        Site::new(3, 0.0, 1.0, 1, 0.0),
        Site::new(4, 50.0, 1.0, 2, 0.0),
    ];
    Instance::new("stats".to_string(), sites, 5.0)
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(Duration::from_secs(0)), "0h 00m 00s");
    assert_eq!(format_duration(Duration::from_secs(3725)), "1h 02m 05s");
}

#[test]
fn test_compress_ranges() {
    assert_eq!(
        compress_ranges(&[1, 2, 3, 4, 5, 6, 7, 9, 12, 13, 14, 15]),
        "1-7, 9, 12-15"
    );
    assert_eq!(compress_ranges(&[]), "");
    assert_eq!(compress_ranges(&[4]), "4");
    assert_eq!(compress_ranges(&[5, 3, 4, 4, 10]), "3-5, 10");
    assert_eq!(compress_ranges(&[u32::MAX - 1, u32::MAX]), format!("{}-{}", u32::MAX - 1, u32::MAX));
}

#[test]
fn test_stats_ignore_unlisted_preinstalled_sites() {
    let instance = create_test_instance();

    // Site 3 would cover demand point 1, but only listed IDs count
    let stats = SolutionStats::compute(&instance, &[4]);
    assert_eq!(stats.installed_count, 1);
    assert_eq!(stats.preinstalled_count, 1);
    assert_eq!(stats.coverage.covered_count, 1);
    assert!((stats.coverage.percent - 75.0).abs() < 1e-9);

    let stats = SolutionStats::compute(&instance, &[3, 4]);
    assert!((stats.coverage.percent - 100.0).abs() < 1e-9);
    assert_eq!(stats.installed_ids, "3-4");
}

#[test]
fn test_stats_format() {
    let instance = create_test_instance();
    let text = SolutionStats::compute(&instance, &[4]).format();
    assert!(text.starts_with("Instance stats statistics:"));
    assert!(text.contains("- Installed IDs: 4"));
    assert!(text.contains("(75.00%)"));

    let empty = SolutionStats::compute(&instance, &[]).format();
    assert!(empty.contains("- Installed IDs: []"));
}
