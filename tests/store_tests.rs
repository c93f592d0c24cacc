//! Unit tests for the result cache.

use pof_fronts::canonical::CanonicalFront;
use pof_fronts::reference::ReferencePoint;
use pof_fronts::solution::{Precision, Solution};
use pof_fronts::store::{
    fingerprint, CacheLayout, CacheState, HypervolumeSummary, InstanceLocks, ResultStore,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

/// Creates a store rooted in a temporary directory.
fn create_test_store(root: &Path) -> ResultStore {
    ResultStore::new(
        root.join("frentes_pareto"),
        root.join("aeds"),
        Precision::Canonical,
    )
}

/// Creates a one-solution canonical front.
fn create_test_front(f1: f64, f2: f64) -> CanonicalFront {
    let mut solution = Solution::new(f1, f2, vec![1, 2]);
    solution.is_pareto_optimal = true;
    solution.coverage_percent = Some(50.0);
    CanonicalFront {
        annotated: vec![solution],
        front: vec![(f1, f2)],
    }
}

#[test]
fn test_layout_paths() {
    let layout = CacheLayout::new("/cache/fronts", "/cache/aeds", "inst");
    assert_eq!(
        layout.front_file(3),
        Path::new("/cache/fronts/inst/inst_GEN3.dat")
    );
    assert_eq!(
        layout.annotated_file(3),
        Path::new("/cache/aeds/inst/inst_Ubicaciones_GEN3.dat")
    );
    assert_eq!(
        layout.summary_path(),
        Path::new("/cache/fronts/inst/inst_HV_summary.txt")
    );

    let staging = layout.staging();
    assert_eq!(staging.name, "inst");
    assert_eq!(staging.front_dir.parent(), Some(Path::new("/cache/fronts")));
    assert_ne!(staging.front_dir, layout.front_dir);
    assert_ne!(staging.annotated_dir, layout.annotated_dir);
}

#[test]
fn test_shared_root_uses_one_staging_directory() {
    let layout = CacheLayout::new("/cache", "/cache", "inst");
    assert!(layout.is_shared());

    let staging = layout.staging();
    assert_eq!(staging.front_dir, staging.annotated_dir);
    assert_ne!(staging.front_dir, layout.front_dir);
    assert_eq!(staging.front_dir.parent(), Some(Path::new("/cache")));
}

#[test]
fn test_commit_with_shared_root_keeps_all_files() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("cache");
    let store = ResultStore::new(&cache, &cache, Precision::Canonical);

    let mut summary = HypervolumeSummary::new(ReferencePoint::new(5.0, 5.0));
    summary.push(1, 1.0);

    for _ in 0..2 {
        let mut writer = store.begin("inst").unwrap();
        writer.write_generation(1, &create_test_front(1.0, 2.0)).unwrap();
        let entry = writer.commit(&summary, Some("abc")).unwrap();

        assert!(entry.front_files.iter().all(|f| f.is_file()));
        assert!(entry.annotated_files.iter().all(|f| f.is_file()));
        assert!(store.layout("inst").summary_path().is_file());
        assert_eq!(store.state("inst", Some("abc")), CacheState::Fresh);
    }

    // Front listing does not pick up annotated files in the shared directory
    let layout = store.layout("inst");
    assert_eq!(layout.front_files(), vec![layout.front_file(1)]);
    assert_eq!(layout.annotated_files(), vec![layout.annotated_file(1)]);
    assert!(!layout.staging().front_dir.exists());
}

#[test]
fn test_summary_render_and_parse() {
    let mut summary = HypervolumeSummary::new(ReferencePoint::new(3.003, 5.005));
    summary.push(1, 2.5);
    summary.push(2, 0.0);
    summary.push(10, 4.123456);

    let text = summary.render();
    assert_eq!(
        text,
        "3.003 5.005\nGEN1 2.5000\nGEN2 0.0000\nGEN10 4.1235\n#\n"
    );

    let parsed = HypervolumeSummary::parse(&text).unwrap();
    assert_eq!(parsed.reference, summary.reference);
    assert_eq!(parsed.hypervolumes(), vec![2.5, 0.0, 4.1235]);
    assert_eq!(parsed.generations[2].generation, 10);
}

#[test]
fn test_summary_parse_rejects_missing_reference() {
    assert!(HypervolumeSummary::parse("").is_none());
    assert!(HypervolumeSummary::parse("#\n").is_none());
    assert!(HypervolumeSummary::parse("abc def\nGEN1 1.0\n").is_none());

    // Garbage generation lines are skipped
    let parsed = HypervolumeSummary::parse("1 2\nGEN1 1.5\nbogus\nGENx 3\n").unwrap();
    assert_eq!(parsed.hypervolumes(), vec![1.5]);
}

#[test]
fn test_state_absent_then_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let store = create_test_store(dir.path());
    assert_eq!(store.state("inst", None), CacheState::Absent);

    let mut writer = store.begin("inst").unwrap();
    let files = writer.write_generation(1, &create_test_front(1.0, 2.0)).unwrap();
    assert!(files.front_file.is_file());

    // Nothing visible before commit
    assert_eq!(store.state("inst", None), CacheState::Absent);

    let mut summary = HypervolumeSummary::new(ReferencePoint::new(2.0, 3.0));
    summary.push(1, 1.0);
    let entry = writer.commit(&summary, Some("abc")).unwrap();

    assert_eq!(entry.annotated_files, vec![files.annotated_file.clone()]);
    assert!(files.annotated_file.is_file());
    assert_eq!(store.state("inst", None), CacheState::Fresh);
    assert_eq!(store.state("inst", Some("abc")), CacheState::Fresh);
    assert_eq!(store.state("inst", Some("changed")), CacheState::Stale);

    let read = store.read("inst").unwrap();
    assert_eq!(read.summary, summary);
    assert_eq!(read.annotated_files, entry.annotated_files);
    assert_eq!(read.front_files, entry.front_files);

    // Staging directories are gone
    let staging = store.layout("inst").staging();
    assert!(!staging.front_dir.exists());
    assert!(!staging.annotated_dir.exists());
}

#[test]
fn test_state_stale_without_summary() {
    let dir = tempfile::tempdir().unwrap();
    let store = create_test_store(dir.path());
    let layout = store.layout("inst");

    fs::create_dir_all(&layout.annotated_dir).unwrap();
    fs::write(layout.annotated_file(1), "#\n1.0 2.0 P 1 | 50.0\n#\n").unwrap();
    assert_eq!(store.state("inst", None), CacheState::Stale);
}

#[test]
fn test_commit_replaces_previous_generations() {
    let dir = tempfile::tempdir().unwrap();
    let store = create_test_store(dir.path());
    let summary = HypervolumeSummary::new(ReferencePoint::new(5.0, 5.0));

    let mut writer = store.begin("inst").unwrap();
    writer.write_generation(1, &create_test_front(1.0, 2.0)).unwrap();
    writer.write_generation(2, &create_test_front(1.0, 1.0)).unwrap();
    writer.commit(&summary, None).unwrap();
    assert_eq!(store.layout("inst").annotated_files().len(), 2);

    let mut writer = store.begin("inst").unwrap();
    writer.write_generation(7, &create_test_front(3.0, 3.0)).unwrap();
    writer.commit(&summary, None).unwrap();

    let files = store.layout("inst").annotated_files();
    assert_eq!(files, vec![store.layout("inst").annotated_file(7)]);
}

#[test]
fn test_abort_keeps_existing_cache() {
    let dir = tempfile::tempdir().unwrap();
    let store = create_test_store(dir.path());
    let summary = HypervolumeSummary::new(ReferencePoint::new(5.0, 5.0));

    let mut writer = store.begin("inst").unwrap();
    writer.write_generation(1, &create_test_front(1.0, 2.0)).unwrap();
    writer.commit(&summary, None).unwrap();

    let mut writer = store.begin("inst").unwrap();
    writer.write_generation(2, &create_test_front(1.0, 1.0)).unwrap();
    writer.abort().unwrap();

    let layout = store.layout("inst");
    assert_eq!(layout.annotated_files(), vec![layout.annotated_file(1)]);
    assert!(!layout.staging().front_dir.exists());
}

#[test]
fn test_fingerprint_tracks_content() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("POF_inst_GEN_1.dat");
    let b = dir.path().join("POF_inst_GEN_2.dat");
    fs::write(&a, "1.0 2.0 1\n").unwrap();
    fs::write(&b, "2.0 1.0 2\n").unwrap();

    let first = fingerprint(&[&a, &b]).unwrap();
    assert_eq!(first.len(), 64);
    assert_eq!(first, fingerprint(&[&a, &b]).unwrap());

    fs::write(&b, "2.0 0.5 2\n").unwrap();
    assert_ne!(first, fingerprint(&[&a, &b]).unwrap());

    assert!(fingerprint(&[dir.path().join("missing.dat")]).is_err());
}

#[test]
fn test_instance_locks_serialize_access() {
    let locks = Arc::new(InstanceLocks::default());
    let counter = Arc::new(std::sync::Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let locks = Arc::clone(&locks);
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                locks
                    .with_lock("inst", || {
                        counter.lock().unwrap().push(i);
                        Ok(i)
                    })
                    .unwrap()
            })
        })
        .collect();

    let mut results: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    results.sort();
    assert_eq!(results, vec![0, 1, 2, 3]);
    assert_eq!(counter.lock().unwrap().len(), 4);
}
