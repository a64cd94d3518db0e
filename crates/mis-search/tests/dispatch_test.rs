/// Integration tests for the parallel dispatcher

use mis_search::{
    OutputLayout, ParallelDispatcher, RunId, SearchError, SearchOrchestrator, SolverGateway, SolverKind,
    SweepSummary, Unit,
};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const VALID: &str = r#"{
    "machines": [
        {"machine_id": 1, "L": 10, "W": 10},
        {"machine_id": 2, "L": 6, "W": 4}
    ],
    "parts": [
        {"part_id": 1, "num_part": 2, "orientations": [{"l": 4, "w": 4, "h": 1}]},
        {"part_id": 2, "num_part": 1, "orientations": [{"l": 3, "w": 4, "h": 1}]}
    ]
}"#;

fn dispatcher(root: &TempDir) -> ParallelDispatcher {
    let gateway: Arc<dyn SolverGateway> = Arc::new(SolverKind::Interval.build());
    let layout = OutputLayout::new(root.path().join("output"));
    ParallelDispatcher::new(SearchOrchestrator::new(gateway, layout, RunId::new("TEST1"))).with_workers(2)
}

fn write(root: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = root.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_malformed_instance_is_isolated() {
    let root = TempDir::new().unwrap();
    let a = write(&root, "a.json", "{\"machines\": [");
    let b = write(&root, "b.json", VALID);

    let report = dispatcher(&root).run(&[a, b]).await;

    assert_eq!(report.run_id.as_str(), "TEST1");
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].container.is_none());
    assert!(matches!(report.failures[0].error, SearchError::MalformedInstance { .. }));

    let units: Vec<(String, String)> = report
        .summaries
        .iter()
        .map(|s| (s.instance.clone(), s.container_id.to_string()))
        .collect();
    assert_eq!(units, vec![("b".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]);
    assert!(root.path().join("output/cache/b/1.json").exists());
    assert!(root.path().join("output/runs/TEST1/b/2/6x4-1.json").exists());
}

#[tokio::test]
async fn test_invalid_container_is_isolated() {
    let root = TempDir::new().unwrap();
    let content = r#"{
        "machines": [{"machine_id": 1, "L": 0, "W": 10}, {"machine_id": 2, "L": 8, "W": 8}],
        "parts": [{"part_id": 1, "num_part": 2, "orientations": [{"l": 4, "w": 4}]}]
    }"#;
    let path = write(&root, "mixed.json", content);

    let report = dispatcher(&root).run(&[path]).await;

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].container.as_ref().map(|c| c.as_str()), Some("1"));
    assert!(matches!(report.failures[0].error, SearchError::InvalidDimensions { .. }));
    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.summaries[0].cached_feasible, 1);
}

#[tokio::test]
async fn test_callback_sees_every_unit() {
    let root = TempDir::new().unwrap();
    let b = write(&root, "b.json", VALID);
    let c = write(&root, "c.json", VALID);

    let finished = Arc::new(AtomicUsize::new(0));
    let counter = finished.clone();
    let dispatcher = dispatcher(&root).on_finished(Arc::new(move |_: &Unit, result: &mis_search::Result<SweepSummary>| {
        assert!(result.is_ok());
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let (units, failures) = dispatcher.plan(&[b, c]);
    assert_eq!(units.len(), 4);
    assert!(failures.is_empty());

    let report = dispatcher.run_units(units).await;
    assert!(report.is_success());
    assert_eq!(finished.load(Ordering::SeqCst), 4);
    assert_eq!(report.summaries.len(), 4);
}

#[test]
fn test_zero_workers_means_one() {
    let root = TempDir::new().unwrap();
    assert_eq!(dispatcher(&root).with_workers(0).workers(), 1);
}

const TWO_SQUARES: &str = r#"[{"part_id": 1, "num_part": 2, "orientations": [{"l": 4, "w": 4}]}]"#;

fn single_machine(length: u32, width: u32) -> String {
    format!(
        r#"{{"machines": [{{"machine_id": 1, "L": {}, "W": {}}}], "parts": {}}}"#,
        length, width, TWO_SQUARES
    )
}

#[tokio::test]
async fn test_instances_with_the_same_name_are_not_both_run() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("d1")).unwrap();
    fs::create_dir_all(root.path().join("d2")).unwrap();
    let large = write(&root, "d1/x.json", &single_machine(10, 10));
    let small = write(&root, "d2/x.json", &single_machine(5, 5));

    let report = dispatcher(&root).with_workers(1).run(&[large, small.clone()]).await;

    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.summaries[0].cached_feasible, 3);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.instance, "x");
    assert!(failure.container.is_none());
    match &failure.error {
        SearchError::DuplicateInstance { name, path, .. } => {
            assert_eq!(name, "x");
            assert_eq!(path, &small);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_similar_container_ids_keep_separate_caches() {
    let root = TempDir::new().unwrap();
    let content = format!(
        r#"{{"machines": [{{"machine_id": "m 1", "L": 10, "W": 10}}, {{"machine_id": "m-1", "L": 5, "W": 5}}],
            "parts": {}}}"#,
        TWO_SQUARES
    );
    let path = write(&root, "x.json", &content);

    let report = dispatcher(&root).with_workers(1).run(&[path]).await;

    assert!(report.is_success());
    let by_id: Vec<(String, usize, usize)> = report
        .summaries
        .iter()
        .map(|s| {
            let reused = s.resolutions.iter().map(|r| r.reused).sum::<usize>();
            (s.container_id.to_string(), s.cached_feasible, reused)
        })
        .collect();
    // Two 4x4 squares do not fit in 5x5, so the smaller machine only ever
    // reuses its own singles.
    assert_eq!(
        by_id,
        vec![("m 1".to_string(), 3, 9), ("m-1".to_string(), 2, 2)]
    );
    assert!(root.path().join("output/cache/x/m~201.json").exists());
    assert!(root.path().join("output/cache/x/m-1.json").exists());
}

#[tokio::test]
async fn test_load_failure_is_named_by_file_stem() {
    let root = TempDir::new().unwrap();
    let broken = write(&root, "broken.json", "[");

    let report = dispatcher(&root).run(&[broken]).await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].instance, "broken");
}
