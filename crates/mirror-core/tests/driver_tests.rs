use std::time::{Duration, Instant};

use mirror_core::{Driver, RecordingSink, Roots, SyncEvent, SyncOptions};
use mirror_test_utils::TestTree;
use pretty_assertions::assert_eq;

fn count(sink: &RecordingSink, predicate: impl Fn(&SyncEvent) -> bool) -> usize {
    sink.events().iter().filter(|e| predicate(e)).count()
}

#[test]
fn test_runs_requested_number_of_passes() {
    let source = TestTree::new();
    let replica = TestTree::new();
    source.write("a.txt", "X");
    let roots = Roots::validate(source.root(), replica.root()).unwrap();
    let driver = Driver::new(roots, SyncOptions::default(), Duration::ZERO);

    let sink = RecordingSink::new();
    let passes = driver.run(&sink, Some(3));

    assert_eq!(passes, 3);
    assert_eq!(count(&sink, |e| *e == SyncEvent::PassStarted), 3);
    assert_eq!(
        count(&sink, |e| matches!(e, SyncEvent::PassCompleted { .. })),
        3
    );
    // Only the first pass had work to do
    assert_eq!(sink.applied().len(), 1);
    replica.assert_file("a.txt", "X");
}

#[test]
fn test_pass_errors_do_not_stop_the_loop() {
    let tree = TestTree::new();
    tree.mkdir("source");
    tree.mkdir("replica");
    let roots = Roots::validate(tree.path("source"), tree.path("replica")).unwrap();
    std::fs::remove_dir(tree.path("source")).unwrap();

    let driver = Driver::new(roots, SyncOptions::default(), Duration::ZERO);
    let sink = RecordingSink::new();
    let passes = driver.run(&sink, Some(2));

    assert_eq!(passes, 2);
    assert_eq!(
        count(&sink, |e| matches!(e, SyncEvent::PassAborted { .. })),
        2
    );
}

#[test]
fn test_sleeps_between_passes_not_after_last() {
    let source = TestTree::new();
    let replica = TestTree::new();
    let roots = Roots::validate(source.root(), replica.root()).unwrap();
    let interval = Duration::from_millis(50);
    let driver = Driver::new(roots, SyncOptions::default(), interval);

    let started = Instant::now();
    driver.run(&RecordingSink::new(), Some(2));
    let elapsed = started.elapsed();

    assert!(elapsed >= interval, "expected one pause, took {:?}", elapsed);
    assert_eq!(driver.interval(), interval);
}

#[test]
fn test_run_once_returns_report() {
    let source = TestTree::new();
    let replica = TestTree::new();
    source.write("sub/b.txt", "Y");
    let roots = Roots::validate(source.root(), replica.root()).unwrap();
    let driver = Driver::new(roots, SyncOptions::default(), Duration::from_secs(3600));

    let report = driver.run_once(&RecordingSink::new()).unwrap();

    assert_eq!(report.summary().created, 1);
    replica.assert_file("sub/b.txt", "Y");
}
