//! Integration tests for du-walker
//!
//! Real-filesystem tests use tempfile directories. Tests that need precise
//! control over tree shape, latency or failures use the in-memory lister,
//! with tree shapes generated by proptest.

use du_walker::config::WalkConfig;
use du_walker::progress::format_disk_usage;
use du_walker::walker::{
    DirLister, DiskUsageCoordinator, DiskUsageResult, MemoryLister, RunningTotals,
};
use proptest::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn write_file(path: &Path, size: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![b'x'; size]).unwrap();
}

/// Synthetic directory tree entry
#[derive(Debug, Clone)]
enum Node {
    File(u64),
    Dir(Vec<Node>),
}

/// Trees up to 5 levels deep, up to 8 entries per directory
fn tree_strategy() -> impl Strategy<Value = Vec<Node>> {
    let leaf = (0u64..10_000_000).prop_map(Node::File);
    let node = leaf.prop_recursive(5, 256, 8, |inner| {
        prop::collection::vec(inner, 0..8).prop_map(Node::Dir)
    });
    prop::collection::vec(node, 0..8)
}

/// Add `children` under `dir`; returns the number of directories added
fn populate(
    lister: &mut MemoryLister,
    dir: &Path,
    children: &[Node],
    totals: &mut RunningTotals,
) -> u64 {
    lister.add_dir(dir);
    let mut dirs = 1;

    for (i, child) in children.iter().enumerate() {
        let path = dir.join(format!("e{i}"));
        match child {
            Node::File(size) => {
                lister.add_file(&path, *size);
                totals.record(*size);
            }
            Node::Dir(grandchildren) => {
                dirs += populate(lister, &path, grandchildren, totals);
            }
        }
    }

    dirs
}

/// Balanced tree with `fanout` subdirectories per level and four files per
/// directory; records the expected totals
fn balanced_tree(
    lister: &mut MemoryLister,
    dir: &Path,
    depth: usize,
    fanout: usize,
    totals: &mut RunningTotals,
) {
    lister.add_dir(dir);
    for f in 0..4u64 {
        let size = 1000 + f * 17 + depth as u64;
        lister.add_file(dir.join(format!("f{f}")), size);
        totals.record(size);
    }
    if depth > 0 {
        for d in 0..fanout {
            balanced_tree(lister, &dir.join(format!("d{d}")), depth - 1, fanout, totals);
        }
    }
}

/// Walk an in-memory tree rooted at `/t` on a fresh multi-threaded runtime
fn walk_memory(lister: Arc<dyn DirLister>, concurrency: usize) -> DiskUsageResult {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();
    let config = WalkConfig::for_roots(vec![PathBuf::from("/t")])
        .with_concurrency(concurrency)
        .with_queue_size(1);

    runtime
        .block_on(DiskUsageCoordinator::with_lister(config, lister).run(|_| {}))
        .unwrap()
}

#[tokio::test]
async fn test_example_scenario_on_disk() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("R");
    write_file(&root.join("a"), 100);
    write_file(&root.join("b"), 200);
    write_file(&root.join("D").join("c"), 300);

    let config = WalkConfig::for_roots(vec![root]).with_concurrency(20);
    let result = DiskUsageCoordinator::new(config).run(|_| {}).await.unwrap();

    assert!(result.completed);
    assert_eq!(result.totals, RunningTotals { files: 3, bytes: 600 });
    assert_eq!(format_disk_usage(&result.totals), "3 files 0.0 GB");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sum_invariant_on_disk() {
    let dir = tempdir().unwrap();
    let mut expected = RunningTotals::default();

    for a in 0..4 {
        for b in 0..3 {
            for c in 0..(a + b) {
                let size = 17 * (a + 1) * (b + 2) + c;
                write_file(&dir.path().join(format!("a{a}/b{b}/nested/f{c}")), size);
                expected.record(size as u64);
            }
        }
        write_file(&dir.path().join(format!("top{a}")), 1000 + a);
        expected.record(1000 + a as u64);
    }
    fs::create_dir_all(dir.path().join("empty/also_empty")).unwrap();

    for concurrency in [1, 3, 20] {
        let config = WalkConfig::for_roots(vec![dir.path().to_path_buf()])
            .with_concurrency(concurrency)
            .with_queue_size(1);
        let result = DiskUsageCoordinator::new(config).run(|_| {}).await.unwrap();

        assert!(result.completed);
        assert_eq!(result.totals, expected, "concurrency {concurrency}");
        assert_eq!(result.errors, 0);
    }
}

#[tokio::test]
async fn test_overlapping_roots_counted_twice() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("sub/f"), 10);

    let config = WalkConfig::for_roots(vec![dir.path().to_path_buf(), dir.path().join("sub")]);
    let result = DiskUsageCoordinator::new(config).run(|_| {}).await.unwrap();

    assert_eq!(result.totals, RunningTotals { files: 2, bytes: 20 });
}

#[tokio::test]
async fn test_missing_root_is_reported_not_fatal() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("real/f"), 42);

    let config = WalkConfig::for_roots(vec![
        dir.path().join("real"),
        dir.path().join("does-not-exist"),
    ]);
    let result = DiskUsageCoordinator::new(config).run(|_| {}).await.unwrap();

    assert!(result.completed);
    assert_eq!(result.totals, RunningTotals { files: 1, bytes: 42 });
    assert_eq!(result.errors, 1);
}

#[tokio::test]
async fn test_exclude_patterns_on_disk() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("src/main.rs"), 10);
    write_file(&dir.path().join(".git/objects/pack"), 5000);

    let config = WalkConfig::for_roots(vec![dir.path().to_path_buf()])
        .with_exclude_patterns(&[r"/\.git$".to_string()])
        .unwrap();
    let result = DiskUsageCoordinator::new(config).run(|_| {}).await.unwrap();

    assert_eq!(result.totals, RunningTotals { files: 1, bytes: 10 });
    assert_eq!(result.excluded, 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_sum_invariant_generated_trees(tree in tree_strategy(), k in 1usize..=32) {
        let mut lister = MemoryLister::new();
        let mut expected = RunningTotals::default();
        let dirs = populate(&mut lister, Path::new("/t"), &tree, &mut expected);

        let result = walk_memory(Arc::new(lister), k);

        prop_assert!(result.completed);
        prop_assert_eq!(result.totals, expected);
        prop_assert_eq!(result.dirs, dirs);
        prop_assert_eq!(result.errors, 0);
    }

    #[test]
    fn test_concurrency_cap_generated_trees(tree in tree_strategy(), k in 1usize..=32) {
        let mut lister = MemoryLister::new().with_delay(Duration::from_micros(200));
        let mut expected = RunningTotals::default();
        let dirs = populate(&mut lister, Path::new("/t"), &tree, &mut expected);
        let lister = Arc::new(lister);

        let result = walk_memory(lister.clone(), k);

        prop_assert!(result.completed);
        prop_assert!(
            lister.peak_concurrency() <= k,
            "peak {} exceeded cap {}",
            lister.peak_concurrency(),
            k
        );
        prop_assert_eq!(lister.list_calls() as u64, dirs);
        prop_assert_eq!(result.totals, expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancellation_truncates_and_terminates() {
    // 1 + 7 + 49 + 343 directories
    let mut lister = MemoryLister::new().with_delay(Duration::from_millis(5));
    let mut full = RunningTotals::default();
    balanced_tree(&mut lister, Path::new("/t"), 3, 7, &mut full);

    let config = WalkConfig::for_roots(vec![PathBuf::from("/t")])
        .with_concurrency(2)
        .with_queue_size(1);
    let coordinator = DiskUsageCoordinator::with_lister(config, Arc::new(lister));
    let cancel = coordinator.cancel_signal();

    let run = tokio::spawn(coordinator.run(|_| {}));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(cancel.fire());

    let result = tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("cancelled run should terminate")
        .unwrap()
        .unwrap();

    assert!(!result.completed);
    assert!(result.totals.files <= full.files);
    assert!(result.totals.bytes <= full.bytes);
    assert!(result.dirs < 400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_double_fire_behaves_like_single_fire() {
    let mut lister = MemoryLister::new().with_delay(Duration::from_millis(5));
    let mut full = RunningTotals::default();
    balanced_tree(&mut lister, Path::new("/t"), 3, 6, &mut full);

    let config = WalkConfig::for_roots(vec![PathBuf::from("/t")]).with_concurrency(2);
    let coordinator = DiskUsageCoordinator::with_lister(config, Arc::new(lister));
    let cancel = coordinator.cancel_signal();

    let run = tokio::spawn(coordinator.run(|_| {}));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(cancel.fire());
    assert!(!cancel.fire());

    let result = tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("cancelled run should terminate")
        .unwrap()
        .unwrap();

    assert!(!result.completed);
    assert!(result.totals.files <= full.files);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_progress_snapshots_are_monotonic() {
    // 1 + 5 + 25 + 125 directories
    let mut lister = MemoryLister::new().with_delay(Duration::from_millis(2));
    let mut full = RunningTotals::default();
    balanced_tree(&mut lister, Path::new("/t"), 3, 5, &mut full);

    let config = WalkConfig::for_roots(vec![PathBuf::from("/t")])
        .with_concurrency(2)
        .with_report_interval(Some(Duration::from_millis(10)));

    let mut snapshots: Vec<RunningTotals> = Vec::new();
    let result = DiskUsageCoordinator::with_lister(config, Arc::new(lister))
        .run(|totals| snapshots.push(*totals))
        .await
        .unwrap();

    assert_eq!(result.totals, full);
    assert!(!snapshots.is_empty());
    for pair in snapshots.windows(2) {
        assert!(pair[0].files <= pair[1].files);
        assert!(pair[0].bytes <= pair[1].bytes);
    }
    if let Some(last) = snapshots.last() {
        assert!(last.files <= result.totals.files);
    }
}
