//! Integration tests for fsearch
//!
//! These build real directory trees with tempfile, run the full pipeline,
//! and inspect the captured output streams.

use fsearch::config::WalkConfig;
use fsearch::walk::{Filters, WalkCoordinator};
use regex::bytes::Regex;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Write target that can be inspected after the walk returns
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn lines(&self) -> HashSet<String> {
        let raw = self.0.lock().unwrap();
        String::from_utf8_lossy(&raw)
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn config(root: &Path, filters: Filters) -> WalkConfig {
    WalkConfig {
        root: root.to_str().unwrap().to_string(),
        filters,
        scan_tasks: 8,
        filter_workers: 3,
        queue_capacity: 128,
    }
}

fn run_walk(config: WalkConfig) -> (fsearch::WalkResult, SharedBuf, SharedBuf) {
    let out = SharedBuf::default();
    let err = SharedBuf::default();
    let result = WalkCoordinator::new(config)
        .run(out.clone(), err.clone())
        .expect("walk failed");
    (result, out, err)
}

#[test]
fn test_walk_emits_every_reachable_entry_once() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("top.txt"), b"").unwrap();
    fs::create_dir_all(root.join("a/b/c")).unwrap();
    fs::write(root.join("a/one"), b"").unwrap();
    fs::write(root.join("a/b/two"), b"").unwrap();
    fs::write(root.join("a/b/c/three"), b"").unwrap();

    let (result, out, err) = run_walk(config(root, Filters::default()));

    let base = root.to_str().unwrap();
    let expected: HashSet<String> = [
        format!("{base}/top.txt"),
        format!("{base}/a"),
        format!("{base}/a/one"),
        format!("{base}/a/b"),
        format!("{base}/a/b/two"),
        format!("{base}/a/b/c"),
        format!("{base}/a/b/c/three"),
    ]
    .into_iter()
    .collect();

    assert_eq!(out.lines(), expected);
    assert!(err.is_empty());
    assert_eq!(result.matched, 7);
    assert_eq!(result.dirs_scanned, 4);
}

#[test]
fn test_match_and_exclude_patterns() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("foobar"), b"").unwrap();
    fs::write(root.join("foobaz"), b"").unwrap();
    fs::write(root.join("zfoo"), b"").unwrap();

    let filters = Filters {
        name: Some(Regex::new("^foo").unwrap()),
        exclude: Some(Regex::new("bar$").unwrap()),
    };
    let (result, out, _err) = run_walk(config(root, filters));

    let expected: HashSet<String> =
        [format!("{}/foobaz", root.to_str().unwrap())].into_iter().collect();
    assert_eq!(out.lines(), expected);
    assert_eq!(result.matched, 1);
    assert_eq!(result.entries_seen, 3);
}

#[test]
fn test_exclude_without_match_pattern() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("keep"), b"").unwrap();
    fs::write(root.join("noise.log"), b"").unwrap();

    let filters = Filters {
        name: None,
        exclude: Some(Regex::new("\\.log$").unwrap()),
    };
    let (_result, out, _err) = run_walk(config(root, filters));

    let expected: HashSet<String> =
        [format!("{}/keep", root.to_str().unwrap())].into_iter().collect();
    assert_eq!(out.lines(), expected);
}

#[test]
fn test_walk_is_idempotent_over_unchanged_tree() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    for i in 0..20 {
        let sub = root.join(format!("d{i}"));
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("f"), b"").unwrap();
    }

    let (_r1, out1, _e1) = run_walk(config(root, Filters::default()));
    let (_r2, out2, _e2) = run_walk(config(root, Filters::default()));

    // Order may differ between runs; the set of paths must not.
    assert_eq!(out1.lines(), out2.lines());
    assert_eq!(out1.lines().len(), 40);
}

#[test]
fn test_wide_tree_respects_admission_capacity() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    for i in 0..200 {
        fs::create_dir(root.join(format!("wide-{i:03}"))).unwrap();
    }

    let mut cfg = config(root, Filters::default());
    cfg.scan_tasks = 4;
    let (result, out, err) = run_walk(cfg);

    assert_eq!(out.lines().len(), 200);
    assert!(err.is_empty());
    assert!(
        result.peak_scan_tasks <= 4,
        "admission bound exceeded: {}",
        result.peak_scan_tasks
    );
}

#[test]
fn test_missing_root_fails_the_walk() {
    let cfg = WalkConfig {
        root: "/no/such/fsearch/root".into(),
        filters: Filters::default(),
        scan_tasks: 4,
        filter_workers: 2,
        queue_capacity: 64,
    };

    let out = SharedBuf::default();
    let err = SharedBuf::default();
    let result = WalkCoordinator::new(cfg).run(out.clone(), err.clone());

    assert!(matches!(
        result,
        Err(fsearch::WalkerError::Scan(fsearch::ScanError::Open { .. }))
    ));
    assert!(out.is_empty());
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_isolated() {
    use std::os::unix::fs::PermissionsExt;

    // Root bypasses permission checks entirely; skip there.
    if unsafe { libc::geteuid() } == 0 {
        return;
    }

    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("visible"), b"").unwrap();
    let locked = root.join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden"), b"").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let (result, out, err) = run_walk(config(root, Filters::default()));

    // Restore so tempdir cleanup can delete it.
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let lines = out.lines();
    let base = root.to_str().unwrap();
    // Siblings and the unreadable directory's own entry still come through.
    assert!(lines.contains(&format!("{base}/visible")));
    assert!(lines.contains(&format!("{base}/locked")));
    // Its contents do not, and exactly one error names the directory.
    assert!(!lines.contains(&format!("{base}/locked/hidden")));
    assert_eq!(result.errors, 1);
    let err_lines = err.lines();
    assert!(err_lines.iter().any(|l| l.contains("locked")));
}

#[cfg(unix)]
#[test]
fn test_symlinked_directories_are_not_followed() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("real")).unwrap();
    fs::write(root.join("real/inside"), b"").unwrap();
    std::os::unix::fs::symlink(root.join("real"), root.join("link")).unwrap();

    let (_result, out, err) = run_walk(config(root, Filters::default()));

    let base = root.to_str().unwrap();
    let lines = out.lines();
    // The symlink itself is an entry, but its target is never recursed into
    // through the link.
    assert!(lines.contains(&format!("{base}/link")));
    assert!(lines.contains(&format!("{base}/real/inside")));
    assert!(!lines.contains(&format!("{base}/link/inside")));
    assert!(err.is_empty());
}

#[test]
fn test_large_directory_spans_multiple_enumeration_buffers() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    // Enough names to overflow a single 4 KiB getdents buffer several times.
    for i in 0..600 {
        fs::write(root.join(format!("file-with-a-longish-name-{i:04}")), b"").unwrap();
    }

    let (result, out, err) = run_walk(config(root, Filters::default()));

    assert_eq!(out.lines().len(), 600);
    assert_eq!(result.entries_seen, 600);
    assert!(err.is_empty());
}
