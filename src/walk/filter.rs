//! Name filtering worker pool
//!
//! A fixed pool of threads drains the entries queue, applies the compiled
//! name patterns, and forwards survivors to the results queue. The patterns
//! are matched against the raw name bytes, so non-UTF-8 names filter the
//! same way the kernel reported them.
//!
//! Each worker owns a clone of the results sender; when the entries queue
//! disconnects and the last worker exits, the final sender drops and the
//! results queue closes. That drop is the pool's join barrier: the results
//! queue can never close while any worker is still draining.

use crate::walk::dirent::Entry;
use crossbeam_channel::{Receiver, Sender};
use regex::bytes::Regex;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Compiled name patterns, immutable for the duration of one walk
#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Entry name must match to pass, when set
    pub name: Option<Regex>,

    /// Entry name must NOT match to pass, when set
    pub exclude: Option<Regex>,
}

impl Filters {
    /// Test a raw entry name against both patterns.
    ///
    /// The two patterns are independent: an exclude pattern applies whether
    /// or not a match pattern is configured.
    pub fn accepts(&self, name: &[u8]) -> bool {
        if let Some(ref pattern) = self.name {
            if !pattern.is_match(name) {
                return false;
            }
        }

        if let Some(ref pattern) = self.exclude {
            if pattern.is_match(name) {
                return false;
            }
        }

        true
    }
}

/// The filter worker pool
pub struct FilterPool {
    handles: Vec<JoinHandle<()>>,
}

impl FilterPool {
    /// Spawn `workers` filter threads draining `entries` into `results`.
    pub fn spawn(
        workers: usize,
        filters: Filters,
        entries: Receiver<Entry>,
        results: Sender<Entry>,
    ) -> std::io::Result<Self> {
        let mut handles = Vec::with_capacity(workers);

        for id in 0..workers {
            let filters = filters.clone();
            let entries = entries.clone();
            let results = results.clone();

            let handle = thread::Builder::new()
                .name(format!("filter-{id}"))
                .spawn(move || filter_loop(id, &filters, &entries, &results))?;
            handles.push(handle);
        }

        Ok(Self { handles })
    }

    /// Wait for every worker to observe the entries queue closed and exit.
    pub fn join(self) {
        for handle in self.handles {
            // Workers have no panicking paths; a panic here is a bug worth
            // surfacing loudly.
            handle.join().expect("filter worker panicked");
        }
    }
}

fn filter_loop(id: usize, filters: &Filters, entries: &Receiver<Entry>, results: &Sender<Entry>) {
    let mut seen = 0u64;
    let mut passed = 0u64;

    while let Ok(entry) = entries.recv() {
        seen += 1;
        if !filters.accepts(&entry.name) {
            continue;
        }
        passed += 1;
        if results.send(entry).is_err() {
            // Downstream sink is gone; nothing left to do.
            break;
        }
    }

    debug!(worker = id, seen, passed, "Filter worker finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::dirent::EntryType;
    use crossbeam_channel::bounded;

    fn entry(name: &str) -> Entry {
        Entry {
            inode: 1,
            file_type: EntryType::File,
            name: name.as_bytes().to_vec(),
            path: format!("/t/{name}"),
        }
    }

    #[test]
    fn test_no_patterns_pass_everything() {
        let filters = Filters::default();
        assert!(filters.accepts(b"anything"));
        assert!(filters.accepts(b""));
    }

    #[test]
    fn test_match_and_exclude_combine() {
        let filters = Filters {
            name: Some(Regex::new("^foo").unwrap()),
            exclude: Some(Regex::new("bar$").unwrap()),
        };

        // Starts with foo but ends with bar: dropped by exclude.
        assert!(!filters.accepts(b"foobar"));
        // Starts with foo, does not end with bar: passes.
        assert!(filters.accepts(b"foobaz"));
        // Does not start with foo: dropped by match.
        assert!(!filters.accepts(b"zfoo"));
    }

    #[test]
    fn test_exclude_applies_without_match_pattern() {
        // Exclude must work on its own, not only when a match pattern is set.
        let filters = Filters {
            name: None,
            exclude: Some(Regex::new("^skip").unwrap()),
        };
        assert!(!filters.accepts(b"skip-me"));
        assert!(filters.accepts(b"keep-me"));
    }

    #[test]
    fn test_matches_raw_bytes() {
        let filters = Filters {
            name: Some(Regex::new("^data").unwrap()),
            exclude: None,
        };
        let mut name = b"data-".to_vec();
        name.extend_from_slice(&[0xff, 0xfe]); // not valid UTF-8
        assert!(filters.accepts(&name));
    }

    #[test]
    fn test_pool_filters_and_closes_results() {
        let (entries_tx, entries_rx) = bounded(16);
        let (results_tx, results_rx) = bounded(16);

        let filters = Filters {
            name: Some(Regex::new("^keep").unwrap()),
            exclude: None,
        };
        let pool = FilterPool::spawn(3, filters, entries_rx, results_tx).unwrap();

        for name in ["keep-a", "drop-a", "keep-b", "drop-b", "keep-c"] {
            entries_tx.send(entry(name)).unwrap();
        }
        drop(entries_tx);

        // The results queue closes only after every worker has drained.
        let mut names: Vec<String> = results_rx
            .iter()
            .map(|e| String::from_utf8(e.name).unwrap())
            .collect();
        names.sort();
        assert_eq!(names, ["keep-a", "keep-b", "keep-c"]);

        pool.join();
    }
}
