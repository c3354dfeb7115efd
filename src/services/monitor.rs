// Network Manager - Script Presence Monitor
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Tracks whether any dispatcher script is installed.
//!
//! Each watched directory has a "has at least one entry" flag and dispatching
//! is enabled while any flag is set. A background task polls the directories
//! and reports which one changed; the change is applied on the thread that
//! owns the monitor, via [`ScriptMonitor::process_pending`] or
//! [`ScriptMonitor::run`].

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::{DispatcherConfig, Error, Result};

/// Last known state of one script directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDirState {
    pub path: PathBuf,
    pub has_scripts: bool,
}

/// Cheap change detector for a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Fingerprint {
    Listed {
        entries: usize,
        modified: Option<SystemTime>,
    },
    Unreadable,
}

fn fingerprint(path: &Path) -> Fingerprint {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
    match std::fs::read_dir(path) {
        Ok(entries) => Fingerprint::Listed {
            entries: entries.count(),
            modified,
        },
        Err(_) => Fingerprint::Unreadable,
    }
}

/// Whether `path` has at least one entry. A listing error counts as yes.
fn has_scripts(path: &Path) -> bool {
    match std::fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_some(),
        Err(e) => {
            warn!("Failed to list dispatcher scripts in {:?}: {}", path, e);
            true
        }
    }
}

/// Owner of the dispatch-enabled flag and the directory watches.
pub struct ScriptMonitor {
    dirs: RefCell<Vec<ScriptDirState>>,
    enabled: Cell<bool>,
    events: RefCell<Option<mpsc::UnboundedReceiver<usize>>>,
    cancel: CancellationToken,
    watcher: RefCell<Option<JoinHandle<()>>>,
}

impl ScriptMonitor {
    /// List every directory once. No watching happens until
    /// [`start_watching`](Self::start_watching).
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let dirs: Vec<ScriptDirState> = dirs
            .into_iter()
            .map(|path| {
                let path = path.into();
                let has_scripts = has_scripts(&path);
                ScriptDirState { path, has_scripts }
            })
            .collect();
        let enabled = dirs.iter().any(|d| d.has_scripts);
        debug!(
            "Dispatcher scripts {} at startup",
            if enabled { "present" } else { "absent" }
        );

        Self {
            dirs: RefCell::new(dirs),
            enabled: Cell::new(enabled),
            events: RefCell::new(None),
            cancel: CancellationToken::new(),
            watcher: RefCell::new(None),
        }
    }

    /// Create the monitor for the configured directories and start watching
    /// them. Must be called from within a Tokio runtime.
    pub fn init(config: &DispatcherConfig) -> Result<Rc<Self>> {
        let monitor = Self::new(config.script_dirs.iter().cloned());
        monitor.start_watching(Duration::from_millis(config.poll_interval_ms.max(1)))?;
        Ok(Rc::new(monitor))
    }

    /// Spawn the directory poller.
    pub fn start_watching(&self, period: Duration) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Internal("script monitor is shut down".to_string()));
        }
        if self.watcher.borrow().is_some() {
            return Ok(());
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Internal(format!("no runtime for script watch: {}", e)))?;

        let paths: Vec<PathBuf> = self.dirs.borrow().iter().map(|d| d.path.clone()).collect();
        let baseline: Vec<Fingerprint> = paths.iter().map(|p| fingerprint(p)).collect();
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = self.cancel.clone();

        let handle = runtime.spawn(async move {
            let mut fingerprints = baseline;
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        for (index, path) in paths.iter().enumerate() {
                            let current = fingerprint(path);
                            if current != fingerprints[index] {
                                debug!("Script directory {:?} changed", path);
                                fingerprints[index] = current;
                                if tx.send(index).is_err() {
                                    return;
                                }
                            }
                        }
                    }
                }
            }
            debug!("Script directory watch stopped");
        });

        *self.events.borrow_mut() = Some(rx);
        *self.watcher.borrow_mut() = Some(handle);

        // Anything that changed before the baseline was taken.
        let count = self.dirs.borrow().len();
        for index in 0..count {
            self.handle_change(index);
        }
        Ok(())
    }

    /// Re-list one directory and recompute the global flag.
    pub fn handle_change(&self, index: usize) {
        let enabled = {
            let mut dirs = self.dirs.borrow_mut();
            let Some(dir) = dirs.get_mut(index) else {
                warn!("Change reported for unknown script directory {}", index);
                return;
            };
            dir.has_scripts = has_scripts(&dir.path);
            dirs.iter().any(|d| d.has_scripts)
        };

        if enabled != self.enabled.replace(enabled) {
            info!(
                "Dispatcher {}",
                if enabled {
                    "scripts found, dispatching enabled"
                } else {
                    "scripts removed, dispatching disabled"
                }
            );
        }
    }

    /// Apply every change reported so far. Returns how many were applied.
    pub fn process_pending(&self) -> usize {
        let mut changed = Vec::new();
        if let Some(rx) = self.events.borrow_mut().as_mut() {
            while let Ok(index) = rx.try_recv() {
                changed.push(index);
            }
        }
        for &index in &changed {
            self.handle_change(index);
        }
        changed.len()
    }

    /// Apply changes as they arrive until [`shutdown`](Self::shutdown).
    pub async fn run(&self) {
        let Some(mut rx) = self.events.borrow_mut().take() else {
            return;
        };
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Some(index) => self.handle_change(index),
                    None => break,
                },
            }
        }
    }

    /// Whether any watched directory has scripts.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn dir_states(&self) -> Vec<ScriptDirState> {
        self.dirs.borrow().clone()
    }

    /// Stop watching. Safe to call more than once.
    pub fn shutdown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.watcher.borrow_mut().take();
        self.events.borrow_mut().take();
        debug!("Script monitor shut down");
    }
}

impl Drop for ScriptMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start the script monitor for `config`.
pub fn init_monitor(config: &DispatcherConfig) -> Result<Rc<ScriptMonitor>> {
    ScriptMonitor::init(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn three_dirs() -> (TempDir, [PathBuf; 3]) {
        let root = tempfile::tempdir().unwrap();
        let dirs = ["dispatcher.d", "pre-up.d", "pre-down.d"].map(|name| {
            let path = root.path().join(name);
            fs::create_dir(&path).unwrap();
            path
        });
        (root, dirs)
    }

    #[test]
    fn test_empty_dirs_disable_dispatch() {
        let (_root, dirs) = three_dirs();
        let monitor = ScriptMonitor::new(dirs);
        assert!(!monitor.is_enabled());
        assert!(monitor.dir_states().iter().all(|d| !d.has_scripts));
    }

    #[test]
    fn test_initial_listing_sees_existing_script() {
        let (_root, dirs) = three_dirs();
        fs::write(dirs[2].join("10-flush"), "#!/bin/sh\n").unwrap();
        let monitor = ScriptMonitor::new(dirs);
        assert!(monitor.is_enabled());
        assert!(monitor.dir_states()[2].has_scripts);
    }

    #[test]
    fn test_change_updates_only_that_dir() {
        let (_root, dirs) = three_dirs();
        let monitor = ScriptMonitor::new(dirs.clone());

        fs::write(dirs[1].join("20-up"), "#!/bin/sh\n").unwrap();
        monitor.handle_change(1);
        assert!(monitor.is_enabled());

        // Directory 0 was not re-listed, so its flag is unchanged.
        fs::write(dirs[0].join("unseen"), "").unwrap();
        assert!(!monitor.dir_states()[0].has_scripts);

        fs::remove_file(dirs[1].join("20-up")).unwrap();
        monitor.handle_change(1);
        assert!(!monitor.is_enabled());
    }

    #[test]
    fn test_unreadable_dir_fails_open() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing");
        let monitor = ScriptMonitor::new([missing.clone(), missing.clone(), missing]);
        assert!(monitor.is_enabled());
    }

    #[test]
    fn test_unknown_index_is_ignored() {
        let (_root, dirs) = three_dirs();
        let monitor = ScriptMonitor::new(dirs);
        monitor.handle_change(7);
        assert!(!monitor.is_enabled());
    }

    #[test]
    fn test_watching_needs_runtime() {
        let (_root, dirs) = three_dirs();
        let monitor = ScriptMonitor::new(dirs);
        assert!(monitor.start_watching(Duration::from_millis(10)).is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_poller_reports_new_script() {
        let (_root, dirs) = three_dirs();
        let monitor = ScriptMonitor::new(dirs.clone());
        monitor.start_watching(Duration::from_millis(10)).unwrap();
        assert!(!monitor.is_enabled());

        fs::write(dirs[0].join("01-ifupdown"), "#!/bin/sh\n").unwrap();
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if monitor.process_pending() > 0 && monitor.is_enabled() {
                break;
            }
        }
        assert!(monitor.is_enabled());
        monitor.shutdown();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_shutdown_is_idempotent_and_stops_run() {
        let (_root, dirs) = three_dirs();
        let monitor = ScriptMonitor::new(dirs);
        monitor.start_watching(Duration::from_millis(10)).unwrap();

        let run = monitor.run();
        monitor.shutdown();
        monitor.shutdown();
        tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .expect("run should return after shutdown");
        assert!(monitor.start_watching(Duration::from_millis(10)).is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_init_from_config() {
        let (_root, dirs) = three_dirs();
        let config = DispatcherConfig {
            script_dirs: dirs,
            poll_interval_ms: 50,
            ..Default::default()
        };
        let monitor = init_monitor(&config).unwrap();
        assert_eq!(monitor.dir_states().len(), 3);
        assert!(!monitor.is_enabled());
        monitor.shutdown();
    }
}
