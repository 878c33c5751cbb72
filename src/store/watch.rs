//! Filesystem watch mode.
//!
//! Raw notify events are funnelled through a channel to one thread, which
//! coalesces them per path and reloads a file once it has been quiet for the
//! configured window.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use tracing::{debug, error, warn};

use super::core::ModelStore;
use crate::error::StoreError;
use crate::project::ModelLoader;

/// Per-path quiescence tracking.
///
/// Every event for a path pushes its deadline to `now + window`; a path is
/// released only once a deadline passes without being pushed again.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadlines: FxHashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: FxHashMap::default(),
        }
    }

    pub fn push(&mut self, path: PathBuf, now: Instant) {
        self.deadlines.insert(path, now + self.window);
    }

    /// Remove and return every path whose deadline is at or before `now`,
    /// earliest first.
    pub fn drain_expired(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut expired: Vec<(PathBuf, Instant)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, deadline)| (path.clone(), *deadline))
            .collect();
        expired.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        for (path, _) in &expired {
            self.deadlines.remove(path);
        }
        expired.into_iter().map(|(path, _)| path).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

/// Keeps watch mode alive. Dropping it stops the watcher and joins its thread.
///
/// Do not drop it while holding a [`ModelStore::model`] guard on the same
/// thread: the watch thread may be waiting for that lock to apply a change.
pub struct WatchHandle {
    watcher: Option<RecommendedWatcher>,
    thread: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the watcher drops the event sender, which ends the loop.
        self.watcher.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("model watch thread panicked");
            }
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<L: ModelLoader + 'static> ModelStore<L> {
    /// Watch the model root and reload changed files.
    pub fn watch(self: &Arc<Self>) -> Result<WatchHandle, StoreError> {
        let (tx, rx) = crossbeam_channel::unbounded::<notify::Result<Event>>();
        let mut watcher: RecommendedWatcher = Watcher::new(
            move |event: notify::Result<Event>| {
                let _ = tx.send(event);
            },
            notify::Config::default(),
        )?;
        watcher.watch(&self.config().model_root, RecursiveMode::Recursive)?;

        let store = Arc::clone(self);
        let thread = std::thread::Builder::new()
            .name("model-watch".into())
            .spawn(move || run(&store, &rx))?;

        Ok(WatchHandle {
            watcher: Some(watcher),
            thread: Some(thread),
        })
    }
}

fn run<L: ModelLoader>(store: &ModelStore<L>, rx: &Receiver<notify::Result<Event>>) {
    let mut debouncer = Debouncer::new(store.config().debounce());
    let extension = store.loader().extension().to_string();

    loop {
        let received = match debouncer.next_deadline() {
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Ok(event)) => {
                if is_change(&event.kind) {
                    let now = Instant::now();
                    for path in event.paths {
                        if tracks(&path, &extension) {
                            debug!(path = %path.display(), "model file event");
                            debouncer.push(path, now);
                        }
                    }
                }
            }
            Ok(Err(e)) => error!(error = %e, "watch error"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if !debouncer.is_empty() {
                    warn!(dropped = debouncer.len(), "watch stopped with unprocessed changes");
                }
                break;
            }
        }

        for path in debouncer.drain_expired(Instant::now()) {
            // Errors are already logged by the store.
            let _ = store.on_file_changed(&path);
        }
    }
}

/// Created and modified files count as changes. Removals are ignored.
fn is_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

fn tracks(path: &Path, extension: &str) -> bool {
    crate::project::has_extension(path, extension)
}
