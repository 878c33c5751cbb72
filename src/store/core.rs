use std::path::Path;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use rayon::prelude::*;
use smol_str::SmolStr;
use tracing::{error, info, warn};

use super::watch::WatchHandle;
use super::watcher::{ModelWatcher, WatcherRegistry};
use crate::config::ModelConfig;
use crate::error::StoreError;
use crate::model::Model;
use crate::project::{DslLoader, ModelLoader, collect_file_paths};
use crate::syntax::ParsedFile;

/// Result of a successful [`ModelStore::apply_updates`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Nothing was pending.
    Unchanged,
    /// These files were re-resolved and committed, in dependency order.
    Applied(Vec<SmolStr>),
}

impl ApplyOutcome {
    pub fn files(&self) -> &[SmolStr] {
        match self {
            ApplyOutcome::Unchanged => &[],
            ApplyOutcome::Applied(files) => files,
        }
    }
}

/// Everything guarded by the store's mutation lock.
#[derive(Default)]
pub(crate) struct StoreState {
    /// Latest successfully parsed version of every file, by logical name.
    pub(crate) sources: IndexMap<SmolStr, ParsedFile>,
    /// Files changed since the last successful apply.
    pub(crate) pending: IndexSet<SmolStr>,
    pub(crate) model: Model,
    pub(crate) watchers: WatcherRegistry,
}

impl StoreState {
    pub(crate) fn load_file(&mut self, loader: &impl ModelLoader, path: &Path) -> bool {
        match loader.load(path) {
            Ok(file) => {
                self.insert_source(file);
                true
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load model file");
                false
            }
        }
    }

    pub(crate) fn insert_source(&mut self, file: ParsedFile) {
        if let Some(previous) = self.sources.get(&file.name) {
            if previous.path != file.path {
                warn!(
                    file = %file.name,
                    previous = %previous.path.display(),
                    path = %file.path.display(),
                    "file name declared by two paths, keeping the latest"
                );
            }
        }
        self.pending.insert(file.name.clone());
        self.sources.insert(file.name.clone(), file);
    }

    fn clear(&mut self) {
        self.sources.clear();
        self.pending.clear();
        self.model = Model::new();
    }
}

/// Loads model files and keeps a resolved [`Model`] up to date.
///
/// All mutation goes through one lock: a change that arrives while a batch
/// is being applied waits for it to finish.
pub struct ModelStore<L: ModelLoader = DslLoader> {
    config: ModelConfig,
    loader: L,
    state: Mutex<StoreState>,
}

impl ModelStore<DslLoader> {
    pub fn new(config: ModelConfig) -> Self {
        let loader = DslLoader::with_extension(config.extension.clone());
        Self::with_loader(config, loader)
    }
}

impl<L: ModelLoader> ModelStore<L> {
    pub fn with_loader(config: ModelConfig, loader: L) -> Self {
        Self {
            config,
            loader,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Register a watcher; returns its numbered name (`name@n`).
    pub fn register_watcher(&self, watcher: impl ModelWatcher + 'static) -> String {
        self.state.lock().watchers.register(Box::new(watcher))
    }

    /// Reset the store and load every model file under `root`.
    ///
    /// Files are parsed in parallel and inserted in path order. Files that
    /// fail to parse are logged and skipped.
    pub fn load_all(&self, root: &Path) -> Result<ApplyOutcome, StoreError> {
        let mut state = self.state.lock();
        info!(
            count = state.watchers.len(),
            watchers = %state.watchers.full_names().join(", "),
            "registered watchers"
        );
        info!(root = %root.display(), "loading model");

        let paths = collect_file_paths(root, self.loader.extension())?;
        let loaded: Vec<_> = paths
            .par_iter()
            .map(|path| (path, self.loader.load(path)))
            .collect();

        state.clear();
        for (path, result) in loaded {
            match result {
                Ok(file) => state.insert_source(file),
                Err(e) => error!(path = %path.display(), error = %e, "failed to load model file"),
            }
        }

        state.apply_updates(self.config.allow_composite_primary_key)
    }

    /// [`load_all`](Self::load_all) on the configured root, watching it if the
    /// config asks for it.
    ///
    /// The watch starts before the scan. In watch mode a failed model load is
    /// logged and the handle still returned; discovery failures are always
    /// returned.
    pub fn load_from_config(self: &Arc<Self>) -> Result<Option<WatchHandle>, StoreError>
    where
        L: 'static,
    {
        let handle = if self.config.watch {
            info!(root = %self.config.model_root.display(), "starting watch mode");
            Some(self.watch()?)
        } else {
            None
        };

        match (handle, self.load_all(&self.config.model_root)) {
            (_, Err(StoreError::Io(e))) => Err(StoreError::Io(e)),
            (Some(handle), Err(e)) => {
                warn!(error = %e, "initial load failed, waiting for changes");
                Ok(Some(handle))
            }
            (handle, loaded) => loaded.map(|_| handle),
        }
    }

    /// Parse one file and mark it pending. Returns `false` if it failed to parse;
    /// the previous version, if any, is kept.
    pub fn load_file(&self, path: &Path) -> bool {
        self.state.lock().load_file(&self.loader, path)
    }

    /// Reload `path` and apply, under one lock.
    pub fn on_file_changed(&self, path: &Path) -> Result<ApplyOutcome, StoreError> {
        info!(path = %path.display(), "model file changed");
        let mut state = self.state.lock();
        state.load_file(&self.loader, path);
        state.apply_updates(self.config.allow_composite_primary_key)
    }

    /// Re-resolve everything affected by the pending files.
    pub fn apply_updates(&self) -> Result<ApplyOutcome, StoreError> {
        self.state
            .lock()
            .apply_updates(self.config.allow_composite_primary_key)
    }

    /// The last committed model.
    pub fn model(&self) -> MappedMutexGuard<'_, Model> {
        MutexGuard::map(self.state.lock(), |state| &mut state.model)
    }

    /// Logical names of the files waiting for a successful apply.
    pub fn pending(&self) -> Vec<SmolStr> {
        self.state.lock().pending.iter().cloned().collect()
    }

    pub fn parsed_file(&self, name: &str) -> Option<ParsedFile> {
        self.state.lock().sources.get(name).cloned()
    }

    pub fn watcher_names(&self) -> Vec<String> {
        self.state
            .lock()
            .watchers
            .full_names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }
}
