use crate::model::{Model, ModelFile};

/// A consumer of resolved models, typically a code generator.
///
/// Called once per successful batch, on the thread that completed it, with
/// the affected files in dependency order.
pub trait ModelWatcher: Send {
    fn name(&self) -> &str;

    fn on_files_changed(&mut self, model: &Model, files: &[&ModelFile]);
}

pub(crate) struct RegisteredWatcher {
    watcher: Box<dyn ModelWatcher>,
    full_name: String,
}

impl RegisteredWatcher {
    pub(crate) fn full_name(&self) -> &str {
        &self.full_name
    }
}

/// Registered watchers in registration order.
#[derive(Default)]
pub(crate) struct WatcherRegistry {
    watchers: Vec<RegisteredWatcher>,
}

impl WatcherRegistry {
    /// Add a watcher. Watchers sharing a name are numbered from 1: `name@n`.
    pub(crate) fn register(&mut self, watcher: Box<dyn ModelWatcher>) -> String {
        let number = 1 + self
            .watchers
            .iter()
            .filter(|w| w.watcher.name() == watcher.name())
            .count();
        let full_name = format!("{}@{number}", watcher.name());
        self.watchers.push(RegisteredWatcher {
            watcher,
            full_name: full_name.clone(),
        });
        full_name
    }

    pub(crate) fn full_names(&self) -> Vec<&str> {
        self.watchers.iter().map(RegisteredWatcher::full_name).collect()
    }

    pub(crate) fn notify(&mut self, model: &Model, files: &[&ModelFile]) {
        for registered in &mut self.watchers {
            tracing::debug!(
                watcher = %registered.full_name,
                files = files.len(),
                "notifying watcher"
            );
            registered.watcher.on_files_changed(model, files);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.watchers.len()
    }
}
