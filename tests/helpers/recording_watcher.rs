//! A watcher that records the file names of every batch it is notified of.

use std::sync::{Arc, Mutex};

use model_store::{Model, ModelFile, ModelWatcher};

#[derive(Clone, Default)]
pub struct Batches(Arc<Mutex<Vec<Vec<String>>>>);

impl Batches {
    pub fn all(&self) -> Vec<Vec<String>> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Vec<String>> {
        self.0.lock().unwrap().last().cloned()
    }
}

pub struct RecordingWatcher {
    name: String,
    batches: Batches,
}

impl RecordingWatcher {
    pub fn new(name: &str) -> (Self, Batches) {
        let batches = Batches::default();
        let watcher = Self {
            name: name.to_string(),
            batches: batches.clone(),
        };
        (watcher, batches)
    }
}

impl ModelWatcher for RecordingWatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_files_changed(&mut self, model: &Model, files: &[&ModelFile]) {
        for file in files {
            assert!(file.is_resolved(), "{} notified with pending relations", file.name);
            assert!(model.file(&file.name).is_some());
        }
        let names = files.iter().map(|f| f.name.to_string()).collect();
        self.batches.0.lock().unwrap().push(names);
    }
}
