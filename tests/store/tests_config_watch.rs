//! Loading from a configuration file, and watch mode.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use model_store::{ModelConfig, ModelStore};

use super::class_properties;
use crate::helpers::model_fixtures::*;
use crate::helpers::recording_watcher::RecordingWatcher;

fn write_model(dir: &ModelDir) {
    dir.write("model/common.tmd", COMMON);
    dir.write("model/base.tmd", BASE);
    dir.write("model/user.tmd", USER);
    dir.write("model/api.tmd", API);
}

#[test]
fn test_load_from_config_file() {
    let dir = ModelDir::new();
    write_model(&dir);
    let config_path = dir.write("model-store.toml", "modelRoot = \"model\"\n");

    let config = ModelConfig::load(&config_path).unwrap();
    assert_eq!(config.model_root, dir.file("model"));

    let store = Arc::new(ModelStore::new(config));
    let handle = store.load_from_config().unwrap();

    assert!(handle.is_none());
    assert_eq!(store.model().file_count(), 4);
}

#[test]
fn test_load_from_config_uses_configured_extension() {
    let dir = ModelDir::new();
    dir.write("model/common.model", COMMON);
    dir.write("model/base.tmd", BASE);
    let config_path = dir.write(
        "model-store.toml",
        "modelRoot = \"model\"\nextension = \"model\"\n",
    );

    let store = Arc::new(ModelStore::new(ModelConfig::load(&config_path).unwrap()));
    store.load_from_config().unwrap();

    let model = store.model();
    assert_eq!(model.file_count(), 1);
    assert!(model.file("Common").is_some());
}

/// Poll until `done` holds or the timeout passes.
fn wait_for(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    done()
}

#[test]
fn test_watch_reloads_changed_file() {
    let dir = ModelDir::new();
    write_model(&dir);
    let config = ModelConfig {
        watch: true,
        debounce_ms: 50,
        ..ModelConfig::new(dir.file("model"))
    };
    let store = Arc::new(ModelStore::new(config));
    let (watcher, batches) = RecordingWatcher::new("csharp");
    store.register_watcher(watcher);

    let handle = store.load_from_config().unwrap().unwrap();
    assert_eq!(batches.count(), 1);

    dir.write(
        "model/base.tmd",
        "file Base;\nuses Common;\nclass Profil {\n    key field Id : DO_ID;\n    field Libelle : DO_LABEL;\n}\n",
    );

    let reloaded = wait_for(Duration::from_secs(10), || {
        batches
            .last()
            .is_some_and(|batch| batch.first().is_some_and(|name| name == "Base"))
    });
    assert!(reloaded, "watch mode never applied the change: {:?}", batches.all());

    // Reads release the store lock before the handle goes away.
    assert_eq!(class_properties(&store, "Profil"), vec!["Id", "Libelle"]);
    handle.stop();
    assert_eq!(store.model().file_count(), 4);
}

#[test]
fn test_watch_survives_failed_initial_load() {
    let dir = ModelDir::new();
    write_model(&dir);
    dir.write("model/user.tmd", "file User;\nuses Base, Ghost;\n");
    let config = ModelConfig {
        watch: true,
        debounce_ms: 50,
        ..ModelConfig::new(dir.file("model"))
    };
    let store = Arc::new(ModelStore::new(config));

    let handle = store.load_from_config().unwrap();

    assert!(handle.is_some());
    assert_eq!(store.model().file_count(), 0);
    assert_eq!(store.pending().len(), 4);
}

#[test]
fn test_failed_load_is_returned_without_watch() {
    let dir = ModelDir::new();
    dir.write("model/user.tmd", "file User;\nuses Ghost;\n");
    let store = Arc::new(ModelStore::new(ModelConfig::new(dir.file("model"))));

    assert!(matches!(
        store.load_from_config(),
        Err(model_store::StoreError::MissingDependency { .. })
    ));
}
