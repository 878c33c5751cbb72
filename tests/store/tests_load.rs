//! Full loads of a model directory.

use model_store::{ApplyOutcome, ModelStore};
use rstest::rstest;

use super::class_properties;
use crate::helpers::model_fixtures::*;
use crate::helpers::recording_watcher::RecordingWatcher;

// =============================================================================
// LOAD ALL
// =============================================================================

#[test]
fn test_load_all_orders_files_by_dependency() {
    let dir = ModelDir::standard();
    let store = dir.store();

    let outcome = store.load_all(dir.path()).unwrap();

    assert_eq!(outcome.files(), ["Common", "Base", "User", "Api"]);
    assert_eq!(store.model().file_count(), 4);
    assert!(store.pending().is_empty());
}

#[test]
fn test_load_all_resolves_every_relation() {
    let dir = ModelDir::standard();
    let store = dir.store();
    store.load_all(dir.path()).unwrap();

    assert_eq!(class_properties(&store, "Utilisateur"), vec!["Id", "ProfilId"]);

    let model = store.model();
    for file in model.files() {
        assert!(file.is_resolved(), "{} has pending relations", file.name);
    }

    let api = model.file("Api").unwrap();
    let endpoint = model.endpoint(api.endpoints[0]);
    assert_eq!(endpoint.method.as_deref(), Some("GET"));
    let params: Vec<_> = endpoint
        .params
        .iter()
        .map(|&id| model.property(id).name.as_str())
        .collect();
    assert_eq!(params, vec!["Id", "ProfilId"]);
    for &id in &endpoint.params {
        assert!(model.property(id).origin.is_some());
    }
}

#[test]
fn test_load_all_notifies_watchers_once() {
    let dir = ModelDir::standard();
    let store = dir.store();
    let (watcher, batches) = RecordingWatcher::new("csharp");
    store.register_watcher(watcher);

    store.load_all(dir.path()).unwrap();

    assert_eq!(batches.all(), vec![vec!["Common", "Base", "User", "Api"]]);
}

#[test]
fn test_load_all_walks_subdirectories() {
    let dir = ModelDir::new();
    dir.write("common/domains.tmd", COMMON);
    dir.write("securite/profil/base.tmd", BASE);
    dir.write("securite/user.tmd", USER);
    dir.write("notes.txt", "not a model file");
    let store = dir.store();

    let outcome = store.load_all(dir.path()).unwrap();

    assert_eq!(outcome.files().len(), 3);
}

#[test]
fn test_load_all_empty_directory_is_unchanged() {
    let dir = ModelDir::new();
    let store = dir.store();

    assert_eq!(store.load_all(dir.path()).unwrap(), ApplyOutcome::Unchanged);
    assert_eq!(store.model().file_count(), 0);
}

#[test]
fn test_load_all_resets_previous_state() {
    let dir = ModelDir::standard();
    let store = dir.store();
    store.load_all(dir.path()).unwrap();

    let other = ModelDir::new();
    other.write("common.tmd", COMMON);
    store.load_all(other.path()).unwrap();

    let model = store.model();
    assert_eq!(model.file_count(), 1);
    assert!(model.find_class("Utilisateur").is_none());
}

#[test]
fn test_load_all_skips_unparsable_files() {
    let dir = ModelDir::standard();
    dir.write("broken.tmd", "file Broken;\nclass {");
    let store = dir.store();

    let outcome = store.load_all(dir.path()).unwrap();

    assert_eq!(outcome.files().len(), 4);
    assert!(store.parsed_file("Broken").is_none());
}

// =============================================================================
// WATCHER REGISTRATION
// =============================================================================

#[rstest]
#[case(&["csharp"], &["csharp@1"])]
#[case(&["csharp", "csharp"], &["csharp@1", "csharp@2"])]
#[case(&["ts", "csharp", "ts"], &["ts@1", "csharp@1", "ts@2"])]
fn test_watcher_names_are_numbered(#[case] names: &[&str], #[case] expected: &[&str]) {
    let store: ModelStore = ModelDir::new().store();
    let assigned: Vec<String> = names
        .iter()
        .map(|name| store.register_watcher(RecordingWatcher::new(name).0))
        .collect();

    assert_eq!(assigned, expected);
    assert_eq!(store.watcher_names(), expected);
}

#[test]
fn test_every_watcher_sees_the_batch() {
    let dir = ModelDir::standard();
    let store = dir.store();
    let (first, first_batches) = RecordingWatcher::new("csharp");
    let (second, second_batches) = RecordingWatcher::new("ts");
    store.register_watcher(first);
    store.register_watcher(second);

    store.load_all(dir.path()).unwrap();

    assert_eq!(first_batches.all(), second_batches.all());
    assert_eq!(first_batches.count(), 1);
}
