//! Incremental updates after the initial load.

use model_store::ApplyOutcome;

use super::class_properties;
use crate::helpers::model_fixtures::*;
use crate::helpers::recording_watcher::RecordingWatcher;

const BASE_WITH_LABEL: &str = r#"file Base;
uses Common;
reference class Profil {
    key field Id : DO_ID;
    field Code : DO_CODE;
    field Libelle : DO_LABEL;
}
"#;

#[test]
fn test_base_change_reaches_direct_dependents_only() {
    let dir = ModelDir::standard();
    let store = dir.store();
    let (watcher, batches) = RecordingWatcher::new("csharp");
    store.register_watcher(watcher);
    store.load_all(dir.path()).unwrap();

    let path = dir.write("base.tmd", BASE_WITH_LABEL);
    let outcome = store.on_file_changed(&path).unwrap();

    assert_eq!(outcome.files(), ["Base", "User"]);
    assert_eq!(batches.last().unwrap(), vec!["Base", "User"]);
    assert_eq!(class_properties(&store, "Profil"), vec!["Id", "Code", "Libelle"]);
}

#[test]
fn test_domain_change_reaches_every_file() {
    let dir = ModelDir::standard();
    let store = dir.store();
    store.load_all(dir.path()).unwrap();

    let path = dir.write("common.tmd", &format!("{COMMON}domain DO_FLAG {{}}\n"));
    let outcome = store.on_file_changed(&path).unwrap();

    assert_eq!(outcome.files(), ["Common", "Base", "User", "Api"]);
    assert!(store.model().find_domain("DO_FLAG").is_some());
}

#[test]
fn test_dependents_see_the_new_entities() {
    let dir = ModelDir::standard();
    let store = dir.store();
    store.load_all(dir.path()).unwrap();
    let old_profil = store.model().find_class("Profil").unwrap();

    let path = dir.write("base.tmd", BASE_WITH_LABEL);
    store.on_file_changed(&path).unwrap();

    let model = store.model();
    let new_profil = model.find_class("Profil").unwrap();
    assert_ne!(old_profil, new_profil);

    let user = model.file("User").unwrap();
    let utilisateur = user
        .classes
        .iter()
        .copied()
        .find(|&id| model.class(id).name == "Utilisateur")
        .unwrap();
    let target = model
        .class(utilisateur)
        .properties
        .iter()
        .find_map(|&id| match &model.property(id).kind {
            model_store::model::PropertyKind::Association { association, .. } => *association,
            _ => None,
        });
    assert_eq!(target, Some(new_profil));
}

#[test]
fn test_new_file_is_picked_up() {
    let dir = ModelDir::standard();
    let store = dir.store();
    store.load_all(dir.path()).unwrap();

    let path = dir.write(
        "audit.tmd",
        "file Audit;\nuses User;\nclass Trace {\n    key field Id : DO_ID;\n    association Utilisateur;\n}\n",
    );
    let outcome = store.on_file_changed(&path).unwrap();

    assert_eq!(outcome.files(), ["Audit"]);
    assert_eq!(class_properties(&store, "Trace"), vec!["Id", "UtilisateurId"]);
}

#[test]
fn test_apply_without_changes_is_unchanged() {
    let dir = ModelDir::standard();
    let store = dir.store();
    let (watcher, batches) = RecordingWatcher::new("csharp");
    store.register_watcher(watcher);
    store.load_all(dir.path()).unwrap();

    assert_eq!(store.apply_updates().unwrap(), ApplyOutcome::Unchanged);
    assert_eq!(batches.count(), 1);
}

#[test]
fn test_load_file_waits_for_apply() {
    let dir = ModelDir::standard();
    let store = dir.store();
    store.load_all(dir.path()).unwrap();

    let path = dir.write("base.tmd", BASE_WITH_LABEL);
    assert!(store.load_file(&path));
    assert_eq!(store.pending(), ["Base"]);
    assert_eq!(class_properties(&store, "Profil"), vec!["Id", "Code"]);

    store.apply_updates().unwrap();
    assert!(store.pending().is_empty());
    assert_eq!(class_properties(&store, "Profil").len(), 3);
}

#[test]
fn test_renamed_path_keeps_logical_name() {
    let dir = ModelDir::standard();
    let store = dir.store();
    store.load_all(dir.path()).unwrap();

    let path = dir.write("moved/base.tmd", BASE_WITH_LABEL);
    store.on_file_changed(&path).unwrap();

    let parsed = store.parsed_file("Base").unwrap();
    assert_eq!(parsed.path, path);
    assert_eq!(store.model().file_count(), 4);
}
