//! Failed batches: nothing is committed, nothing is notified, and the
//! affected files stay pending until a later batch succeeds.

use model_store::{ApplyOutcome, ModelConfig, ModelStore, ResolveErrorKind, StoreError};
use rstest::rstest;

use super::class_properties;
use crate::helpers::model_fixtures::*;
use crate::helpers::recording_watcher::{Batches, RecordingWatcher};

const USER_BROKEN: &str = r#"file User;
uses Base, Common;
class Utilisateur {
    key field Id : DO_ID;
    association Profil;
    field Statut : DO_NOPE;
}
"#;

fn loaded() -> (ModelDir, ModelStore, Batches) {
    let dir = ModelDir::standard();
    let store = dir.store();
    let (watcher, batches) = RecordingWatcher::new("csharp");
    store.register_watcher(watcher);
    store.load_all(dir.path()).unwrap();
    (dir, store, batches)
}

// =============================================================================
// SOFT ERRORS
// =============================================================================

#[test]
fn test_soft_error_commits_nothing() {
    let (dir, store, batches) = loaded();

    let path = dir.write("user.tmd", USER_BROKEN);
    let errors = match store.on_file_changed(&path) {
        Err(StoreError::Resolution(errors)) => errors,
        other => panic!("expected resolution errors, got {other:?}"),
    };

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].kind,
        ResolveErrorKind::UnknownDomain {
            name: "DO_NOPE".into()
        }
    );
    assert_eq!(errors[0].context.to_string(), "User/Utilisateur/Statut");
    assert_eq!(errors[0].path, path);
    assert_eq!(errors[0].span.start.line, 5);

    assert_eq!(store.pending(), ["User"]);
    assert_eq!(class_properties(&store, "Utilisateur"), vec!["Id", "ProfilId"]);
    assert_eq!(batches.count(), 1);
}

#[test]
fn test_fix_after_soft_error_notifies_once() {
    let (dir, store, batches) = loaded();
    let path = dir.write("user.tmd", USER_BROKEN);
    assert!(store.on_file_changed(&path).is_err());

    dir.write("user.tmd", USER);
    let outcome = store.on_file_changed(&path).unwrap();

    assert_eq!(outcome.files(), ["User", "Api"]);
    assert!(store.pending().is_empty());
    assert_eq!(batches.count(), 2);
    assert_eq!(batches.last().unwrap(), vec!["User", "Api"]);
}

#[test]
fn test_failed_file_is_retried_with_the_next_change() {
    let (dir, store, batches) = loaded();
    dir.write("user.tmd", USER_BROKEN);
    assert!(store.on_file_changed(&dir.file("user.tmd")).is_err());

    // Base is fine on its own, but User is still part of the batch.
    let base = dir.write("base.tmd", BASE);
    assert!(matches!(
        store.on_file_changed(&base),
        Err(StoreError::Resolution(_))
    ));
    assert_eq!(store.pending(), ["User", "Base"]);
    assert_eq!(batches.count(), 1);
}

#[test]
fn test_all_soft_errors_of_a_batch_are_reported() {
    let (dir, store, _) = loaded();
    dir.write(
        "user.tmd",
        "file User;\nuses Base;\nclass Utilisateur {\n    key field Id : DO_ID;\n    association Groupe;\n    field Statut : DO_NOPE;\n    alias Profil include [Code, Couleur];\n}\n",
    );

    let errors = match store.on_file_changed(&dir.file("user.tmd")) {
        Err(StoreError::Resolution(errors)) => errors,
        other => panic!("expected resolution errors, got {other:?}"),
    };

    let kinds: Vec<_> = errors.iter().map(|e| e.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            ResolveErrorKind::UnknownClass {
                name: "Groupe".into()
            },
            ResolveErrorKind::UnknownDomain {
                name: "DO_NOPE".into()
            },
            ResolveErrorKind::UnknownAliasedProperty {
                class: "Profil".into(),
                property: "Couleur".into()
            },
        ]
    );
}

// =============================================================================
// FATAL ERRORS
// =============================================================================

const COMPOSITE_KEY: &str = r#"file Link;
uses Base;
class ProfilDroit {
    key field ProfilId : DO_ID;
    key field DroitId : DO_ID;
}
"#;

#[rstest]
#[case(false, false)]
#[case(true, true)]
fn test_composite_primary_key(#[case] allowed: bool, #[case] commits: bool) {
    let dir = ModelDir::standard();
    dir.write("link.tmd", COMPOSITE_KEY);
    let config = ModelConfig {
        allow_composite_primary_key: allowed,
        ..dir.config()
    };
    let store = ModelStore::new(config);

    let result = store.load_all(dir.path());

    if commits {
        assert_eq!(result.unwrap().files().len(), 5);
    } else {
        match result {
            Err(StoreError::MultiplePrimaryKeys { file, class, keys }) => {
                assert_eq!(file, "Link");
                assert_eq!(class, "ProfilDroit");
                assert_eq!(keys, ["ProfilId", "DroitId"]);
            }
            other => panic!("expected a primary key violation, got {other:?}"),
        }
        assert_eq!(store.model().file_count(), 0);
    }
}

#[test]
fn test_primary_key_violation_stops_the_batch() {
    let (dir, store, batches) = loaded();
    let link = dir.write("link.tmd", COMPOSITE_KEY);
    let zeta = dir.write(
        "zeta.tmd",
        "file Zeta;\nuses Link;\nclass Z {\n    field X : DO_NOPE;\n}\n",
    );
    assert!(store.load_file(&link));
    assert!(store.load_file(&zeta));

    // Zeta would only report a soft error; the fatal one comes first and ends the batch.
    match store.apply_updates() {
        Err(StoreError::MultiplePrimaryKeys { file, class, .. }) => {
            assert_eq!(file, "Link");
            assert_eq!(class, "ProfilDroit");
        }
        other => panic!("expected a primary key violation, got {other:?}"),
    }

    assert_eq!(store.pending(), ["Link", "Zeta"]);
    assert_eq!(batches.count(), 1);
    let model = store.model();
    assert_eq!(model.file_count(), 4);
    assert!(model.file("Link").is_none());
    assert!(model.file("Zeta").is_none());
    drop(model);
    assert_eq!(class_properties(&store, "Utilisateur"), vec!["Id", "ProfilId"]);
}

#[test]
fn test_missing_dependency_is_fatal() {
    let (dir, store, batches) = loaded();
    let path = dir.write("user.tmd", "file User;\nuses Base, Ghost;\n");

    match store.on_file_changed(&path) {
        Err(StoreError::MissingDependency {
            path: reported,
            dependency,
            ..
        }) => {
            assert_eq!(reported, path);
            assert_eq!(dependency, "Ghost");
        }
        other => panic!("expected a missing dependency, got {other:?}"),
    }
    assert_eq!(store.pending(), ["User"]);
    assert_eq!(batches.count(), 1);
}

#[test]
fn test_dependency_cycle_is_fatal() {
    let dir = ModelDir::new();
    dir.write("a.tmd", "file A;\nuses B;\n");
    dir.write("b.tmd", "file B;\nuses C;\n");
    dir.write("c.tmd", "file C;\nuses A;\n");
    let store = dir.store();

    match store.load_all(dir.path()) {
        Err(StoreError::CyclicDependency { cycle }) => {
            assert_eq!(cycle, ["A", "B", "C", "A"]);
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
    assert_eq!(store.pending().len(), 3);
}

// =============================================================================
// PARSE FAILURES
// =============================================================================

#[test]
fn test_parse_failure_keeps_previous_version() {
    let (dir, store, batches) = loaded();
    let path = dir.write("base.tmd", "file Base;\nclass Profil {\n    key field Id DO_ID;\n}\n");

    assert_eq!(store.on_file_changed(&path).unwrap(), ApplyOutcome::Unchanged);

    let parsed = store.parsed_file("Base").unwrap();
    assert_eq!(parsed.classes[0].properties.len(), 2);
    assert!(store.pending().is_empty());
    assert_eq!(batches.count(), 1);
}

#[test]
fn test_unreadable_path_is_not_loaded() {
    let (dir, store, _) = loaded();
    assert!(!store.load_file(&dir.file("missing.tmd")));
    assert!(store.pending().is_empty());
}
