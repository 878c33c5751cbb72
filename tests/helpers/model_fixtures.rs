//! A temporary model directory with the files most store tests start from.

use std::fs;
use std::path::{Path, PathBuf};

use model_store::{ModelConfig, ModelStore};
use tempfile::TempDir;

pub const COMMON: &str = r#"file Common;
domain DO_ID { label "Identifiant"; }
domain DO_CODE { length 10; }
domain DO_LABEL {}
"#;

pub const BASE: &str = r#"file Base;
uses Common;
reference class Profil {
    key field Id : DO_ID;
    field Code : DO_CODE;
}
"#;

pub const USER: &str = r#"file User;
uses Base, Common;
class Utilisateur {
    key field Id : DO_ID;
    association Profil;
}
"#;

pub const API: &str = r#"file Api;
uses User;
endpoint GetUtilisateur {
    method GET;
    param alias Utilisateur;
}
"#;

pub struct ModelDir {
    dir: TempDir,
}

impl ModelDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Common, Base, User and Api, one file each.
    pub fn standard() -> Self {
        let dir = Self::new();
        dir.write("common.tmd", COMMON);
        dir.write("base.tmd", BASE);
        dir.write("user.tmd", USER);
        dir.write("api.tmd", API);
        dir
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.file(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn config(&self) -> ModelConfig {
        ModelConfig::new(self.path())
    }

    pub fn store(&self) -> ModelStore {
        ModelStore::new(self.config())
    }
}
