//! Turning a path into a [`ParsedFile`].

use std::path::Path;

use crate::base::constants::MODEL_FILE_EXTENSION;
use crate::error::ParseError;
use crate::parser;
use crate::syntax::ParsedFile;

/// Reads one model file into its structural form.
///
/// The store only depends on this trait, so another model language can be
/// plugged in without touching resolution.
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<ParsedFile, ParseError>;

    /// Extension of the files this loader understands, without the dot.
    fn extension(&self) -> &str;
}

/// Loader for the `.tmd` model language.
#[derive(Clone, Debug)]
pub struct DslLoader {
    extension: String,
}

impl DslLoader {
    pub fn new() -> Self {
        Self::with_extension(MODEL_FILE_EXTENSION)
    }

    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Default for DslLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLoader for DslLoader {
    fn load(&self, path: &Path) -> Result<ParsedFile, ParseError> {
        load_file(path)
    }

    fn extension(&self) -> &str {
        &self.extension
    }
}

/// Read and parse a model file. Any syntax error fails the whole file.
pub fn load_file(path: &Path) -> Result<ParsedFile, ParseError> {
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parse = parser::parse(&source, path);
    if parse.ok() {
        Ok(parse.file)
    } else {
        Err(ParseError::Syntax {
            path: path.to_path_buf(),
            errors: parse.errors,
        })
    }
}
