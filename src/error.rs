//! Error types for loading and resolving models.

use std::fmt;
use std::path::PathBuf;

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::Span;
use crate::parser::SyntaxError;

/// Errors raised while loading a single model file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The file could not be read.
    #[error("{}: cannot read file: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file has one or more syntax errors.
    #[error("{}: {} syntax error(s): {}", .path.display(), .errors.len(), join(.errors))]
    Syntax {
        path: PathBuf,
        errors: Vec<SyntaxError>,
    },
}

impl ParseError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ParseError::Io { path, .. } | ParseError::Syntax { path, .. } => path,
        }
    }
}

fn join(errors: &[SyntaxError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Where a resolution error happened: `file/owner/member`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub file: SmolStr,
    pub owner: Option<SmolStr>,
    pub member: Option<SmolStr>,
}

impl ErrorContext {
    pub fn file(file: impl Into<SmolStr>) -> Self {
        Self {
            file: file.into(),
            owner: None,
            member: None,
        }
    }

    pub fn owner(mut self, owner: impl Into<SmolStr>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn member(mut self, member: impl Into<SmolStr>) -> Self {
        self.member = Some(member.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(owner) = &self.owner {
            write!(f, "/{owner}")?;
        }
        if let Some(member) = &self.member {
            write!(f, "/{member}")?;
        }
        Ok(())
    }
}

/// What went wrong while resolving one relation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveErrorKind {
    #[error("class '{name}' not found in the file or its dependencies")]
    UnknownClass { name: SmolStr },

    #[error("domain '{name}' not found")]
    UnknownDomain { name: SmolStr },

    #[error("class '{class}' must have a primary key to be referenced by an association")]
    MissingPrimaryKey { class: SmolStr },

    #[error("property '{property}' not found on class '{class}'")]
    UnknownAliasedProperty { class: SmolStr, property: SmolStr },

    #[error("alias of class '{class}' cannot be expanded: its aliases form a cycle")]
    CircularAlias { class: SmolStr },

    #[error("file '{file}' not found in the dependencies of the file")]
    UnknownAliasFile { file: SmolStr },

    #[error("class '{class}' not found in file '{file}'")]
    UnknownAliasClass { file: SmolStr, class: SmolStr },

    #[error("endpoint '{endpoint}' not found in file '{file}'")]
    UnknownAliasEndpoint { file: SmolStr, endpoint: SmolStr },
}

/// A soft error collected while resolving a file.
///
/// Displays as `{path}[{line},{col}] - {message} ({file}/{owner}/{member})`,
/// the format editors pick up as a clickable location.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{}{span} - {kind} ({context})", .path.display())]
pub struct ResolveError {
    pub path: PathBuf,
    pub span: Span,
    pub kind: ResolveErrorKind,
    pub context: ErrorContext,
}

impl ResolveError {
    pub fn new(
        path: impl Into<PathBuf>,
        span: Span,
        kind: ResolveErrorKind,
        context: ErrorContext,
    ) -> Self {
        Self {
            path: path.into(),
            span,
            kind,
            context,
        }
    }
}

/// Errors that abort a whole apply.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A `uses` entry names a file that is not loaded.
    #[error("{}{span} - referenced file '{dependency}' not found", .path.display())]
    MissingDependency {
        path: PathBuf,
        span: Span,
        dependency: SmolStr,
    },

    /// The `uses` graph of the affected files has a cycle.
    #[error("cyclic file dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<SmolStr> },

    /// A class declares several primary keys and composite keys are disallowed.
    #[error(
        "class {class} of file {file} must have a single primary key ({} found)",
        .keys.join(", ")
    )]
    MultiplePrimaryKeys {
        file: SmolStr,
        class: SmolStr,
        keys: Vec<SmolStr>,
    },

    /// One or more relations could not be resolved.
    #[error("model resolution failed with {} error(s)", .0.len())]
    Resolution(Vec<ResolveError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl StoreError {
    /// Collected resolution errors, if this is a soft failure.
    pub fn resolution_errors(&self) -> &[ResolveError] {
        match self {
            StoreError::Resolution(errors) => errors,
            _ => &[],
        }
    }
}

/// Errors reading a [`ModelConfig`](crate::config::ModelConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}: cannot read config: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}
