//! # model-store
//!
//! Incremental loading and relationship resolution for multi-file models of
//! classes, domains and endpoints.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! store     → ModelStore: affected sets, sort, resolve, commit, watchers, watch mode
//!   ↓
//! project   → File discovery, ModelLoader / DslLoader
//!   ↓
//! model     → Arena of classes, domains, endpoints, properties; committed Model
//!   ↓
//! syntax    → ParsedFile: declarations with unresolved references
//!   ↓
//! parser    → Logos lexer, recursive-descent parser
//!   ↓
//! base      → Primitives (Span/Position, LineIndex, TextRange)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → model → project → store)
// ============================================================================

/// Foundation types: Span/Position, LineIndex, TextRange
pub mod base;

/// Parser: Logos lexer, recursive-descent parser
pub mod parser;

/// Syntax: ParsedFile and declaration types
pub mod syntax;

/// Resolved model: arena, handles, committed files
pub mod model;

/// Project: file discovery and loaders
pub mod project;

/// The incremental model store
pub mod store;

/// Store configuration
pub mod config;

/// Error types
pub mod error;

// Re-export foundation types
pub use base::{LineIndex, Position, Span, TextRange, TextSize};

pub use config::ModelConfig;
pub use error::{ConfigError, ErrorContext, ParseError, ResolveError, ResolveErrorKind, StoreError};
pub use model::{Model, ModelFile};
pub use project::{DslLoader, ModelLoader};
pub use store::{ApplyOutcome, Debouncer, ModelStore, ModelWatcher, WatchHandle};
