//! Foundation types for the model store.
//!
//! This module provides the primitives used throughout the crate:
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineIndex`] - Offset to line/column conversion
//! - [`Position`], [`Span`] - Line/column positions for declarations and references
//! - Domain constants (file extension, debounce window)
//!
//! This module has NO dependencies on other modules of the crate.

pub mod constants;
mod position;
mod span;

pub use position::{Position, Span};
pub use span::{LineIndex, TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
