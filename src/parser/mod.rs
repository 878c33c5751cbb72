//! Recursive-descent parser for `.tmd` model files
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with TokenKind and TextRange
//!     ↓
//! Parser → ParsedFile (references still unresolved)
//!     ↓
//! Model store → instantiation + relationship resolution
//! ```
//!
//! Keywords are contextual: a keyword token is accepted wherever a name is
//! expected, so `field label : DO_LABEL;` parses.

#[allow(clippy::module_inception)]
mod parser;

mod lexer;

pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::{Parse, SyntaxError, parse};

/// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
