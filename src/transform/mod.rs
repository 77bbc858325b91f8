//! Source-to-source script transforms.
//!
//! # Modules
//!
//! - `lexer`: String/comment/regex-aware JavaScript tokenizer
//! - `strip`: Removes debug directive calls (production)
//! - `inline`: Precompiles inline `<ns>.<engine>.compile('...')` calls (production)
//! - `literal`: Decodes quoted string literals
//! - `edit`: Byte-range edits and `TransformResult`
//!
//! Every transform is a pure function of its input text and the policy values
//! passed in; nothing here reads configuration or process state on its own.

mod edit;
pub mod inline;
pub mod lexer;
mod literal;
pub mod strip;

pub use edit::{Edit, TransformResult};
pub use inline::rewrite_inline_templates;
pub use strip::strip_directives;

use thiserror::Error;

use crate::template::PrecompileError;

/// Malformed script source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("unterminated {what} starting at byte {offset}")]
    Unterminated { what: &'static str, offset: usize },

    #[error("unbalanced parenthesis: `(` at byte {offset} is never closed")]
    Unbalanced { offset: usize },
}

impl ScanError {
    /// Byte offset into the scanned source.
    pub const fn offset(&self) -> usize {
        match self {
            Self::Unterminated { offset, .. } | Self::Unbalanced { offset } => *offset,
        }
    }
}

/// Failure of a script transform.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Template(#[from] PrecompileError),
}
