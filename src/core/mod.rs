//! Core types - pure abstractions shared across the codebase.

mod category;
mod env;
mod error;
mod state;

pub use category::SourceKind;
pub use env::{BuildEnvironment, DirectivePolicy, TemplateMode};
pub use error::BuildError;
pub use state::{CancelToken, setup_shutdown_handler};
