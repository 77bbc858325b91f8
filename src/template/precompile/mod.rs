//! Template precompilers.
//!
//! A precompiler turns template text into a serialized, directly executable
//! representation. It is a pure function from the pipeline's point of view.
//!
//! | Kind       | Implementation          | Notes                                  |
//! |------------|-------------------------|----------------------------------------|
//! | `vendored` | [`VendoredPrecompiler`] | project's template compiler under node |
//! | `builtin`  | [`BuiltinPrecompiler`]  | in-process, offline and tests only     |
//! | `command`  | [`CommandPrecompiler`]  | external program, stdin→stdout         |
//!
//! Only `vendored` (or a `command` driving the same compiler) produces specs
//! that `<engine>.template(...)` can run.

mod builtin;
mod command;
mod vendored;

pub use builtin::BuiltinPrecompiler;
pub use command::CommandPrecompiler;
pub use vendored::VendoredPrecompiler;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{PrecompilerKind, TemplatesConfig};

/// The template language failed to parse, or the precompiler could not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PrecompileError {
    pub message: String,
}

impl PrecompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Template source → executable representation.
pub trait Precompile: Send + Sync {
    fn precompile(&self, source: &str) -> Result<String, PrecompileError>;

    /// Short name for log output.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Build the precompiler selected by `[templates]`.
pub fn from_config(templates: &TemplatesConfig, root: &Path) -> Arc<dyn Precompile> {
    match templates.precompiler {
        PrecompilerKind::Vendored => Arc::new(VendoredPrecompiler::new(
            &templates.node,
            &templates.compiler,
            root,
        )),
        PrecompilerKind::Builtin => Arc::new(BuiltinPrecompiler),
        PrecompilerKind::Command => Arc::new(CommandPrecompiler::new(&templates.command, root)),
    }
}
