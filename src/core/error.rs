//! Build error taxonomy.
//!
//! Every variant is fatal for the whole invocation: the pipeline moves to
//! `Failed` and no bundle is written. Skipped inline calls with non-literal
//! arguments are not errors and never reach this type.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::template::PrecompileError;
use crate::transform::TransformError;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed script source (unbalanced directive call, unterminated literal).
    #[error("{}:{offset}: {message}", path.display())]
    Parse {
        path: PathBuf,
        offset: usize,
        message: String,
    },

    #[error("template syntax error in `{}`: {message}", path.display())]
    TemplateSyntax { path: PathBuf, message: String },

    #[error(
        "duplicate template name `{name}` in bundle `{bundle}`: `{}` and `{}`",
        first.display(),
        second.display()
    )]
    DuplicateTemplateName {
        bundle: String,
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to write bundle `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is neither a script nor a template", path.display())]
    Unsupported { path: PathBuf },

    #[error("build cancelled")]
    Cancelled,
}

impl BuildError {
    /// Attach a file path to a transform failure.
    pub fn from_transform(path: impl Into<PathBuf>, err: TransformError) -> Self {
        let path = path.into();
        match err {
            TransformError::Scan(scan) => Self::Parse {
                path,
                offset: scan.offset(),
                message: scan.to_string(),
            },
            TransformError::Template(err) => Self::from_precompile(path, err),
        }
    }

    /// Attach a file path to a precompiler failure.
    pub fn from_precompile(path: impl Into<PathBuf>, err: PrecompileError) -> Self {
        Self::TemplateSyntax {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
