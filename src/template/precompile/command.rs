//! External command precompiler.
//!
//! Runs the configured command once per template, writing the template text
//! to stdin and taking stdout (trimmed) as the compiled representation. A
//! non-zero exit status is reported as a template syntax error carrying the
//! command's stderr.

use std::path::{Path, PathBuf};

use crate::debug;
use crate::utils::exec::{Cmd, strip_ansi};

use super::{Precompile, PrecompileError};

#[derive(Debug, Clone)]
pub struct CommandPrecompiler {
    command: Vec<String>,
    /// Working directory for the command (project root).
    cwd: PathBuf,
}

impl CommandPrecompiler {
    pub fn new(command: &[String], cwd: &Path) -> Self {
        Self {
            command: command.to_vec(),
            cwd: cwd.to_path_buf(),
        }
    }
}

impl Precompile for CommandPrecompiler {
    fn precompile(&self, source: &str) -> Result<String, PrecompileError> {
        if self.command.is_empty() {
            return Err(PrecompileError::new("no precompiler command configured"));
        }

        let output = Cmd::from_slice(&self.command)
            .cwd(&self.cwd)
            .stdin(source)
            .output()
            .map_err(|err| PrecompileError::new(format!("{err:#}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = strip_ansi(stderr.trim());
        if !output.status.success() {
            let message = match stderr.trim() {
                "" => format!("`{}` failed with {}", self.name(), output.status),
                text => text.to_string(),
            };
            return Err(PrecompileError::new(message));
        }

        if !stderr.is_empty() {
            debug!(self.name(); "{}", stderr);
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| {
            PrecompileError::new(format!("`{}` produced non-UTF-8 output", self.name()))
        })?;
        Ok(stdout.trim().to_string())
    }

    fn name(&self) -> &str {
        self.command.first().map_or("command", String::as_str)
    }
}
