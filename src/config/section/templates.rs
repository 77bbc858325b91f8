//! `[templates]` section configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::{BuildEnvironment, TemplateMode};
use crate::log;

/// Which precompiler turns template text into its executable form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecompilerKind {
    /// The project's vendored template compiler, run with node.
    #[default]
    Vendored,
    /// In-process compiler whose output needs its own helper runtime.
    Builtin,
    /// External command reading the template on stdin.
    Command,
}

/// Template file settings.
///
/// # Example
///
/// ```toml
/// [templates]
/// extensions = ["hbs"]
/// precompiler = "vendored"
/// compiler = "vendor/javascripts/ember-template-compiler.js"
/// node = "node"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// File extensions (without dot) treated as templates.
    pub extensions: Vec<String>,
    pub precompiler: PrecompilerKind,
    /// Template compiler script for `precompiler = "vendored"`.
    pub compiler: PathBuf,
    /// JavaScript runtime for `precompiler = "vendored"`.
    pub node: String,
    /// Program and arguments for `precompiler = "command"`.
    pub command: Vec<String>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["hbs".into(), "handlebars".into()],
            precompiler: PrecompilerKind::Vendored,
            compiler: "vendor/javascripts/ember-template-compiler.js".into(),
            node: "node".into(),
            command: Vec::new(),
        }
    }
}

impl TemplatesConfig {
    pub(crate) fn normalize(&mut self, root: &Path) {
        self.compiler = crate::config::resolve_config_path(&self.compiler, root);
    }

    /// Check that the precompiler can run when `env` precompiles templates.
    ///
    /// Runtime-mode environments never invoke it, so a missing compiler is
    /// only an error for production.
    pub fn validate_for(&self, env: BuildEnvironment, root: &Path, diag: &mut ConfigDiagnostics) {
        if env.template_mode() != TemplateMode::Precompiled {
            return;
        }
        match self.precompiler {
            PrecompilerKind::Vendored => {
                if !self.compiler.is_file() {
                    diag.error_with_hint(
                        FieldPath::new("templates.compiler"),
                        format!("template compiler `{}` not found", self.compiler.display()),
                        "vendor ember-template-compiler.js or set `templates.compiler`",
                    );
                }
                if !program_exists(&self.node, root) {
                    diag.error_with_hint(
                        FieldPath::new("templates.node"),
                        format!("`{}` not found", self.node),
                        "install node or set `templates.node`",
                    );
                }
            }
            PrecompilerKind::Builtin => {
                log!(
                    "warning";
                    "precompiler = \"builtin\" emits specs the framework runtime cannot execute"
                );
            }
            PrecompilerKind::Command => {}
        }
    }

    pub fn validate(&self, root: &Path, diag: &mut ConfigDiagnostics) {
        if self.extensions.is_empty() {
            diag.error(
                FieldPath::new("templates.extensions"),
                "at least one template extension is required",
            );
        }
        for ext in &self.extensions {
            if ext.is_empty() || ext.contains('.') {
                diag.error_with_hint(
                    FieldPath::new("templates.extensions"),
                    format!("invalid extension `{ext}`"),
                    "write extensions without a leading dot, e.g. \"hbs\"",
                );
            }
        }

        if self.precompiler != PrecompilerKind::Command {
            return;
        }

        let Some(program) = self.command.first() else {
            diag.error_with_hint(
                FieldPath::new("templates.command"),
                "`precompiler = \"command\"` requires a command",
                "e.g. command = [\"node\", \"vendor/precompile.js\"]",
            );
            return;
        };

        if !program_exists(program, root) {
            diag.error_with_hint(
                FieldPath::new("templates.command"),
                format!("`{program}` not found"),
                "install it or use an absolute or project-relative path",
            );
        }
    }
}

/// Whether `program` resolves on PATH or relative to the project root.
fn program_exists(program: &str, root: &Path) -> bool {
    if which::which(program).is_ok() {
        return true;
    }
    let path = Path::new(program);
    path.components().count() > 1 && root.join(path).is_file()
}
