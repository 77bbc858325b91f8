//! Template compilation.
//!
//! Turns template text into the body of a registration statement:
//!
//! | Mode          | Output                                          |
//! |---------------|-------------------------------------------------|
//! | `Runtime`     | `Ember.Handlebars.compile("<escaped source>")`  |
//! | `Precompiled` | `Ember.Handlebars.template(<precompiled>)`      |
//!
//! Runtime mode never calls the precompiler; the framework parses the
//! embedded source when the template is first rendered.

mod name;
pub mod precompile;

pub use name::{quote_name, template_name};
pub use precompile::{BuiltinPrecompiler, Precompile, PrecompileError};

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::FrameworkConfig;
use crate::core::TemplateMode;

/// Engine function that compiles template source at runtime.
pub const RUNTIME_FN: &str = "compile";
/// Engine function that wraps a precompiled template.
pub const PRECOMPILED_FN: &str = "template";

/// Encode `text` as a double-quoted JavaScript string literal.
pub(crate) fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}

/// Compiles template text for a given mode.
#[derive(Clone)]
pub struct TemplateCompiler {
    root: String,
    engine: String,
    precompiler: Arc<dyn Precompile>,
}

impl TemplateCompiler {
    pub fn new(framework: &FrameworkConfig, precompiler: Arc<dyn Precompile>) -> Self {
        Self {
            root: framework.root.clone(),
            engine: framework.engine.clone(),
            precompiler,
        }
    }

    /// Compiled body for `source` in `mode`.
    pub fn compile(&self, source: &str, mode: TemplateMode) -> Result<String, PrecompileError> {
        let (function, argument) = match mode {
            TemplateMode::Runtime => (RUNTIME_FN, js_string(source)),
            TemplateMode::Precompiled => (PRECOMPILED_FN, self.precompile(source)?),
        };
        Ok(format!("{}.{}.{function}({argument})", self.root, self.engine))
    }

    /// Raw precompiler output, without the wrapping call.
    pub fn precompile(&self, source: &str) -> Result<String, PrecompileError> {
        self.precompiler.precompile(source)
    }

    pub fn precompiler_name(&self) -> &str {
        self.precompiler.name()
    }
}

impl std::fmt::Debug for TemplateCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCompiler")
            .field("root", &self.root)
            .field("engine", &self.engine)
            .field("precompiler", &self.precompiler.name())
            .finish()
    }
}

/// A compiled standalone template, ready for assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRegistration {
    /// Name derived from the path (`posts/show.hbs` → `posts.show`).
    pub name: String,
    pub body: String,
    pub mode: TemplateMode,
    /// Source file, for duplicate-name reports.
    pub path: PathBuf,
}

impl TemplateRegistration {
    /// `<root>.TEMPLATES['<name>']=<body>;`
    pub fn statement(&self, root: &str) -> String {
        format!("{root}.TEMPLATES[{}]={};", quote_name(&self.name), self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts invocations so tests can assert the precompiler was not used.
    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl Precompile for Counting {
        fn precompile(&self, source: &str) -> Result<String, PrecompileError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(format!("[{source}]"))
        }
    }

    fn compiler() -> TemplateCompiler {
        TemplateCompiler::new(&FrameworkConfig::default(), Arc::new(BuiltinPrecompiler))
    }

    #[test]
    fn test_runtime_embeds_source_verbatim() {
        let out = compiler()
            .compile("Hello {{name}}!", TemplateMode::Runtime)
            .unwrap();
        assert_eq!(out, r#"Ember.Handlebars.compile("Hello {{name}}!")"#);
    }

    #[test]
    fn test_runtime_escapes_for_embedding() {
        let out = compiler()
            .compile("<p class=\"x\">\n\\ {{y}}</p>", TemplateMode::Runtime)
            .unwrap();
        assert_eq!(
            out,
            r#"Ember.Handlebars.compile("<p class=\"x\">\n\\ {{y}}</p>")"#
        );
    }

    #[test]
    fn test_runtime_never_invokes_precompiler() {
        let counting = Arc::new(Counting::default());
        let compiler = TemplateCompiler::new(&FrameworkConfig::default(), counting.clone());

        // Even malformed template text compiles in runtime mode
        compiler.compile("{{#if", TemplateMode::Runtime).unwrap();
        assert_eq!(counting.0.load(Ordering::SeqCst), 0);

        compiler.compile("ok", TemplateMode::Precompiled).unwrap();
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_precompiled_wraps_precompiler_output() {
        let compiler = compiler();
        let out = compiler
            .compile("Hello {{name}}!", TemplateMode::Precompiled)
            .unwrap();
        let direct = BuiltinPrecompiler.precompile("Hello {{name}}!").unwrap();
        assert_eq!(out, format!("Ember.Handlebars.template({direct})"));
    }

    #[test]
    fn test_precompiled_error() {
        let err = compiler()
            .compile("{{#each items}}", TemplateMode::Precompiled)
            .unwrap_err();
        assert!(err.message.contains("unclosed block"));
    }

    #[test]
    fn test_custom_framework_names() {
        let framework = FrameworkConfig::with_aliases("SC", "Tpl", &[("SC", "SC")]);
        let compiler = TemplateCompiler::new(&framework, Arc::new(BuiltinPrecompiler));
        assert_eq!(
            compiler.compile("x", TemplateMode::Runtime).unwrap(),
            r#"SC.Tpl.compile("x")"#
        );
    }

    #[test]
    fn test_registration_statement() {
        let registration = TemplateRegistration {
            name: "posts.show".into(),
            body: "B".into(),
            mode: TemplateMode::Runtime,
            path: PathBuf::from("posts/show.hbs"),
        };
        assert_eq!(
            registration.statement("Ember"),
            "Ember.TEMPLATES['posts.show']=B;"
        );
    }
}
