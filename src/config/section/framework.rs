//! `[framework]` section configuration.
//!
//! Describes the client framework's global namespace: where the template
//! registry lives, what the template engine sub-namespace is called, and
//! which identifiers are aliases for the namespace in application code.

use serde::{Deserialize, Serialize};

use crate::config::util::is_js_identifier;
use crate::config::{ConfigDiagnostics, FieldPath};

/// Framework namespace settings.
///
/// # Example
///
/// ```toml
/// [framework]
/// root = "Ember"
/// engine = "Handlebars"
/// aliases = [
///   { alias = "Ember", canonical = "Ember" },
///   { alias = "Em", canonical = "Ember" },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Namespace owning the `TEMPLATES` registry.
    pub root: String,
    /// Template engine sub-namespace (`<ns>.<engine>.compile`).
    pub engine: String,
    /// Identifiers recognized as the framework namespace.
    pub aliases: Vec<NamespaceAlias>,
}

/// An identifier that refers to a framework namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceAlias {
    pub alias: String,
    pub canonical: String,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self::with_aliases("Ember", "Handlebars", &[("Ember", "Ember"), ("Em", "Ember")])
    }
}

impl FrameworkConfig {
    pub fn with_aliases(root: &str, engine: &str, aliases: &[(&str, &str)]) -> Self {
        Self {
            root: root.to_string(),
            engine: engine.to_string(),
            aliases: aliases
                .iter()
                .map(|(alias, canonical)| NamespaceAlias {
                    alias: (*alias).to_string(),
                    canonical: (*canonical).to_string(),
                })
                .collect(),
        }
    }

    #[inline]
    pub fn is_alias(&self, name: &str) -> bool {
        self.canonical_of(name).is_some()
    }

    /// Canonical namespace for an alias.
    pub fn canonical_of(&self, name: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|a| a.alias == name)
            .map(|a| a.canonical.as_str())
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, value) in [("framework.root", &self.root), ("framework.engine", &self.engine)] {
            if !is_js_identifier(value) {
                diag.error(
                    FieldPath::new(field),
                    format!("`{value}` is not a JavaScript identifier"),
                );
            }
        }

        if self.aliases.is_empty() {
            diag.error_with_hint(
                FieldPath::new("framework.aliases"),
                "at least one namespace alias is required",
                format!("add {{ alias = \"{0}\", canonical = \"{0}\" }}", self.root),
            );
        }

        for (i, entry) in self.aliases.iter().enumerate() {
            for (field, value) in [("alias", &entry.alias), ("canonical", &entry.canonical)] {
                if !is_js_identifier(value) {
                    diag.error(
                        FieldPath::indexed("framework.aliases", i, field),
                        format!("`{value}` is not a JavaScript identifier"),
                    );
                }
            }
            if self.aliases[..i].iter().any(|a| a.alias == entry.alias) {
                diag.error(
                    FieldPath::indexed("framework.aliases", i, "alias"),
                    format!("alias `{}` is declared more than once", entry.alias),
                );
            }
        }
    }
}
