//! `[[bundle]]` section configuration.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::config::{ConfigDiagnostics, FieldPath};

/// One output bundle and the source roots it concatenates.
///
/// Scripts from every root come first in root order, then template
/// registrations in root order.
///
/// # Example
///
/// ```toml
/// [[bundle]]
/// name = "application.js"
/// scripts = ["vendor/javascripts", "app/javascripts"]
/// templates = ["app/templates"]
/// exclude = ["vendor/javascripts/ember-template-compiler.js"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Output file name, relative to the output root.
    pub name: String,
    #[serde(default)]
    pub scripts: Vec<PathBuf>,
    #[serde(default)]
    pub templates: Vec<PathBuf>,
    /// Files or directories left out of the bundle.
    #[serde(default)]
    pub exclude: Vec<PathBuf>,
}

impl BundleConfig {
    /// The conventional single application bundle.
    ///
    /// The vendored template compiler is excluded: it is a build-time tool
    /// and never shipped to the client.
    pub fn application() -> Self {
        Self {
            name: "application.js".into(),
            scripts: vec!["vendor/javascripts".into(), "app/javascripts".into()],
            templates: vec!["app/templates".into()],
            exclude: vec!["vendor/javascripts/ember-template-compiler.js".into()],
        }
    }

    /// Whether `path` is excluded (exact match or inside an excluded directory).
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|ex| path.starts_with(ex))
    }

    /// Resolve every source path against the project root.
    pub(crate) fn normalize(&mut self, root: &Path) {
        let resolve = |paths: &mut Vec<PathBuf>| {
            for path in paths.iter_mut() {
                *path = crate::config::resolve_config_path(path, root);
            }
        };
        resolve(&mut self.scripts);
        resolve(&mut self.templates);
        resolve(&mut self.exclude);
    }

    pub fn validate_all(bundles: &[Self], diag: &mut ConfigDiagnostics) {
        if bundles.is_empty() {
            diag.error_with_hint(
                FieldPath::new("bundle"),
                "at least one bundle is required",
                "add a [[bundle]] table with a name and source roots",
            );
        }

        for (i, bundle) in bundles.iter().enumerate() {
            let field = FieldPath::indexed("bundle", i, "name");
            let name = Path::new(&bundle.name);

            if bundle.name.trim().is_empty() {
                diag.error(field, "bundle name must not be empty");
                continue;
            }
            if name.is_absolute()
                || name
                    .components()
                    .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
            {
                diag.error_with_hint(
                    field.clone(),
                    format!("bundle name `{}` escapes the output directory", bundle.name),
                    "use a path relative to [build] output",
                );
            }
            if bundles[..i].iter().any(|b| b.name == bundle.name) {
                diag.error(field, format!("bundle `{}` is declared more than once", bundle.name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    #[test]
    fn test_default_is_application_bundle() {
        let config = PipelineConfig::from_str("").unwrap();
        assert_eq!(config.bundle, vec![BundleConfig::application()]);
    }

    #[test]
    fn test_parse_bundles() {
        let config = PipelineConfig::from_str(
            r#"
[[bundle]]
name = "app.js"
scripts = ["js"]

[[bundle]]
name = "admin/admin.js"
templates = ["admin/templates"]
"#,
        )
        .unwrap();
        assert_eq!(config.bundle.len(), 2);
        assert_eq!(config.bundle[0].scripts, vec![PathBuf::from("js")]);
        assert!(config.bundle[0].templates.is_empty());
        assert_eq!(config.bundle[1].name, "admin/admin.js");
    }

    #[test]
    fn test_is_excluded() {
        let bundle = BundleConfig::application();
        assert!(bundle.is_excluded(Path::new(
            "vendor/javascripts/ember-template-compiler.js"
        )));
        assert!(!bundle.is_excluded(Path::new("vendor/javascripts/ember.js")));

        let dir = BundleConfig {
            exclude: vec!["vendor/javascripts/tests".into()],
            ..BundleConfig::application()
        };
        assert!(dir.is_excluded(Path::new("vendor/javascripts/tests/qunit.js")));
    }

    #[test]
    fn test_validate_names() {
        let mut a = BundleConfig::application();
        let b = BundleConfig::application();
        let mut c = BundleConfig::application();
        a.name = "../escape.js".into();
        c.name = " ".into();

        let mut diag = ConfigDiagnostics::new();
        BundleConfig::validate_all(&[a, b.clone(), b, c], &mut diag);

        let messages: Vec<_> = diag.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].contains("escapes"));
        assert!(messages[1].contains("more than once"));
        assert!(messages[2].contains("empty"));
    }

    #[test]
    fn test_validate_empty_list() {
        let mut diag = ConfigDiagnostics::new();
        BundleConfig::validate_all(&[], &mut diag);
        assert_eq!(diag.errors()[0].field.as_str(), "bundle");
    }
}
