//! Source file classification.

use std::path::Path;

/// Kind of source file, determines which stages run over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Script file (.js) - directive stripping + inline template rewriting
    Script,
    /// Template file (.hbs, .handlebars) - compiled into a registration
    Template,
    /// Anything else - not part of a bundle
    Opaque,
}

/// Script extensions. Scripts are always plain JavaScript.
pub const SCRIPT_EXTENSIONS: &[&str] = &["js"];

impl SourceKind {
    /// Detect source kind from file extension.
    ///
    /// `template_exts` comes from `[templates] extensions` in config.
    pub fn from_extension<S: AsRef<str>>(ext: &str, template_exts: &[S]) -> Self {
        let ext = ext.to_ascii_lowercase();
        if SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
            Self::Script
        } else if template_exts.iter().any(|t| t.as_ref().eq_ignore_ascii_case(&ext)) {
            Self::Template
        } else {
            Self::Opaque
        }
    }

    /// Detect source kind from file path.
    pub fn from_path<S: AsRef<str>>(path: &Path, template_exts: &[S]) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Self::Opaque, |ext| Self::from_extension(ext, template_exts))
    }

    /// Display name for this source kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Template => "template",
            Self::Opaque => "opaque",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const EXTS: &[&str] = &["hbs", "handlebars"];

    #[test]
    fn test_from_extension() {
        assert_eq!(SourceKind::from_extension("js", EXTS), SourceKind::Script);
        assert_eq!(SourceKind::from_extension("JS", EXTS), SourceKind::Script);
        assert_eq!(SourceKind::from_extension("hbs", EXTS), SourceKind::Template);
        assert_eq!(
            SourceKind::from_extension("handlebars", EXTS),
            SourceKind::Template
        );
        assert_eq!(SourceKind::from_extension("css", EXTS), SourceKind::Opaque);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            SourceKind::from_path(&PathBuf::from("app/javascripts/view.js"), EXTS),
            SourceKind::Script
        );
        assert_eq!(
            SourceKind::from_path(&PathBuf::from("app/templates/home.hbs"), EXTS),
            SourceKind::Template
        );
        assert_eq!(
            SourceKind::from_path(&PathBuf::from("README"), EXTS),
            SourceKind::Opaque
        );
    }

    #[test]
    fn test_custom_template_extensions() {
        let exts = ["mustache"];
        assert_eq!(
            SourceKind::from_path(&PathBuf::from("a/b.mustache"), &exts),
            SourceKind::Template
        );
        assert_eq!(
            SourceKind::from_path(&PathBuf::from("a/b.hbs"), &exts),
            SourceKind::Opaque
        );
    }
}
