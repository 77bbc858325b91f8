//! Source discovery.
//!
//! Walks the declared roots of a bundle, classifies files by extension and
//! reads them into memory. This is the only place the pipeline reads source
//! files; every later stage works on the returned text.
//!
//! Order is deterministic: roots in declared order, entries within a root
//! sorted by file name. Hidden files and `.DS_Store` are skipped, as are
//! paths listed in the bundle's `exclude`.

use jwalk::WalkDir;
use std::path::{Path, PathBuf};

use crate::config::BundleConfig;
use crate::core::{BuildError, SourceKind};
use crate::debug;
use crate::utils::path::display_relative;

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// A source file read during discovery. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to `root`, `/`-separated.
    pub logical: String,
    /// The declared root this file was found under.
    pub root: PathBuf,
    pub kind: SourceKind,
    pub text: String,
}

/// Files of one bundle, in bundle order.
#[derive(Debug, Default)]
pub struct BundleSources {
    pub scripts: Vec<SourceFile>,
    pub templates: Vec<SourceFile>,
}

impl BundleSources {
    pub fn len(&self) -> usize {
        self.scripts.len() + self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collect and read every script and template of `bundle`.
pub fn discover<S: AsRef<str>>(
    bundle: &BundleConfig,
    template_exts: &[S],
) -> Result<BundleSources, BuildError> {
    let scripts = discover_kind(bundle, &bundle.scripts, SourceKind::Script, template_exts)?;
    let templates =
        discover_kind(bundle, &bundle.templates, SourceKind::Template, template_exts)?;
    Ok(BundleSources { scripts, templates })
}

fn discover_kind<S: AsRef<str>>(
    bundle: &BundleConfig,
    roots: &[PathBuf],
    kind: SourceKind,
    template_exts: &[S],
) -> Result<Vec<SourceFile>, BuildError> {
    let mut files = Vec::new();
    for root in roots {
        if !root.exists() {
            debug!("discover"; "skipping missing {} root {}", kind.name(), root.display());
            continue;
        }

        for path in collect_all_files(root)? {
            if bundle.is_excluded(&path) {
                debug!("discover"; "excluded {}", path.display());
                continue;
            }
            let found = SourceKind::from_path(&path, template_exts);
            if found != kind {
                debug!("discover"; "ignoring {} ({} root)", path.display(), kind.name());
                continue;
            }
            files.push(read_source(&path, root, kind)?);
        }
    }
    Ok(files)
}

/// Collect all files under `dir` recursively, sorted by name.
///
/// A root that is itself a file yields just that file. Any entry that cannot
/// be walked (an unreadable subdirectory, say) fails the whole collection.
pub fn collect_all_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    if dir.is_file() {
        return Ok(vec![dir.to_path_buf()]);
    }

    let walk_error = |err: jwalk::Error, fallback: &Path| BuildError::Io {
        path: err.path().map_or_else(|| fallback.to_path_buf(), Path::to_path_buf),
        source: err.into(),
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort(true).skip_hidden(true) {
        let mut entry = entry.map_err(|err| walk_error(err, dir))?;
        // Directories that could not be listed carry their error
        if let Some(err) = entry.read_children_error.take() {
            return Err(walk_error(err, &entry.path()));
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_str().unwrap_or_default();
        if IGNORED_FILES.contains(&name) {
            continue;
        }
        files.push(entry.path());
    }
    Ok(files)
}

/// Read one file as UTF-8 text.
pub fn read_source(path: &Path, root: &Path, kind: SourceKind) -> Result<SourceFile, BuildError> {
    let text = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let logical_root = if root == path {
        root.parent().unwrap_or(root)
    } else {
        root
    };

    Ok(SourceFile {
        path: path.to_path_buf(),
        logical: display_relative(path, logical_root),
        root: logical_root.to_path_buf(),
        kind,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const EXTS: &[&str] = &["hbs", "handlebars"];

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn bundle(root: &Path) -> BundleConfig {
        let mut bundle = BundleConfig::application();
        bundle.normalize(root);
        bundle
    }

    #[test]
    fn test_discover_order_and_kinds() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "vendor/javascripts/jquery.js", "jq");
        write(root, "vendor/javascripts/ember.js", "em");
        write(root, "app/javascripts/app.js", "app");
        write(root, "app/javascripts/views/b.js", "b");
        write(root, "app/javascripts/style.css", "css");
        write(root, "app/templates/home.hbs", "Hello");
        write(root, "app/templates/posts/show.handlebars", "Post");

        let sources = discover(&bundle(root), EXTS).unwrap();

        let scripts: Vec<_> = sources.scripts.iter().map(|f| f.logical.as_str()).collect();
        assert_eq!(scripts, vec!["ember.js", "jquery.js", "app.js", "views/b.js"]);
        assert!(sources.scripts.iter().all(|f| f.kind == SourceKind::Script));

        let templates: Vec<_> = sources.templates.iter().map(|f| f.logical.as_str()).collect();
        assert_eq!(templates, vec!["home.hbs", "posts/show.handlebars"]);
        assert_eq!(sources.templates[0].text, "Hello");
        assert_eq!(sources.len(), 6);
    }

    #[test]
    fn test_vendored_compiler_excluded() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "vendor/javascripts/ember.js", "em");
        write(root, "vendor/javascripts/ember-template-compiler.js", "compiler");

        let sources = discover(&bundle(root), EXTS).unwrap();
        let names: Vec<_> = sources.scripts.iter().map(|f| f.logical.as_str()).collect();
        assert_eq!(names, vec!["ember.js"]);
    }

    #[test]
    fn test_hidden_and_ignored_files_skipped() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "app/javascripts/.DS_Store", "");
        write(root, "app/javascripts/.hidden.js", "x");
        write(root, "app/javascripts/.cache/c.js", "x");
        write(root, "app/javascripts/ok.js", "ok");

        let sources = discover(&bundle(root), EXTS).unwrap();
        assert_eq!(sources.scripts.len(), 1);
        assert_eq!(sources.scripts[0].logical, "ok.js");
    }

    #[test]
    fn test_missing_roots_are_skipped() {
        let dir = TempDir::new().unwrap();
        let sources = discover(&bundle(dir.path()), EXTS).unwrap();
        assert!(sources.is_empty());
    }

    #[test]
    fn test_file_root() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "lib/one.js", "1");
        let mut bundle = BundleConfig {
            name: "one.js".into(),
            scripts: vec!["lib/one.js".into()],
            templates: Vec::new(),
            exclude: Vec::new(),
        };
        bundle.normalize(dir.path());

        let sources = discover(&bundle, EXTS).unwrap();
        assert_eq!(sources.scripts[0].logical, "one.js");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/javascripts/ok.js", "ok");
        write(dir.path(), "app/javascripts/locked/hidden.js", "x");
        let locked = dir.path().join("app/javascripts/locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not restrict a privileged user
        let readable = fs::read_dir(&locked).is_ok();
        let result = discover(&bundle(dir.path()), EXTS);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        let err = result.unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }), "{err}");
    }

    #[test]
    fn test_non_utf8_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app/javascripts/bin.js");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = discover(&bundle(dir.path()), EXTS).unwrap_err();
        assert!(matches!(err, BuildError::Io { path: p, .. } if p == path));
    }
}
