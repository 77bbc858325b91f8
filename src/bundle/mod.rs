//! Bundle assembly and output.
//!
//! A bundle is the transformed scripts in discovery order followed by one
//! registration statement per template:
//!
//! ```text
//! <script 1>
//! <script 2>
//! Ember.TEMPLATES['home']=Ember.Handlebars.compile("Hello {{name}}!");
//! Ember.TEMPLATES['posts.show']=Ember.Handlebars.compile("...");
//! ```
//!
//! Assembly happens fully in memory. Writing goes through a temporary file in
//! the destination directory that is renamed over the target, so readers
//! never observe a partially written bundle.

use rustc_hash::FxHashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::FrameworkConfig;
use crate::core::BuildError;
use crate::template::TemplateRegistration;

/// An assembled bundle, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub name: String,
    /// Destination path.
    pub path: PathBuf,
    pub text: String,
    pub scripts: usize,
    pub templates: usize,
}

/// Concatenate scripts and template registrations into bundle text.
///
/// Fails with `DuplicateTemplateName` when two templates derive the same name.
pub fn assemble<S: AsRef<str>>(
    name: &str,
    scripts: &[S],
    templates: &[TemplateRegistration],
    framework: &FrameworkConfig,
) -> Result<String, BuildError> {
    check_unique_names(name, templates)?;

    let capacity = scripts.iter().map(|s| s.as_ref().len() + 1).sum::<usize>()
        + templates.iter().map(|t| t.body.len() + t.name.len() + 32).sum::<usize>();
    let mut out = String::with_capacity(capacity);

    for script in scripts {
        let script = script.as_ref();
        if script.is_empty() {
            continue;
        }
        out.push_str(script);
        if !script.ends_with('\n') {
            out.push('\n');
        }
    }

    for template in templates {
        out.push_str(&template.statement(&framework.root));
        out.push('\n');
    }

    Ok(out)
}

fn check_unique_names(bundle: &str, templates: &[TemplateRegistration]) -> Result<(), BuildError> {
    let mut seen: FxHashMap<&str, &Path> = FxHashMap::default();
    for template in templates {
        if let Some(first) = seen.insert(&template.name, &template.path) {
            return Err(BuildError::DuplicateTemplateName {
                bundle: bundle.to_string(),
                name: template.name.clone(),
                first: first.to_path_buf(),
                second: template.path.clone(),
            });
        }
    }
    Ok(())
}

/// Atomically write `bundle.text` to `bundle.path`, creating parent directories.
pub fn write_bundle(bundle: &Bundle) -> Result<(), BuildError> {
    let path = &bundle.path;
    let write_err = |source| BuildError::Write {
        path: path.clone(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bundle.text.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}
