//! Project configuration management for `bundlewright.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── bundle     # [[bundle]]
//! │   ├── framework  # [framework]
//! │   └── templates  # [templates]
//! ├── types/         # ConfigError, diagnostics, field paths
//! ├── util.rs        # Config file lookup, identifier checks
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! # Environment resolution
//!
//! | Priority | Source                    |
//! |----------|---------------------------|
//! | 1        | `--env` on the command line |
//! | 2        | `BUNDLEWRIGHT_ENV`        |
//! | 3        | `[build] env`             |
//! | 4        | `development`             |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{BuildConfig, BundleConfig, FrameworkConfig, PrecompilerKind, TemplatesConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::core::BuildEnvironment;
use crate::log;
use crate::utils::path::{display_relative, normalize_path, resolve_against};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "bundlewright.toml";

/// Environment variable consulted when `--env` is not given.
pub const ENV_VAR: &str = "BUNDLEWRIGHT_ENV";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `bundlewright.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub framework: FrameworkConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default = "default_bundles")]
    pub bundle: Vec<BundleConfig>,
}

fn default_bundles() -> Vec<BundleConfig> {
    vec![BundleConfig::application()]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            build: BuildConfig::default(),
            framework: FrameworkConfig::default(),
            templates: TemplatesConfig::default(),
            bundle: default_bundles(),
        }
    }
}

impl PipelineConfig {
    /// Locate and load the configuration.
    ///
    /// Searches upward from cwd for `config_name`. When no file exists the
    /// default layout rooted at cwd is used.
    pub fn load(config_name: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = find_config_file(config_name) {
            return Self::from_file(&path);
        }

        let cwd = std::env::current_dir().map_err(|err| ConfigError::Io(PathBuf::from("."), err))?;
        log!("hint"; "no {} found, using the default project layout", config_name.display());

        let config = Self {
            config_path: cwd.join(config_name),
            ..Self::default()
        };
        config.finalize(&cwd)
    }

    /// Load configuration from file path with unknown field detection.
    ///
    /// The project root is the config file's parent directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.config_path = normalize_path(path);
        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.finalize(&root)
    }

    /// Parse configuration from TOML string (no path normalization).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve paths against `root` and validate.
    pub fn finalize(mut self, root: &Path) -> Result<Self, ConfigError> {
        self.normalize_paths(root);
        self.validate()?;
        Ok(self)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Resolve the build environment for this invocation.
    ///
    /// Reads `BUNDLEWRIGHT_ENV` once; callers pass the result down explicitly.
    pub fn environment(&self, cli_env: Option<&str>) -> Result<BuildEnvironment, ConfigError> {
        let var = std::env::var(ENV_VAR).ok();
        resolve_environment(cli_env, var.as_deref(), self.build.env.as_deref())
    }

    /// Override the output root (CLI `--output`, relative to cwd).
    pub fn set_output(&mut self, output: &Path) {
        self.build.output = normalize_path(output);
    }

    /// Path relative to the project root, for messages.
    pub fn display_path(&self, path: &Path) -> String {
        display_relative(path, &self.root)
    }

    /// Output path of a bundle.
    pub fn bundle_path(&self, bundle: &BundleConfig) -> PathBuf {
        self.build.output.join(&bundle.name)
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    fn normalize_paths(&mut self, root: &Path) {
        self.root = normalize_path(root);
        self.build.output = resolve_config_path(&self.build.output, &self.root);
        self.templates.normalize(&self.root);
        for bundle in &mut self.bundle {
            bundle.normalize(&self.root);
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every section, collecting all errors before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.framework.validate(&mut diag);
        self.templates.validate(&self.root, &mut diag);
        BundleConfig::validate_all(&self.bundle, &mut diag);

        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    /// Validate what only matters for `env`, such as the precompiler.
    pub fn validate_for(&self, env: BuildEnvironment) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.templates.validate_for(env, &self.root, &mut diag);
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

/// Apply environment precedence: CLI, then environment variable, then config.
///
/// Blank values count as unset. Falls back to `development`.
pub fn resolve_environment(
    cli: Option<&str>,
    var: Option<&str>,
    configured: Option<&str>,
) -> Result<BuildEnvironment, ConfigError> {
    [cli, var, configured]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .map_or(Ok(BuildEnvironment::default()), str::parse)
}

/// Expand `~` and resolve a configured path against the project root.
pub(crate) fn resolve_config_path(path: &Path, root: &Path) -> PathBuf {
    let expanded = match path.to_str() {
        Some(text) => PathBuf::from(shellexpand::tilde(text).into_owned()),
        None => path.to_path_buf(),
    };
    resolve_against(&expanded, root)
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config and resolve it against `root`.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str, root: &Path) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {ignored:?}"
    );
    parsed.finalize(root).unwrap()
}

// ============================================================================
// tests
// ============================================================================
