//! `[build]` section configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Build settings.
///
/// # Example
///
/// ```toml
/// [build]
/// env = "production"
/// output = "public/assets"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default environment when neither `--env` nor `BUNDLEWRIGHT_ENV` is set.
    ///
    /// Kept as text so an invalid value surfaces as an environment error
    /// during resolution rather than a TOML error.
    pub env: Option<String>,

    /// Output root for written bundles.
    pub output: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            env: None,
            output: "site".into(),
        }
    }
}
