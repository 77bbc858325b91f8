//! `build` command: run the pipeline and summarize what was written.

use anyhow::{Context, Result};
use std::io::{IsTerminal, stderr};

use crate::config::PipelineConfig;
use crate::core::{BuildEnvironment, CancelToken};
use crate::log;
use crate::pipeline::{BuildReport, BundleReport, Pipeline};
use crate::utils::plural::plural_count;

/// Build every configured bundle for `env`.
pub fn build_bundles(
    config: PipelineConfig,
    env: BuildEnvironment,
    cancel: &CancelToken,
) -> Result<BuildReport> {
    log!("build"; "building for {}", env);

    let pipeline = Pipeline::from_config(config, env).with_progress(stderr().is_terminal());
    let report = pipeline.run(cancel).context("build failed")?;

    for bundle in &report.bundles {
        log!("build"; "{}", summary(pipeline.config(), bundle));
    }
    Ok(report)
}

fn summary(config: &PipelineConfig, bundle: &BundleReport) -> String {
    format!(
        "{} ({}, {}, {} bytes, {})",
        config.display_path(&bundle.path),
        plural_count(bundle.scripts, "script"),
        plural_count(bundle.templates, "template"),
        bundle.bytes,
        bundle.fingerprint
    )
}
