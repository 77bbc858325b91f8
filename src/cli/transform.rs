//! `transform` command: print one file as the pipeline would emit it.

use anyhow::{Context, Result};
use std::io::{Write, stdout};
use std::path::Path;

use crate::config::PipelineConfig;
use crate::core::BuildEnvironment;
use crate::debug;
use crate::pipeline::Pipeline;
use crate::utils::path::normalize_path;

/// Transform `file` for `env` and write the result to stdout.
pub fn transform_file(config: PipelineConfig, env: BuildEnvironment, file: &Path) -> Result<()> {
    let path = normalize_path(file);
    let pipeline = Pipeline::from_config(config, env);
    debug!("transform"; "{} with stages for {}", pipeline.config().display_path(&path), env);

    let output = pipeline
        .transform_file(&path)
        .with_context(|| format!("failed to transform {}", file.display()))?;

    let mut out = stdout().lock();
    out.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
