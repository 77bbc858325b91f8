//! Pipeline orchestration.
//!
//! One [`Pipeline`] drives one compile invocation for a fixed environment:
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────────┐   ┌────────────┐   ┌─────────┐
//! │ Discovering │ → │ Transforming (rayon)     │ → │ Assembling │ → │ Written │
//! │ read files  │   │ scripts: strip → inline  │   │ join, dups │   │ atomic  │
//! │             │   │ templates: compile       │   │            │   │ rename  │
//! └─────────────┘   └──────────────────────────┘   └────────────┘   └─────────┘
//! ```
//!
//! Every bundle is assembled in memory before the first one is written, so a
//! failure while discovering, transforming or assembling leaves the output
//! tree untouched. Writing replaces each bundle atomically, one at a time: if
//! a later write fails, earlier bundles have already been replaced.
//! Cancellation is honoured up to the start of Assembling.

mod phase;
mod stage;


pub use phase::{Phase, PhaseTracker};
pub use stage::{Stage, stages_for};

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bundle::{Bundle, assemble, write_bundle};
use crate::config::{BundleConfig, PipelineConfig};
use crate::core::{BuildEnvironment, BuildError, CancelToken, SourceKind};
use crate::debug;
use crate::logger::ProgressLine;
use crate::source::{self, BundleSources, SourceFile};
use crate::template::{
    Precompile, TemplateCompiler, TemplateRegistration, precompile, template_name,
};
use crate::transform::{TransformResult, rewrite_inline_templates, strip_directives};
use crate::utils::hash::fingerprint;

/// Outcome of a successful `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub env: BuildEnvironment,
    pub phase: Phase,
    pub bundles: Vec<BundleReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
    pub name: String,
    pub path: PathBuf,
    pub scripts: usize,
    pub templates: usize,
    pub bytes: usize,
    /// Content fingerprint, for comparing builds.
    pub fingerprint: String,
}

impl From<&Bundle> for BundleReport {
    fn from(bundle: &Bundle) -> Self {
        Self {
            name: bundle.name.clone(),
            path: bundle.path.clone(),
            scripts: bundle.scripts,
            templates: bundle.templates,
            bytes: bundle.text.len(),
            fingerprint: fingerprint(&bundle.text),
        }
    }
}

/// A compile invocation for one environment.
pub struct Pipeline {
    config: PipelineConfig,
    env: BuildEnvironment,
    compiler: TemplateCompiler,
    progress: bool,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        env: BuildEnvironment,
        precompiler: Arc<dyn Precompile>,
    ) -> Self {
        let compiler = TemplateCompiler::new(&config.framework, precompiler);
        debug!("pipeline"; "{} with {} precompiler", env, compiler.precompiler_name());
        Self {
            config,
            env,
            compiler,
            progress: false,
        }
    }

    /// Pipeline using the precompiler selected by `[templates]`.
    pub fn from_config(config: PipelineConfig, env: BuildEnvironment) -> Self {
        let precompiler = precompile::from_config(&config.templates, &config.root);
        Self::new(config, env, precompiler)
    }

    /// Show a progress line while transforming.
    pub fn with_progress(mut self, enable: bool) -> Self {
        self.progress = enable;
        self
    }

    pub const fn env(&self) -> BuildEnvironment {
        self.env
    }

    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ordered stages applied to a file of `kind`.
    pub fn stages(&self, kind: SourceKind) -> Vec<Stage> {
        stages_for(self.env, kind)
    }

    /// Discover, transform, assemble and write every bundle.
    pub fn run(&self, cancel: &CancelToken) -> Result<BuildReport, BuildError> {
        let mut tracker = PhaseTracker::new();
        let result = self.compile_tracked(cancel, &mut tracker).and_then(|bundles| {
            for bundle in &bundles {
                debug!("write"; "{} ({} bytes)", bundle.path.display(), bundle.text.len());
                write_bundle(bundle)?;
            }
            tracker.advance(Phase::Written);
            Ok(bundles)
        });

        match result {
            Ok(bundles) => Ok(BuildReport {
                env: self.env,
                phase: tracker.phase(),
                bundles: bundles.iter().map(BundleReport::from).collect(),
            }),
            Err(err) => {
                tracker.fail();
                Err(err)
            }
        }
    }

    /// Discover, transform and assemble every bundle without writing.
    pub fn compile(&self, cancel: &CancelToken) -> Result<Vec<Bundle>, BuildError> {
        let mut tracker = PhaseTracker::new();
        self.compile_tracked(cancel, &mut tracker).inspect_err(|_| tracker.fail())
    }

    fn compile_tracked(
        &self,
        cancel: &CancelToken,
        tracker: &mut PhaseTracker,
    ) -> Result<Vec<Bundle>, BuildError> {
        tracker.advance(Phase::Discovering);
        let mut discovered = Vec::with_capacity(self.config.bundle.len());
        for bundle in &self.config.bundle {
            check_cancel(cancel)?;
            let sources = source::discover(bundle, &self.config.templates.extensions)?;
            debug!(
                "discover";
                "{}: {} scripts, {} templates",
                bundle.name,
                sources.scripts.len(),
                sources.templates.len()
            );
            discovered.push((bundle, sources));
        }

        tracker.advance(Phase::Transforming);
        let progress = self.progress.then(|| {
            let (scripts, templates) = discovered.iter().fold((0, 0), |(s, t), (_, src)| {
                (s + src.scripts.len(), t + src.templates.len())
            });
            ProgressLine::new(&[("script", scripts), ("template", templates)])
        });

        let mut transformed = Vec::with_capacity(discovered.len());
        for (_, sources) in &discovered {
            transformed.push(self.transform_bundle(sources, cancel, progress.as_ref())?);
        }
        if let Some(progress) = progress {
            progress.finish();
        }

        // Last cancellation point
        check_cancel(cancel)?;
        tracker.advance(Phase::Assembling);

        discovered
            .iter()
            .zip(transformed)
            .map(|((bundle, _), (scripts, templates))| {
                self.assemble_bundle(bundle, &scripts, &templates)
            })
            .collect()
    }

    /// Transform every file of one bundle in parallel, preserving order.
    fn transform_bundle(
        &self,
        sources: &BundleSources,
        cancel: &CancelToken,
        progress: Option<&ProgressLine>,
    ) -> Result<(Vec<String>, Vec<TemplateRegistration>), BuildError> {
        let scripts = sources
            .scripts
            .par_iter()
            .map(|file| {
                check_cancel(cancel)?;
                let output = self.transform_script(&file.path, &file.text)?;
                if let Some(progress) = progress {
                    progress.inc("script");
                }
                Ok(output)
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let templates = sources
            .templates
            .par_iter()
            .map(|file| {
                check_cancel(cancel)?;
                let registration = self.compile_template(file)?;
                if let Some(progress) = progress {
                    progress.inc("template");
                }
                Ok(registration)
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        Ok((scripts, templates))
    }

    fn assemble_bundle(
        &self,
        bundle: &BundleConfig,
        scripts: &[String],
        templates: &[TemplateRegistration],
    ) -> Result<Bundle, BuildError> {
        let text = assemble(&bundle.name, scripts, templates, &self.config.framework)?;
        Ok(Bundle {
            name: bundle.name.clone(),
            path: self.config.bundle_path(bundle),
            text,
            scripts: scripts.len(),
            templates: templates.len(),
        })
    }

    /// Run the script stages over `text`.
    pub fn transform_script(&self, path: &Path, text: &str) -> Result<String, BuildError> {
        let framework = &self.config.framework;
        let mut current = text.to_string();

        for stage in self.stages(SourceKind::Script) {
            let result: TransformResult = match stage {
                Stage::StripDirectives => {
                    strip_directives(&current, self.env.directive_policy(), framework)
                }
                Stage::RewriteInline => rewrite_inline_templates(
                    &current,
                    self.env.template_mode(),
                    framework,
                    &self.compiler,
                ),
                Stage::CompileTemplate(_) => continue,
            }
            .map_err(|err| BuildError::from_transform(path, err))?;

            for offset in &result.skipped {
                debug!(
                    "inline";
                    "{}: left non-literal compile call at byte {} for runtime",
                    self.config.display_path(path),
                    offset
                );
            }
            if !result.edits.is_empty() {
                debug!(
                    "transform";
                    "{}: {} {} edit(s)",
                    self.config.display_path(path),
                    stage,
                    result.edits.len()
                );
            }
            current = result.output;
        }

        Ok(current)
    }

    /// Compile a template file into its registration.
    pub fn compile_template(&self, file: &SourceFile) -> Result<TemplateRegistration, BuildError> {
        let mode = self.env.template_mode();
        let body = self
            .compiler
            .compile(&file.text, mode)
            .map_err(|err| BuildError::from_precompile(&file.path, err))?;

        Ok(TemplateRegistration {
            name: template_name(&file.path, &file.root),
            body,
            mode,
            path: file.path.clone(),
        })
    }

    /// Transform a single file for inspection.
    ///
    /// Scripts yield their transformed text. Templates yield their
    /// registration statement, named relative to the template root that
    /// contains them (or their own directory).
    pub fn transform_file(&self, path: &Path) -> Result<String, BuildError> {
        let kind = SourceKind::from_path(path, &self.config.templates.extensions);
        match kind {
            SourceKind::Script => {
                let file = source::read_source(path, path, kind)?;
                self.transform_script(path, &file.text)
            }
            SourceKind::Template => {
                let root = self.template_root_of(path);
                let file = source::read_source(path, &root, kind)?;
                let registration = self.compile_template(&file)?;
                Ok(registration.statement(&self.config.framework.root))
            }
            SourceKind::Opaque => Err(BuildError::Unsupported {
                path: path.to_path_buf(),
            }),
        }
    }

    fn template_root_of(&self, path: &Path) -> PathBuf {
        self.config
            .bundle
            .iter()
            .flat_map(|b| &b.templates)
            .find(|root| path.starts_with(root) && path != root.as_path())
            .cloned()
            .or_else(|| path.parent().map(Path::to_path_buf))
            .unwrap_or_default()
    }
}

fn check_cancel(cancel: &CancelToken) -> Result<(), BuildError> {
    if cancel.is_cancelled() {
        Err(BuildError::Cancelled)
    } else {
        Ok(())
    }
}
