//! Per-kind stage lists.
//!
//! | Kind     | development / test      | production                         |
//! |----------|-------------------------|------------------------------------|
//! | Script   | (none)                  | `StripDirectives`, `RewriteInline` |
//! | Template | `CompileTemplate(Runtime)` | `CompileTemplate(Precompiled)`  |
//!
//! Directives are stripped before inline rewriting so compile calls inside a
//! removed directive are never precompiled.

use std::fmt;

use crate::core::{BuildEnvironment, DirectivePolicy, SourceKind, TemplateMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    StripDirectives,
    RewriteInline,
    CompileTemplate(TemplateMode),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StripDirectives => f.write_str("strip-directives"),
            Self::RewriteInline => f.write_str("rewrite-inline"),
            Self::CompileTemplate(mode) => write!(f, "compile-template({})", mode.as_str()),
        }
    }
}

/// Ordered stages applied to a file of `kind` under `env`.
pub fn stages_for(env: BuildEnvironment, kind: SourceKind) -> Vec<Stage> {
    match kind {
        SourceKind::Script => {
            let mut stages = Vec::with_capacity(2);
            if env.directive_policy() == DirectivePolicy::Strip {
                stages.push(Stage::StripDirectives);
            }
            if env.template_mode() == TemplateMode::Precompiled {
                stages.push(Stage::RewriteInline);
            }
            stages
        }
        SourceKind::Template => vec![Stage::CompileTemplate(env.template_mode())],
        SourceKind::Opaque => Vec::new(),
    }
}
