//! Inline template-compile call rewriting.
//!
//! In production, a call such as
//!
//! ```text
//! template: Em.Handlebars.compile('Hello {{name}}')
//! ```
//!
//! is replaced by the precompiled form under the canonical namespace:
//!
//! ```text
//! template: Ember.Handlebars.template(<precompiled spec>)
//! ```
//!
//! Only calls whose sole argument is a plain quoted string are rewritten.
//! Anything else (template literals, concatenation, variables) is left for the
//! framework to compile at runtime, and its offset is reported in
//! [`TransformResult::skipped`].

use crate::config::FrameworkConfig;
use crate::core::TemplateMode;
use crate::template::{PRECOMPILED_FN, RUNTIME_FN, TemplateCompiler};

use super::lexer::{Token, TokenKind, matching_paren, tokenize};
use super::literal::decode_string_literal;
use super::strip::is_member_access;
use super::{Edit, TransformError, TransformResult};

/// Rewrite inline compile calls according to `mode`.
pub fn rewrite_inline_templates(
    source: &str,
    mode: TemplateMode,
    framework: &FrameworkConfig,
    compiler: &TemplateCompiler,
) -> Result<TransformResult, TransformError> {
    if mode == TemplateMode::Runtime {
        return Ok(TransformResult::unchanged(source));
    }

    let tokens = tokenize(source)?;
    let mut edits = Vec::new();
    let mut skipped = Vec::new();
    let mut idx = 0;

    while idx < tokens.len() {
        let Some(canonical) = compile_call_at(&tokens, source, idx, framework) else {
            idx += 1;
            continue;
        };

        let open = idx + 5;
        let close = matching_paren(&tokens, source, open)?;
        let start = tokens[idx].start;

        match single_literal_argument(&tokens[open + 1..close], source) {
            Some(template) => {
                let compiled = compiler.precompile(&template)?;
                let replacement = format!(
                    "{canonical}.{}.{PRECOMPILED_FN}({compiled})",
                    framework.engine
                );
                edits.push(Edit::new(start..tokens[close].end, replacement));
                idx = close + 1;
            }
            None => {
                // The arguments may hold literal calls of their own
                skipped.push(start);
                idx = open + 1;
            }
        }
    }

    Ok(TransformResult::from_edits(source, edits, skipped))
}

/// If `<alias>.<engine>.compile(` starts at `idx`, return the alias' canonical namespace.
fn compile_call_at<'c>(
    tokens: &[Token],
    source: &str,
    idx: usize,
    framework: &'c FrameworkConfig,
) -> Option<&'c str> {
    let [ns, dot1, engine, dot2, func, paren] = tokens.get(idx..idx + 6)? else {
        return None;
    };

    let chain = [ns, dot1, engine, dot2, func];
    let adjacent = chain.windows(2).all(|w| w[0].end == w[1].start);

    let is_match = adjacent
        && ns.kind == TokenKind::Ident
        && !is_member_access(tokens, source, idx)
        && dot1.is_punct(source, ".")
        && engine.is_ident(source, &framework.engine)
        && dot2.is_punct(source, ".")
        && func.is_ident(source, RUNTIME_FN)
        && paren.is_punct(source, "(");

    if is_match {
        framework.canonical_of(ns.text(source))
    } else {
        None
    }
}

/// Decode the argument list if it is exactly one plain string literal.
fn single_literal_argument(args: &[Token], source: &str) -> Option<String> {
    match args {
        [arg] if arg.kind == TokenKind::Str => decode_string_literal(arg.text(source)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{BuiltinPrecompiler, Precompile, PrecompileError};
    use std::sync::Arc;

    fn compiler() -> TemplateCompiler {
        TemplateCompiler::new(&FrameworkConfig::default(), Arc::new(BuiltinPrecompiler))
    }

    fn rewrite(source: &str) -> TransformResult {
        rewrite_inline_templates(
            source,
            TemplateMode::Precompiled,
            &FrameworkConfig::default(),
            &compiler(),
        )
        .unwrap()
    }

    fn precompiled(template: &str) -> String {
        BuiltinPrecompiler.precompile(template).unwrap()
    }

    #[test]
    fn test_runtime_mode_is_identity() {
        let source = "t = Ember.Handlebars.compile('Hello {{name}}');";
        let result = rewrite_inline_templates(
            source,
            TemplateMode::Runtime,
            &FrameworkConfig::default(),
            &compiler(),
        )
        .unwrap();
        assert_eq!(result.output, source);
    }

    #[test]
    fn test_rewrites_primary_namespace() {
        let source = "App.MyView = Ember.View.extend({\n  template: Ember.Handlebars.compile('Hello {{name}}')\n})";
        let result = rewrite(source);
        let expected = format!(
            "App.MyView = Ember.View.extend({{\n  template: Ember.Handlebars.template({})\n}})",
            precompiled("Hello {{name}}")
        );
        assert_eq!(result.output, expected);
        assert_eq!(result.edits.len(), 1);
    }

    #[test]
    fn test_short_alias_maps_to_canonical() {
        let result = rewrite("x = Em.Handlebars.compile(\"Hello {{name}}\");");
        assert_eq!(
            result.output,
            format!(
                "x = Ember.Handlebars.template({});",
                precompiled("Hello {{name}}")
            )
        );
    }

    #[test]
    fn test_escaped_literal_is_decoded_before_compiling() {
        let result = rewrite(r"x = Ember.Handlebars.compile('It\'s {{name}}\n');");
        assert!(result.output.contains(&precompiled("It's {{name}}\n")));
    }

    #[test]
    fn test_non_literal_arguments_are_skipped() {
        let sources = [
            "Ember.Handlebars.compile(source)",
            "Ember.Handlebars.compile('a' + b)",
            "Ember.Handlebars.compile(`Hello {{name}}`)",
            "Ember.Handlebars.compile('a', 'b')",
            "Ember.Handlebars.compile()",
        ];
        for source in sources {
            let result = rewrite(source);
            assert_eq!(result.output, source);
            assert_eq!(result.skipped, vec![0], "expected skip for {source:?}");
        }
    }

    #[test]
    fn test_literal_call_inside_skipped_call() {
        let source = "Ember.Handlebars.compile(prefix + Em.Handlebars.compile('a'))";
        let result = rewrite(source);
        assert_eq!(
            result.output,
            format!(
                "Ember.Handlebars.compile(prefix + Ember.Handlebars.template({}))",
                precompiled("a")
            )
        );
        assert_eq!(result.skipped, vec![0]);
        assert_eq!(result.edits.len(), 1);
    }

    #[test]
    fn test_ignores_strings_comments_and_other_members() {
        let source = "// Ember.Handlebars.compile('a')\nvar s = \"Ember.Handlebars.compile('b')\";\nfoo.Ember.Handlebars.compile('c');\nEmber.Other.compile('d');";
        let result = rewrite(source);
        assert_eq!(result.output, source);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_multiple_calls_rewritten_left_to_right() {
        let source = "a = Ember.Handlebars.compile('{{a}}'); b = Em.Handlebars.compile('{{b}}');";
        let result = rewrite(source);
        assert_eq!(
            result.output,
            format!(
                "a = Ember.Handlebars.template({}); b = Ember.Handlebars.template({});",
                precompiled("{{a}}"),
                precompiled("{{b}}")
            )
        );
    }

    #[test]
    fn test_deterministic() {
        let source = "t = Ember.Handlebars.compile('{{#each items}}{{this}}{{/each}}');";
        assert_eq!(rewrite(source).output, rewrite(source).output);
    }

    #[test]
    fn test_syntax_error_propagates() {
        let source = "t = Ember.Handlebars.compile('{{#if a}}open');";
        let err = rewrite_inline_templates(
            source,
            TemplateMode::Precompiled,
            &FrameworkConfig::default(),
            &compiler(),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::Template(_)));
    }

    struct Tagging;

    impl Precompile for Tagging {
        fn precompile(&self, source: &str) -> Result<String, PrecompileError> {
            Ok(format!("<{}>", source.len()))
        }
    }

    #[test]
    fn test_uses_configured_precompiler() {
        let compiler = TemplateCompiler::new(&FrameworkConfig::default(), Arc::new(Tagging));
        let result = rewrite_inline_templates(
            "Ember.Handlebars.compile('abc')",
            TemplateMode::Precompiled,
            &FrameworkConfig::default(),
            &compiler,
        )
        .unwrap();
        assert_eq!(result.output, "Ember.Handlebars.template(<3>)");
    }
}
