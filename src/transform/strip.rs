//! Debug directive stripping.
//!
//! In production, every `<alias>.assert(...)`, `<alias>.warn(...)`,
//! `<alias>.deprecate(...)` and `<alias>.debug(...)` call is deleted, from the
//! namespace identifier through the matching close parenthesis. The rest of
//! the line (a trailing `;`, surrounding expressions) is left as written.
//!
//! ```text
//! Ember.assert('ready', isReady(app)); start(app);
//! ;                                    start(app);
//! ```
//!
//! Matches are found on the token stream, so calls inside strings, comments
//! and regex literals are never touched.

use crate::config::FrameworkConfig;
use crate::core::DirectivePolicy;

use super::lexer::{Token, TokenKind, matching_paren, tokenize};
use super::{Edit, TransformError, TransformResult};

/// Debug-only framework functions removed in production.
pub const DIRECTIVES: &[&str] = &["assert", "warn", "deprecate", "debug"];

/// Strip debug directive calls according to `policy`.
pub fn strip_directives(
    source: &str,
    policy: DirectivePolicy,
    framework: &FrameworkConfig,
) -> Result<TransformResult, TransformError> {
    if policy == DirectivePolicy::Keep {
        return Ok(TransformResult::unchanged(source));
    }

    let tokens = tokenize(source)?;
    let mut edits = Vec::new();
    let mut idx = 0;

    while idx < tokens.len() {
        match directive_open_paren(&tokens, source, idx, framework) {
            Some(open) => {
                let close = matching_paren(&tokens, source, open)?;
                edits.push(Edit::delete(tokens[idx].start..tokens[close].end));
                idx = close + 1;
            }
            None => idx += 1,
        }
    }

    Ok(TransformResult::from_edits(source, edits, Vec::new()))
}

/// If a directive call starts at `idx`, return the index of its `(` token.
fn directive_open_paren(
    tokens: &[Token],
    source: &str,
    idx: usize,
    framework: &FrameworkConfig,
) -> Option<usize> {
    let [ns, dot, name, paren] = tokens.get(idx..idx + 4)? else {
        return None;
    };

    let is_match = ns.kind == TokenKind::Ident
        && framework.is_alias(ns.text(source))
        && !is_member_access(tokens, source, idx)
        && dot.is_punct(source, ".")
        && ns.end == dot.start
        && name.kind == TokenKind::Ident
        && dot.end == name.start
        && DIRECTIVES.contains(&name.text(source))
        && paren.is_punct(source, "(");

    is_match.then_some(idx + 3)
}

/// Whether the token at `idx` is the property side of a member expression
/// (`foo.Ember`), which is never a namespace reference.
pub(super) fn is_member_access(tokens: &[Token], source: &str, idx: usize) -> bool {
    idx > 0 && tokens[idx - 1].is_punct(source, ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::ScanError;

    fn strip(source: &str) -> String {
        strip_directives(source, DirectivePolicy::Strip, &FrameworkConfig::default())
            .unwrap()
            .output
    }

    #[test]
    fn test_keep_policy_is_identity() {
        let source = "Ember.assert('x');";
        let result =
            strip_directives(source, DirectivePolicy::Keep, &FrameworkConfig::default()).unwrap();
        assert_eq!(result.output, source);
        assert!(result.is_unchanged());
    }

    #[test]
    fn test_strips_each_directive() {
        for name in DIRECTIVES {
            let source = format!("before(); Ember.{name}('message'); after();");
            assert_eq!(strip(&source), "before(); ; after();");
        }
    }

    #[test]
    fn test_strips_short_alias() {
        assert_eq!(strip("Em.warn('careful')\nx();"), "\nx();");
    }

    #[test]
    fn test_nested_parens_and_strings() {
        let source = "Ember.assert(\"needs ) paren\", check(a, (b)), ')'); go();";
        assert_eq!(strip(source), "; go();");
    }

    #[test]
    fn test_multiline_call() {
        let source = "Ember.deprecate(\n  'old api',\n  false,\n  { id: 'x' }\n);\nrun();";
        assert_eq!(strip(source), ";\nrun();");
    }

    #[test]
    fn test_ignores_strings_and_comments() {
        let source = "var s = 'Ember.assert(1)'; // Ember.warn(2)\n/* Ember.debug(3) */";
        assert_eq!(strip(source), source);
    }

    #[test]
    fn test_ignores_other_members() {
        let source = "Ember.Logger.warn('x'); App.assert(1); foo.Ember.assert(2); Ember.assertion(3);";
        assert_eq!(strip(source), source);
    }

    #[test]
    fn test_ignores_non_calls() {
        let source = "var a = Ember.assert; Ember.warn = noop;";
        assert_eq!(strip(source), source);
    }

    #[test]
    fn test_whitespace_before_paren() {
        assert_eq!(strip("Ember.debug /* why */ ('x');"), ";");
    }

    #[test]
    fn test_nested_directive_removed_with_outer() {
        assert_eq!(strip("Ember.assert(Ember.warn('a'), 'b');"), ";");
    }

    #[test]
    fn test_inside_template_substitution() {
        assert_eq!(strip("`a${Ember.debug('x')}b`"), "`a${}b`");
    }

    #[test]
    fn test_edits_are_in_input_coordinates() {
        let source = "a; Ember.warn('x'); b; Em.debug('y');";
        let result =
            strip_directives(source, DirectivePolicy::Strip, &FrameworkConfig::default()).unwrap();
        assert_eq!(result.edits.len(), 2);
        assert_eq!(&source[result.edits[0].range.clone()], "Ember.warn('x')");
        assert_eq!(&source[result.edits[1].range.clone()], "Em.debug('y')");
        assert_eq!(result.output, "a; ; b; ;");
    }

    #[test]
    fn test_unbalanced_call_is_error() {
        let source = "ok();\nEmber.assert('x', f(1);\n";
        let err = strip_directives(source, DirectivePolicy::Strip, &FrameworkConfig::default())
            .unwrap_err();
        match err {
            TransformError::Scan(ScanError::Unbalanced { offset }) => {
                assert_eq!(&source[offset..offset + 1], "(");
                assert_eq!(offset, 18);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Holds for inputs that stay valid once stripped. A directive used as an
    /// operand (`x = Ember.debug(1) / 2;`) leaves `x =  / 2;`, which the
    /// second pass lexes as an unterminated regular expression.
    #[test]
    fn test_idempotent() {
        let sources = [
            "Ember.assert('x'); run();",
            "if (debug) { Em.debug('state', state); }\nrender();",
            "var msg = 'Ember.warn(1)'; Ember.warn(msg);",
            "plain();",
        ];
        for source in sources {
            let once = strip(source);
            assert_eq!(strip(&once), once, "not idempotent for {source:?}");
        }
    }

    #[test]
    fn test_crlf_line_continuation_in_string() {
        let source = "var s = 'first \\\r\nsecond';\r\nEmber.assert(s);\r\n";
        assert_eq!(strip(source), "var s = 'first \\\r\nsecond';\r\n;\r\n");
    }

    #[test]
    fn test_regex_after_if_condition() {
        let source = "if (ok) /'/.test(s) && Ember.warn('quote');";
        assert_eq!(strip(source), "if (ok) /'/.test(s) && ;");
    }

    #[test]
    fn test_no_directives_is_identity() {
        let source = "App.ready = function() { console.log('(ready'); };";
        assert_eq!(strip(source), source);
    }

    #[test]
    fn test_configured_aliases() {
        let framework = FrameworkConfig::with_aliases("Ember", "Handlebars", &[("SC", "Ember")]);
        let result =
            strip_directives("SC.warn(1); Ember.warn(2);", DirectivePolicy::Strip, &framework)
                .unwrap();
        assert_eq!(result.output, "; Ember.warn(2);");
    }
}
