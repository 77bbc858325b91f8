//! Minimal JavaScript lexer.
//!
//! Only as much of the grammar as is needed to tell code apart from strings,
//! comments, template literals and regular expressions. Whitespace and
//! comments are dropped; everything else becomes a [`Token`] carrying its byte
//! span in the input, so rewrites can splice the text directly.
//!
//! Template literal substitutions (`${ ... }`) are lexed as ordinary code,
//! which means directive calls nested inside them are still visible.
//!
//! A `/` starts a regular expression when the previous significant token
//! cannot end an expression (operators, keywords like `return`, start of
//! input). A `)` ends an expression unless it closes the condition of
//! `if`, `while`, `for` or `with`. This is the usual heuristic; it does not
//! cover every corner of the grammar (`/` after a block-ending `}` is always
//! division, for instance).

use super::ScanError;

/// Kind of significant token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword (`Ember`, `return`, `$el`).
    Ident,
    /// Numeric literal.
    Number,
    /// Punctuation. Single character except `++` and `--`.
    Punct,
    /// Single- or double-quoted string literal, quotes included.
    Str,
    /// Template literal chunk (from a backtick or `}` up to `${` or the closing backtick).
    Template,
    /// Regular expression literal, flags included.
    Regex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    #[inline]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    #[inline]
    pub fn is_punct(&self, source: &str, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text(source) == punct
    }

    #[inline]
    pub fn is_ident(&self, source: &str, ident: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source) == ident
    }
}

/// Keywords after which a `/` begins a regular expression.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// Keywords whose parenthesized head is followed by a statement, not an operator.
const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Tokenize JavaScript source.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScanError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    /// Brace depth at which each open `${` substitution started.
    templates: Vec<usize>,
    braces: usize,
    /// For each open `(`, whether it began a control-statement head.
    parens: Vec<bool>,
    /// Whether the most recent `)` closed a control-statement head.
    control_head_closed: bool,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            templates: Vec::new(),
            braces: 0,
            parens: Vec::new(),
            control_head_closed: false,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ScanError> {
        // Shebang line
        if self.bytes.starts_with(b"#!") {
            self.skip_line();
        }

        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'/' => match self.peek(1) {
                    Some(b'/') => self.skip_line(),
                    Some(b'*') => self.skip_block_comment()?,
                    _ if self.regex_allowed() => self.lex_regex()?,
                    _ => self.push_punct(1),
                },
                b'\'' | b'"' => self.lex_string(b)?,
                b'`' => {
                    let start = self.pos;
                    self.pos += 1;
                    self.lex_template_chunk(start)?;
                }
                b'{' => {
                    self.braces += 1;
                    self.push_punct(1);
                }
                b'}' => {
                    if self.templates.last() == Some(&self.braces) {
                        self.templates.pop();
                        let start = self.pos;
                        self.pos += 1;
                        self.lex_template_chunk(start)?;
                    } else {
                        self.braces = self.braces.saturating_sub(1);
                        self.push_punct(1);
                    }
                }
                b'(' => {
                    let control = self.tokens.last().is_some_and(|t| {
                        t.kind == TokenKind::Ident && CONTROL_KEYWORDS.contains(&t.text(self.src))
                    });
                    self.parens.push(control);
                    self.push_punct(1);
                }
                b')' => {
                    self.control_head_closed = self.parens.pop().unwrap_or(false);
                    self.push_punct(1);
                }
                b'0'..=b'9' => self.lex_number(),
                b'.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
                b'+' | b'-' if self.peek(1) == Some(b) => self.push_punct(2),
                _ if is_ident_byte(b) => self.lex_ident(),
                _ => self.push_punct(1),
            }
        }

        if !self.templates.is_empty() {
            return Err(ScanError::Unterminated {
                what: "template substitution",
                offset: self.src.len(),
            });
        }

        Ok(self.tokens)
    }

    #[inline]
    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            start,
            end: self.pos,
        });
    }

    fn push_punct(&mut self, len: usize) {
        let start = self.pos;
        self.pos += len;
        self.push(TokenKind::Punct, start);
    }

    fn skip_line(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ScanError> {
        let start = self.pos;
        match self.src[start + 2..].find("*/") {
            Some(end) => {
                self.pos = start + 2 + end + 2;
                Ok(())
            }
            None => Err(ScanError::Unterminated {
                what: "block comment",
                offset: start,
            }),
        }
    }

    fn lex_ident(&mut self) {
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|&b| is_ident_byte(b) || b.is_ascii_digit()) {
            self.pos += 1;
        }
        self.push(TokenKind::Ident, start);
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_')
        {
            self.pos += 1;
        }
        self.push(TokenKind::Number, start);
    }

    /// Skip a backslash escape. A CRLF line continuation is one escape.
    fn skip_escape(&mut self) {
        if self.bytes[self.pos + 1..].starts_with(b"\r\n") {
            self.pos += 3;
        } else {
            self.pos += 2;
        }
    }

    fn lex_string(&mut self, quote: u8) -> Result<(), ScanError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.bytes.get(self.pos) {
                Some(b'\\') => self.skip_escape(),
                Some(&b) if b == quote => {
                    self.pos += 1;
                    self.push(TokenKind::Str, start);
                    return Ok(());
                }
                Some(b'\n') | None => {
                    return Err(ScanError::Unterminated {
                        what: "string literal",
                        offset: start,
                    });
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Scan template text up to `${` (entering a substitution) or the closing backtick.
    fn lex_template_chunk(&mut self, start: usize) -> Result<(), ScanError> {
        loop {
            match self.bytes.get(self.pos) {
                Some(b'\\') => self.skip_escape(),
                Some(b'`') => {
                    self.pos += 1;
                    self.push(TokenKind::Template, start);
                    return Ok(());
                }
                Some(b'$') if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.push(TokenKind::Template, start);
                    self.templates.push(self.braces);
                    return Ok(());
                }
                Some(_) => self.pos += 1,
                None => {
                    return Err(ScanError::Unterminated {
                        what: "template literal",
                        offset: start,
                    });
                }
            }
        }
    }

    fn lex_regex(&mut self) -> Result<(), ScanError> {
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        loop {
            match self.bytes.get(self.pos) {
                Some(b'\\') => self.pos += 2,
                Some(b'[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(b']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some(b'/') if !in_class => {
                    self.pos += 1;
                    break;
                }
                Some(b'\n') | None => {
                    return Err(ScanError::Unterminated {
                        what: "regular expression",
                        offset: start,
                    });
                }
                Some(_) => self.pos += 1,
            }
        }
        // Flags
        while self.bytes.get(self.pos).is_some_and(|&b| b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        self.push(TokenKind::Regex, start);
        Ok(())
    }

    /// Whether a `/` at the current position starts a regular expression.
    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.tokens.last() else {
            return true;
        };
        match prev.kind {
            TokenKind::Number | TokenKind::Str | TokenKind::Regex => false,
            // A chunk ending in `${` opens a substitution; otherwise the literal is complete
            TokenKind::Template => prev.text(self.src).ends_with("${"),
            TokenKind::Ident => REGEX_PRECEDING_KEYWORDS.contains(&prev.text(self.src)),
            TokenKind::Punct => match prev.text(self.src) {
                ")" => self.control_head_closed,
                "]" | "++" | "--" => false,
                _ => true,
            },
        }
    }
}

#[inline]
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

/// Find the index of the `)` token matching the `(` at `open`.
///
/// Strings, template chunks and regex literals are single tokens, so
/// parentheses inside them never affect the depth.
pub fn matching_paren(tokens: &[Token], source: &str, open: usize) -> Result<usize, ScanError> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        if token.kind != TokenKind::Punct {
            continue;
        }
        match token.text(source) {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    return Ok(idx);
                }
            }
            _ => {}
        }
    }
    Err(ScanError::Unbalanced {
        offset: tokens[open].start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, &str)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text(source)))
            .collect()
    }

    #[test]
    fn test_member_call() {
        use TokenKind::*;
        assert_eq!(
            kinds("Ember.assert('x');"),
            vec![
                (Ident, "Ember"),
                (Punct, "."),
                (Ident, "assert"),
                (Punct, "("),
                (Str, "'x'"),
                (Punct, ")"),
                (Punct, ";"),
            ]
        );
    }

    #[test]
    fn test_comments_are_dropped() {
        let source = "a // Ember.assert(x)\n/* Ember.warn('y') */ b";
        assert_eq!(
            kinds(source),
            vec![(TokenKind::Ident, "a"), (TokenKind::Ident, "b")]
        );
    }

    #[test]
    fn test_strings_hold_parens_and_quotes() {
        let source = r#"f("(", 'it\'s )', "\"")"#;
        let tokens = kinds(source);
        assert_eq!(tokens[2], (TokenKind::Str, r#""(""#));
        assert_eq!(tokens[4], (TokenKind::Str, r"'it\'s )'"));
        assert_eq!(tokens[6], (TokenKind::Str, r#""\"""#));
        assert_eq!(tokens.len(), 8);
    }

    #[test]
    fn test_template_literal_substitution_is_code() {
        use TokenKind::*;
        let source = "`a ${Ember.debug(1)} b`";
        assert_eq!(
            kinds(source),
            vec![
                (Template, "`a ${"),
                (Ident, "Ember"),
                (Punct, "."),
                (Ident, "debug"),
                (Punct, "("),
                (Number, "1"),
                (Punct, ")"),
                (Template, "} b`"),
            ]
        );
    }

    #[test]
    fn test_nested_braces_in_substitution() {
        let source = "`${ {a: 1}.a } done`";
        let tokens = kinds(source);
        assert_eq!(tokens.last().unwrap(), &(TokenKind::Template, "} done`"));
    }

    #[test]
    fn test_regex_vs_division() {
        use TokenKind::*;
        assert_eq!(
            kinds("a / b / c"),
            vec![
                (Ident, "a"),
                (Punct, "/"),
                (Ident, "b"),
                (Punct, "/"),
                (Ident, "c")
            ]
        );
        assert_eq!(
            kinds("x = /[/)]\\//g;"),
            vec![
                (Ident, "x"),
                (Punct, "="),
                (Regex, "/[/)]\\//g"),
                (Punct, ";")
            ]
        );
        assert_eq!(
            kinds("return /'/.test(s)")[1],
            (Regex, "/'/")
        );
        assert_eq!(kinds("i++ / 2")[2], (Punct, "/"));
    }

    #[test]
    fn test_regex_after_control_head() {
        use TokenKind::*;
        assert_eq!(kinds("if (ok) /'/.test(s)")[4], (Regex, "/'/"));
        assert_eq!(kinds("while (f(x)) /a/.exec(s)")[7], (Regex, "/a/"));
        // Ordinary parenthesized expressions still end in a division
        assert_eq!(kinds("(a + b) / 2")[5], (Punct, "/"));
        assert_eq!(kinds("if (f(a) / 2) x")[6], (Punct, "/"));
    }

    #[test]
    fn test_crlf_line_continuation() {
        let source = "var s = 'first \\\r\nsecond';\r\nrun();";
        let tokens = kinds(source);
        assert_eq!(tokens[3], (TokenKind::Str, "'first \\\r\nsecond'"));
        assert_eq!(tokens[5], (TokenKind::Ident, "run"));

        let template = "`a \\\r\nb`";
        assert_eq!(kinds(template), vec![(TokenKind::Template, template)]);
    }

    #[test]
    fn test_shebang_is_skipped() {
        assert_eq!(
            kinds("#!/usr/bin/env node\nrun()"),
            vec![
                (TokenKind::Ident, "run"),
                (TokenKind::Punct, "("),
                (TokenKind::Punct, ")")
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("var a = 'oops;\n").unwrap_err();
        assert!(matches!(err, ScanError::Unterminated { offset: 8, .. }));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize("a /* never closed").unwrap_err();
        assert!(matches!(err, ScanError::Unterminated { offset: 2, .. }));
    }

    #[test]
    fn test_unterminated_template() {
        assert!(tokenize("`abc").is_err());
        assert!(tokenize("`abc ${ x").is_err());
    }

    #[test]
    fn test_matching_paren() {
        let source = "f(a, g(')'), (b))";
        let tokens = tokenize(source).unwrap();
        let close = matching_paren(&tokens, source, 1).unwrap();
        assert_eq!(tokens[close].end, source.len());
    }

    #[test]
    fn test_matching_paren_unbalanced() {
        let source = "x; f(a, (b)";
        let tokens = tokenize(source).unwrap();
        let open = tokens.iter().position(|t| t.is_punct(source, "(")).unwrap();
        let err = matching_paren(&tokens, source, open).unwrap_err();
        assert!(matches!(err, ScanError::Unbalanced { offset: 4 }));
    }

    #[test]
    fn test_unicode_identifiers_and_strings() {
        let source = "const café = 'naïve (';";
        let tokens = kinds(source);
        assert_eq!(tokens[1], (TokenKind::Ident, "café"));
        assert_eq!(tokens[3], (TokenKind::Str, "'naïve ('"));
    }
}
