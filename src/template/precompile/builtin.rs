//! Built-in precompiler for the Handlebars/Mustache subset used by templates.
//!
//! # Supported syntax
//!
//! | Syntax                              | Meaning                         |
//! |-------------------------------------|---------------------------------|
//! | `{{path}}`, `{{helper a "b" k=v}}`  | escaped value / helper call     |
//! | `{{{path}}}`, `{{&path}}`           | unescaped value                 |
//! | `{{#name ...}}…{{else}}…{{/name}}`  | block (section or block helper) |
//! | `{{^name}}…{{/name}}`               | inverted block                  |
//! | `{{> partial [context]}}`           | partial                         |
//! | `{{! … }}`, `{{!-- … --}}`          | comment                         |
//! | `{{~ … ~}}`                         | whitespace control              |
//!
//! # Output
//!
//! A single JavaScript function expression `function(h,ctx){...}` where `h`
//! is the runtime helper object (`lookup`, `data`, `helper`, `block`,
//! `partial`, `escape`, `raw`). Output is a pure function of the input text.
//!
//! The framework runtime behind `<engine>.template(...)` does not provide
//! that helper object, so this output is for offline inspection and tests.
//! Production bundles use the vendored compiler.

use crate::template::js_string;

use super::{Precompile, PrecompileError};

/// Precompiler implemented in-process.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPrecompiler;

impl Precompile for BuiltinPrecompiler {
    fn precompile(&self, source: &str) -> Result<String, PrecompileError> {
        let program = Parser::new(source).parse()?;
        let mut out = String::with_capacity(source.len() * 2);
        out.push_str("function(h,ctx){");
        emit_program(&program, &mut out);
        out.push('}');
        Ok(out)
    }

    fn name(&self) -> &str {
        "builtin"
    }
}

// ============================================================================
// AST
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Mustache {
        expr: Expr,
        escape: bool,
    },
    Block {
        expr: Expr,
        program: Vec<Node>,
        inverse: Option<Vec<Node>>,
    },
    Partial {
        name: String,
        context: Option<Param>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Expr {
    path: Path,
    params: Vec<Param>,
    hash: Vec<(String, Param)>,
}

#[derive(Debug, Clone, PartialEq)]
enum Param {
    Path(Path),
    Str(String),
    Number(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
struct Path {
    raw: String,
    data: bool,
    parts: Vec<String>,
}

// ============================================================================
// Parser
// ============================================================================

/// Why a program body ended.
enum End {
    Eof,
    Else { offset: usize },
    Close { name: String, offset: usize },
}

enum Tag {
    Comment,
    Node(Node),
    Open {
        expr: Expr,
        inverted: bool,
        offset: usize,
    },
    Else {
        offset: usize,
    },
    Close {
        name: String,
        offset: usize,
    },
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    /// Set by a closing `~`: trim leading whitespace of the next text.
    strip_next: bool,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            strip_next: false,
        }
    }

    fn parse(mut self) -> Result<Vec<Node>, PrecompileError> {
        let (program, end) = self.parse_program()?;
        match end {
            End::Eof => Ok(program),
            End::Else { offset } => Err(self.error(offset, "`{{else}}` outside of a block")),
            End::Close { name, offset } => Err(self.error(
                offset,
                format!("closing `{{{{/{name}}}}}` without a matching open block"),
            )),
        }
    }

    fn parse_program(&mut self) -> Result<(Vec<Node>, End), PrecompileError> {
        let mut nodes = Vec::new();
        loop {
            let rest = &self.src[self.pos..];
            let Some(found) = rest.find("{{") else {
                self.push_text(&mut nodes, rest);
                self.pos = self.src.len();
                return Ok((nodes, End::Eof));
            };

            let text = &rest[..found];
            let offset = self.pos + found;
            self.push_text(&mut nodes, text);
            self.pos = offset;

            match self.read_tag(&mut nodes)? {
                Tag::Comment => {}
                Tag::Node(node) => nodes.push(node),
                Tag::Else { offset } => return Ok((nodes, End::Else { offset })),
                Tag::Close { name, offset } => return Ok((nodes, End::Close { name, offset })),
                Tag::Open {
                    expr,
                    inverted,
                    offset,
                } => nodes.push(self.parse_block(expr, inverted, offset)?),
            }
        }
    }

    fn parse_block(
        &mut self,
        expr: Expr,
        inverted: bool,
        open_offset: usize,
    ) -> Result<Node, PrecompileError> {
        let name = expr.path.raw.clone();
        let (first, end) = self.parse_program()?;

        let (second, end) = match end {
            End::Else { .. } => {
                let (second, end) = self.parse_program()?;
                if let End::Else { offset } = end {
                    return Err(self.error(offset, "multiple `{{else}}` in one block"));
                }
                (Some(second), end)
            }
            end => (None, end),
        };

        match end {
            End::Close { name: close, .. } if close == name => {}
            End::Close {
                name: close,
                offset,
            } => {
                return Err(self.error(
                    offset,
                    format!(
                        "`{{{{/{close}}}}}` does not match `{{{{#{name}}}}}` opened at {}",
                        self.position(open_offset)
                    ),
                ));
            }
            _ => {
                return Err(self.error(open_offset, format!("unclosed block `{{{{#{name}}}}}`")));
            }
        }

        let (program, inverse) = if inverted {
            (second.unwrap_or_default(), Some(first))
        } else {
            (first, second)
        };

        Ok(Node::Block {
            expr,
            program,
            inverse,
        })
    }

    fn push_text(&mut self, nodes: &mut Vec<Node>, text: &str) {
        let text = if std::mem::take(&mut self.strip_next) {
            text.trim_start()
        } else {
            text
        };
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(prev)) = nodes.last_mut() {
            prev.push_str(text);
        } else {
            nodes.push(Node::Text(text.to_string()));
        }
    }

    /// Read the tag starting at `self.pos` (which points at `{{`).
    fn read_tag(&mut self, nodes: &mut Vec<Node>) -> Result<Tag, PrecompileError> {
        let start = self.pos;
        let rest = &self.src[start..];

        if rest.starts_with("{{!--") {
            let end = rest[5..]
                .find("--}}")
                .ok_or_else(|| self.error(start, "unclosed comment"))?;
            self.pos = start + 5 + end + 4;
            return Ok(Tag::Comment);
        }

        let (open, close) = if rest.starts_with("{{{") {
            ("{{{", "}}}")
        } else {
            ("{{", "}}")
        };
        let end = rest[open.len()..]
            .find(close)
            .ok_or_else(|| self.error(start, "unclosed mustache"))?;
        let inner_start = start + open.len();
        let mut inner = &self.src[inner_start..inner_start + end];
        self.pos = inner_start + end + close.len();

        if let Some(stripped) = inner.strip_prefix('~') {
            inner = stripped;
            if let Some(Node::Text(prev)) = nodes.last_mut() {
                let trimmed = prev.trim_end().len();
                prev.truncate(trimmed);
                if prev.is_empty() {
                    nodes.pop();
                }
            }
        }
        if let Some(stripped) = inner.strip_suffix('~') {
            inner = stripped;
            self.strip_next = true;
        }

        if inner.starts_with('!') {
            return Ok(Tag::Comment);
        }

        let inner = inner.trim();
        if open == "{{{" {
            let expr = self.parse_expr(inner, start)?;
            return Ok(Tag::Node(Node::Mustache {
                expr,
                escape: false,
            }));
        }

        let tag = match inner.chars().next() {
            Some('#') => Tag::Open {
                expr: self.parse_expr(inner[1..].trim(), start)?,
                inverted: false,
                offset: start,
            },
            Some('^') if inner[1..].trim().is_empty() => Tag::Else { offset: start },
            Some('^') => Tag::Open {
                expr: self.parse_expr(inner[1..].trim(), start)?,
                inverted: true,
                offset: start,
            },
            Some('/') => {
                let name = inner[1..].trim();
                if name.is_empty() {
                    return Err(self.error(start, "empty closing block"));
                }
                Tag::Close {
                    name: name.to_string(),
                    offset: start,
                }
            }
            Some('>') => self.parse_partial(inner[1..].trim(), start)?,
            Some('&') => Tag::Node(Node::Mustache {
                expr: self.parse_expr(inner[1..].trim(), start)?,
                escape: false,
            }),
            _ if inner == "else" => Tag::Else { offset: start },
            _ if inner.starts_with("else ") => {
                return Err(self.error(start, "chained `{{else ...}}` is not supported"));
            }
            _ => Tag::Node(Node::Mustache {
                expr: self.parse_expr(inner, start)?,
                escape: true,
            }),
        };
        Ok(tag)
    }

    fn parse_partial(&self, text: &str, offset: usize) -> Result<Tag, PrecompileError> {
        let mut words = split_words(text).map_err(|msg| self.error(offset, msg))?.into_iter();
        let name = match words.next() {
            Some(Word::Quoted(name)) => name,
            Some(Word::Bare(name)) => name.to_string(),
            _ => return Err(self.error(offset, "partial without a name")),
        };
        let context = match words.next() {
            Some(word) => Some(self.param(word, offset)?),
            None => None,
        };
        if words.next().is_some() {
            return Err(self.error(offset, "partial takes at most one context argument"));
        }
        Ok(Tag::Node(Node::Partial { name, context }))
    }

    fn parse_expr(&self, text: &str, offset: usize) -> Result<Expr, PrecompileError> {
        if text.is_empty() {
            return Err(self.error(offset, "empty expression"));
        }
        let words = split_words(text).map_err(|msg| self.error(offset, msg))?;
        let mut words = words.into_iter();

        let path = match words.next() {
            Some(Word::Bare(word)) if !word.contains('=') => {
                parse_path(word).map_err(|msg| self.error(offset, msg))?
            }
            _ => return Err(self.error(offset, "expression must start with a path")),
        };

        let mut params = Vec::new();
        let mut hash = Vec::new();
        for word in words {
            match word {
                Word::Bare(bare) if bare.contains('=') => {
                    let (key, value) = bare.split_once('=').unwrap_or((bare, ""));
                    if key.is_empty() || value.is_empty() {
                        return Err(self.error(offset, format!("invalid hash argument `{bare}`")));
                    }
                    hash.push((key.to_string(), self.param(Word::Bare(value), offset)?));
                }
                Word::Hash(key, value) => hash.push((key.to_string(), Param::Str(value))),
                _ if !hash.is_empty() => {
                    return Err(self.error(offset, "positional argument after hash argument"));
                }
                word => params.push(self.param(word, offset)?),
            }
        }

        Ok(Expr { path, params, hash })
    }

    fn param(&self, word: Word<'_>, offset: usize) -> Result<Param, PrecompileError> {
        Ok(match word {
            Word::Quoted(s) => Param::Str(s),
            Word::Bare("true") => Param::Bool(true),
            Word::Bare("false") => Param::Bool(false),
            Word::Bare(n) if is_number(n) => Param::Number(n.to_string()),
            Word::Bare(p) => Param::Path(parse_path(p).map_err(|msg| self.error(offset, msg))?),
            Word::Hash(key, _) => {
                return Err(self.error(offset, format!("unexpected hash argument `{key}`")));
            }
        })
    }

    fn position(&self, offset: usize) -> String {
        let before = &self.src[..offset];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        format!("{line}:{column}")
    }

    fn error(&self, offset: usize, message: impl AsRef<str>) -> PrecompileError {
        PrecompileError::new(format!("{}: {}", self.position(offset), message.as_ref()))
    }
}

/// A whitespace-separated piece of a mustache expression.
enum Word<'a> {
    Bare(&'a str),
    Quoted(String),
    /// `key="quoted value"`
    Hash(&'a str, String),
}

fn split_words(text: &str) -> Result<Vec<Word<'_>>, String> {
    let mut words = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        let quote_at = rest.find(['"', '\'']);
        let space_at = rest.find(char::is_whitespace).unwrap_or(rest.len());

        match quote_at {
            // Quoted word, or a `key="..."` hash pair
            Some(q) if q < space_at => {
                let key = &rest[..q];
                if !key.is_empty() && !key.ends_with('=') {
                    return Err(format!("unexpected quote in `{}`", &rest[..space_at]));
                }
                let quote = rest[q..].chars().next().unwrap_or('"');
                let body = &rest[q + 1..];
                let close = body
                    .find(quote)
                    .ok_or_else(|| "unterminated string argument".to_string())?;
                let value = body[..close].to_string();
                if key.is_empty() {
                    words.push(Word::Quoted(value));
                } else {
                    words.push(Word::Hash(&key[..key.len() - 1], value));
                }
                rest = &body[close + 1..];
                if rest.starts_with(|c: char| !c.is_whitespace()) {
                    return Err("missing whitespace after string argument".to_string());
                }
            }
            _ => {
                words.push(Word::Bare(&rest[..space_at]));
                rest = &rest[space_at..];
            }
        }
        rest = rest.trim_start();
    }
    Ok(words)
}

fn is_number(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    let mut parts = digits.splitn(2, '.');
    let int = parts.next().unwrap_or_default();
    let frac = parts.next();
    !int.is_empty()
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

/// Characters that may not appear in a path segment.
const INVALID_PATH_CHARS: &[char] = &[
    '!', '"', '#', '%', '&', '\'', '(', ')', '*', '+', ',', ';', '<', '=', '>', '@', '[', '\\',
    ']', '^', '`', '{', '|', '}', '~',
];

fn parse_path(word: &str) -> Result<Path, String> {
    let (data, body) = match word.strip_prefix('@') {
        Some(body) => (true, body),
        None => (false, word),
    };

    let mut parts = Vec::new();
    if !(body == "this" || body == ".") {
        for (i, piece) in body.split('/').enumerate() {
            if piece == ".." && !data {
                parts.push(piece.to_string());
                continue;
            }
            for (j, segment) in piece.split('.').enumerate() {
                match segment {
                    "this" if i == 0 && j == 0 && !data => {}
                    "" => return Err(format!("invalid path `{word}`")),
                    _ if segment.contains(INVALID_PATH_CHARS) => {
                        return Err(format!("invalid path `{word}`"));
                    }
                    _ => parts.push(segment.to_string()),
                }
            }
        }
    }

    if data && parts.is_empty() {
        return Err(format!("invalid data path `{word}`"));
    }

    Ok(Path {
        raw: word.to_string(),
        data,
        parts,
    })
}

// ============================================================================
// Code generation
// ============================================================================

fn emit_program(nodes: &[Node], out: &mut String) {
    out.push_str("var out=\"\";");
    for node in nodes {
        emit_node(node, out);
    }
    out.push_str("return out;");
}

fn emit_function(nodes: &[Node], out: &mut String) {
    out.push_str("function(ctx){");
    emit_program(nodes, out);
    out.push('}');
}

fn emit_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => {
            out.push_str("out+=");
            out.push_str(&js_string(text));
            out.push(';');
        }
        Node::Mustache { expr, escape } => {
            out.push_str(if *escape { "out+=h.escape(" } else { "out+=h.raw(" });
            emit_value(expr, out);
            out.push_str(");");
        }
        Node::Block {
            expr,
            program,
            inverse,
        } => {
            out.push_str("out+=h.block(ctx,");
            out.push_str(&js_string(&expr.path.raw));
            out.push(',');
            emit_params(&expr.params, out);
            out.push(',');
            emit_hash(&expr.hash, out);
            out.push(',');
            emit_function(program, out);
            out.push(',');
            match inverse {
                Some(inverse) => emit_function(inverse, out),
                None => out.push_str("null"),
            }
            out.push_str(");");
        }
        Node::Partial { name, context } => {
            out.push_str("out+=h.partial(");
            match context {
                Some(param) => emit_param(param, out),
                None => out.push_str("ctx"),
            }
            out.push(',');
            out.push_str(&js_string(name));
            out.push_str(");");
        }
    }
}

/// A mustache value: plain lookup, or a helper call when arguments are present.
fn emit_value(expr: &Expr, out: &mut String) {
    if expr.params.is_empty() && expr.hash.is_empty() {
        emit_path(&expr.path, out);
        return;
    }
    out.push_str("h.helper(ctx,");
    out.push_str(&js_string(&expr.path.raw));
    out.push(',');
    emit_params(&expr.params, out);
    out.push(',');
    emit_hash(&expr.hash, out);
    out.push(')');
}

fn emit_path(path: &Path, out: &mut String) {
    if path.parts.is_empty() {
        out.push_str("ctx");
        return;
    }
    out.push_str(if path.data { "h.data(ctx,[" } else { "h.lookup(ctx,[" });
    for (idx, part) in path.parts.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&js_string(part));
    }
    out.push_str("])");
}

fn emit_param(param: &Param, out: &mut String) {
    match param {
        Param::Path(path) => emit_path(path, out),
        Param::Str(s) => out.push_str(&js_string(s)),
        Param::Number(n) => out.push_str(n),
        Param::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
    }
}

fn emit_params(params: &[Param], out: &mut String) {
    out.push('[');
    for (idx, param) in params.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        emit_param(param, out);
    }
    out.push(']');
}

fn emit_hash(hash: &[(String, Param)], out: &mut String) {
    out.push('{');
    for (idx, (key, value)) in hash.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&js_string(key));
        out.push(':');
        emit_param(value, out);
    }
    out.push('}');
}
