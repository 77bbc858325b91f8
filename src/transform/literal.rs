//! String literal decoding.

/// Decode a single- or double-quoted JavaScript string literal.
///
/// `raw` includes the surrounding quotes. Returns `None` if `raw` is not a
/// simple quoted literal or contains a malformed escape sequence; callers
/// treat that the same as a non-literal argument.
pub fn decode_string_literal(raw: &str) -> Option<String> {
    let quote = raw.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let body = raw.strip_prefix(quote)?.strip_suffix(quote)?;

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == quote {
            // Unescaped quote inside the body: not a single literal
            return None;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            '0' if !chars.peek().is_some_and(char::is_ascii_digit) => out.push('\0'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(hex_char(&hex, 2)?);
            }
            'u' if chars.peek() == Some(&'{') => {
                chars.next();
                let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                if hex.is_empty() || hex.len() > 6 {
                    return None;
                }
                out.push(hex_char(&hex, hex.len())?);
            }
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let unit = u32::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == 4)?;
                out.push(decode_utf16_unit(unit, &mut chars)?);
            }
            // Line continuation
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\u{2028}' | '\u{2029}' => {}
            // Legacy octal escapes are not supported
            '1'..='9' | '0' => return None,
            other => out.push(other),
        }
    }
    Some(out)
}

fn hex_char(hex: &str, len: usize) -> Option<char> {
    if hex.len() != len {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Combine a surrogate pair written as two `\uXXXX` escapes.
fn decode_utf16_unit(
    unit: u32,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Option<char> {
    if !(0xD800..0xDC00).contains(&unit) {
        return char::from_u32(unit);
    }
    // High surrogate: expect `\uDC00`-`\uDFFF` next
    if chars.next()? != '\\' || chars.next()? != 'u' {
        return None;
    }
    let hex: String = chars.by_ref().take(4).collect();
    let low = u32::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == 4)?;
    if !(0xDC00..0xE000).contains(&low) {
        return None;
    }
    char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_literals() {
        assert_eq!(
            decode_string_literal("'Hello {{name}}'").as_deref(),
            Some("Hello {{name}}")
        );
        assert_eq!(
            decode_string_literal("\"Hello {{name}}\"").as_deref(),
            Some("Hello {{name}}")
        );
        assert_eq!(decode_string_literal("''").as_deref(), Some(""));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            decode_string_literal(r"'it\'s\n\t\\'").as_deref(),
            Some("it's\n\t\\")
        );
        assert_eq!(decode_string_literal(r#""say \"hi\"""#).as_deref(), Some("say \"hi\""));
        assert_eq!(decode_string_literal(r"'\x41B\u{43}'").as_deref(), Some("ABC"));
        assert_eq!(decode_string_literal(r"'\q'").as_deref(), Some("q"));
        assert_eq!(decode_string_literal(r"'\0'").as_deref(), Some("\0"));
    }

    #[test]
    fn test_surrogate_pair() {
        assert_eq!(
            decode_string_literal(r"'\uD83D\uDE00'").as_deref(),
            Some("\u{1F600}")
        );
        assert_eq!(decode_string_literal(r"'\uD83D'"), None);
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(decode_string_literal("'a\\\nb'").as_deref(), Some("ab"));
        assert_eq!(decode_string_literal("'a\\\r\nb'").as_deref(), Some("ab"));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(decode_string_literal(r"'\x4'"), None);
        assert_eq!(decode_string_literal(r"'\uZZZZ'"), None);
        assert_eq!(decode_string_literal(r"'\u{110000}'"), None);
        assert_eq!(decode_string_literal(r"'\12'"), None);
        assert_eq!(decode_string_literal("`tpl`"), None);
        assert_eq!(decode_string_literal("name"), None);
        assert_eq!(decode_string_literal("'unterminated"), None);
    }
}
