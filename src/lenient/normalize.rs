//! Coercion of loosely serialized literals into strict JSON.
//!
//! Stored event logs were sometimes written with a dynamic-language `repr`
//! instead of a JSON encoder: single-quoted strings, `True`/`False`/`None`,
//! trailing commas, raw newlines inside strings, and occasionally the whole
//! payload wrapped in one more quoted (or `b'...'`) string. The scanner here
//! rewrites that dialect into strict JSON in one left-to-right pass without
//! touching the characters of string values.

use anyhow::{Context, Result};
use serde_json::Value;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Outside,
    Single,
    Double,
}

/// Parses `raw` strictly, and only if that fails, unwraps one envelope level
/// and retries on the normalized form.
pub fn parse_lenient(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        match value {
            Value::String(inner) => return parse_strict_or_normalized(&inner),
            other => return Ok(other),
        }
    }

    parse_strict_or_normalized(&unwrap_envelope(trimmed))
}

fn parse_strict_or_normalized(text: &str) -> Result<Value> {
    let text = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }
    let normalized = normalize_literal(text);
    serde_json::from_str(&normalized).context("payload is not valid even after normalization")
}

/// Removes one enclosing quoted-string envelope (`"..."`, `'...'`, `b'...'`),
/// undoing one level of escaping. Inside a byte envelope, runs of `\xNN`
/// escapes are UTF-8 bytes. Anything else is returned unchanged.
pub fn unwrap_envelope(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') {
        if let Ok(Value::String(inner)) = serde_json::from_str::<Value>(trimmed) {
            return Cow::Owned(inner);
        }
    }

    let (body, is_bytes) = match trimmed.strip_prefix(|c| c == 'b' || c == 'B') {
        Some(rest) if rest.starts_with(|c| c == '\'' || c == '"') => (rest, true),
        _ => (trimmed, false),
    };
    let mut chars = body.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('\'' | '"')), Some(close)) if open == close && body.len() >= 2 => {
            Cow::Owned(unescape_one_level(&body[1..body.len() - 1], is_bytes))
        }
        _ => Cow::Borrowed(trimmed),
    }
}

fn unescape_one_level(inner: &str, is_bytes: bool) -> String {
    let chars: Vec<char> = inner.chars().collect();
    let mut out = String::with_capacity(inner.len());
    let mut i = 0;
    while i < chars.len() {
        if is_bytes {
            let consumed = push_escaped_bytes(&chars, i, &mut out);
            if consumed > 0 {
                i += consumed;
                continue;
            }
        }
        let ch = chars[i];
        if ch != '\\' || i + 1 >= chars.len() {
            out.push(ch);
            i += 1;
            continue;
        }
        let next = chars[i + 1];
        match next {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '\\' | '\'' | '"' => out.push(next),
            'x' => match hex_value(&chars, i + 2, 2).and_then(char::from_u32) {
                Some(decoded) => {
                    out.push(decoded);
                    i += 4;
                    continue;
                }
                None => {
                    out.push('\\');
                    out.push('x');
                }
            },
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        i += 2;
    }
    out
}

/// Decodes the run of `\xNN` escapes starting at `from` as UTF-8 and returns
/// how many characters it covered (zero if there is no run).
fn push_escaped_bytes(chars: &[char], from: usize, out: &mut String) -> usize {
    let mut bytes = Vec::new();
    let mut pos = from;
    while chars.get(pos) == Some(&'\\') && chars.get(pos + 1) == Some(&'x') {
        let Some(byte) = hex_value(chars, pos + 2, 2) else {
            break;
        };
        bytes.push(byte as u8);
        pos += 4;
    }
    if bytes.is_empty() {
        return 0;
    }
    match String::from_utf8(bytes) {
        Ok(text) => out.push_str(&text),
        Err(error) => out.push_str(&String::from_utf8_lossy(error.as_bytes())),
    }
    pos - from
}

/// Rewrites the relaxed literal dialect into strict JSON.
///
/// Already-strict input comes back unchanged.
pub fn normalize_literal(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    let mut state = QuoteState::Outside;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match state {
            QuoteState::Outside => match ch {
                '\'' => {
                    out.push('"');
                    state = QuoteState::Single;
                }
                '"' => {
                    out.push('"');
                    state = QuoteState::Double;
                }
                ',' if matches!(next_significant(&chars, i + 1), Some(']' | '}')) => {}
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let start = i;
                    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    out.push_str(match word.as_str() {
                        "True" => "true",
                        "False" => "false",
                        "None" => "null",
                        other => other,
                    });
                    continue;
                }
                c => out.push(c),
            },
            QuoteState::Single | QuoteState::Double => {
                if ch == '\\' {
                    i += 1 + push_escape(&chars, i + 1, &mut out);
                    continue;
                }
                match (state, ch) {
                    (QuoteState::Single, '\'') | (QuoteState::Double, '"') => {
                        out.push('"');
                        state = QuoteState::Outside;
                    }
                    (QuoteState::Single, '"') => out.push_str("\\\""),
                    _ => push_string_char(ch, &mut out),
                }
            }
        }
        i += 1;
    }

    out
}

/// Writes the strict form of the escape whose body starts at `pos` (the
/// character after the backslash) and returns how many characters it used.
/// Escapes with no strict equivalent keep their backslash as a literal.
fn push_escape(chars: &[char], pos: usize, out: &mut String) -> usize {
    let Some(&next) = chars.get(pos) else {
        out.push_str("\\\\");
        return 0;
    };
    match next {
        '\'' => {
            out.push('\'');
            1
        }
        '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => {
            out.push('\\');
            out.push(next);
            1
        }
        'u' if hex_value(chars, pos + 1, 4).is_some() => {
            out.push_str("\\u");
            out.extend(&chars[pos + 1..pos + 5]);
            5
        }
        'x' if hex_value(chars, pos + 1, 2).is_some() => {
            out.push_str("\\u00");
            out.extend(&chars[pos + 1..pos + 3]);
            3
        }
        'U' => match hex_value(chars, pos + 1, 8).and_then(char::from_u32) {
            Some(decoded) => {
                push_string_char(decoded, out);
                9
            }
            None => {
                out.push_str("\\\\");
                0
            }
        },
        _ => {
            out.push_str("\\\\");
            0
        }
    }
}

fn push_string_char(ch: char, out: &mut String) {
    match ch {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
        c => out.push(c),
    }
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from.min(chars.len())..]
        .iter()
        .copied()
        .find(|c| !c.is_whitespace())
}

fn hex_value(chars: &[char], from: usize, len: usize) -> Option<u32> {
    let digits = chars.get(from..from + len)?;
    digits
        .iter()
        .try_fold(0u32, |acc, c| c.to_digit(16).map(|d| acc * 16 + d))
}
