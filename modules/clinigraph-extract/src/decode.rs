//! Tolerant decoding of model replies into JSON.
//!
//! Steps run in order and stop at the first parse that succeeds: strip code
//! fences, parse directly, cut the outermost `{...}` span, then parse again
//! after a repair pass. The repair pass is heuristic: a single-quoted value
//! that itself contains an apostrophe (`'patient's'`) is split at the
//! apostrophe and fails to decode.

use std::iter::Peekable;
use std::str::Chars;

use ai_client::{strip_code_fences, truncate_to_char_boundary};
use serde_json::Value;

use crate::error::DecodeError;

/// Bytes of offending text kept on a `DecodeError`.
const EXCERPT_BYTES: usize = 280;

/// Decode `text` into a JSON value. `context` names the call site in errors.
pub fn decode(text: &str, context: &str) -> Result<Value, DecodeError> {
    let stripped = strip_code_fences(text);
    if stripped.is_empty() {
        return Err(decode_error(context, "empty response", text));
    }

    if let Ok(value) = serde_json::from_str(stripped) {
        return Ok(value);
    }

    let candidate = if stripped.starts_with('{') {
        stripped
    } else {
        let span = object_span(stripped).unwrap_or(stripped);
        if let Ok(value) = serde_json::from_str(span) {
            return Ok(value);
        }
        span
    };

    let repaired = repair(candidate);
    serde_json::from_str(&repaired).map_err(|e| decode_error(context, &e.to_string(), text))
}

/// Greedy `{ ... }` span: first opening brace to last closing brace.
fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Fix the malformations models most often produce.
///
/// A single pass that tracks string literals: trailing commas before `}` or
/// `]` are dropped, bare object keys are quoted, smart-quote delimiters are
/// straightened and single-quoted strings become double-quoted. Text inside
/// string literals is copied unchanged.
pub fn repair(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut chars = text.chars().peekable();
    // Last non-whitespace character emitted outside a string.
    let mut last: Option<char> = None;

    while let Some(c) = chars.next() {
        match c {
            c if c == '"' || is_smart_double(c) => {
                copy_double_quoted(&mut chars, &mut out, c != '"');
                last = Some('"');
            }
            c if c == '\'' || is_smart_single(c) => {
                copy_single_quoted(&mut chars, &mut out, c != '\'');
                last = Some('"');
            }
            ',' if matches!(next_significant(&chars), Some('}' | ']')) => {}
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !(next.is_ascii_alphanumeric() || next == '_' || next == '-') {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                if matches!(last, Some('{' | ',')) && next_significant(&chars) == Some(':') {
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                    last = Some('"');
                } else {
                    out.push_str(&word);
                    last = Some(c);
                }
            }
            c => {
                out.push(c);
                if !c.is_whitespace() {
                    last = Some(c);
                }
            }
        }
    }

    out
}

fn next_significant(chars: &Peekable<Chars<'_>>) -> Option<char> {
    chars.clone().find(|c| !c.is_whitespace())
}

fn is_smart_double(c: char) -> bool {
    matches!(c, '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}')
}

fn is_smart_single(c: char) -> bool {
    matches!(c, '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}')
}

/// Copy a double-quoted literal whose opening quote was already consumed.
/// A literal opened with a smart quote also closes on one.
fn copy_double_quoted(chars: &mut Peekable<Chars<'_>>, out: &mut String, smart: bool) {
    out.push('"');
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '"' => break,
            c if smart && is_smart_double(c) => break,
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Rewrite a single-quoted literal as a double-quoted one.
///
/// The first closing quote ends the literal, so `'patient's'` splits at the
/// apostrophe. Inside `‘...’` a straight apostrophe is content.
fn copy_single_quoted(chars: &mut Peekable<Chars<'_>>, out: &mut String, smart: bool) {
    out.push('"');
    while let Some(c) = chars.next() {
        match c {
            '\'' if !smart => break,
            c if smart && is_smart_single(c) => break,
            '"' => out.push_str("\\\""),
            '\\' => match chars.next() {
                Some('\'') => out.push('\''),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push_str("\\\\"),
            },
            c => out.push(c),
        }
    }
    out.push('"');
}

fn decode_error(context: &str, reason: &str, text: &str) -> DecodeError {
    DecodeError {
        context: context.to_string(),
        reason: reason.to_string(),
        excerpt: truncate_to_char_boundary(text.trim(), EXCERPT_BYTES).to_string(),
    }
}
