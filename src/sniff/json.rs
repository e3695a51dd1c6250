//! Permissive JSON recogniser.
//!
//! A forward-scanning matcher over a reduced JSON grammar, keeping an
//! explicit stack of object/array nesting and ignoring everything else
//! about the content. Deliberately not a parser: the input buffer is a
//! bounded sample and may be truncated mid-document, so the matcher
//! accepts once enough tokens have matched rather than requiring a
//! balanced document.

use tracing::debug;

/// Tokens accepted once this many have matched.
const ACCEPT_THRESHOLD: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nest {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    String,
    Number,
    Literal,
    ObjectStart,
    ObjectMiddle,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Comma,
}

/// Legal opening tokens.
const AT_START: &[Token] = &[
    Token::ObjectStart,
    Token::ArrayStart,
    Token::String,
    Token::Number,
    Token::Literal,
];

/// Legal continuations inside an object.
const IN_OBJECT: &[Token] = &[
    Token::Comma,
    Token::ObjectMiddle,
    Token::ObjectEnd,
    Token::String,
    Token::Number,
    Token::ObjectStart,
    Token::ArrayStart,
    Token::Literal,
];

/// Legal continuations inside an array.
const IN_ARRAY: &[Token] = &[
    Token::String,
    Token::Number,
    Token::ObjectStart,
    Token::ArrayStart,
    Token::Literal,
    Token::Comma,
    Token::ArrayEnd,
];

/// Returns whether this text buffer (potentially truncated) is JSON.
pub fn is_json(buf: &str) -> bool {
    // the sample is read with universal newlines in mind
    let buf = buf.replace("\r\n", "\n");
    let mut pos = 0usize;
    let mut stack: Vec<Nest> = Vec::new();
    let mut matches = 0usize;

    while pos < buf.len() {
        let rest = &buf[pos..];
        let candidates = if pos == 0 {
            AT_START
        } else {
            match stack.last() {
                // content beyond the first token must be nested
                None => {
                    debug!("not JSON - unnested trailing content after {} matches", matches);
                    return false;
                }
                Some(Nest::Object) => IN_OBJECT,
                Some(Nest::Array) => IN_ARRAY,
            }
        };

        let mut hit = None;
        for &token in candidates {
            if let Some(len) = match_token(token, rest) {
                hit = Some((token, len));
                break;
            }
        }
        let Some((token, len)) = hit else {
            debug!("not JSON - {} matches", matches);
            return false;
        };

        match token {
            Token::ObjectStart => stack.push(Nest::Object),
            Token::ArrayStart => stack.push(Nest::Array),
            Token::ObjectEnd | Token::ArrayEnd => {
                stack.pop();
            }
            _ => {}
        }
        pos += len;
        matches += 1;
        if matches >= ACCEPT_THRESHOLD {
            debug!("JSON detected: {} matches", matches);
            return true;
        }
    }
    debug!("JSON detected: {} matches", matches);
    true
}

fn match_token(token: Token, rest: &str) -> Option<usize> {
    match token {
        Token::String => match_string(rest),
        Token::Number => match_number(rest),
        Token::Literal => match_literal(rest),
        Token::ObjectStart => {
            if rest.starts_with('{') {
                match_object_middle(&rest[1..]).map(|n| n + 1)
            } else {
                None
            }
        }
        Token::ObjectMiddle => match_object_middle(rest),
        Token::ObjectEnd => rest.starts_with('}').then_some(1),
        Token::ArrayStart => rest.starts_with('[').then_some(1),
        Token::ArrayEnd => rest.starts_with(']').then_some(1),
        Token::Comma => {
            if rest.starts_with(',') {
                Some(1 + one_whitespace(&rest.as_bytes()[1..]))
            } else {
                None
            }
        }
    }
}

/// `"..."` with no escape handling; the matcher only needs the span.
fn match_string(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let close = memchr::memchr(b'"', &bytes[1..])?;
    Some(close + 2)
}

/// `-?digits(.digits)?([eE][+-]?digits)?` with backtracking on a bare dot.
fn match_number(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0usize;
    if bytes.first() == Some(&b'-') {
        i += 1;
    }
    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == int_start {
        return None;
    }
    let mut end = i;
    if bytes.get(i) == Some(&b'.') {
        let mut j = i + 1;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > i + 1 {
            end = j;
        }
    }
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut j = end + 1;
        if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exp_start = j;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }
    Some(end)
}

fn match_literal(rest: &str) -> Option<usize> {
    for literal in ["true", "false", "null"] {
        if rest.starts_with(literal) {
            return Some(literal.len());
        }
    }
    None
}

/// `"key":` with one optional trailing whitespace.
fn match_object_middle(rest: &str) -> Option<usize> {
    let key_len = match_string(rest)?;
    let bytes = rest.as_bytes();
    if bytes.get(key_len) != Some(&b':') {
        return None;
    }
    let len = key_len + 1;
    Some(len + one_whitespace(&bytes[len..]))
}

fn one_whitespace(bytes: &[u8]) -> usize {
    usize::from(matches!(
        bytes.first(),
        Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | Some(0x0b) | Some(0x0c)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        assert!(is_json("5"));
        assert!(is_json("-5"));
        assert!(is_json("-5.4"));
        assert!(is_json("-5.4e5"));
        assert!(is_json("-5.4e-5"));
        assert!(!is_json("4."));
        assert!(is_json("\"hello\""));
        assert!(!is_json("hello\""));
    }

    #[test]
    fn arrays() {
        assert!(is_json("[\"hello\"]"));
        assert!(!is_json("\"hello\"]"));
        assert!(is_json("[5]"));
        assert!(is_json("[5, 6]"));
        assert!(is_json("[5,6]"));
        assert!(is_json("[\"cat\", 6]"));
    }

    #[test]
    fn objects() {
        assert!(is_json("{\"cat\": 6}"));
        assert!(is_json("{\"cat\":6}"));
        assert!(is_json("{\"cat\": \"bob\"}"));
        assert!(is_json("{\"cat\": [1, 2]}"));
        assert!(is_json("{\"cat\": [1, 2], \"dog\": 5, \"rabbit\": \"great\"}"));
    }

    #[test]
    fn unbalanced_nesting_is_rejected() {
        assert!(!is_json("{\"cat\": [1, 2}]"));
        assert!(is_json("[{\"cat\": [1]}, 2]"));
    }

    #[test]
    fn truncated_sample_is_accepted_after_enough_tokens() {
        // six tokens in, with the document still open
        assert!(is_json("{\"a\": 1, \"b\": 2, \"c\": ["));
    }

    #[test]
    fn crlf_is_normalised() {
        assert!(is_json("[1,\r\n2, 3, 4, 5, 6]"));
    }
}
