use std::io;

use bytes::{BufMut, BytesMut};
use tokio::io::AsyncRead;
use tracing::trace;

use crate::lexer::{JsLexer, LexError, TokenKind};
use crate::reader::RewindReader;

/// Identifier substitutions applied before quoting. `undefined` and `NaN`
/// have no JSON equivalent and become `null`.
fn keyword_replacement(ident: &str) -> Option<&'static [u8]> {
    match ident {
        "true" => Some(b"true"),
        "false" => Some(b"false"),
        "null" | "undefined" | "NaN" => Some(b"null"),
        _ => None,
    }
}

fn matching_close(open: u8) -> u8 {
    if open == b'{' {
        b'}'
    } else {
        b']'
    }
}

/// Consumes one JavaScript object or array literal from `source`, which must
/// be positioned at its opening `{` or `[`, and converts it to JSON.
///
/// Returns the candidate bytes plus the exact count of source bytes the
/// lexer covered, which is how far the scanner must advance on success. The
/// candidate is *not* guaranteed to be valid JSON; the caller validates it.
/// `Ok(None)` means the region cannot be a value and the scanner should
/// rewind. Only upstream I/O failures surface as errors.
pub(crate) async fn read_js_value<R: AsyncRead + Unpin>(
    source: &mut RewindReader<R>,
    max_bytes: Option<usize>,
) -> Result<Option<(BytesMut, usize)>, io::Error> {
    let mut lexer = JsLexer::new(source);
    let mut buf = BytesMut::new();

    // The region is a Dyck word over the opening bracket kind: counting only
    // brackets equal to `first` is enough to find its end.
    let mut first: u8 = 0;
    let mut level: i32 = 0;

    // Most recent byte written to `buf`, for trailing-comma and `+` fixups.
    // Skipped tokens (whitespace, comments) never update it.
    let mut last_byte: u8 = 0;

    loop {
        let token = match lexer.next().await {
            Ok(Some(token)) => token,
            // EOF: hand back what we have, validation rejects incomplete
            // candidates.
            Ok(None) => break,
            Err(LexError::Io(err)) => return Err(err),
            Err(err) => {
                trace!(error = %err, "lexer rejected candidate region");
                return Ok(None);
            }
        };

        if first == 0 {
            first = token.text.as_bytes()[0];
        }
        if let Some(limit) = max_bytes {
            if lexer.consumed() > limit {
                trace!(limit, "candidate exceeded size limit");
                return Ok(None);
            }
        }

        match token.kind {
            TokenKind::Whitespace | TokenKind::LineTerminator | TokenKind::Comment => continue,
            TokenKind::Identifier => match keyword_replacement(&token.text) {
                Some(replacement) => buf.extend_from_slice(replacement),
                // Quoting Infinity would silently turn a number into a
                // string, so the whole value is dropped instead.
                None if token.text == "Infinity" => return Ok(None),
                // An unquoted object key: marshal it into a JSON string.
                None => {
                    if !write_json_string(&mut buf, &token.text) {
                        return Ok(None);
                    }
                }
            },
            TokenKind::Div => {
                // A '/' in value position can only start a regex; division
                // is an expression and those are rejected anyway.
                let regex = match lexer.read_regex(&token.text).await {
                    Ok(token) => token,
                    Err(LexError::Io(err)) => return Err(err),
                    Err(err) => {
                        trace!(error = %err, "expected regex after '/'");
                        return Ok(None);
                    }
                };
                // Regex literals are kept as plain strings rather than
                // throwing away the whole object.
                if !write_json_string(&mut buf, &regex.text) {
                    return Ok(None);
                }
            }
            TokenKind::Punctuator => {
                let text = token.text.as_bytes();
                if text.len() > 1 {
                    trace!(token = %token.text, "operator in value position");
                    return Ok(None);
                }
                match text[0] {
                    b @ (b'{' | b'[') => {
                        if b == first {
                            level += 1;
                        }
                        if last_byte == b'{' && b == b'{' {
                            // `{{` never occurs in a value.
                            return Ok(None);
                        }
                        buf.put_u8(b);
                    }
                    b @ (b'}' | b']') => {
                        if b == matching_close(first) {
                            level -= 1;
                        }
                        // Trailing comma, e.g. `[1, 2, 3, ]`.
                        if last_byte == b',' {
                            buf.truncate(buf.len() - 1);
                        }
                        buf.put_u8(b);
                        if level == 0 {
                            break;
                        }
                    }
                    b'+' => {
                        if last_byte.is_ascii_digit() {
                            // `1 + 1` is an expression, not a value.
                            return Ok(None);
                        }
                        buf.put_u8(b'+');
                    }
                    // Commonly a '-' before a number, or ':'/','.
                    b => buf.put_u8(b),
                }
            }
            TokenKind::Str => match token.text.as_bytes()[0] {
                b'"' => buf.extend_from_slice(token.text.as_bytes()),
                b'\'' => rewrite_single_quoted(&mut buf, &token.text),
                _ => return Ok(None),
            },
            TokenKind::Template => {
                if token.text.len() <= 2 {
                    return Ok(None);
                }
                let inner = unescape_backticks(&token.text[1..token.text.len() - 1]);
                if !write_json_string(&mut buf, &inner) {
                    return Ok(None);
                }
            }
            TokenKind::Number | TokenKind::BigInt => {
                // A leading '+' was already written as a punctuator; JSON
                // numbers cannot carry it.
                if last_byte == b'+' {
                    buf.truncate(buf.len() - 1);
                }
                let digits = if token.kind == TokenKind::BigInt {
                    token.text.trim_end_matches('n')
                } else {
                    token.text.as_str()
                };
                write_number(&mut buf, digits);
            }
            // Not produced by the token loop, but if it were, the regex
            // treatment above is the right one.
            TokenKind::Regex => {
                if !write_json_string(&mut buf, &token.text) {
                    return Ok(None);
                }
            }
        }

        if let Some(&b) = buf.last() {
            last_byte = b;
        }
    }

    Ok(Some((buf, lexer.consumed())))
}

/// Appends `s` JSON-encoded (quoted and escaped) to `buf`.
fn write_json_string(buf: &mut BytesMut, s: &str) -> bool {
    serde_json::to_writer((&mut *buf).writer(), s).is_ok()
}

/// Converts a single-quoted JavaScript string token to a double-quoted one:
/// `'` becomes `"`, inner `"` gets escaped, and `\'` loses its now-useless
/// escape. All other escape sequences pass through untouched.
fn rewrite_single_quoted(buf: &mut BytesMut, text: &str) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                buf.put_u8(b'"');
                i += 1;
            }
            b'"' => {
                buf.extend_from_slice(b"\\\"");
                i += 1;
            }
            b'\\' if bytes.get(i + 1) == Some(&b'\'') => {
                buf.put_u8(b'\'');
                i += 2;
            }
            b => {
                buf.put_u8(b);
                i += 1;
            }
        }
    }
}

/// Removes the escapes that only exist because of the backtick delimiters.
/// Everything else is re-escaped by the JSON string encoder afterwards.
fn unescape_backticks(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'`') {
            out.push('`');
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Writes a JavaScript numeric literal as a JSON number where possible.
///
/// Hex, octal and binary integers (and bigints, whose `n` suffix the caller
/// already stripped) are converted to base 10. Anything that does not parse
/// as an integer (floats, exponents) is passed through unchanged and left
/// to the JSON validator.
fn write_number(buf: &mut BytesMut, text: &str) {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'+') => (false, &text[1..]),
        Some(b'-') => (true, &text[1..]),
        _ => (false, text),
    };
    if negative {
        buf.put_u8(b'-');
    }

    let parsed = if let Some(hex) = strip_prefix2(digits, "0x", "0X") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = strip_prefix2(digits, "0o", "0O") {
        u64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = strip_prefix2(digits, "0b", "0B") {
        u64::from_str_radix(bin, 2).ok()
    } else {
        digits.parse::<u64>().ok()
    };

    match parsed {
        Some(n) => buf.extend_from_slice(n.to_string().as_bytes()),
        None => buf.extend_from_slice(digits.as_bytes()),
    }
}

fn strip_prefix2<'a>(s: &'a str, lower: &str, upper: &str) -> Option<&'a str> {
    s.strip_prefix(lower).or_else(|| s.strip_prefix(upper))
}
