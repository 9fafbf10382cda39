//! Quoted-string escapes.
//!
//! The escape set is JSON's: `\" \\ \/ \b \f \n \r \t \uXXXX`, with UTF-16
//! surrogate pairs combined.

use std::borrow::Cow;

/// Decode a quoted string token, quotes included.
pub fn decode_quoted(token_text: &str) -> Cow<'_, str> {
    let inner = token_text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token_text);
    unescape(inner)
}

/// Resolve escape sequences in the text between the quotes.
///
/// Total: input that failed [`validate_escapes`] decodes leniently (the
/// backslash is kept, lone surrogates become U+FFFD).
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some('/') => result.push('/'),
            Some('b') => result.push('\u{8}'),
            Some('f') => result.push('\u{c}'),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('u') => {
                let Some(high) = read_hex4(&mut chars) else {
                    result.push(char::REPLACEMENT_CHARACTER);
                    continue;
                };
                if (0xD800..0xDC00).contains(&high) {
                    let mut lookahead = chars.clone();
                    if lookahead.next() == Some('\\')
                        && lookahead.next() == Some('u')
                        && let Some(low) = read_hex4(&mut lookahead)
                        && (0xDC00..0xE000).contains(&low)
                    {
                        chars = lookahead;
                        let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                        result.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    } else {
                        result.push(char::REPLACEMENT_CHARACTER);
                    }
                } else {
                    result.push(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
            }
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    Cow::Owned(result)
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let mut code = 0;
    for _ in 0..4 {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}

/// Find invalid escape sequences. Returns `(byte offset, sequence)` pairs,
/// offsets relative to `text`.
pub fn validate_escapes(text: &str) -> Vec<(usize, String)> {
    let mut errors = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            continue;
        }
        match chars.next() {
            Some((_, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't')) => {}
            Some((_, 'u')) => {
                let mut count = 0;
                while count < 4 {
                    match chars.peek() {
                        Some((_, c)) if c.is_ascii_hexdigit() => {
                            chars.next();
                            count += 1;
                        }
                        _ => break,
                    }
                }
                if count != 4 {
                    let end = chars.peek().map(|(j, _)| *j).unwrap_or(text.len());
                    errors.push((i, text[i..end].to_string()));
                }
            }
            Some((_, c)) => errors.push((i, format!("\\{}", c))),
            None => errors.push((i, "\\".to_string())),
        }
    }

    errors
}
