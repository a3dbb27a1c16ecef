//! XML Reference Expansion
//!
//! Two passes, always in this order:
//! - Predefined entities: &amp; &lt; &gt; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! Unknown or malformed references are left in place. Nothing here fails.
//! Uses Cow so text without references is never copied.

use memchr::{memchr, memchr2};
use std::borrow::Cow;

/// The five predefined markup entities and their replacement text
pub static PREDEFINED_ENTITIES: [(&str, &str); 5] = [
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
];

/// Look up a predefined entity. `reference` includes the `&` and `;`.
#[inline]
pub fn lookup_entity(reference: &str) -> Option<&'static str> {
    PREDEFINED_ENTITIES
        .iter()
        .find(|(name, _)| *name == reference)
        .map(|&(_, value)| value)
}

/// Expand both kinds of references, entities first
pub fn expand_references(input: &str) -> Cow<'_, str> {
    match expand_entities(input) {
        Cow::Borrowed(text) => expand_char_references(text),
        Cow::Owned(text) => {
            let expanded = match expand_char_references(&text) {
                Cow::Owned(expanded) => Some(expanded),
                Cow::Borrowed(_) => None,
            };
            Cow::Owned(expanded.unwrap_or(text))
        }
    }
}

/// Replace predefined entity references with their characters
pub fn expand_entities(input: &str) -> Cow<'_, str> {
    // Fast path: no '&' means nothing to expand
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        result.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let expanded = memchr(b';', rest.as_bytes())
            .and_then(|semi| lookup_entity(&rest[..=semi]).map(|value| (semi, value)));

        match expanded {
            Some((semi, value)) => {
                result.push_str(value);
                rest = &rest[semi + 1..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);

    Cow::Owned(result)
}

/// Replace `&#DDD;` and `&#xHHH;` references with the referenced character
pub fn expand_char_references(input: &str) -> Cow<'_, str> {
    if memchr::memmem::find(input.as_bytes(), b"&#").is_none() {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        result.push_str(&rest[..amp]);
        rest = &rest[amp..];

        match decode_char_reference(rest) {
            Some((len, c)) => {
                result.push(c);
                rest = &rest[len..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);

    Cow::Owned(result)
}

/// Decode a character reference at the start of `input`.
/// Returns the reference length in bytes and the decoded char.
fn decode_char_reference(input: &str) -> Option<(usize, char)> {
    let body = input.strip_prefix("&#")?;

    let (digits, radix, prefix_len) = match body.strip_prefix('x') {
        Some(hex) => (hex, 16, 3),
        None => (body, 10, 2),
    };

    let len = digits
        .bytes()
        .position(|b| !(b as char).is_digit(radix))
        .unwrap_or(digits.len());
    if len == 0 || digits.as_bytes().get(len) != Some(&b';') {
        return None;
    }

    let codepoint = u32::from_str_radix(&digits[..len], radix).ok()?;
    let c = char::from_u32(codepoint)?;

    Some((prefix_len + len + 1, c))
}

/// Canonicalize `\r\n` and lone `\r` to `\n`
pub fn normalize_line_endings(input: Cow<'_, str>) -> Cow<'_, str> {
    if memchr(b'\r', input.as_bytes()).is_none() {
        return input;
    }

    let mut result = String::with_capacity(input.len());
    let mut rest: &str = &input;

    while let Some(br) = memchr2(b'\r', b'\n', rest.as_bytes()) {
        result.push_str(&rest[..br]);
        result.push('\n');
        rest = if rest[br..].starts_with("\r\n") {
            &rest[br + 2..]
        } else {
            &rest[br + 1..]
        };
    }
    result.push_str(rest);

    Cow::Owned(result)
}
