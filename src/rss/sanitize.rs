//! Text sanitization for feed content.
//!
//! Free-text feed fields are cleaned in two passes: strip all markup with
//! an allow-nothing policy, then decode HTML entities. The order matters:
//! entity-encoded text such as `&lt;defer&gt;` must survive stripping as
//! literal text, which decoding first would prevent.

/// Sanitize a free-text feed field.
///
/// Already-clean text passes through unchanged, so sanitizing twice is a
/// no-op. Empty input yields empty output.
pub fn sanitize(input: &str) -> String {
    decode_entities(&strip_tags(input))
}

/// Remove all markup. Nothing is allowed through; only text content
/// outside tags survives.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;

    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    out
}

/// Decode HTML entities.
///
/// Named and numeric entities are decoded; unknown or unterminated
/// sequences are kept literally, which keeps decoding idempotent on
/// already-decoded text.
fn decode_entities(input: &str) -> String {
    // Longest decodable entity is a numeric one like "#x10FFFF"
    const MAX_ENTITY_LEN: usize = 8;

    let mut out = String::with_capacity(input.len());
    let mut entity: Option<String> = None;

    for ch in input.chars() {
        match entity.as_mut() {
            None => {
                if ch == '&' {
                    entity = Some(String::new());
                } else {
                    out.push(ch);
                }
            }
            Some(buf) => {
                if ch == ';' {
                    match decode_entity(buf) {
                        Some(decoded) => out.push(decoded),
                        None => {
                            out.push('&');
                            out.push_str(buf);
                            out.push(';');
                        }
                    }
                    entity = None;
                } else if ch == '&' {
                    // The previous run was not an entity; a new one may
                    // start at this ampersand
                    out.push('&');
                    out.push_str(buf);
                    buf.clear();
                } else if (ch.is_ascii_alphanumeric() || ch == '#') && buf.len() < MAX_ENTITY_LEN {
                    buf.push(ch);
                } else {
                    out.push('&');
                    out.push_str(buf);
                    out.push(ch);
                    entity = None;
                }
            }
        }
    }

    if let Some(buf) = entity {
        out.push('&');
        out.push_str(&buf);
    }

    out
}

/// Decode a single entity name (without `&` and `;`).
fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ if name.starts_with('#') => parse_numeric_entity(name).and_then(char::from_u32),
        _ => None,
    }
}

/// Parse a numeric entity name (e.g., "#123" or "#x7B").
fn parse_numeric_entity(name: &str) -> Option<u32> {
    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse().ok()
    } else {
        None
    }
}
