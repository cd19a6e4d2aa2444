// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTML/plain-text conversion for artifact descriptions.
//!
//! The Hub stores HTML descriptions; the Tracker stores plain text. Pushing
//! strips markup, pulling re-encodes plain text into minimal HTML so the Hub
//! renders line breaks.

/// Strips markup from a Hub HTML description, yielding plain text.
///
/// Block-level closers and `<br>` become newlines; the handful of entities
/// the Hub editor emits are decoded. Unknown entities pass through verbatim.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut chars = html.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '<' => {
                let mut tag = String::new();
                for (_, t) in chars.by_ref() {
                    if t == '>' {
                        break;
                    }
                    tag.push(t);
                }
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                let closing = tag.starts_with('/');
                match name.as_str() {
                    "br" => out.push('\n'),
                    "p" | "div" | "li" | "tr" if closing => out.push('\n'),
                    _ => {}
                }
            }
            '&' => {
                let rest = &html[start..];
                match decode_entity(rest) {
                    Some((decoded, len)) => {
                        out.push_str(decoded);
                        // Skip the remainder of the entity.
                        for _ in 0..len - 1 {
                            chars.next();
                        }
                    }
                    None => out.push('&'),
                }
            }
            _ => out.push(c),
        }
    }

    // Collapse the trailing whitespace block tags leave behind.
    out.trim_end().to_string()
}

/// Encodes plain text as minimal HTML for a Hub description.
pub fn text_to_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br />"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Recognizes an entity at the start of `s`, returning the decoded text and
/// the entity's length in characters.
fn decode_entity(s: &str) -> Option<(&'static str, usize)> {
    const ENTITIES: [(&str, &str); 6] = [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&nbsp;", " "),
    ];
    for (entity, decoded) in ENTITIES {
        if s.starts_with(entity) {
            return Some((decoded, entity.len()));
        }
    }
    None
}

#[cfg(test)]
#[path = "htmltext_tests.rs"]
mod tests;
