//! Text normalization for provider output.
//!
//! Generated text routinely arrives with one or more layers of HTML entity
//! encoding (`&quot;`, `&amp;quot;`, numeric escapes). [`normalize`] peels
//! layers until the string stops changing, then trims surrounding
//! whitespace. Pure, no I/O.

use regex::Regex;
use std::sync::OnceLock;

/// Default safety cap on decode passes.
///
/// Termination is guaranteed by fixed-point equality; the cap only guards
/// against a decoder bug producing a non-converging cycle.
pub const DEFAULT_MAX_DECODE_PASSES: usize = 10;

fn numeric_entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"&#(\d{1,7});").unwrap())
}

/// Decode a single layer of entity encoding.
///
/// Named entities are decoded with `&amp;` last, so `&amp;lt;` needs a
/// second pass to become `<`. That is the layering [`normalize`] unwinds.
pub fn decode_entities_once(s: &str) -> String {
    let text = s
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&");

    numeric_entity_pattern()
        .replace_all(&text, |caps: &regex::Captures<'_>| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Repeatedly decode entity layers until a fixed point, then trim.
///
/// Blank input maps to the empty string.
pub fn normalize(s: &str) -> String {
    normalize_with_cap(s, DEFAULT_MAX_DECODE_PASSES)
}

/// [`normalize`] with an explicit pass cap (see `PipelineConfig`).
pub fn normalize_with_cap(s: &str, max_passes: usize) -> String {
    let mut current = s.to_string();
    for _ in 0..max_passes.max(1) {
        let decoded = decode_entities_once(&current);
        if decoded == current {
            break;
        }
        current = decoded;
    }
    current.trim().to_string()
}
