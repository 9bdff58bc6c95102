use std::sync::OnceLock;

use regex::Regex;

use crate::validate::check_url;

const BLOCKED_FRAGMENTS: [&str; 4] = ["javascript:", "data:", "vbscript:", "<script"];

fn inline_handler_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bon\w+\s*=").expect("inline handler pattern"))
}

/// Returns the normalized address if `raw` is safe to navigate to.
///
/// Only allowed schemes pass; script-bearing fragments and inline event handlers reject
/// the whole address.
pub fn sanitize_url(raw: &str) -> Option<String> {
    let lower = raw.trim().to_lowercase();
    if BLOCKED_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
        || inline_handler_pattern().is_match(&lower)
    {
        return None;
    }
    check_url(raw).ok().map(|url| url.to_string())
}

/// Escapes text for inclusion in markup.
pub fn sanitize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Reverses the common HTML entities found in imported titles.
pub fn decode_html_entities(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}
