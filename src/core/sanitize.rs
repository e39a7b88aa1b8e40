// src/core/sanitize.rs
use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static LEADING_JUNK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-\s]+").unwrap());

pub fn strip_tags(s: &str) -> String {
    TAG_RE.replace_all(s, "").into_owned()
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Canonical form of a classification description.
///
/// Markup is removed, then the leading run of dashes/whitespace (the
/// source indents sub-levels with `- - `). Whitespace is collapsed, the
/// trailing colon dropped and the result upper-cased.
///
/// Colons are trimmed together with any whitespace between them so that
/// `"Other :"` and `"Other:"` agree and a second pass changes nothing.
pub fn normalize_description(raw: &str) -> String {
    let text = strip_tags(raw);
    let text = normalize_ws(&LEADING_JUNK_RE.replace(&text, ""));
    text.trim_end_matches(|c: char| c == ':' || c.is_whitespace())
        .to_uppercase()
}

/// Too generic to stand on its own in the output table.
pub fn is_vague(desc: &str) -> bool {
    desc == "OTHER" || desc.starts_with("FOR ") || desc.starts_with("OF ")
}
