use std::sync::OnceLock;

use regex::Regex;

fn line_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn inline_ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\S\n]+").unwrap())
}

/// Strip markup from feed text.
///
/// Entities are decoded first so escaped tags are removed too. `<br>` variants become
/// newlines, any remaining `<...>` span is dropped, whitespace runs collapse to one
/// space, and blank lines are removed.
pub fn clean_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let with_breaks = line_break_re().replace_all(&decoded, "\n");
    let stripped = tag_re().replace_all(&with_breaks, "");

    stripped
        .lines()
        .map(|line| inline_ws_re().replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
