use once_cell::sync::Lazy;
use regex::Regex;

static BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p>|</li>|</h\d>").expect("invalid break regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("invalid tag regex"));
static BLANK_LINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n+").expect("invalid blank line regex"));

/// Remove HTML markup from an upstream description, keeping paragraph breaks.
pub fn strip_markup(input: &str) -> String {
    let with_breaks = BREAK_RE.replace_all(input, "\n");
    let without_tags = TAG_RE.replace_all(&with_breaks, "");
    let decoded = decode_entities(&without_tags);
    BLANK_LINES_RE
        .replace_all(decoded.trim(), "\n\n")
        .to_string()
}

fn decode_entities(input: &str) -> String {
    // `&amp;` last so already-decoded ampersands are not decoded twice.
    input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}
