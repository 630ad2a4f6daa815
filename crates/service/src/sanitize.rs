//! Markup neutralization for stored free text.
//!
//! Every string field on a write path goes through [`clean`] before it is
//! persisted, so a record read back out never carries executable markup.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script regex"));
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("style regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)</?[a-zA-Z!/][^>]*>").expect("tag regex"));

/// Strip script/style elements with their content, strip remaining tags,
/// then entity-escape what is left.
pub fn clean(input: &str) -> String {
    let no_scripts = SCRIPT_BLOCK.replace_all(input, "");
    let no_styles = STYLE_BLOCK.replace_all(&no_scripts, "");
    let no_tags = TAG.replace_all(&no_styles, "");
    escape(&no_tags)
}

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
