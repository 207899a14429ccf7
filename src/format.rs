//! String helpers shared by the model and render layers.
//!
//! Everything here is pure: no artifact access, no logging.

use pulldown_cmark::{Options, Parser, html};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Round `x` to `digits` decimals and print it without trailing zeros.
///
/// 0.33333 -> "0.333", 1.0 -> "1", 2.5 (digits = 0) -> "3"
pub fn round(x: f64, digits: u32) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    let scale = 10f64.powi(digits as i32);
    let scaled = x * scale;
    if !scaled.is_finite() {
        return x.to_string();
    }
    let r = scaled.round() / scale;
    // Avoid printing "-0".
    let r = if r == 0.0 { 0.0 } else { r };
    r.to_string()
}

/// Keep the head and tail of `text` when it is longer than `max` chars.
pub fn truncate_middle(text: &str, max: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max {
        return text.to_string();
    }
    let half = max / 2;
    let head: String = chars[..half].iter().collect();
    let tail: String = chars[chars.len() - half..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Render `text` as HTML, underlining words that do not occur in `orig`.
///
/// Words are split on single spaces, so runs of spaces survive the round trip.
pub fn highlight_new_words(text: &str, orig: &str) -> String {
    let orig_words: std::collections::HashSet<&str> = orig.split(' ').collect();
    text.split(' ')
        .map(|word| {
            if orig_words.contains(word) {
                escape_html(word)
            } else {
                format!("<u>{}</u>", escape_html(word))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Turn already-escaped HTML with embedded newlines into `<br>`-separated lines.
pub fn multiline_html(html: &str) -> String {
    html.replace('\n', "<br>\n")
}

/// Render a markdown description. A lone paragraph is unwrapped so the result
/// can sit inside a table cell or a `<span>`.
pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut out = String::new();
    html::push_html(&mut out, parser);

    let trimmed = out.trim_end();
    if let Some(inner) = trimmed
        .strip_prefix("<p>")
        .and_then(|s| s.strip_suffix("</p>"))
    {
        if !inner.contains("<p>") {
            return inner.to_string();
        }
    }
    trimmed.to_string()
}

/// Plain-text rendering of a JSON value: strings unquoted, everything else as JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `k=v,k=v` in the map's order.
pub fn render_dict(obj: &Map<String, Value>) -> String {
    obj.iter()
        .map(|(k, v)| format!("{}={}", k, value_text(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Remove the keys whose value is the same in every item.
///
/// Used to name several runs by the adapter settings where they differ.
pub fn find_diff(items: &[Map<String, Value>]) -> Vec<Map<String, Value>> {
    let Some(first) = items.first() else {
        return Vec::new();
    };
    let common: Vec<&String> = first
        .keys()
        .filter(|key| items.iter().all(|item| item.get(*key) == first.get(*key)))
        .collect();

    items
        .iter()
        .map(|item| {
            item.iter()
                .filter(|(k, _)| !common.contains(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .collect()
}

/// Ordered union of several lists.
pub fn canonicalize_list<T: PartialEq + Clone>(lists: &[Vec<T>]) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for list in lists {
        for elem in list {
            if !out.contains(elem) {
                out.push(elem.clone());
            }
        }
    }
    out
}

/// Order `list` by position in `reference`; items missing from it go last.
pub fn sort_by_reference_order(list: &mut [String], reference: &[String]) {
    list.sort_by_key(|x| {
        reference
            .iter()
            .position(|r| r == x)
            .unwrap_or(usize::MAX)
    });
}

/// Replace `${key}` occurrences with values from `environment`.
pub fn substitute(template: &str, environment: &BTreeMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in environment {
        out = out.replace(&format!("${{{}}}", key), value);
    }
    out
}

/// Join rendered items the way link bars are shown: `a | b | c`.
pub fn render_items(items: &[String]) -> String {
    items.join(" | ")
}
