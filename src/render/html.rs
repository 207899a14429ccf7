use crate::format::escape_html;

use url::form_urlencoded;

/// Wrap a page body in a self-contained HTML document.
///
/// The template is filled with `replace` rather than `format!()`: the embedded
/// stylesheet is full of `{}` that would clash with Rust formatting.
pub fn render_document(title: &str, summary_html: &str, nav_html: &str, main_html: &str) -> String {
    const TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>__TITLE__</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; display: flex; gap: 24px; align-items: baseline; }
  nav a { margin-right: 12px; }
  main { padding: 12px 16px; }
  .summary { color: #555; font-size: 14px; }
  .muted { color: #888; }
  .technical-details { color: #888; font-size: 12px; }
  .help { cursor: help; color: #888; }
  .error { color: #b00020; }
  .table-container { margin: 16px 0; overflow-x: auto; }
  table { border-collapse: collapse; }
  td, th { border-bottom: 1px solid #eee; padding: 4px 8px; text-align: left; font-size: 14px; vertical-align: top; }
  .results-table thead td { font-weight: bold; border-bottom: 1px solid #ccc; }
  .instance-input { white-space: normal; margin: 4px 0 4px 16px; }
  .instance-reference { font-style: italic; }
  .prediction { margin: 4px 0 4px 16px; }
  .correct { color: #1b7f3b; font-weight: bold; }
  .wrong { color: #b00020; }
  .list-header { font-weight: bold; margin: 8px 0; }
  .list-item-todo { color: #aaa; }
  .columns { display: flex; gap: 32px; flex-wrap: wrap; }
  .columns > div { min-width: 240px; }
  details { margin: 4px 0; }
  pre { white-space: pre-wrap; font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: 13px; }
</style>
</head>
<body>
<header>
  <nav>__NAV__</nav>
  <div class="summary">__SUMMARY__</div>
</header>
<main>
__MAIN__
</main>
</body>
</html>
"#;

    TEMPLATE
        .replace("__TITLE__", &escape_html(title))
        .replace("__NAV__", nav_html)
        .replace("__SUMMARY__", summary_html)
        .replace("__MAIN__", main_html)
}

pub fn link(href: &str, inner_html: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape_html(href), inner_html)
}

pub fn link_titled(href: &str, title: &str, class: &str, inner_html: &str) -> String {
    format!(
        "<a href=\"{}\" title=\"{}\" class=\"{}\">{}</a>",
        escape_html(href),
        escape_html(title),
        class,
        inner_html
    )
}

/// `#name` with the name percent-encoded, for linking to an [`anchor`] or `id`.
pub fn fragment(name: &str) -> String {
    // byte_serialize writes spaces as `+` and a literal `+` as `%2B`.
    let encoded: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!("#{}", encoded.replace('+', "%20"))
}

/// An anchor target for `#name` links.
pub fn anchor(name: &str, inner_html: &str) -> String {
    format!("<a name=\"{}\">{}</a>", escape_html(name), inner_html)
}

pub fn help_icon(help: &str) -> String {
    format!("<span class=\"help\" title=\"{}\">&#9432;</span>", escape_html(help))
}

pub fn td(inner_html: &str) -> String {
    format!("<td>{}</td>", inner_html)
}

pub fn tr(cells: &[String]) -> String {
    format!("<tr>{}</tr>", cells.concat())
}

pub fn header(title: &str, body_html: &str) -> String {
    format!("<div><h4>{}</h4>{}</div>", escape_html(title), body_html)
}

/// A block shown in place of content that could not be loaded or matched.
pub fn placeholder(message: &str) -> String {
    format!("<div class=\"muted\">{}</div>", escape_html(message))
}

pub fn error_block(message: &str) -> String {
    format!("<div class=\"error\">{}</div>", escape_html(message))
}
