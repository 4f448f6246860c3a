//! Markdown to inline markup

use log::warn;

/// Literal two-character sequence that becomes a line break
const LINE_BREAK: &str = "\\\\";

/// Render a localized text fragment to markup.
///
/// A literal `\\` becomes `<br />`, the result is converted from Markdown
/// (raw HTML allowed), and a single wrapping paragraph is removed.
pub fn render_text(text: &str) -> String {
    let text = text.replace(LINE_BREAK, "<br />");

    let options = markdown::Options {
        compile: markdown::CompileOptions {
            allow_dangerous_html: true,
            ..markdown::CompileOptions::default()
        },
        ..markdown::Options::default()
    };
    let html = match markdown::to_html_with_options(&text, &options) {
        Ok(html) => html,
        Err(_) => {
            warn!("Markdown conversion failed, escaping raw HTML: {}", text);
            markdown::to_html(&text)
        }
    };

    strip_paragraph(&html).to_string()
}

/// Remove a `<p>...</p>` wrapper when it is the only paragraph
pub fn strip_paragraph(html: &str) -> &str {
    let Some(inner) = html
        .strip_prefix("<p>")
        .and_then(|rest| rest.strip_suffix("</p>"))
    else {
        return html;
    };
    if inner.is_empty() || inner.contains("<p>") || inner.contains("</p>") {
        return html;
    }
    inner
}
