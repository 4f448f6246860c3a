//! Whitespace and comment minifiers
//!
//! The transforms are line and character based, not parsers. Comment
//! markers are recognised anywhere, including inside strings; quoted CSS
//! strings keep their whitespace. Every transform is idempotent.

/// Kind of text being minified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinifyKind {
    Html,
    Css,
    Js,
}

/// Shrinks markup, stylesheets and scripts
pub trait Minifier {
    fn minify(&self, kind: MinifyKind, source: &str) -> String;
}

/// Built-in line-based minifier
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicMinifier;

impl Minifier for BasicMinifier {
    fn minify(&self, kind: MinifyKind, source: &str) -> String {
        match kind {
            MinifyKind::Html => minify_html(source),
            MinifyKind::Css => minify_css(source),
            MinifyKind::Js => minify_js(source),
        }
    }
}

/// Leaves everything untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMinifier;

impl Minifier for NoMinifier {
    fn minify(&self, _kind: MinifyKind, source: &str) -> String {
        source.to_string()
    }
}

/// Drop comments (except `<!--[if` conditionals), trim lines and drop
/// blank lines. `<pre>` blocks are kept verbatim.
fn minify_html(source: &str) -> String {
    let stripped = strip_html_comments(source);
    let mut lines = Vec::new();
    let mut in_pre = false;

    for line in stripped.lines() {
        if in_pre {
            lines.push(line);
        } else {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed);
            }
        }
        if line.contains("<pre") {
            in_pre = true;
        }
        if line.contains("</pre>") {
            in_pre = false;
        }
    }

    lines.join("\n")
}

fn strip_html_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("<!--") {
        let Some(len) = rest[start..].find("-->") else {
            break;
        };
        let end = start + len + 3;
        out.push_str(&rest[..start]);
        if rest[start..].starts_with("<!--[if") || rest[start..end].contains("<![endif]") {
            out.push_str(&rest[start..end]);
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

/// Drop `/* */` comments and collapse whitespace around punctuation,
/// leaving quoted strings untouched
fn minify_css(source: &str) -> String {
    let mut without_comments = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("/*") {
        without_comments.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(len) => rest = &rest[start + 2 + len + 2..],
            None => {
                rest = "";
            }
        }
    }
    without_comments.push_str(rest);

    let mut out = String::with_capacity(without_comments.len());
    let mut pending_space = false;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in without_comments.chars() {
        if let Some(open) = quote {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        let after_punct = out.ends_with(|c: char| matches!(c, '{' | '}' | ':' | ';' | ','));
        // A space before ':' separates a selector from a pseudo-class
        if matches!(ch, '{' | '}' | ';' | ',') {
            if ch == '}' && out.ends_with(';') {
                out.pop();
            }
            out.push(ch);
            pending_space = false;
            continue;
        }
        if pending_space && !out.is_empty() && !after_punct {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
        if matches!(ch, '"' | '\'') {
            quote = Some(ch);
        }
    }
    out
}

/// Trim lines and drop blank ones
fn minify_js(source: &str) -> String {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
