//! Tags emitted in place of asset and image directives

use std::path::Path;

/// Site-absolute URL of a file under a public subfolder, always `/`-separated
pub fn public_path(folder: &Path, file: &str) -> String {
    let joined = folder.join(file);
    format!("/{}", joined.to_string_lossy().replace('\\', "/"))
}

pub fn stylesheet_tag(href: &str) -> String {
    format!(r#"<link rel="stylesheet" href="{}" />"#, href)
}

pub fn script_tag(src: &str) -> String {
    format!(r#"<script src="{}"></script>"#, src)
}

/// Markdown image reference, rendered later by the text renderer
pub fn image_markdown(src: &str, description: &str) -> String {
    format!("![{}]({})", description, src)
}
