//! Markup generation for resolved text and embedded assets
//!
//! `text` converts localized Markdown into inline markup; `markup` builds
//! the tags emitted for stylesheet, script and image directives.

pub mod markup;
pub mod text;

pub use markup::{image_markdown, public_path, script_tag, stylesheet_tag};
pub use text::{render_text, strip_paragraph};
