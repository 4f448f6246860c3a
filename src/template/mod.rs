//! Template resolution engine
//!
//! A template is any text file. Lines are copied through unchanged unless
//! they carry a `<!-- ... -->` directive or a `{{name}}` reference.
//!
//! # Example
//!
//! ```text
//! <!-- css: site.css -->
//! <!-- heading = title_en -->
//! <h1>{{heading}}</h1>
//! <!-- include: footer.html -->
//! ```

mod resolver;
mod scope;

pub use resolver::{Compiler, MAX_REFERENCE_DEPTH};
pub use scope::RunScope;
