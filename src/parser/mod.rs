//! Line scanning and directive parsing for templates

pub mod ast;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use grammar::{
    has_markers, match_line, parse_directive, segments, COMMENT_MARKER, REFERENCE_MARKER,
};
