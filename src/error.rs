//! Error types and line diagnostics

use std::path::PathBuf;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::config::ConfigError;
use crate::parser::ast::Span;

/// Fatal errors; any of these aborts the run
#[derive(Error, Debug)]
pub enum CompileError {
    /// A template, include, listing or asset source could not be read
    #[error("cannot read {}: {source}", path.display())]
    MissingFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Output could not be written
    #[error("cannot write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file includes itself, directly or through other files
    #[error("cyclic include detected: {chain}")]
    CyclicInclude { chain: String },

    /// The requested language has no catalog
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),

    /// The site configuration is unusable
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Resolved through the fallback language
    Warning,
    /// Could not be resolved; the rest of the line is left as written
    Error,
}

/// A non-fatal finding tied to one source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Template file the line came from
    pub file: String,
    /// 1-based line number
    pub line: usize,
    /// Byte range of the offending reference within `source_line`
    pub span: Span,
    pub source_line: String,
    pub message: String,
}

impl Diagnostic {
    /// Format the diagnostic with source context using ariadne
    pub fn format(&self) -> String {
        let mut buf = Vec::new();
        let location = format!("{}:{}", self.file, self.line);
        let (kind, color) = match self.severity {
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
            Severity::Error => (ReportKind::Error, Color::Red),
        };
        let written = Report::build(kind, location.as_str(), self.span.start)
            .with_message(&self.message)
            .with_label(
                Label::new((location.as_str(), self.span.clone()))
                    .with_message(&self.message)
                    .with_color(color),
            )
            .finish()
            .write(
                (location.as_str(), Source::from(self.source_line.as_str())),
                &mut buf,
            );
        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => format!("{}: {}", location, self.message),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}
