//! Structured-data renderers behind publication and art embeds
//!
//! A listing sub-file starts with a comment naming condition tags, e.g.
//! `<!-- selected, 2023 -->`; the rest of the file is the item template.
//! A [`ListingRenderer`] turns the conditions and template into markup.

use std::collections::BTreeMap;

use log::warn;
use serde::Deserialize;

use crate::parser::lexer::{lex_line, LineToken};

/// Placeholder prefix for record fields inside item templates
pub const FIELD_PREFIX: &str = "item.";

/// Fills an item template from a data source
pub trait ListingRenderer {
    fn fill_template(&self, conditions: &[String], template: &[String]) -> String;
}

/// One item of a listing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListingRecord {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl ListingRecord {
    /// A record matches when it carries every condition tag
    pub fn matches(&self, conditions: &[String]) -> bool {
        conditions.iter().all(|c| self.tags.iter().any(|t| t == c))
    }
}

/// Renders records held in memory, in configuration order
#[derive(Debug, Clone, Default)]
pub struct RecordListing {
    records: Vec<ListingRecord>,
}

impl RecordListing {
    pub fn new(records: Vec<ListingRecord>) -> Self {
        Self { records }
    }

    fn fill_record(&self, record: &ListingRecord, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut copied = 0;
        for (tok, span) in lex_line(line) {
            let LineToken::Reference(name) = tok else {
                continue;
            };
            let Some(field) = name.strip_prefix(FIELD_PREFIX) else {
                continue;
            };
            out.push_str(&line[copied..span.start]);
            match record.fields.get(field) {
                Some(value) => out.push_str(value),
                None => warn!("Listing record has no field '{}'", field),
            }
            copied = span.end;
        }
        out.push_str(&line[copied..]);
        out
    }
}

impl ListingRenderer for RecordListing {
    fn fill_template(&self, conditions: &[String], template: &[String]) -> String {
        let mut out = String::new();
        for record in self.records.iter().filter(|r| r.matches(conditions)) {
            for line in template {
                out.push_str(&self.fill_record(record, line));
            }
        }
        out
    }
}

/// Split a listing sub-file into its condition tags and item template
pub fn parse_listing(source: &str) -> (Vec<String>, Vec<String>) {
    let mut lines = source.split_inclusive('\n');
    let conditions = lines
        .next()
        .map(|first| {
            let first = first.trim();
            let first = first.strip_prefix("<!--").unwrap_or(first);
            let first = first.strip_suffix("-->").unwrap_or(first);
            first
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let template = lines.map(str::to_string).collect();
    (conditions, template)
}
