//! Language catalogs with two-tier lookup
//!
//! Every catalog maps variable names to localized text. Lookups go to the
//! active catalog first and to the fallback catalog second. A name ending
//! in `_<code>` pins the lookup to that language's catalog instead of the
//! active one.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

/// Index of a catalog inside a [`LanguageTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageId(usize);

/// One language's mapping from variable name to text
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    /// Short code, also used as the forcing suffix (`en` for `_en`)
    pub code: String,
    pub entries: HashMap<String, String>,
}

impl Catalog {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            entries: HashMap::new(),
        }
    }

    /// Add an entry
    pub fn with_entry(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(name.into(), text.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|s| s.as_str())
    }
}

/// Result of a two-tier lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// Found in the selected catalog
    Found(&'a str),
    /// Missing from the selected catalog, found in the fallback
    Fallback(&'a str),
    /// Missing from both
    Missing,
}

/// All catalogs of a compilation, read-only once built
#[derive(Debug, Clone)]
pub struct LanguageTable {
    catalogs: Vec<Catalog>,
    fallback: LanguageId,
}

impl LanguageTable {
    /// Build the table, injecting `year`, `month` and `day` from `today`
    /// into every catalog.
    ///
    /// Returns `None` if `fallback` is not the code of one of the catalogs.
    pub fn new(catalogs: Vec<Catalog>, fallback: &str, today: NaiveDate) -> Option<Self> {
        let fallback = catalogs.iter().position(|c| c.code == fallback)?;
        let mut catalogs = catalogs;
        for catalog in &mut catalogs {
            catalog
                .entries
                .insert("year".to_string(), today.year().to_string());
            catalog
                .entries
                .insert("month".to_string(), today.month().to_string());
            catalog
                .entries
                .insert("day".to_string(), today.day().to_string());
        }
        Some(Self {
            catalogs,
            fallback: LanguageId(fallback),
        })
    }

    /// Look up a catalog by code
    pub fn id(&self, code: &str) -> Option<LanguageId> {
        self.catalogs
            .iter()
            .position(|c| c.code == code)
            .map(LanguageId)
    }

    pub fn fallback(&self) -> LanguageId {
        self.fallback
    }

    pub fn catalog(&self, id: LanguageId) -> &Catalog {
        &self.catalogs[id.0]
    }

    pub fn catalogs(&self) -> &[Catalog] {
        &self.catalogs
    }

    /// Strip a language-forcing suffix, if the name carries one
    pub fn split_forced<'n>(&self, name: &'n str) -> (&'n str, Option<LanguageId>) {
        for (index, catalog) in self.catalogs.iter().enumerate() {
            let stem = name
                .strip_suffix(catalog.code.as_str())
                .and_then(|rest| rest.strip_suffix('_'));
            if let Some(stem) = stem.filter(|s| !s.is_empty()) {
                return (stem, Some(LanguageId(index)));
            }
        }
        (name, None)
    }

    /// Resolve a variable name for the given active language
    pub fn resolve(&self, name: &str, current: LanguageId) -> Lookup<'_> {
        let (name, forced) = self.split_forced(name);
        let selected = self.catalog(forced.unwrap_or(current));

        if let Some(text) = selected.get(name) {
            return Lookup::Found(text);
        }
        match self.catalog(self.fallback).get(name) {
            Some(text) => Lookup::Fallback(text),
            None => Lookup::Missing,
        }
    }
}
