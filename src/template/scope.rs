//! Per-run state of the resolution engine

use std::collections::{HashMap, HashSet};

use crate::assets::AssetKind;
use crate::error::{Diagnostic, Severity};
use crate::language::LanguageId;
use crate::parser::ast::ListingKind;

/// Everything one compilation run accumulates.
///
/// A scope is created per run and dropped with it; nothing here is shared
/// between runs.
#[derive(Debug, Clone)]
pub struct RunScope {
    /// Active language for unsuffixed references
    pub current: LanguageId,
    /// alias -> target variable name, last write wins
    assignments: HashMap<String, String>,
    /// file -> fully rendered text, first render wins
    rendered: HashMap<String, String>,
    /// listing sub-file -> rendered listing
    embeds: HashMap<(ListingKind, String), String>,
    /// Assets already handed to the pipeline
    built_assets: HashSet<(AssetKind, String)>,
    /// Files currently being rendered, outermost first (cycle detection)
    resolving: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl RunScope {
    pub fn new(current: LanguageId) -> Self {
        Self {
            current,
            assignments: HashMap::new(),
            rendered: HashMap::new(),
            embeds: HashMap::new(),
            built_assets: HashSet::new(),
            resolving: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn assign(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.assignments.insert(alias.into(), target.into());
    }

    /// Follow an alias one step; names without an alias map to themselves
    pub fn redirect<'n>(&'n self, name: &'n str) -> &'n str {
        self.assignments.get(name).map(|s| s.as_str()).unwrap_or(name)
    }

    pub fn rendered(&self, file: &str) -> Option<&str> {
        self.rendered.get(file).map(|s| s.as_str())
    }

    /// Store a rendered file; an existing entry is never replaced
    pub fn store_rendered(&mut self, file: &str, html: String) {
        self.rendered.entry(file.to_string()).or_insert(html);
    }

    pub fn embed(&self, kind: ListingKind, file: &str) -> Option<&str> {
        self.embeds
            .get(&(kind, file.to_string()))
            .map(|s| s.as_str())
    }

    pub fn store_embed(&mut self, kind: ListingKind, file: &str, html: String) {
        self.embeds.entry((kind, file.to_string())).or_insert(html);
    }

    /// Record an asset as built; returns false if it already was
    pub fn mark_built(&mut self, kind: AssetKind, file: &str) -> bool {
        self.built_assets.insert((kind, file.to_string()))
    }

    pub fn is_built(&self, kind: AssetKind, file: &str) -> bool {
        self.built_assets.contains(&(kind, file.to_string()))
    }

    /// Check if a file is currently being rendered (cycle detection)
    pub fn is_resolving(&self, file: &str) -> bool {
        self.resolving.iter().any(|f| f == file)
    }

    /// Mark a file as being rendered
    pub fn start_resolving(&mut self, file: &str) {
        self.resolving.push(file.to_string());
    }

    /// Mark a file as done rendering
    pub fn done_resolving(&mut self, file: &str) {
        if let Some(pos) = self.resolving.iter().rposition(|f| f == file) {
            self.resolving.remove(pos);
        }
    }

    /// Include chain from the outermost file to `file`, for error messages
    pub fn chain_to(&self, file: &str) -> String {
        let mut chain = self.resolving.clone();
        chain.push(file.to_string());
        chain.join(" -> ")
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{Catalog, LanguageTable};
    use chrono::NaiveDate;

    fn scope() -> RunScope {
        let table = LanguageTable::new(
            vec![Catalog::new("en")],
            "en",
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
        )
        .expect("fallback exists");
        RunScope::new(table.fallback())
    }

    #[test]
    fn test_assignment_last_write_wins() {
        let mut scope = scope();
        assert_eq!(scope.redirect("a"), "a");
        scope.assign("a", "b");
        scope.assign("a", "c");
        assert_eq!(scope.redirect("a"), "c");
    }

    #[test]
    fn test_first_render_wins() {
        let mut scope = scope();
        scope.store_rendered("f.html", "first".to_string());
        scope.store_rendered("f.html", "second".to_string());
        assert_eq!(scope.rendered("f.html"), Some("first"));
    }

    #[test]
    fn test_built_assets_monotonic() {
        let mut scope = scope();
        assert!(scope.mark_built(AssetKind::Stylesheet, "a.css"));
        assert!(!scope.mark_built(AssetKind::Stylesheet, "a.css"));
        assert!(scope.is_built(AssetKind::Stylesheet, "a.css"));
        assert!(!scope.is_built(AssetKind::Script, "a.css"));
    }

    #[test]
    fn test_resolving_chain() {
        let mut scope = scope();
        scope.start_resolving("a.html");
        scope.start_resolving("b.html");
        assert!(scope.is_resolving("a.html"));
        assert_eq!(scope.chain_to("a.html"), "a.html -> b.html -> a.html");
        scope.done_resolving("b.html");
        assert!(!scope.is_resolving("b.html"));
    }

    #[test]
    fn test_embeds_keyed_by_kind() {
        let mut scope = scope();
        scope.store_embed(ListingKind::Art, "x.html", "art".to_string());
        assert_eq!(scope.embed(ListingKind::Art, "x.html"), Some("art"));
        assert_eq!(scope.embed(ListingKind::Publication, "x.html"), None);
    }
}
