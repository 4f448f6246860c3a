//! Template resolution - directive dispatch, recursive includes and
//! variable resolution with language fallback

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::assets::{write_file, AssetKind, AssetPipeline, FsAssetPipeline};
use crate::config::SiteConfig;
use crate::error::{CompileError, Diagnostic, Severity};
use crate::language::{LanguageTable, Lookup};
use crate::listing::{parse_listing, ListingRenderer, RecordListing};
use crate::minify::{BasicMinifier, Minifier, MinifyKind};
use crate::parser::ast::{Directive, ListingKind, Reference, Segment, Spanned};
use crate::parser::{has_markers, match_line, segments, REFERENCE_MARKER};
use crate::renderer::markup::{image_markdown, public_path};
use crate::renderer::text::render_text;

use super::scope::RunScope;

/// How deep text substituted for a reference may itself contain references
pub const MAX_REFERENCE_DEPTH: usize = 8;

/// The resolution engine for one compilation run.
///
/// Configuration and catalogs are borrowed read-only; everything the run
/// accumulates (aliases, rendered files, built assets) lives in its
/// [`RunScope`] and is dropped with the compiler.
pub struct Compiler<'a> {
    config: &'a SiteConfig,
    languages: &'a LanguageTable,
    assets: Box<dyn AssetPipeline + 'a>,
    publications: Box<dyn ListingRenderer + 'a>,
    arts: Box<dyn ListingRenderer + 'a>,
    minifier: Box<dyn Minifier + 'a>,
    scope: RunScope,
}

impl<'a> Compiler<'a> {
    /// Create a compiler with the file-system asset pipeline and the
    /// record-backed listing renderers from `config`
    pub fn new(config: &'a SiteConfig, languages: &'a LanguageTable) -> Result<Self, CompileError> {
        let current = match config.current_language() {
            Some(code) => languages
                .id(code)
                .ok_or_else(|| CompileError::UnknownLanguage(code.to_string()))?,
            None => languages.fallback(),
        };

        Ok(Self {
            config,
            languages,
            assets: Box::new(FsAssetPipeline::new(config, Box::new(BasicMinifier))),
            publications: Box::new(RecordListing::new(config.listing.publication.clone())),
            arts: Box::new(RecordListing::new(config.listing.art.clone())),
            minifier: Box::new(BasicMinifier),
            scope: RunScope::new(current),
        })
    }

    /// Replace the asset pipeline
    pub fn with_assets(mut self, assets: Box<dyn AssetPipeline + 'a>) -> Self {
        self.assets = assets;
        self
    }

    /// Replace the renderer behind one kind of listing embed
    pub fn with_listing(mut self, kind: ListingKind, renderer: Box<dyn ListingRenderer + 'a>) -> Self {
        match kind {
            ListingKind::Publication => self.publications = renderer,
            ListingKind::Art => self.arts = renderer,
        }
        self
    }

    /// Replace the minifier applied to compiled pages
    pub fn with_minifier(mut self, minifier: Box<dyn Minifier + 'a>) -> Self {
        self.minifier = minifier;
        self
    }

    /// Switch the active language
    pub fn set_language(&mut self, code: &str) -> Result<(), CompileError> {
        self.scope.current = self
            .languages
            .id(code)
            .ok_or_else(|| CompileError::UnknownLanguage(code.to_string()))?;
        Ok(())
    }

    /// Code of the active language
    pub fn language(&self) -> &str {
        &self.languages.catalog(self.scope.current).code
    }

    pub fn scope(&self) -> &RunScope {
        &self.scope
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.scope.diagnostics()
    }

    /// Render an entry file, minify it if configured and write it under
    /// the build directory
    pub fn compile(&mut self, file: &str) -> Result<String, CompileError> {
        let mut html = self.render(file)?;
        if self.config.build.minify_html {
            html = self.minifier.minify(MinifyKind::Html, &html);
        }
        let output = self.config.output_path(file);
        write_file(&output, &html)?;
        info!("Wrote {}", output.display());
        Ok(html)
    }

    /// Compile every configured build file, returning the written paths
    pub fn compile_all(&mut self) -> Result<Vec<PathBuf>, CompileError> {
        let config = self.config;
        let mut written = Vec::with_capacity(config.build.files.len());
        for file in &config.build.files {
            self.compile(file)?;
            written.push(config.output_path(file));
        }
        Ok(written)
    }

    /// Render a template file with all directives resolved.
    ///
    /// The first render of a file is cached for the rest of the run and
    /// returned as-is on later calls, without re-reading the source.
    pub fn render(&mut self, file: &str) -> Result<String, CompileError> {
        if let Some(html) = self.scope.rendered(file) {
            info!("Reusing rendered file: {}", file);
            return Ok(html.to_string());
        }

        if self.scope.is_resolving(file) {
            return Err(CompileError::CyclicInclude {
                chain: self.scope.chain_to(file),
            });
        }

        let source = read_source(&self.config.template_path(file))?;

        self.scope.start_resolving(file);
        let result = self.render_source(file, &source);
        self.scope.done_resolving(file);

        let html = result?;
        self.scope.store_rendered(file, html.clone());
        Ok(html)
    }

    fn render_source(&mut self, file: &str, source: &str) -> Result<String, CompileError> {
        let mut html = String::with_capacity(source.len());
        for (index, line) in source.split_inclusive('\n').enumerate() {
            self.render_line(file, index + 1, line, &mut html)?;
        }
        Ok(html)
    }

    fn render_line(
        &mut self,
        file: &str,
        line_no: usize,
        line: &str,
        html: &mut String,
    ) -> Result<(), CompileError> {
        if !has_markers(line) {
            html.push_str(line);
            return Ok(());
        }

        let ending = line_ending(line);
        let mut text = Cow::Borrowed(line);

        if let Some(directive) = match_line(line) {
            let terminal = directive.node.is_terminal();
            match directive.node {
                Directive::Assignment { alias, target } => {
                    debug!("Assigning {} = {}", alias, target);
                    self.scope.assign(alias, target);
                }
                Directive::Include { path } => {
                    info!("Including: {}", path);
                    let included = self.render(&path)?;
                    html.push_str(&included);
                }
                Directive::Stylesheet { path } => {
                    html.push_str(&self.embed_asset(AssetKind::Stylesheet, &path)?);
                    html.push_str(ending);
                }
                Directive::Script { path } => {
                    html.push_str(&self.embed_asset(AssetKind::Script, &path)?);
                    html.push_str(ending);
                }
                Directive::Image { path, description } => {
                    let description = self.resolve_variables(file, line_no, &description);
                    let src = public_path(&self.config.paths.images, &path);
                    let image = render_text(&image_markdown(&src, &description));
                    text = Cow::Owned(format!("{}{}", image, ending));
                }
                Directive::Listing { kind, path } => {
                    text = Cow::Owned(self.embed_listing(kind, &path)?);
                }
            }
            if terminal {
                return Ok(());
            }
        }

        let resolved = self.resolve_variables(file, line_no, &text);
        html.push_str(&resolved);
        Ok(())
    }

    /// Hand an asset to the pipeline once per run and return its tag
    fn embed_asset(&mut self, kind: AssetKind, file: &str) -> Result<String, CompileError> {
        if self.scope.mark_built(kind, file) {
            info!("Building {:?}: {}", kind, file);
            if !self.assets.process(kind, file)? {
                debug!("{} was already up to date", file);
            }
        } else {
            info!("Reusing built {:?}: {}", kind, file);
        }
        Ok(kind.tag(&kind.public_path(self.config, file)))
    }

    fn embed_listing(&mut self, kind: ListingKind, file: &str) -> Result<String, CompileError> {
        if let Some(html) = self.scope.embed(kind, file) {
            info!("Reusing {} listing: {}", kind, file);
            return Ok(html.to_string());
        }

        let source = read_source(&self.config.template_path(file))?;
        let (conditions, template) = parse_listing(&source);
        info!("Filling {} listing {} for {:?}", kind, file, conditions);

        let renderer = match kind {
            ListingKind::Publication => &self.publications,
            ListingKind::Art => &self.arts,
        };
        let html = renderer.fill_template(&conditions, &template);
        self.scope.store_embed(kind, file, html.clone());
        Ok(html)
    }

    /// Substitute every `{{name}}` in `text`, left to right.
    ///
    /// Substituted text is scanned again, so values may reference other
    /// variables. When a reference cannot be resolved, it and everything
    /// after it are left exactly as written.
    fn resolve_variables(&mut self, file: &str, line_no: usize, text: &str) -> String {
        if !text.contains(REFERENCE_MARKER) {
            return text.to_string();
        }

        // Texts the pending segments were cut from, for diagnostics
        let mut sources: Vec<String> = vec![text.to_string()];
        let mut pending: VecDeque<(Segment, usize, usize)> =
            segments(text).into_iter().map(|s| (s, 0, 0)).collect();
        let mut out = String::with_capacity(text.len());

        while let Some((segment, depth, source)) = pending.pop_front() {
            let reference = match segment {
                Segment::Literal(literal) => {
                    out.push_str(&literal);
                    continue;
                }
                Segment::Reference(reference) => reference,
            };

            let value = if depth >= MAX_REFERENCE_DEPTH {
                let message = format!(
                    "variable '{}' is nested more than {} levels deep",
                    reference.node.name, MAX_REFERENCE_DEPTH
                );
                self.report(Severity::Error, file, line_no, &sources[source], &reference, message);
                None
            } else {
                self.lookup(file, line_no, &sources[source], &reference)
            };

            let Some(value) = value else {
                out.push_str(&reference.node.raw);
                for (rest, _, _) in pending.drain(..) {
                    out.push_str(rest.raw());
                }
                break;
            };

            let value = render_text(&value);
            if value.contains(REFERENCE_MARKER) {
                let index = sources.len();
                for nested in segments(&value).into_iter().rev() {
                    pending.push_front((nested, depth + 1, index));
                }
                sources.push(value);
            } else {
                out.push_str(&value);
            }
        }

        out
    }

    /// Resolve one reference through aliases and the language table
    fn lookup(
        &mut self,
        file: &str,
        line_no: usize,
        source_line: &str,
        reference: &Spanned<Reference>,
    ) -> Option<String> {
        let languages = self.languages;
        let name = self.scope.redirect(&reference.node.name).to_string();

        match languages.resolve(&name, self.scope.current) {
            Lookup::Found(text) => Some(text.to_string()),
            Lookup::Fallback(text) => {
                let fallback = &languages.catalog(languages.fallback()).code;
                let message = format!(
                    "variable '{}' not found in the selected language, using '{}'",
                    name, fallback
                );
                self.report(Severity::Warning, file, line_no, source_line, reference, message);
                Some(text.to_string())
            }
            Lookup::Missing => {
                let message = format!("variable '{}' is not defined in any language", name);
                self.report(Severity::Error, file, line_no, source_line, reference, message);
                None
            }
        }
    }

    fn report(
        &mut self,
        severity: Severity,
        file: &str,
        line_no: usize,
        source_line: &str,
        reference: &Spanned<Reference>,
        message: String,
    ) {
        match severity {
            Severity::Warning => warn!("{}:{}: {}", file, line_no, message),
            Severity::Error => error!("{}:{}: {}", file, line_no, message),
        }
        self.scope.report(Diagnostic {
            severity,
            file: file.to_string(),
            line: line_no,
            span: reference.span.clone(),
            source_line: source_line.to_string(),
            message,
        });
    }
}

fn read_source(path: &Path) -> Result<String, CompileError> {
    fs::read_to_string(path).map_err(|source| CompileError::MissingFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Trailing `\n` or `\r\n` of a line, if any
fn line_ending(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const SITE: &str = r#"
[build]
minify_html = false

[language]
current = "cn"
fallback = "en"

[text.en]
title = "Hello"
name = "World"
motto = "English only"
greeting = "Hi {{name}}"
loop = "{{loop}}"

[text.cn]
title = "你好"
name = "世界"
"#;

    struct Site {
        _dir: TempDir,
        config: SiteConfig,
        languages: LanguageTable,
    }

    impl Site {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("tempdir");
            let config = SiteConfig::from_str(SITE)
                .expect("Should parse")
                .with_root(dir.path());
            let languages = config
                .language_table(NaiveDate::from_ymd_opt(2024, 5, 6).expect("valid date"))
                .expect("valid languages");
            Self {
                _dir: dir,
                config,
                languages,
            }
        }

        fn write(&self, file: &str, content: &str) {
            let path = self.config.template_path(file);
            fs::create_dir_all(path.parent().expect("has parent")).expect("mkdir");
            fs::write(path, content).expect("write");
        }

        fn compiler(&self) -> Compiler<'_> {
            Compiler::new(&self.config, &self.languages).expect("compiler")
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<(AssetKind, String)>>>);

    impl AssetPipeline for Recorder {
        fn process(&mut self, kind: AssetKind, file: &str) -> Result<bool, CompileError> {
            self.0.borrow_mut().push((kind, file.to_string()));
            Ok(true)
        }
    }

    /// Counts fills and remembers the last conditions
    #[derive(Clone, Default)]
    struct CountingListing {
        calls: Rc<Cell<usize>>,
        conditions: Rc<RefCell<Vec<String>>>,
    }

    impl ListingRenderer for CountingListing {
        fn fill_template(&self, conditions: &[String], template: &[String]) -> String {
            self.calls.set(self.calls.get() + 1);
            *self.conditions.borrow_mut() = conditions.to_vec();
            format!("L{}", template.len())
        }
    }

    #[test]
    fn test_plain_lines_pass_through() {
        let site = Site::new();
        site.write("a.html", "<p>plain</p>\nno newline");
        let html = site.compiler().render("a.html").expect("render");
        assert_eq!(html, "<p>plain</p>\nno newline");
    }

    #[test]
    fn test_current_language_and_fallback() {
        let site = Site::new();
        site.write("a.html", "<h1>{{title}}</h1>\n<p>{{motto}}</p>\n");
        let mut compiler = site.compiler();
        let html = compiler.render("a.html").expect("render");
        assert_eq!(html, "<h1>你好</h1>\n<p>English only</p>\n");

        let diagnostics = compiler.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].line, 2);
    }

    #[test]
    fn test_missing_everywhere_leaves_rest_of_line() {
        let site = Site::new();
        site.write("a.html", "{{title}} {{nope}} {{name}}\n{{name}}\n");
        let mut compiler = site.compiler();
        let html = compiler.render("a.html").expect("render");
        assert_eq!(html, "你好 {{nope}} {{name}}\n世界\n");

        let errors: Vec<_> = compiler
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span, 10..18);
        assert!(compiler.scope().has_errors());
    }

    #[test]
    fn test_alias_redirects_before_suffix() {
        let site = Site::new();
        site.write("a.html", "<!-- heading = title_en -->\n{{heading}}|{{title}}\n");
        let html = site.compiler().render("a.html").expect("render");
        assert_eq!(html, "Hello|你好\n");
    }

    #[test]
    fn test_nested_references() {
        let site = Site::new();
        site.write("a.html", "{{greeting}}\n");
        let html = site.compiler().render("a.html").expect("render");
        // name comes from the active language
        assert_eq!(html, "Hi 世界\n");
    }

    #[test]
    fn test_self_reference_stops() {
        let site = Site::new();
        site.write("a.html", "x {{loop}} y\n");
        let mut compiler = site.compiler();
        let html = compiler.render("a.html").expect("render");
        assert_eq!(html, "x {{loop}} y\n");
        assert!(compiler.scope().has_errors());
    }

    #[test]
    fn test_assets_built_once() {
        let site = Site::new();
        site.write(
            "a.html",
            "<!-- css: site.css -->\n<!-- css: site.css -->\n<!-- js: app.js -->\n",
        );
        let recorder = Recorder::default();
        let mut compiler = site.compiler().with_assets(Box::new(recorder.clone()));
        let html = compiler.render("a.html").expect("render");

        assert_eq!(
            html,
            concat!(
                "<link rel=\"stylesheet\" href=\"/css/site.css\" />\n",
                "<link rel=\"stylesheet\" href=\"/css/site.css\" />\n",
                "<script src=\"/js/app.js\"></script>\n"
            )
        );
        assert_eq!(
            *recorder.0.borrow(),
            vec![
                (AssetKind::Stylesheet, "site.css".to_string()),
                (AssetKind::Script, "app.js".to_string())
            ]
        );
    }

    #[test]
    fn test_image_embed() {
        let site = Site::new();
        site.write("a.html", "<!-- image: me.png | {{name_en}} -->\n");
        let html = site.compiler().render("a.html").expect("render");
        assert_eq!(html, "<img src=\"/images/me.png\" alt=\"World\" />\n");
    }

    #[test]
    fn test_cyclic_include_fails_fast() {
        let site = Site::new();
        site.write("a.html", "<!-- include: b.html -->\n");
        site.write("b.html", "<!-- include: a.html -->\n");
        let err = site.compiler().render("a.html").expect_err("cycle");
        match err {
            CompileError::CyclicInclude { chain } => {
                assert_eq!(chain, "a.html -> b.html -> a.html")
            }
            other => panic!("Expected CyclicInclude, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_include_is_fatal() {
        let site = Site::new();
        site.write("a.html", "top\n<!-- include: gone.html -->\n");
        let err = site.compiler().render("a.html").expect_err("missing");
        assert!(matches!(err, CompileError::MissingFile { .. }));
    }

    #[test]
    fn test_set_language() {
        let site = Site::new();
        let mut compiler = site.compiler();
        assert_eq!(compiler.language(), "cn");
        compiler.set_language("en").expect("en exists");
        assert_eq!(compiler.language(), "en");
        assert!(matches!(
            compiler.set_language("fr"),
            Err(CompileError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_crlf_endings_preserved() {
        let site = Site::new();
        site.write("a.html", "<!-- js: a.js -->\r\n{{title}}\r\n");
        let mut compiler = site
            .compiler()
            .with_assets(Box::new(Recorder::default()));
        let html = compiler.render("a.html").expect("render");
        assert_eq!(html, "<script src=\"/js/a.js\"></script>\r\n你好\r\n");
    }

    #[test]
    fn test_references_inside_comments() {
        let site = Site::new();
        site.write(
            "a.html",
            "<!--[if IE]><link href=\"{{title}}\"><![endif]-->\n<!-- (c) {{name}} -->\n",
        );
        let html = site.compiler().render("a.html").expect("render");
        assert_eq!(
            html,
            "<!--[if IE]><link href=\"你好\"><![endif]-->\n<!-- (c) 世界 -->\n"
        );
    }

    #[test]
    fn test_keyword_named_include_and_alias() {
        let site = Site::new();
        site.write("art", "ART\n");
        site.write("a.html", "<!-- include: art -->\n<!-- image = title_en -->\n{{image}}\n");
        let html = site.compiler().render("a.html").expect("render");
        assert_eq!(html, "ART\nHello\n");
    }

    #[test]
    fn test_listing_embed_filled_once() {
        let site = Site::new();
        site.write("gallery.html", "<!-- selected, oil -->\n<li>{{item.title}}</li>\n");
        site.write("a.html", "<!-- art: gallery.html -->\n<!-- art: gallery.html -->\n");

        let listing = CountingListing::default();
        let mut compiler = site
            .compiler()
            .with_listing(ListingKind::Art, Box::new(listing.clone()));
        let html = compiler.render("a.html").expect("render");

        assert_eq!(html, "L1L1");
        assert_eq!(listing.calls.get(), 1);
        assert_eq!(
            *listing.conditions.borrow(),
            vec!["selected".to_string(), "oil".to_string()]
        );
        assert_eq!(
            compiler.scope().embed(ListingKind::Art, "gallery.html"),
            Some("L1")
        );
    }
}
