//! Marksmith - a template-to-markup compiler
//!
//! Templates are plain text files with two kinds of markers: directive
//! comments (`<!-- include: footer.html -->`, `<!-- css: site.css -->`,
//! `<!-- title = title_en -->`, ...) and variable references
//! (`{{title}}`). Variables come from per-language catalogs in the site
//! file and are rendered from Markdown.
//!
//! # Example
//!
//! ```rust,no_run
//! use marksmith::{render_file, SiteConfig};
//!
//! let config = SiteConfig::from_file("site.toml".as_ref()).unwrap();
//! let html = render_file(&config, "index.html").unwrap();
//! println!("{}", html);
//! ```

pub mod assets;
pub mod config;
pub mod error;
pub mod language;
pub mod listing;
pub mod minify;
pub mod parser;
pub mod renderer;
pub mod template;

pub use assets::{AssetKind, AssetPipeline, FsAssetPipeline};
pub use config::{BuildConfig, ConfigError, SiteConfig};
pub use error::{CompileError, Diagnostic, Severity};
pub use language::{Catalog, LanguageTable, Lookup};
pub use listing::{ListingRecord, ListingRenderer, RecordListing};
pub use minify::{BasicMinifier, Minifier, MinifyKind, NoMinifier};
pub use template::{Compiler, RunScope};

/// Today's date as stamped into the `year`, `month` and `day` variables
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Render one template with a fresh run, without writing anything
///
/// Assets referenced by the template are still built into the build
/// directory.
pub fn render_file(config: &SiteConfig, file: &str) -> Result<String, CompileError> {
    let languages = config.language_table(today())?;
    let mut compiler = Compiler::new(config, &languages)?;
    compiler.render(file)
}

/// Compile every configured build file with a fresh run
pub fn compile_site(config: &SiteConfig) -> Result<Vec<Diagnostic>, CompileError> {
    let languages = config.language_table(today())?;
    let mut compiler = Compiler::new(config, &languages)?;
    compiler.compile_all()?;
    Ok(compiler.diagnostics().to_vec())
}
