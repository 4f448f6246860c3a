//! Site configuration loaded from TOML
//!
//! The site file names the template and build directories, the entry files
//! to compile, minification switches, the language catalogs and the records
//! behind listing embeds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::language::{Catalog, LanguageTable};
use crate::listing::ListingRecord;

/// Errors that can occur when loading or validating a site file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read site file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse site TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid site configuration: {0}")]
    Invalid(String),
}

/// Directory layout, relative to the site root
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub templates: PathBuf,
    pub builds: PathBuf,
    pub css: PathBuf,
    pub js: PathBuf,
    pub images: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates: PathBuf::from("templates"),
            builds: PathBuf::from("builds"),
            css: PathBuf::from("css"),
            js: PathBuf::from("js"),
            images: PathBuf::from("images"),
        }
    }
}

/// What to build and how much to shrink it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Entry files, relative to the templates directory
    pub files: Vec<String>,
    pub minify_html: bool,
    pub minify_css: bool,
    pub minify_js: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            minify_html: true,
            minify_css: true,
            minify_js: true,
        }
    }
}

impl BuildConfig {
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    /// Turn every minifier on or off
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify_html = minify;
        self.minify_css = minify;
        self.minify_js = minify;
        self
    }
}

/// Language selection; both default to the first catalog
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub current: Option<String>,
    pub fallback: Option<String>,
}

/// Records for the built-in listing renderers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub publication: Vec<ListingRecord>,
    pub art: Vec<ListingRecord>,
}

/// A complete site configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory the relative paths are resolved against
    #[serde(skip)]
    pub root: PathBuf,
    pub paths: PathsConfig,
    pub build: BuildConfig,
    pub language: LanguageConfig,
    /// Catalog code -> variable name -> text
    pub text: BTreeMap<String, BTreeMap<String, toml::Value>>,
    pub listing: ListingConfig,
}

impl SiteConfig {
    /// Load a site file; relative paths resolve against its directory
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::from_str(&content)?.with_root(root))
    }

    /// Parse a site file from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = toml::from_str(content)?;
        if config.text.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [text.<code>] catalog is required".to_string(),
            ));
        }
        Ok(config)
    }

    /// Set the directory relative paths resolve against
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_build(mut self, build: BuildConfig) -> Self {
        self.build = build;
        self
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(&self.paths.templates)
    }

    pub fn builds_dir(&self) -> PathBuf {
        self.root.join(&self.paths.builds)
    }

    /// Source path of a template file
    pub fn template_path(&self, file: &str) -> PathBuf {
        self.templates_dir().join(file)
    }

    /// Output path mirroring a template file
    pub fn output_path(&self, file: &str) -> PathBuf {
        self.builds_dir().join(file)
    }

    /// Code of the language active at the start of a run
    pub fn current_language(&self) -> Option<&str> {
        self.language
            .current
            .as_deref()
            .or_else(|| self.text.keys().next().map(String::as_str))
    }

    /// Build the language table, stamping `today` into every catalog
    pub fn language_table(&self, today: NaiveDate) -> Result<LanguageTable, ConfigError> {
        let catalogs: Vec<Catalog> = self
            .text
            .iter()
            .map(|(code, entries)| Catalog {
                code: code.clone(),
                entries: entries
                    .iter()
                    .map(|(name, value)| (name.clone(), value_text(value)))
                    .collect(),
            })
            .collect();

        let fallback = self
            .language
            .fallback
            .clone()
            .or_else(|| self.text.keys().next().cloned())
            .ok_or_else(|| ConfigError::Invalid("no language catalogs".to_string()))?;

        if let Some(current) = self.current_language() {
            if !self.text.contains_key(current) {
                return Err(ConfigError::Invalid(format!(
                    "current language '{}' has no [text.{}] catalog",
                    current, current
                )));
            }
        }

        LanguageTable::new(catalogs, &fallback, today).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "fallback language '{}' has no [text.{}] catalog",
                fallback, fallback
            ))
        })
    }
}

/// Text of a catalog value; non-string scalars use their TOML form
fn value_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
