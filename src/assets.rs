//! Stylesheet and script output
//!
//! The resolution engine decides *whether* an asset needs building (once
//! per run); an [`AssetPipeline`] decides *how*.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::SiteConfig;
use crate::error::CompileError;
use crate::minify::{Minifier, MinifyKind};
use crate::renderer::markup::{public_path, script_tag, stylesheet_tag};

/// Asset files recognised by directives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Stylesheet,
    Script,
}

impl AssetKind {
    /// Public subfolder of this kind of asset
    pub fn folder<'c>(&self, config: &'c SiteConfig) -> &'c Path {
        match self {
            AssetKind::Stylesheet => &config.paths.css,
            AssetKind::Script => &config.paths.js,
        }
    }

    pub fn minify_kind(&self) -> MinifyKind {
        match self {
            AssetKind::Stylesheet => MinifyKind::Css,
            AssetKind::Script => MinifyKind::Js,
        }
    }

    /// Tag that references the asset's public URL
    pub fn tag(&self, href: &str) -> String {
        match self {
            AssetKind::Stylesheet => stylesheet_tag(href),
            AssetKind::Script => script_tag(href),
        }
    }

    /// Public URL of an asset file
    pub fn public_path(&self, config: &SiteConfig, file: &str) -> String {
        public_path(self.folder(config), file)
    }
}

/// Transforms one asset source into its build output.
///
/// Called at most once per kind and path per run; returns whether new work
/// was performed.
pub trait AssetPipeline {
    fn process(&mut self, kind: AssetKind, file: &str) -> Result<bool, CompileError>;
}

/// Reads `<templates>/<folder>/<file>`, minifies, writes
/// `<builds>/<folder>/<file>`
pub struct FsAssetPipeline<'a> {
    config: &'a SiteConfig,
    minifier: Box<dyn Minifier + 'a>,
}

impl<'a> FsAssetPipeline<'a> {
    pub fn new(config: &'a SiteConfig, minifier: Box<dyn Minifier + 'a>) -> Self {
        Self { config, minifier }
    }

    fn source_path(&self, kind: AssetKind, file: &str) -> PathBuf {
        self.config
            .templates_dir()
            .join(kind.folder(self.config))
            .join(file)
    }

    fn output_path(&self, kind: AssetKind, file: &str) -> PathBuf {
        self.config
            .builds_dir()
            .join(kind.folder(self.config))
            .join(file)
    }

    fn should_minify(&self, kind: AssetKind, file: &str) -> bool {
        let enabled = match kind {
            AssetKind::Stylesheet => self.config.build.minify_css,
            AssetKind::Script => self.config.build.minify_js,
        };
        enabled && !file.contains(".min.")
    }
}

impl AssetPipeline for FsAssetPipeline<'_> {
    fn process(&mut self, kind: AssetKind, file: &str) -> Result<bool, CompileError> {
        let source_path = self.source_path(kind, file);
        let mut content =
            fs::read_to_string(&source_path).map_err(|source| CompileError::MissingFile {
                path: source_path.clone(),
                source,
            })?;

        if self.should_minify(kind, file) {
            info!("Minimizing {}", file);
            content = self.minifier.minify(kind.minify_kind(), &content);
        }

        let output_path = self.output_path(kind, file);
        write_file(&output_path, &content)?;
        Ok(true)
    }
}

/// Write a file, creating parent directories
pub fn write_file(path: &Path, content: &str) -> Result<(), CompileError> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
    };
    write().map_err(|source| CompileError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}
