//! Marksmith CLI
//!
//! Usage:
//!   marksmith [OPTIONS] [FILES]...
//!
//! Options:
//!   -c, --config <FILE>  Site file (default: site.toml)
//!   -l, --lang <CODE>    Active language for the run
//!   --stdout             Print rendered output instead of writing files
//!   --no-minify          Disable HTML, CSS and JS minification
//!   -h, --help           Print help

use std::path::PathBuf;

use clap::Parser;
use log::info;

use marksmith::{today, Compiler, SiteConfig};

#[derive(Parser)]
#[command(name = "marksmith")]
#[command(about = "Compile templates with includes, assets and localized text into markup")]
struct Cli {
    /// Entry files relative to the templates directory (default: [build].files)
    files: Vec<String>,

    /// Site file (TOML format)
    #[arg(short, long, default_value = "site.toml")]
    config: PathBuf,

    /// Active language code for the run
    #[arg(short, long)]
    lang: Option<String>,

    /// Print rendered output instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Disable minification of pages, stylesheets and scripts
    #[arg(long)]
    no_minify: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match SiteConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading site file '{}': {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };
    if cli.no_minify {
        let build = config.build.clone().with_minify(false);
        config = config.with_build(build);
    }

    let languages = match config.language_table(today()) {
        Ok(languages) => languages,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut compiler = match Compiler::new(&config, &languages) {
        Ok(compiler) => compiler,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(lang) = &cli.lang {
        if let Err(e) = compiler.set_language(lang) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    let files = if cli.files.is_empty() {
        config.build.files.clone()
    } else {
        cli.files.clone()
    };
    if files.is_empty() {
        eprintln!("Error: no files to compile; list them in [build].files or on the command line");
        std::process::exit(1);
    }

    for file in &files {
        let result = if cli.stdout {
            compiler.render(file).map(|html| print!("{}", html))
        } else {
            compiler.compile(file).map(|_| ())
        };
        if let Err(e) = result {
            report_diagnostics(&compiler);
            eprintln!("Error compiling '{}': {}", file, e);
            std::process::exit(1);
        }
    }

    report_diagnostics(&compiler);
    info!(
        "Compiled {} file(s) in language '{}'",
        files.len(),
        compiler.language()
    );
}

fn report_diagnostics(compiler: &Compiler<'_>) {
    for diagnostic in compiler.diagnostics() {
        eprint!("{}", diagnostic.format());
    }
}
