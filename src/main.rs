//! docmd — generate Markdown API reference pages from a compiler XML
//! documentation export.
//!
//! Thin shell over the library: flags map straight onto [`RenderOptions`],
//! and the output destination picks the render mode:
//!
//! - **stdout mode**: `docmd export.xml`
//! - **directory mode**: `docmd export.xml -o docs/api`
//! - **single-file mode**: `docmd export.xml --single-file docs/api.md`

use anyhow::{Context, Result};
use clap::Parser;
use docmd::{FileNameStyle, RenderOptions, Renderer};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "docmd",
    about = "Generate Markdown API reference pages from an XML documentation export"
)]
struct Cli {
    /// XML documentation export to convert
    input: PathBuf,

    /// Output directory for per-type pages plus index.md
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Write one consolidated Markdown file instead of a directory
    #[arg(long, conflicts_with = "output")]
    single_file: Option<PathBuf>,

    /// File name style: verbatim or clean-generics
    #[arg(long, default_value = "verbatim")]
    file_names: String,

    /// Namespace prefix to trim from display names
    #[arg(long)]
    trim_namespace: Option<String>,

    /// Apply the namespace trim to generated file names too
    #[arg(long)]
    trim_namespace_in_file_names: bool,

    /// Language tag for fenced code blocks
    #[arg(long, default_value = "csharp")]
    code_language: String,

    /// Write a JSON report of the generated files
    #[arg(long)]
    report: Option<PathBuf>,
}

/// Machine-readable summary of one generation run.
#[derive(Serialize)]
struct Report {
    input: String,
    mode: &'static str,
    files: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_name_style = match cli.file_names.as_str() {
        "verbatim" => FileNameStyle::Verbatim,
        "clean-generics" => FileNameStyle::CleanGenerics,
        other => anyhow::bail!(
            "unknown file name style: {other}. Use verbatim or clean-generics"
        ),
    };

    let options = RenderOptions {
        file_name_style,
        root_namespace_to_trim: cli.trim_namespace.clone(),
        code_block_language: cli.code_language.clone(),
        trim_root_namespace_in_file_names: cli.trim_namespace_in_file_names,
    };

    let model = docmd::load(&cli.input)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;
    if model.types().next().is_none() {
        eprintln!("warning: no documented types in {}", cli.input.display());
    }

    let renderer = Renderer::new(&model, &options);

    let (mode, files): (&'static str, Vec<PathBuf>) = if let Some(dir) = cli.output.as_deref() {
        ("directory", renderer.to_directory(dir)?)
    } else if let Some(path) = cli.single_file.as_deref() {
        renderer.to_single_file(path)?;
        ("single-file", vec![path.to_path_buf()])
    } else {
        // No destination given: print the consolidated document.
        print!("{}", renderer.to_string());
        ("stdout", Vec::new())
    };

    if let Some(report_path) = cli.report.as_deref() {
        let report = Report {
            input: cli.input.display().to_string(),
            mode,
            files: files.iter().map(|p| p.display().to_string()).collect(),
        };
        fs::write(report_path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("failed to write report: {}", report_path.display()))?;
    }

    Ok(())
}
