use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use docweave_core::{
    BundleInfo, BundleInput, ConvertOptions, DocumentationContext, OutputFormat, Severity,
    SourceFile,
};
use std::path::{Path, PathBuf};

mod bundle;
mod config;
mod convert;
mod logging;

#[derive(Parser)]
#[command(name = "docweave", version, about = "Compile documentation bundles into HTML and markdown")]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FormatArg {
    Html,
    Markdown,
    Both,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Both => OutputFormat::Both,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum RenderFormat {
    Html,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a documentation bundle into pages
    Convert {
        /// Bundle directory (e.g. MyKit.docc)
        bundle: PathBuf,

        /// Output directory
        #[arg(long, short, default_value = "build")]
        output: PathBuf,

        /// Output format (overrides docweave.json)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Always add kind suffixes when disambiguating symbol paths
        #[arg(long)]
        legacy_disambiguation: bool,

        /// Path prefix the site is served under
        #[arg(long)]
        hosting_base_path: Option<String>,

        /// Watch the bundle and convert again on changes
        #[arg(long)]
        watch: bool,
    },

    /// Render a single markup file
    Render {
        /// Path to the .md or .tutorial file
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "markdown")]
        format: RenderFormat,
    },

    /// Resolve a documentation link against a bundle
    Resolve {
        /// Bundle directory
        bundle: PathBuf,

        /// Link such as `MyKit/Foo/bar()` or `doc://org.example.MyKit/documentation/MyKit/Foo`
        link: String,
    },

    /// List every symbol path in a bundle
    Links {
        /// Bundle directory
        bundle: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Convert {
            bundle,
            output,
            format,
            legacy_disambiguation,
            hosting_base_path,
            watch,
        } => {
            let opts = convert::ConvertOpts {
                bundle,
                output,
                format: format.map(OutputFormat::from),
                legacy_disambiguation,
                hosting_base_path,
                quiet: cli.quiet,
            };
            let report = convert::handle_convert(&opts)?;
            if !cli.quiet {
                report.print_summary(&opts.output);
            }
            if watch {
                convert::watch_and_convert(&opts)?;
            } else if report.has_errors() {
                std::process::exit(1);
            }
        }
        Commands::Render { file, format } => {
            handle_render(&file, format)?;
        }
        Commands::Resolve { bundle, link } => {
            handle_resolve(&bundle, &link)?;
        }
        Commands::Links { bundle } => {
            handle_links(&bundle)?;
        }
    }

    Ok(())
}

fn handle_render(file: &Path, format: RenderFormat) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read '{}'", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    let context = DocumentationContext::new(BundleInput {
        info: BundleInfo::default(),
        documents: vec![SourceFile::new(name.clone(), content)],
        ..BundleInput::default()
    });

    let mut has_errors = false;
    for diagnostic in context.diagnostics() {
        has_errors |= diagnostic.diagnostic.severity == Severity::Error;
        convert::print_diagnostic(diagnostic);
    }

    let Some(page) = context
        .pages()
        .find(|page| page.source.as_deref() == Some(name.as_str()))
    else {
        anyhow::bail!("'{}' did not produce a page", file.display());
    };

    let options = ConvertOptions {
        format: match format {
            RenderFormat::Html => OutputFormat::Html,
            RenderFormat::Markdown => OutputFormat::Markdown,
        },
        ..ConvertOptions::default()
    };
    let converted = docweave_core::convert::convert_page(&context, page, &options);
    let output = converted.html.or(converted.markdown).unwrap_or_default();
    println!("{output}");

    if has_errors {
        std::process::exit(1);
    }
    Ok(())
}

fn handle_resolve(bundle: &Path, link: &str) -> Result<()> {
    let opened = convert::open_bundle(bundle, false, None)?;
    match opened.context.resolve(link) {
        Some(path) => {
            println!("{path}");
            Ok(())
        }
        None => {
            eprintln!("{}: {}", link, "unresolved".red().bold());
            std::process::exit(1);
        }
    }
}

fn handle_links(bundle: &Path) -> Result<()> {
    let opened = convert::open_bundle(bundle, false, None)?;
    let index = opened.context.index();
    for (id, symbol) in index.symbols() {
        println!(
            "{}  {}",
            index.url_path(id),
            symbol.precise_identifier.dimmed()
        );
    }
    Ok(())
}
