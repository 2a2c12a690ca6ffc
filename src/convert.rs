//! `docweave convert`: compile a documentation bundle into HTML and markdown pages.

use anyhow::{Context, Result};
use colored::Colorize;
use docweave_core::{
    ConvertOptions, DocumentationContext, OutputFormat, Severity, SourceDiagnostic, convert_bundle,
};
use notify::{EventKind, RecursiveMode, Watcher};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::bundle::load_bundle;
use crate::config::{DocweaveConfig, load_config};

pub struct ConvertOpts {
    pub bundle: PathBuf,
    pub output: PathBuf,
    /// Overrides the config file's `outputFormat`.
    pub format: Option<OutputFormat>,
    pub legacy_disambiguation: bool,
    pub hosting_base_path: Option<String>,
    pub quiet: bool,
}

#[derive(Debug, Default)]
pub struct ConvertReport {
    pub pages: usize,
    pub written: usize,
    pub unchanged: usize,
    pub images: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl ConvertReport {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn print_summary(&self, output: &Path) {
        let mut parts = vec![format!("{} pages", self.pages)];
        if self.written > 0 {
            parts.push(format!("{} written", self.written));
        }
        if self.unchanged > 0 {
            parts.push(format!("{} unchanged", self.unchanged));
        }
        if self.images > 0 {
            parts.push(format!("{} images", self.images));
        }
        println!(
            "{} {} → {}",
            "Converted".green().bold(),
            parts.join(", "),
            output.display()
        );

        if self.warnings > 0 || self.errors > 0 {
            println!(
                "  {} {}, {} {}",
                self.warnings,
                "warnings".yellow(),
                self.errors,
                "errors".red()
            );
        }
    }
}

/// A bundle's context plus the settings and load problems that came with it.
pub struct OpenedBundle {
    pub config: DocweaveConfig,
    pub context: DocumentationContext,
    pub images: Vec<(String, PathBuf)>,
    pub load_diagnostics: Vec<SourceDiagnostic>,
}

impl OpenedBundle {
    /// Load diagnostics followed by context diagnostics.
    pub fn diagnostics(&self) -> impl Iterator<Item = &SourceDiagnostic> {
        self.load_diagnostics
            .iter()
            .chain(self.context.diagnostics())
    }
}

pub fn open_bundle(root: &Path, legacy_disambiguation: bool, skip: Option<&Path>) -> Result<OpenedBundle> {
    if !root.is_dir() {
        anyhow::bail!("'{}' is not a directory", root.display());
    }
    let config = load_config(root)?;
    let mut info = config.bundle_info(root);
    info.legacy_disambiguation |= legacy_disambiguation;

    let loaded = load_bundle(root, info, skip)?;
    let context = DocumentationContext::new(loaded.input);
    Ok(OpenedBundle {
        config,
        context,
        images: loaded.images,
        load_diagnostics: loaded.diagnostics,
    })
}

pub fn handle_convert(opts: &ConvertOpts) -> Result<ConvertReport> {
    let root = fs::canonicalize(&opts.bundle)
        .with_context(|| format!("Cannot resolve path '{}'", opts.bundle.display()))?;
    let skip = fs::canonicalize(&opts.output).ok();
    let bundle = open_bundle(&root, opts.legacy_disambiguation, skip.as_deref())?;

    let mut report = ConvertReport::default();
    for diagnostic in bundle.diagnostics() {
        match diagnostic.diagnostic.severity {
            Severity::Error => report.errors += 1,
            Severity::Warning => report.warnings += 1,
            Severity::Info => {}
        }
        print_diagnostic(diagnostic);
    }

    let options = ConvertOptions {
        format: opts.format.unwrap_or(bundle.config.output_format),
        hosting_base_path: opts
            .hosting_base_path
            .clone()
            .or_else(|| bundle.config.hosting_base_path.clone()),
        ..ConvertOptions::default()
    };
    let output = convert_bundle(&bundle.context, &options);
    report.pages = output.pages.len();

    fs::create_dir_all(&opts.output)
        .with_context(|| format!("Failed to create '{}'", opts.output.display()))?;

    for page in &output.pages {
        let page_dir = opts.output.join(page.path.trim_start_matches('/'));
        if let Some(html) = &page.html {
            write_if_changed(&page_dir.join("index.html"), html.as_bytes(), &mut report)?;
        }
        if let Some(markdown) = &page.markdown {
            write_if_changed(&page_dir.join("index.md"), markdown.as_bytes(), &mut report)?;
        }
        if !opts.quiet {
            tracing::info!(page = %page.path, "converted");
        }
    }

    let image_dir = opts
        .output
        .join("images")
        .join(&bundle.context.info().bundle_id);
    for (name, path) in &bundle.images {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        write_if_changed(&image_dir.join(name), &bytes, &mut report)?;
        report.images += 1;
    }

    if options.format.includes_markdown() {
        let manifest = output
            .manifest
            .to_json()
            .context("Failed to serialize relationships")?;
        write_if_changed(
            &opts.output.join("relationships.json"),
            manifest.as_bytes(),
            &mut report,
        )?;
    }

    Ok(report)
}

/// Print one diagnostic to stderr as `file:line: severity: [code] message`.
pub fn print_diagnostic(diagnostic: &SourceDiagnostic) {
    let diag = &diagnostic.diagnostic;
    let severity_str = match diag.severity {
        Severity::Error => format!("{}", "error".red().bold()),
        Severity::Warning => format!("{}", "warning".yellow().bold()),
        Severity::Info => format!("{}", "info".cyan().bold()),
    };
    let line_info = match diag.span {
        Some(span) => format!("{}:{}", diagnostic.source, span.start_line),
        None => diagnostic.source.clone(),
    };
    let code_str = match &diag.code {
        Some(c) => format!("[{}] ", c),
        None => String::new(),
    };
    eprintln!("{line_info}: {severity_str}: {code_str}{}", diag.message);
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Write `contents` unless the file already holds the same bytes.
fn write_if_changed(path: &Path, contents: &[u8], report: &mut ConvertReport) -> Result<()> {
    if let Ok(existing) = fs::read(path) {
        if content_hash(&existing) == content_hash(contents) {
            report.unchanged += 1;
            return Ok(());
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write '{}'", path.display()))?;
    report.written += 1;
    Ok(())
}

/// Watch the bundle for changes and convert again on each save.
///
/// Debounces rapid events (e.g. editors that write in stages) with a 200ms
/// window. Changes inside the output directory are ignored. Ctrl+C exits.
pub fn watch_and_convert(opts: &ConvertOpts) -> Result<()> {
    let root = fs::canonicalize(&opts.bundle)
        .with_context(|| format!("Cannot resolve path '{}'", opts.bundle.display()))?;
    let output = fs::canonicalize(&opts.output).unwrap_or_else(|_| opts.output.clone());

    println!(
        "{} {} for changes (Ctrl+C to stop)",
        "Watching".cyan().bold(),
        opts.bundle.display()
    );

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    let mut last_convert = Instant::now();
    let debounce = Duration::from_millis(200);

    loop {
        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(event) => {
                let is_change = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );
                let affects_sources = event.paths.iter().any(|p| !p.starts_with(&output));

                if is_change && affects_sources && last_convert.elapsed() > debounce {
                    // Let the editor finish writing.
                    std::thread::sleep(Duration::from_millis(50));

                    match handle_convert(opts) {
                        Ok(report) => {
                            if !opts.quiet {
                                report.print_summary(&opts.output);
                            }
                            last_convert = Instant::now();
                        }
                        Err(e) => {
                            eprintln!("{} {:#}", "Convert error:".red().bold(), e);
                        }
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_hex_sha256() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_write_if_changed_skips_identical_content() {
        let dir = std::env::temp_dir().join("docweave-write-if-changed");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested/page.html");
        let mut report = ConvertReport::default();

        write_if_changed(&path, b"<p>one</p>", &mut report).unwrap();
        write_if_changed(&path, b"<p>one</p>", &mut report).unwrap();
        write_if_changed(&path, b"<p>two</p>", &mut report).unwrap();

        assert_eq!(report.written, 2);
        assert_eq!(report.unchanged, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>two</p>");
        let _ = fs::remove_dir_all(&dir);
    }
}
