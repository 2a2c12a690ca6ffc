//! Bundle discovery: walks a documentation directory and loads everything a
//! `DocumentationContext` is built from.

use anyhow::{Context, Result};
use docweave_core::{BundleInfo, BundleInput, Diagnostic, SourceDiagnostic, SourceFile, SymbolGraph};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::CONFIG_FILE;

const MARKUP_EXTENSIONS: &[&str] = &["md", "tutorial"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp"];
const SYMBOL_GRAPH_SUFFIX: &str = ".symbols.json";

/// A bundle read from disk.
#[derive(Debug)]
pub struct LoadedBundle {
    pub input: BundleInput,
    /// Image files to copy into the output, by file name.
    pub images: Vec<(String, PathBuf)>,
    /// Problems found while reading, such as malformed symbol graphs.
    pub diagnostics: Vec<SourceDiagnostic>,
}

/// Bundle-relative path with forward slashes.
fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

/// Whether a walk entry should be descended into: hidden files and the
/// output directory are skipped.
fn is_visible(entry: &walkdir::DirEntry, skip: Option<&Path>) -> bool {
    let hidden = entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.');
    let skipped = skip.is_some_and(|skip| entry.path().starts_with(skip));
    !hidden && !skipped
}

/// Load every markup file, symbol graph, image and source file under `root`.
///
/// `skip` excludes a directory, typically the conversion output when it
/// lives inside the bundle.
pub fn load_bundle(root: &Path, info: BundleInfo, skip: Option<&Path>) -> Result<LoadedBundle> {
    let mut input = BundleInput {
        info,
        ..BundleInput::default()
    };
    let mut images = Vec::new();
    let mut diagnostics = Vec::new();
    let mut files = BTreeMap::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| is_visible(entry, skip));
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = relative_name(root, path);
        let file_name = entry.file_name().to_string_lossy().to_string();

        if file_name == CONFIG_FILE {
            continue;
        }

        if file_name.ends_with(SYMBOL_GRAPH_SUFFIX) {
            match SymbolGraph::load(path) {
                Ok(graph) => input.symbol_graphs.push(graph),
                Err(error) => diagnostics.push(SourceDiagnostic {
                    source: name,
                    diagnostic: Diagnostic::from(error),
                }),
            }
            continue;
        }

        match extension(path).as_deref() {
            Some(ext) if MARKUP_EXTENSIONS.contains(&ext) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                input.documents.push(SourceFile::new(name, contents));
            }
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => {
                input.assets.push(file_name.clone());
                images.push((file_name, path.to_path_buf()));
            }
            _ => match std::fs::read_to_string(path) {
                Ok(contents) => {
                    files.insert(name, contents);
                }
                Err(error) => tracing::debug!(file = %path.display(), %error, "skipping unreadable file"),
            },
        }
    }
    input.files = files;

    tracing::info!(
        root = %root.display(),
        documents = input.documents.len(),
        symbol_graphs = input.symbol_graphs.len(),
        images = images.len(),
        "loaded bundle"
    );

    Ok(LoadedBundle {
        input,
        images,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_bundle(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("docweave-bundle-test").join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("Resources")).unwrap();
        dir
    }

    #[test]
    fn test_discovers_inputs_by_kind() {
        let root = temp_bundle("kinds");
        fs::write(root.join("Guide.md"), "# Guide\n").unwrap();
        fs::write(root.join("Intro.tutorial"), "@Tutorials(name: \"Kit\") {\n}\n").unwrap();
        fs::write(root.join("Resources/hero@2x.png"), [0u8, 1, 2]).unwrap();
        fs::write(root.join("Resources/example.swift"), "let x = 1\n").unwrap();
        fs::write(root.join("docweave.json"), "{}").unwrap();
        fs::write(
            root.join("MyKit.symbols.json"),
            r#"{ "module": { "name": "MyKit" }, "symbols": [] }"#,
        )
        .unwrap();
        fs::write(root.join(".hidden.md"), "# Hidden\n").unwrap();

        let bundle = load_bundle(&root, BundleInfo::new("b", "Kit"), None).unwrap();
        let documents: Vec<&str> = bundle.input.documents.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(documents, ["Guide.md", "Intro.tutorial"]);
        assert_eq!(bundle.input.symbol_graphs.len(), 1);
        assert_eq!(bundle.input.assets, ["hero@2x.png"]);
        assert_eq!(
            bundle.input.files.keys().collect::<Vec<_>>(),
            ["Resources/example.swift"]
        );
        assert!(bundle.diagnostics.is_empty());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_malformed_symbol_graph_is_a_diagnostic() {
        let root = temp_bundle("malformed");
        fs::write(root.join("Broken.symbols.json"), "{").unwrap();

        let bundle = load_bundle(&root, BundleInfo::default(), None).unwrap();
        assert!(bundle.input.symbol_graphs.is_empty());
        assert_eq!(bundle.diagnostics.len(), 1);
        assert_eq!(bundle.diagnostics[0].source, "Broken.symbols.json");
        assert_eq!(bundle.diagnostics[0].diagnostic.code.as_deref(), Some("E002"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_skips_output_directory() {
        let root = temp_bundle("skip");
        fs::create_dir_all(root.join("build/documentation")).unwrap();
        fs::write(root.join("build/documentation/index.md"), "# Old\n").unwrap();
        fs::write(root.join("Guide.md"), "# Guide\n").unwrap();

        let bundle = load_bundle(&root, BundleInfo::default(), Some(&root.join("build"))).unwrap();
        assert_eq!(bundle.input.documents.len(), 1);

        let _ = fs::remove_dir_all(&root);
    }
}
