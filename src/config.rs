use anyhow::{Context, Result};
use docweave_core::{BundleInfo, OutputFormat};
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE: &str = "docweave.json";

/// Top-level docweave.json schema. Every field is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocweaveConfig {
    #[serde(default)]
    pub bundle_id: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default)]
    pub legacy_disambiguation: bool,

    #[serde(default)]
    pub hosting_base_path: Option<String>,

    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_language() -> String {
    "swift".to_string()
}

impl Default for DocweaveConfig {
    fn default() -> Self {
        Self {
            bundle_id: None,
            display_name: None,
            default_language: default_language(),
            legacy_disambiguation: false,
            hosting_base_path: None,
            output_format: OutputFormat::default(),
        }
    }
}

impl DocweaveConfig {
    /// Bundle identity, falling back to the directory name (`MyKit.docc` → `MyKit`).
    pub fn bundle_info(&self, bundle_root: &Path) -> BundleInfo {
        let directory_name = bundle_root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Documentation".to_string());
        let stem = directory_name
            .split('.')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("Documentation")
            .to_string();

        let display_name = self.display_name.clone().unwrap_or_else(|| stem.clone());
        BundleInfo {
            bundle_id: self.bundle_id.clone().unwrap_or(stem),
            display_name,
            default_language: self.default_language.clone(),
            legacy_disambiguation: self.legacy_disambiguation,
        }
    }
}

/// Load config from a docweave.json file, or return defaults if missing.
pub fn load_config(bundle_root: &Path) -> Result<DocweaveConfig> {
    let config_path = bundle_root.join(CONFIG_FILE);

    if config_path.exists() {
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: DocweaveConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        Ok(config)
    } else {
        Ok(DocweaveConfig::default())
    }
}
