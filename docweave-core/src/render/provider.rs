//! What the renderers need to know about the rest of the documentation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::markup::Markup;

/// How a linked page is titled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkedName {
    /// An article or tutorial title, rendered as plain text.
    Conceptual(String),
    /// A symbol name, rendered in code voice.
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkedElementNames {
    Single(LinkedName),
    /// A symbol whose name differs per source language, keyed by language id.
    LanguageSpecificSymbol(BTreeMap<String, String>),
}

/// A resolved link target.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedElement {
    /// The target's page path, e.g. `/documentation/MyKit/Foo`, optionally
    /// with a `#fragment`.
    pub path: String,
    pub names: LinkedElementNames,
    /// The target's abstract, shown after the link inside link lists.
    pub abstract_content: Vec<Markup>,
    /// Symbol kind identifier for symbols.
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorStyle {
    Light,
    Dark,
}

impl ColorStyle {
    pub fn media_query(self) -> &'static str {
        match self {
            Self::Light => "(prefers-color-scheme: light)",
            Self::Dark => "(prefers-color-scheme: dark)",
        }
    }
}

/// An image asset with its appearance and scale-factor variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAsset {
    /// URL per display scale, per color style.
    pub images: BTreeMap<ColorStyle, BTreeMap<u32, String>>,
}

impl LinkedAsset {
    /// The URL of the lowest-scale variant, preferring the light style.
    pub fn primary_url(&self) -> Option<&str> {
        self.images
            .values()
            .find_map(|scales| scales.values().next())
            .map(String::as_str)
    }
}

/// Link, asset and file lookups used while rendering one page.
///
/// Implementations must be read-only: pages are rendered concurrently.
pub trait LinkProvider: Sync {
    /// Resolve a link destination such as `doc:GettingStarted` or
    /// `doc://org.example.MyKit/documentation/MyKit/Foo`, authored on `page`.
    fn element(&self, destination: &str, page: &str) -> Option<LinkedElement>;

    /// Resolve a double-backtick symbol path, authored on `page`.
    fn symbol(&self, path: &str, page: &str) -> Option<LinkedElement>;

    /// Resolve a symbol by its precise identifier.
    fn symbol_by_precise_identifier(&self, precise: &str) -> Option<LinkedElement>;

    fn asset_named(&self, name: &str) -> Option<LinkedAsset>;

    /// Text for a link that could not be resolved.
    fn fallback_link_text(&self, _destination: &str) -> Option<String> {
        None
    }

    /// Contents of a file referenced by `@Snippet` or `@Code`.
    fn file_contents(&self, _path: &str) -> Option<String> {
        None
    }
}

/// Page-level settings shared by both renderers.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Path of the page being rendered, e.g. `/documentation/MyKit/Foo`.
    pub page_path: String,
    pub bundle_id: String,
    /// Source language whose tabs render inline.
    pub default_language: String,
}

impl RenderOptions {
    pub fn new(page_path: impl Into<String>, bundle_id: impl Into<String>) -> Self {
        Self {
            page_path: page_path.into(),
            bundle_id: bundle_id.into(),
            default_language: "swift".to_string(),
        }
    }
}

/// Text shown for an unresolved `doc:` link: its last path component.
pub fn last_path_component(destination: &str) -> &str {
    let path = destination
        .strip_prefix("doc://")
        .map(|rest| rest.find('/').map_or("", |slash| &rest[slash..]))
        .or_else(|| destination.strip_prefix("doc:"))
        .unwrap_or(destination);
    let path = path.split('#').next().unwrap_or(path);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fallback_text_is_last_component() {
        assert_eq!(last_path_component("doc:MyKit/Foo/bar()"), "bar()");
        assert_eq!(last_path_component("doc:GettingStarted"), "GettingStarted");
        assert_eq!(
            last_path_component("doc://org.example/documentation/MyKit/Foo#Topics"),
            "Foo"
        );
    }

    #[test]
    fn primary_url_prefers_light_low_scale() {
        let mut asset = LinkedAsset::default();
        asset
            .images
            .entry(ColorStyle::Dark)
            .or_default()
            .insert(1, "dark.png".into());
        asset
            .images
            .entry(ColorStyle::Light)
            .or_default()
            .insert(2, "light@2x.png".into());
        assert_eq!(asset.primary_url(), Some("light@2x.png"));
    }
}
