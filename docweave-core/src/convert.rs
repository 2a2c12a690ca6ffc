//! Page conversion: breadcrumbs, a standalone HTML document and a markdown
//! document for every page of a [`DocumentationContext`].

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::context::{DocumentationContext, Page, SourceDiagnostic};
use crate::graph::NodeKind;
use crate::hierarchy::RenderHierarchyTranslator;
use crate::manifest::{Relationship, RelationshipManifest};
use crate::markup::plain_text;
use crate::render::{
    HtmlRenderer, MarkdownRenderer, RenderNode, RenderOptions, escape_html, relative_path, to_html,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Html,
    Markdown,
    #[default]
    Both,
}

impl OutputFormat {
    pub fn includes_html(self) -> bool {
        matches!(self, Self::Html | Self::Both)
    }

    pub fn includes_markdown(self) -> bool {
        matches!(self, Self::Markdown | Self::Both)
    }
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub format: OutputFormat,
    /// Prefix of the published site, used for canonical URLs, e.g. `/docs`.
    pub hosting_base_path: Option<String>,
    /// Value of the `lang` attribute of HTML pages.
    pub lang: String,
    /// Worker threads; `None` uses the available parallelism.
    pub threads: Option<NonZeroUsize>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            hosting_base_path: None,
            lang: "en".to_string(),
            threads: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub title: String,
    /// Page path, with a fragment for volumes and chapters.
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ConvertedPage {
    pub path: String,
    pub title: String,
    pub kind: NodeKind,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub html: Option<String>,
    pub markdown: Option<String>,
    pub relationships: BTreeSet<Relationship>,
}

#[derive(Debug, Clone)]
pub struct ConvertOutput {
    /// Pages in path order.
    pub pages: Vec<ConvertedPage>,
    pub manifest: RelationshipManifest,
    pub diagnostics: Vec<SourceDiagnostic>,
}

/// Convert every page of the bundle, spreading pages over scoped threads.
pub fn convert_bundle(context: &DocumentationContext, options: &ConvertOptions) -> ConvertOutput {
    let pages: Vec<&Page> = context.pages().collect();
    let threads = options
        .threads
        .or_else(|| std::thread::available_parallelism().ok())
        .map_or(1, NonZeroUsize::get)
        .clamp(1, pages.len().max(1));
    let chunk_size = pages.len().div_ceil(threads).max(1);

    let converted: Vec<ConvertedPage> = std::thread::scope(|scope| {
        let workers: Vec<_> = pages
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|page| convert_page(context, page, options))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|worker| {
                worker
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    });

    let mut manifest = RelationshipManifest::new(&context.info().bundle_id);
    for page in &converted {
        manifest.extend(page.relationships.iter().cloned());
    }
    tracing::info!(
        pages = converted.len(),
        relationships = manifest.len(),
        threads,
        "converted bundle"
    );

    ConvertOutput {
        pages: converted,
        manifest,
        diagnostics: context.diagnostics().to_vec(),
    }
}

/// Convert one page. Rendering never fails; unresolved links degrade to text.
#[tracing::instrument(level = "debug", skip_all, fields(page = %page.path()))]
pub fn convert_page(
    context: &DocumentationContext,
    page: &Page,
    options: &ConvertOptions,
) -> ConvertedPage {
    let info = context.info();
    let mut render_options = RenderOptions::new(page.path(), &info.bundle_id);
    render_options.default_language = info.default_language.clone();
    let breadcrumbs = breadcrumbs(context, page);

    let html = options.format.includes_html().then(|| {
        let body = to_html(&HtmlRenderer::new(context, &render_options).render_document(&page.blocks));
        html_page(context, page, &breadcrumbs, &body, options)
    });

    let (markdown, relationships) = if options.format.includes_markdown() {
        let output = MarkdownRenderer::new(context, &render_options).render_document(&page.blocks);
        (Some(output.markdown), output.relationships)
    } else {
        (None, BTreeSet::new())
    };

    ConvertedPage {
        path: page.path().to_string(),
        title: page.title.clone(),
        kind: page.kind,
        breadcrumbs,
        html,
        markdown,
        relationships,
    }
}

/// The canonical curation path to `page`, root first, excluding the page.
pub fn breadcrumbs(context: &DocumentationContext, page: &Page) -> Vec<Breadcrumb> {
    let graph = context.graph();
    let Some(node) = context.node_of(page) else {
        return Vec::new();
    };
    let mut translator = RenderHierarchyTranslator::new(graph);
    let path = if page.kind.is_tutorial_content() {
        translator
            .visit_technology_node(node, true)
            .and_then(|hierarchy| hierarchy.paths.into_iter().next())
            .unwrap_or_default()
    } else {
        translator.visit_reference_node(node).canonical_path().to_vec()
    };
    path.into_iter()
        .map(|reference| Breadcrumb {
            title: graph
                .id_of(&reference)
                .map(|id| graph.node(id).title.clone())
                .unwrap_or_else(|| reference.path.clone()),
            path: reference.path_and_fragment(),
        })
        .collect()
}

fn breadcrumb_nav(page: &Page, breadcrumbs: &[Breadcrumb]) -> RenderNode {
    let mut items: Vec<RenderNode> = breadcrumbs
        .iter()
        .map(|crumb| {
            RenderNode::element(
                "li",
                vec![RenderNode::element_with(
                    "a",
                    [("href", relative_path(page.path(), &crumb.path))],
                    vec![RenderNode::text(crumb.title.as_str())],
                )],
            )
        })
        .collect();
    items.push(RenderNode::element_with(
        "li",
        [("aria-current", "page")],
        vec![RenderNode::text(page.title.as_str())],
    ));
    RenderNode::element_with(
        "nav",
        [("aria-label", "Breadcrumbs"), ("class", "breadcrumbs")],
        vec![RenderNode::element("ol", items)],
    )
}

fn kind_class(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Module => "module",
        NodeKind::Symbol => "symbol",
        NodeKind::Article | NodeKind::Landmark => "article",
        NodeKind::TechnologyRoot => "technology-root",
        NodeKind::TutorialTableOfContents => "tutorials",
        NodeKind::Volume | NodeKind::Chapter => "chapter",
        NodeKind::Tutorial => "tutorial",
        NodeKind::TutorialArticle => "tutorial-article",
    }
}

fn html_page(
    context: &DocumentationContext,
    page: &Page,
    breadcrumbs: &[Breadcrumb],
    body: &str,
    options: &ConvertOptions,
) -> String {
    let info = context.info();
    let title = if info.display_name.is_empty() || info.display_name == page.title {
        page.title.clone()
    } else {
        format!("{} | {}", page.title, info.display_name)
    };

    let mut meta_extra = String::new();
    let description = plain_text(&page.abstract_content);
    if !description.trim().is_empty() {
        meta_extra.push_str(&format!(
            "\n    <meta name=\"description\" content=\"{}\">",
            escape_html(description.trim())
        ));
    }
    if let Some(base) = &options.hosting_base_path {
        meta_extra.push_str(&format!(
            "\n    <link rel=\"canonical\" href=\"{}{}\">",
            escape_html(base.trim_end_matches('/')),
            escape_html(page.path())
        ));
    }

    let nav = if breadcrumbs.is_empty() {
        String::new()
    } else {
        format!("\n{}", breadcrumb_nav(page, breadcrumbs).to_html())
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="generator" content="docweave">
    <title>{title}</title>{meta_extra}
    <style>{css}</style>
</head>
<body>{nav}
<main>
<article class="docweave {kind}">
{body}
</article>
</main>
</body>
</html>
"#,
        lang = escape_html(&options.lang),
        title = escape_html(&title),
        css = PAGE_CSS,
        kind = kind_class(page.kind),
    )
}

/// Embedded CSS for standalone pages.
const PAGE_CSS: &str = r#"
:root {
    --bg: #ffffff;
    --text: #1d1d1f;
    --text-muted: #6e6e73;
    --accent: #0066cc;
    --border: #d2d2d7;
    --code-bg: #f5f5f7;
    --font: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
    --mono: "SF Mono", Menlo, Consolas, monospace;
}
@media (prefers-color-scheme: dark) {
    :root {
        --bg: #1d1d1f;
        --text: #f5f5f7;
        --text-muted: #a1a1a6;
        --accent: #2997ff;
        --border: #424245;
        --code-bg: #2c2c2e;
    }
}
body { margin: 0; background: var(--bg); color: var(--text); font: 17px/1.5 var(--font); }
main { max-width: 980px; margin: 0 auto; padding: 2rem 1.5rem; }
a { color: var(--accent); text-decoration: none; }
a:hover { text-decoration: underline; }
code, pre { font-family: var(--mono); font-size: 0.9em; }
pre { background: var(--code-bg); padding: 1rem; border-radius: 8px; overflow-x: auto; }
table { border-collapse: collapse; }
th, td { border: 1px solid var(--border); padding: 0.4rem 0.8rem; }
td.center, th.center { text-align: center; }
td.right, th.right { text-align: right; }
nav.breadcrumbs { max-width: 980px; margin: 0 auto; padding: 0.8rem 1.5rem; font-size: 0.85em; }
nav.breadcrumbs ol { list-style: none; margin: 0; padding: 0; display: flex; flex-wrap: wrap; }
nav.breadcrumbs li + li::before { content: "/"; color: var(--text-muted); padding: 0 0.5rem; }
.abstract { display: block; color: var(--text-muted); }
.aside { border-left: 4px solid var(--accent); margin: 1rem 0; padding: 0.5rem 1rem; background: var(--code-bg); }
.aside.warning { border-color: #ff9f0a; }
.aside .label { font-weight: 600; margin: 0; }
.row { display: flex; gap: 1.5rem; }
.column { flex: 1; }
.links.compactGrid, .links.detailedGrid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 1rem; }
figure.code figcaption { font-size: 0.85em; color: var(--text-muted); }
ol.steps { padding-left: 1.2rem; }
.choice[data-correct="true"] .justification { color: #30d158; }
img { max-width: 100%; height: auto; }
"#;
