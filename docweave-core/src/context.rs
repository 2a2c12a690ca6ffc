//! The documentation context: every page of a bundle, the symbol index and
//! the topic graph.
//!
//! A context is built once from already-loaded inputs and is read-only
//! afterwards, so pages can be rendered from it concurrently. Building never
//! fails: problems in the inputs are collected as diagnostics and the page
//! in question is rendered on a best-effort basis.

use std::collections::{BTreeMap, HashMap};

use crate::directive;
use crate::error::Diagnostic;
use crate::graph::{Landmark, NodeId, NodeKind, TopicGraph, TopicNode, TopicReference};
use crate::link::{AbsoluteSymbolLink, ContainerOptions, SymbolId, SymbolIndex};
use crate::markup::{self, BlockDirective, Document, ListItem, Markup};
use crate::render::path::{strip_scheme_and_host, url_readable_fragment};
use crate::render::{
    ColorStyle, LinkListSection, LinkProvider, LinkedAsset, LinkedElement, LinkedElementNames,
    LinkedName, with_sections,
};
use crate::symbol_graph::SymbolGraph;

/// Identity and settings of a documentation bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleInfo {
    pub bundle_id: String,
    pub display_name: String,
    /// Source language whose tabs render inline.
    pub default_language: String,
    pub legacy_disambiguation: bool,
}

impl BundleInfo {
    pub fn new(bundle_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            display_name: display_name.into(),
            ..Self::default()
        }
    }
}

impl Default for BundleInfo {
    fn default() -> Self {
        Self {
            bundle_id: String::new(),
            display_name: String::new(),
            default_language: "swift".to_string(),
            legacy_disambiguation: false,
        }
    }
}

/// A markup file of the bundle. `path` is relative to the bundle root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub contents: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// File name without directories and extensions.
    pub fn stem(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        name.split('.').next().unwrap_or(name)
    }
}

/// Everything a context is built from. Reading it from disk is up to the caller.
#[derive(Debug, Clone, Default)]
pub struct BundleInput {
    pub info: BundleInfo,
    pub documents: Vec<SourceFile>,
    pub symbol_graphs: Vec<SymbolGraph>,
    /// Image file names, e.g. `hero~dark@2x.png`.
    pub assets: Vec<String>,
    /// Files available to `@Snippet` and `@Code`, keyed by bundle-relative path.
    pub files: BTreeMap<String, String>,
}

/// A diagnostic and the file (or page) it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDiagnostic {
    pub source: String,
    pub diagnostic: Diagnostic,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub reference: TopicReference,
    pub kind: NodeKind,
    pub title: String,
    /// Bundle-relative path of the markup file, if the page has one.
    pub source: Option<String>,
    pub blocks: Vec<Markup>,
    pub abstract_content: Vec<Markup>,
    pub symbol: Option<SymbolId>,
}

impl Page {
    pub fn path(&self) -> &str {
        &self.reference.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Role {
    TableOfContents,
    Tutorial,
    TutorialArticle,
    /// Extends the symbol named by the title's symbol link.
    Extension(String),
    TechnologyRoot,
    Article,
}

fn classify(document: &Document) -> Role {
    if document.directives("Tutorials").next().is_some() {
        return Role::TableOfContents;
    }
    if document.directives("Tutorial").next().is_some() {
        return Role::Tutorial;
    }
    if document.directives("Article").next().is_some() {
        return Role::TutorialArticle;
    }
    if let Some([Markup::SymbolLink { destination }]) = document.title_heading() {
        return Role::Extension(destination.clone());
    }
    let technology_root = document
        .directives("Metadata")
        .any(|metadata| metadata.child_directives("TechnologyRoot").next().is_some());
    if technology_root {
        Role::TechnologyRoot
    } else {
        Role::Article
    }
}

#[derive(Debug)]
pub struct DocumentationContext {
    info: BundleInfo,
    /// Name used for the `/documentation/{root}` and `/tutorials/{root}` prefixes.
    root_name: String,
    index: SymbolIndex,
    graph: TopicGraph,
    pages: BTreeMap<String, Page>,
    /// Article and tutorial file stems to page paths.
    stems: HashMap<String, String>,
    /// Titles of each symbol per interface language.
    language_titles: HashMap<String, BTreeMap<String, String>>,
    assets: BTreeMap<String, LinkedAsset>,
    files: BTreeMap<String, String>,
    diagnostics: Vec<SourceDiagnostic>,
}

impl DocumentationContext {
    pub fn new(input: BundleInput) -> Self {
        let BundleInput {
            info,
            documents,
            symbol_graphs,
            assets,
            files,
        } = input;

        let options = ContainerOptions {
            legacy_always_add_kind: info.legacy_disambiguation,
        };
        let index = SymbolIndex::build(&symbol_graphs, options);
        let assets = group_assets(&info.bundle_id, &assets);
        let graph = TopicGraph::new(info.bundle_id.clone());
        let mut context = Self {
            root_name: info.display_name.clone(),
            info,
            index,
            graph,
            pages: BTreeMap::new(),
            stems: HashMap::new(),
            language_titles: language_titles(&symbol_graphs),
            assets,
            files,
            diagnostics: Vec::new(),
        };

        let mut parsed = Vec::with_capacity(documents.len());
        for file in documents {
            let result = markup::parse(&file.contents);
            context.report(&file.path, result.diagnostics);
            context.report(&file.path, directive::check_document(&result.document));
            let role = classify(&result.document);
            parsed.push((file, result.document, role));
        }

        context.root_name = parsed
            .iter()
            .find(|(_, _, role)| *role == Role::TechnologyRoot)
            .map(|(file, _, _)| file.stem().to_string())
            .or_else(|| context.index.modules().next().map(str::to_string))
            .unwrap_or_else(|| context.info.display_name.clone());

        let mut extensions = HashMap::new();
        let mut documents = Vec::new();
        for (file, document, role) in parsed {
            match role {
                Role::Extension(destination) => match context.extension_target(&destination) {
                    Some(path) => {
                        extensions.insert(path, (file.path, document));
                    }
                    None => context.report(
                        &file.path,
                        [Diagnostic::warning(
                            "W013",
                            format!("documentation extension target '{destination}' not found"),
                            None,
                        )],
                    ),
                },
                role => documents.push((file, document, role)),
            }
        }

        context.register_symbols(&mut extensions);
        for (file, document, role) in documents {
            context.register_document(file, document, role);
        }

        context.curate();
        context.curate_tutorials();
        context.curate_automatically();
        context.check_tutorials_reachable();

        tracing::info!(
            bundle = %context.info.bundle_id,
            pages = context.pages.len(),
            symbols = context.index.len(),
            diagnostics = context.diagnostics.len(),
            "built documentation context"
        );
        context
    }

    pub fn info(&self) -> &BundleInfo {
        &self.info
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    pub fn graph(&self) -> &TopicGraph {
        &self.graph
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    pub fn page(&self, path: &str) -> Option<&Page> {
        self.pages.get(path)
    }

    pub fn node_of(&self, page: &Page) -> Option<NodeId> {
        self.graph.id_of(&page.reference)
    }

    pub fn diagnostics(&self) -> &[SourceDiagnostic] {
        &self.diagnostics
    }

    /// The path of the landing page links are resolved from by [`Self::resolve`].
    pub fn root_path(&self) -> String {
        format!("/documentation/{}", self.root_name)
    }

    /// Resolve a link as if it were written on the landing page.
    pub fn resolve(&self, link: &str) -> Option<String> {
        self.element(link, &self.root_path())
            .map(|element| element.path)
    }

    fn report(&mut self, source: &str, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics
            .extend(diagnostics.into_iter().map(|diagnostic| SourceDiagnostic {
                source: source.to_string(),
                diagnostic,
            }));
    }

    fn extension_target(&self, destination: &str) -> Option<String> {
        if self.index.has_module(destination) {
            return Some(format!("/documentation/{destination}"));
        }
        self.index
            .resolve_relative(destination, None)
            .map(|id| self.index.url_path(id).to_string())
    }

    /// Insert a page and its graph node. Returns `None` for a duplicate path.
    fn insert_page(&mut self, page: Page) -> Option<NodeId> {
        if let Some(existing) = self.pages.get(page.path()) {
            let source = page.source.clone().unwrap_or_else(|| page.path().to_string());
            let message = format!(
                "page path '{}' is already used by {}",
                page.path(),
                existing.source.as_deref().unwrap_or("a symbol")
            );
            self.report(&source, [Diagnostic::warning("W012", message, None)]);
            return None;
        }
        let node = self.graph.add_node(TopicNode::new(
            page.reference.clone(),
            page.kind,
            page.title.clone(),
        ));
        self.pages.insert(page.path().to_string(), page);
        Some(node)
    }

    fn register_symbols(&mut self, extensions: &mut HashMap<String, (String, Document)>) {
        let modules: Vec<String> = self.index.modules().map(str::to_string).collect();
        for module in modules {
            let path = format!("/documentation/{module}");
            let extension = extensions.remove(&path);
            let (blocks, abstract_content) =
                compose_symbol_page(&module, &[], extension.as_ref().map(|(_, d)| d));
            self.insert_page(Page {
                reference: TopicReference::new(&self.info.bundle_id, path),
                kind: NodeKind::Module,
                title: module,
                source: extension.map(|(source, _)| source),
                blocks,
                abstract_content,
                symbol: None,
            });
        }

        let ids: Vec<SymbolId> = self.index.symbols().map(|(id, _)| id).collect();
        for id in ids {
            let symbol = self.index.symbol(id);
            let path = self.index.url_path(id).to_string();
            let comment = symbol
                .doc_comment
                .as_deref()
                .map(|source| markup::parse(source).document.blocks)
                .unwrap_or_default();
            let extension = extensions.remove(&path);
            let (blocks, abstract_content) =
                compose_symbol_page(&symbol.title, &comment, extension.as_ref().map(|(_, d)| d));
            let title = symbol.title.clone();
            self.insert_page(Page {
                reference: TopicReference::new(&self.info.bundle_id, path),
                kind: NodeKind::Symbol,
                title,
                source: extension.map(|(source, _)| source),
                blocks,
                abstract_content,
                symbol: Some(id),
            });
        }
    }

    fn register_document(&mut self, file: SourceFile, document: Document, role: Role) {
        let stem = file.stem().to_string();
        let (kind, path, title) = match &role {
            Role::TableOfContents => {
                let name = document
                    .directives("Tutorials")
                    .find_map(|d| d.argument("name"))
                    .unwrap_or(&stem)
                    .to_string();
                (NodeKind::TutorialTableOfContents, format!("/tutorials/{stem}"), Some(name))
            }
            Role::Tutorial | Role::TutorialArticle => {
                let (kind, name) = if role == Role::Tutorial {
                    (NodeKind::Tutorial, "Tutorial")
                } else {
                    (NodeKind::TutorialArticle, "Article")
                };
                let title = document
                    .directives(name)
                    .flat_map(|d| d.child_directives("Intro"))
                    .find_map(|intro| intro.argument("title"))
                    .map(str::to_string)
                    .or_else(|| document.title());
                (kind, format!("/tutorials/{}/{stem}", self.root_name), title)
            }
            Role::TechnologyRoot => (
                NodeKind::TechnologyRoot,
                format!("/documentation/{stem}"),
                document.title(),
            ),
            Role::Article | Role::Extension(_) => (
                NodeKind::Article,
                format!("/documentation/{}/{stem}", self.root_name),
                document.title(),
            ),
        };

        let title = title.unwrap_or_else(|| {
            self.report(
                &file.path,
                [Diagnostic::warning(
                    "W009",
                    format!("page '{stem}' has no title heading"),
                    None,
                )],
            );
            stem.clone()
        });

        let landmarks = tutorial_landmarks(&document);
        let has_assessments = document
            .blocks
            .iter()
            .filter_map(|block| match block {
                Markup::BlockDirective(d) => Some(d),
                _ => None,
            })
            .flat_map(|d| d.child_directives("Assessments"))
            .any(|assessments| assessments.child_directives("MultipleChoice").next().is_some());

        let abstract_content = document
            .abstract_paragraph()
            .map(<[Markup]>::to_vec)
            .unwrap_or_default();
        let page = Page {
            reference: TopicReference::new(&self.info.bundle_id, path.clone()),
            kind,
            title,
            source: Some(file.path),
            blocks: document.blocks,
            abstract_content,
            symbol: None,
        };
        if let Some(node) = self.insert_page(page) {
            let node = self.graph.node_mut(node);
            node.landmarks = landmarks;
            node.has_assessments = has_assessments;
            self.stems.entry(stem).or_insert(path);
        }
    }

    /// Edges from the links listed in each page's Topics section.
    fn curate(&mut self) {
        let mut edges = Vec::new();
        let mut unresolved = Vec::new();
        for page in self.pages.values() {
            for link in topic_links(&page.blocks) {
                let element = match &link {
                    TopicLink::Doc(destination) => self.element(destination, page.path()),
                    TopicLink::Symbol(destination) => self.symbol(destination, page.path()),
                };
                match element {
                    Some(element) => edges.push((page.path().to_string(), element.path)),
                    None => unresolved.push((
                        page.source.clone().unwrap_or_else(|| page.path().to_string()),
                        link.destination().to_string(),
                    )),
                }
            }
        }

        for (parent, child) in edges {
            let child = child.split('#').next().unwrap_or(&child);
            if let (Some(parent), Some(child)) =
                (self.graph.id_of_path(&parent), self.graph.id_of_path(child))
            {
                self.graph.add_edge(parent, child);
            }
        }
        for (source, destination) in unresolved {
            self.report(
                &source,
                [Diagnostic::warning(
                    "W010",
                    format!("topic link '{destination}' could not be resolved"),
                    None,
                )],
            );
        }
    }

    /// Volume, chapter and tutorial edges below each table of contents.
    fn curate_tutorials(&mut self) {
        let tables: Vec<(Page, Vec<BlockDirective>)> = self
            .pages
            .values()
            .filter(|page| page.kind == NodeKind::TutorialTableOfContents)
            .map(|page| {
                let directives = page
                    .blocks
                    .iter()
                    .filter_map(|block| match block {
                        Markup::BlockDirective(d) if d.name == "Tutorials" => Some(d.clone()),
                        _ => None,
                    })
                    .collect();
                (page.clone(), directives)
            })
            .collect();

        for (page, directives) in tables {
            let Some(root) = self.graph.id_of(&page.reference) else {
                continue;
            };
            for tutorials in &directives {
                for volume in tutorials.child_directives("Volume") {
                    let name = volume.argument("name").unwrap_or_default();
                    let node = self.graph.add_node(TopicNode::new(
                        page.reference.with_fragment(url_readable_fragment(name)),
                        NodeKind::Volume,
                        name,
                    ));
                    self.graph.add_edge(root, node);
                    for chapter in volume.child_directives("Chapter") {
                        self.add_chapter(&page, node, chapter);
                    }
                }
                for chapter in tutorials.child_directives("Chapter") {
                    self.add_chapter(&page, root, chapter);
                }
            }
        }
    }

    fn add_chapter(&mut self, page: &Page, parent: NodeId, chapter: &BlockDirective) {
        let name = chapter.argument("name").unwrap_or_default();
        let node = self.graph.add_node(TopicNode::new(
            page.reference.with_fragment(url_readable_fragment(name)),
            NodeKind::Chapter,
            name,
        ));
        self.graph.add_edge(parent, node);

        for reference in chapter.child_directives("TutorialReference") {
            let Some(tutorial) = reference.argument("tutorial") else {
                continue;
            };
            let destination = tutorial.trim_start_matches('<').trim_end_matches('>');
            let target = self
                .element(destination, page.path())
                .and_then(|element| self.graph.id_of_path(&element.path));
            match target {
                Some(target) => self.graph.add_edge(node, target),
                None => {
                    let source = page.source.clone().unwrap_or_else(|| page.path().to_string());
                    self.report(
                        &source,
                        [Diagnostic::warning(
                            "W010",
                            format!("tutorial reference '{destination}' could not be resolved"),
                            Some(reference.span),
                        )],
                    );
                }
            }
        }
    }

    /// Curate pages nobody listed: symbols under their parent symbol or
    /// module, articles under the landing page. The listing is appended to
    /// the parent's Topics section.
    fn curate_automatically(&mut self) {
        let mut groups: BTreeMap<String, BTreeMap<&'static str, Vec<String>>> = BTreeMap::new();

        for (id, symbol) in self.index.symbols() {
            let path = self.index.url_path(id);
            let Some(child) = self.graph.id_of_path(path) else {
                continue;
            };
            if !self.graph.parents(child).is_empty() {
                continue;
            }
            let parent_path = match symbol.parent {
                Some(parent) => self.index.url_path(parent).to_string(),
                None => format!("/documentation/{}", symbol.module),
            };
            if let Some(parent) = self.graph.id_of_path(&parent_path) {
                self.graph.add_edge(parent, child);
                groups
                    .entry(parent_path)
                    .or_default()
                    .entry(group_title(&symbol.kind))
                    .or_default()
                    .push(path.to_string());
            }
        }

        let landing = self.root_path();
        if let Some(root) = self.graph.id_of_path(&landing) {
            let articles: Vec<(NodeId, String)> = self
                .pages
                .values()
                .filter(|page| page.kind == NodeKind::Article)
                .filter_map(|page| Some((self.graph.id_of(&page.reference)?, page.path().to_string())))
                .collect();
            for (node, path) in articles {
                if node != root && self.graph.parents(node).is_empty() {
                    self.graph.add_edge(root, node);
                    groups
                        .entry(landing.clone())
                        .or_default()
                        .entry("Articles")
                        .or_default()
                        .push(path);
                }
            }
        }

        for (parent, groups) in groups {
            let bundle_id = self.info.bundle_id.clone();
            if let Some(page) = self.pages.get_mut(&parent) {
                append_topic_groups(&mut page.blocks, &bundle_id, groups);
            }
        }
    }

    fn check_tutorials_reachable(&mut self) {
        let mut unreachable = Vec::new();
        for page in self.pages.values() {
            if !matches!(page.kind, NodeKind::Tutorial | NodeKind::TutorialArticle) {
                continue;
            }
            let Some(node) = self.graph.id_of(&page.reference) else {
                continue;
            };
            let reachable = self.graph.finite_paths_to(node).iter().any(|path| {
                path.first()
                    .is_some_and(|&root| self.graph.node(root).kind.is_tutorial_root())
            });
            if !reachable {
                unreachable.push((
                    page.source.clone().unwrap_or_else(|| page.path().to_string()),
                    page.title.clone(),
                ));
            }
        }
        for (source, title) in unreachable {
            self.report(
                &source,
                [Diagnostic::warning(
                    "W011",
                    format!("'{title}' is not listed in any table of contents"),
                    None,
                )],
            );
        }
    }

    fn page_element(&self, page: &Page, fragment: Option<&str>) -> LinkedElement {
        let names = match (page.symbol, page.kind) {
            (Some(id), _) => self.symbol_names(id),
            (None, NodeKind::Module) => {
                LinkedElementNames::Single(LinkedName::Symbol(page.title.clone()))
            }
            (None, _) => LinkedElementNames::Single(LinkedName::Conceptual(page.title.clone())),
        };
        let path = match fragment {
            Some(fragment) => format!("{}#{fragment}", page.path()),
            None => page.path().to_string(),
        };
        LinkedElement {
            path,
            names,
            abstract_content: page.abstract_content.clone(),
            kind: page.symbol.map(|id| self.index.symbol(id).kind.clone()),
        }
    }

    fn symbol_names(&self, id: SymbolId) -> LinkedElementNames {
        let symbol = self.index.symbol(id);
        match self.language_titles.get(&symbol.precise_identifier) {
            Some(titles) if titles.values().any(|title| *title != symbol.title) => {
                LinkedElementNames::LanguageSpecificSymbol(titles.clone())
            }
            _ => LinkedElementNames::Single(LinkedName::Symbol(symbol.title.clone())),
        }
    }

    fn resolve_path(&self, destination: &str, page: &str) -> Option<String> {
        if destination.starts_with("doc://") {
            let path = strip_scheme_and_host(destination);
            if self.pages.contains_key(path) {
                return Some(path.to_string());
            }
            let link = AbsoluteSymbolLink::parse(destination)?;
            if link.represents_module {
                return self
                    .index
                    .has_module(&link.module)
                    .then(|| format!("/documentation/{}", link.module));
            }
            return self
                .index
                .resolve_absolute(&link)
                .map(|id| self.index.url_path(id).to_string());
        }

        let name = destination.strip_prefix("doc:").unwrap_or(destination);
        let absolute = format!("/{}", name.trim_start_matches('/'));
        if self.pages.contains_key(&absolute) {
            return Some(absolute);
        }
        let name = name.trim_start_matches('/');
        let stem = name
            .strip_prefix(self.root_name.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(name);
        if let Some(path) = self.stems.get(stem) {
            return Some(path.clone());
        }
        self.resolve_symbol_path(name, page)
    }

    fn resolve_symbol_path(&self, path: &str, page: &str) -> Option<String> {
        if self.index.has_module(path) {
            return Some(format!("/documentation/{path}"));
        }
        let from = self.pages.get(page).and_then(|page| page.symbol);
        self.index
            .resolve_relative(path, from)
            .map(|id| self.index.url_path(id).to_string())
    }
}

impl LinkProvider for DocumentationContext {
    fn element(&self, destination: &str, page: &str) -> Option<LinkedElement> {
        let (target, fragment) = split_fragment(destination);
        let path = self.resolve_path(target, page)?;
        let page = self.pages.get(&path)?;
        Some(self.page_element(page, fragment))
    }

    fn symbol(&self, path: &str, page: &str) -> Option<LinkedElement> {
        let (target, fragment) = split_fragment(path);
        let resolved = self.resolve_symbol_path(target, page)?;
        let page = self.pages.get(&resolved)?;
        Some(self.page_element(page, fragment))
    }

    fn symbol_by_precise_identifier(&self, precise: &str) -> Option<LinkedElement> {
        let id = self.index.lookup_precise(precise)?;
        let page = self.pages.get(self.index.url_path(id))?;
        Some(self.page_element(page, None))
    }

    fn asset_named(&self, name: &str) -> Option<LinkedAsset> {
        let (base, _, _) = asset_variant(name);
        self.assets.get(&base).cloned()
    }

    fn file_contents(&self, path: &str) -> Option<String> {
        let path = path.trim_start_matches('/');
        if let Some(contents) = self.files.get(path) {
            return Some(contents.clone());
        }
        let suffix = format!("/{path}");
        self.files
            .iter()
            .find(|(name, _)| name.ends_with(&suffix))
            .map(|(_, contents)| contents.clone())
    }
}

fn split_fragment(destination: &str) -> (&str, Option<&str>) {
    match destination.split_once('#') {
        Some((target, fragment)) => (target, Some(fragment)),
        None => (destination, None),
    }
}

fn language_titles(graphs: &[SymbolGraph]) -> HashMap<String, BTreeMap<String, String>> {
    let mut titles: HashMap<String, BTreeMap<String, String>> = HashMap::new();
    for symbol in graphs.iter().flat_map(|graph| &graph.symbols) {
        titles
            .entry(symbol.identifier.precise.clone())
            .or_default()
            .entry(symbol.identifier.interface_language.clone())
            .or_insert_with(|| symbol.names.title.clone());
    }
    titles
}

/// Title, abstract and discussion of a symbol or module page. An extension
/// file's abstract replaces the doc comment's; its discussion follows.
fn compose_symbol_page(
    title: &str,
    comment: &[Markup],
    extension: Option<&Document>,
) -> (Vec<Markup>, Vec<Markup>) {
    let (comment_abstract, comment_discussion) = match comment.split_first() {
        Some((Markup::Paragraph { children }, rest)) => (Some(children.clone()), rest),
        _ => (None, comment),
    };
    let abstract_content = extension
        .and_then(Document::abstract_paragraph)
        .map(<[Markup]>::to_vec)
        .or(comment_abstract)
        .unwrap_or_default();

    let mut blocks = vec![Markup::Heading {
        level: 1,
        children: vec![Markup::text(title)],
    }];
    if !abstract_content.is_empty() {
        blocks.push(Markup::paragraph(abstract_content.clone()));
    }
    blocks.extend_from_slice(comment_discussion);
    if let Some(extension) = extension {
        blocks.extend_from_slice(extension.discussion());
    }
    (blocks, abstract_content)
}

fn tutorial_landmarks(document: &Document) -> Vec<Landmark> {
    document
        .directives("Tutorial")
        .flat_map(|tutorial| tutorial.child_directives("Section"))
        .filter_map(|section| section.argument("title"))
        .map(|title| Landmark {
            title: title.to_string(),
            fragment: url_readable_fragment(title),
        })
        .collect()
}

enum TopicLink {
    Doc(String),
    Symbol(String),
}

impl TopicLink {
    fn destination(&self) -> &str {
        match self {
            Self::Doc(destination) | Self::Symbol(destination) => destination,
        }
    }
}

/// Links listed under the Topics heading of a page.
fn topic_links(blocks: &[Markup]) -> Vec<TopicLink> {
    let mut links = Vec::new();
    for (block, section) in with_sections(blocks) {
        if section != Some(LinkListSection::Topics) {
            continue;
        }
        if let Markup::UnorderedList { items } | Markup::OrderedList { items, .. } = block {
            for item in items {
                collect_links(&item.children, &mut links);
            }
        }
    }
    links
}

fn collect_links(nodes: &[Markup], links: &mut Vec<TopicLink>) {
    for node in nodes {
        match node {
            Markup::Link { destination, .. } if destination.starts_with("doc:") => {
                links.push(TopicLink::Doc(destination.clone()));
            }
            Markup::SymbolLink { destination } => links.push(TopicLink::Symbol(destination.clone())),
            other => collect_links(other.children(), links),
        }
    }
}

/// The automatic Topics group a symbol kind is listed under.
fn group_title(kind: &str) -> &'static str {
    match crate::link::kind::strip_language_prefix(kind) {
        "class" => "Classes",
        "struct" => "Structures",
        "enum" => "Enumerations",
        "enum.case" => "Enumeration Cases",
        "protocol" => "Protocols",
        "init" => "Initializers",
        "method" => "Instance Methods",
        "type.method" => "Type Methods",
        "property" => "Instance Properties",
        "type.property" => "Type Properties",
        "subscript" | "type.subscript" => "Subscripts",
        "func" | "func.op" => "Functions",
        "var" => "Variables",
        "typealias" | "typedef" => "Type Aliases",
        "macro" => "Macros",
        _ => "Symbols",
    }
}

fn append_topic_groups(
    blocks: &mut Vec<Markup>,
    bundle_id: &str,
    groups: BTreeMap<&'static str, Vec<String>>,
) {
    let is_section = |block: &Markup, name: &str| {
        matches!(block, Markup::Heading { level: 2, children } if markup::plain_text(children) == name)
    };
    let mut section = Vec::new();
    if !blocks.iter().any(|block| is_section(block, "Topics")) {
        section.push(Markup::Heading {
            level: 2,
            children: vec![Markup::text("Topics")],
        });
    }
    for (title, paths) in groups {
        section.push(Markup::Heading {
            level: 3,
            children: vec![Markup::text(title)],
        });
        let items = paths
            .into_iter()
            .map(|path| ListItem {
                checkbox: None,
                children: vec![Markup::paragraph(vec![Markup::Link {
                    destination: format!("doc://{bundle_id}{path}"),
                    title: None,
                    children: Vec::new(),
                }])],
            })
            .collect();
        section.push(Markup::UnorderedList { items });
    }

    let position = blocks
        .iter()
        .position(|block| is_section(block, "See Also"))
        .unwrap_or(blocks.len());
    let see_also = blocks.split_off(position);
    blocks.extend(section);
    blocks.extend(see_also);
}

/// Base name, style and scale of an image file name: `hero~dark@2x.png` is
/// the dark 2x variant of `hero`.
fn asset_variant(file_name: &str) -> (String, ColorStyle, u32) {
    let name = file_name.rsplit('/').next().unwrap_or(file_name);
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let (stem, scale) = match stem.rsplit_once('@') {
        Some((base, factor)) => match factor.strip_suffix('x').and_then(|n| n.parse().ok()) {
            Some(scale) => (base, scale),
            None => (stem, 1),
        },
        None => (stem, 1),
    };
    match stem.strip_suffix("~dark") {
        Some(base) => (base.to_string(), ColorStyle::Dark, scale),
        None => (stem.to_string(), ColorStyle::Light, scale),
    }
}

fn group_assets(bundle_id: &str, files: &[String]) -> BTreeMap<String, LinkedAsset> {
    let mut assets: BTreeMap<String, LinkedAsset> = BTreeMap::new();
    for file in files {
        let (base, style, scale) = asset_variant(file);
        let name = file.rsplit('/').next().unwrap_or(file);
        assets
            .entry(base)
            .or_default()
            .images
            .entry(style)
            .or_default()
            .insert(scale, format!("/images/{bundle_id}/{name}"));
    }
    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GRAPH: &str = r#"{
        "module": { "name": "MyKit" },
        "symbols": [
            {
                "identifier": { "precise": "s:5MyKit3FooC" },
                "kind": { "identifier": "swift.class" },
                "names": { "title": "Foo" },
                "pathComponents": ["Foo"],
                "docComment": { "lines": [{ "text": "A foo." }] }
            },
            {
                "identifier": { "precise": "s:5MyKit3FooC3baryyF" },
                "kind": { "identifier": "swift.method" },
                "names": { "title": "bar()" },
                "pathComponents": ["Foo", "bar()"]
            },
            {
                "identifier": { "precise": "s:5MyKit3BazV" },
                "kind": { "identifier": "swift.struct" },
                "names": { "title": "Baz" },
                "pathComponents": ["Baz"]
            }
        ],
        "relationships": []
    }"#;

    const OBJC_GRAPH: &str = r#"{
        "module": { "name": "MyKit" },
        "symbols": [
            {
                "identifier": { "precise": "s:5MyKit3FooC", "interfaceLanguage": "occ" },
                "kind": { "identifier": "objc.class" },
                "names": { "title": "MKFoo" },
                "pathComponents": ["Foo"]
            }
        ]
    }"#;

    fn bundle(documents: &[(&str, &str)]) -> DocumentationContext {
        DocumentationContext::new(BundleInput {
            info: BundleInfo::new("org.example.MyKit", "MyKit"),
            documents: documents
                .iter()
                .map(|(path, contents)| SourceFile::new(*path, *contents))
                .collect(),
            symbol_graphs: vec![
                SymbolGraph::from_json("MyKit", GRAPH).unwrap(),
                SymbolGraph::from_json("MyKit-objc", OBJC_GRAPH).unwrap(),
            ],
            assets: vec![
                "hero.png".into(),
                "hero@2x.png".into(),
                "hero~dark.png".into(),
            ],
            files: BTreeMap::from([("Snippets/example.swift".into(), "let x = 1\n".into())]),
        })
    }

    fn codes(context: &DocumentationContext) -> Vec<&str> {
        context
            .diagnostics()
            .iter()
            .filter_map(|d| d.diagnostic.code.as_deref())
            .collect()
    }

    #[test]
    fn registers_module_symbol_and_article_pages() {
        let context = bundle(&[(
            "GettingStarted.md",
            "# Getting Started\n\nSet up the kit.\n",
        )]);
        let paths: Vec<&str> = context.pages().map(Page::path).collect();
        assert_eq!(
            paths,
            [
                "/documentation/MyKit",
                "/documentation/MyKit/Baz",
                "/documentation/MyKit/Foo",
                "/documentation/MyKit/Foo/bar()",
                "/documentation/MyKit/GettingStarted",
            ]
        );
        let article = context.page("/documentation/MyKit/GettingStarted").unwrap();
        assert_eq!(article.title, "Getting Started");
        assert_eq!(article.abstract_content, vec![Markup::text("Set up the kit.")]);
        assert_eq!(context.root_name(), "MyKit");
    }

    #[test]
    fn resolves_links_by_name_path_and_symbol() {
        let context = bundle(&[("GettingStarted.md", "# Getting Started\n")]);
        let page = "/documentation/MyKit/Foo";
        let element = context.element("doc:GettingStarted", page).unwrap();
        assert_eq!(element.path, "/documentation/MyKit/GettingStarted");
        assert_eq!(
            element.names,
            LinkedElementNames::Single(LinkedName::Conceptual("Getting Started".into()))
        );

        let element = context
            .element("doc://org.example.MyKit/documentation/MyKit/Foo/bar()", page)
            .unwrap();
        assert_eq!(element.path, "/documentation/MyKit/Foo/bar()");
        assert_eq!(element.kind.as_deref(), Some("swift.method"));

        assert_eq!(
            context.symbol("bar()", page).map(|e| e.path).as_deref(),
            Some("/documentation/MyKit/Foo/bar()")
        );
        assert_eq!(
            context.element("doc:MyKit/GettingStarted#Overview", page).map(|e| e.path).as_deref(),
            Some("/documentation/MyKit/GettingStarted#Overview")
        );
        assert_eq!(context.resolve("MyKit").as_deref(), Some("/documentation/MyKit"));
        assert!(context.element("doc:Missing", page).is_none());
    }

    #[test]
    fn language_specific_titles() {
        let context = bundle(&[]);
        let element = context.symbol_by_precise_identifier("s:5MyKit3FooC").unwrap();
        assert_eq!(
            element.names,
            LinkedElementNames::LanguageSpecificSymbol(BTreeMap::from([
                ("occ".to_string(), "MKFoo".to_string()),
                ("swift".to_string(), "Foo".to_string()),
            ]))
        );
        assert_eq!(element.abstract_content, vec![Markup::text("A foo.")]);
    }

    #[test]
    fn explicit_curation_replaces_automatic_curation() {
        let context = bundle(&[(
            "GettingStarted.md",
            "# Getting Started\n\nIntro.\n\n## Topics\n\n### Essentials\n\n- ``Foo``\n- <doc:Missing>\n",
        )]);
        let graph = context.graph();
        let foo = graph.id_of_path("/documentation/MyKit/Foo").unwrap();
        let article = graph.id_of_path("/documentation/MyKit/GettingStarted").unwrap();
        let module = graph.id_of_path("/documentation/MyKit").unwrap();
        assert_eq!(graph.parents(foo), &[article]);
        assert_eq!(graph.parents(article), &[module]);
        assert_eq!(codes(&context), ["W010"]);

        let module_page = context.page("/documentation/MyKit").unwrap();
        let headings: Vec<String> = module_page
            .blocks
            .iter()
            .filter_map(|b| match b {
                Markup::Heading { children, .. } => Some(markup::plain_text(children)),
                _ => None,
            })
            .collect();
        assert_eq!(headings, ["MyKit", "Topics", "Articles", "Structures"]);
    }

    #[test]
    fn extension_file_merges_into_symbol_page() {
        let context = bundle(&[(
            "Foo.md",
            "# ``MyKit/Foo``\n\nA better foo.\n\n## Overview\n\nDetails.\n",
        )]);
        let page = context.page("/documentation/MyKit/Foo").unwrap();
        assert_eq!(page.source.as_deref(), Some("Foo.md"));
        assert_eq!(page.abstract_content, vec![Markup::text("A better foo.")]);
        assert_eq!(page.blocks.len(), 4);
        assert!(codes(&context).is_empty());
    }

    #[test]
    fn tutorials_are_curated_from_table_of_contents() {
        let context = bundle(&[
            (
                "MyKit.tutorial",
                "@Tutorials(name: \"MyKit Tutorials\") {\n    @Volume(name: \"Basics\") {\n        @Chapter(name: \"First Steps\") {\n            @TutorialReference(tutorial: \"doc:Building\")\n        }\n    }\n}\n",
            ),
            (
                "Building.tutorial",
                "@Tutorial(time: 10) {\n    @Intro(title: \"Building a Kit\") {\n        Start here.\n    }\n    @Section(title: \"Create a Project\") {\n        Do it.\n    }\n}\n",
            ),
            (
                "Orphan.tutorial",
                "@Tutorial {\n    @Intro(title: \"Orphan\") {\n        Alone.\n    }\n    @Section(title: \"Only\") {\n        Text.\n    }\n}\n",
            ),
        ]);
        let graph = context.graph();
        let tutorial = graph.id_of_path("/tutorials/MyKit/Building").unwrap();
        assert_eq!(graph.node(tutorial).title, "Building a Kit");
        assert_eq!(
            graph.node(tutorial).landmarks,
            vec![Landmark {
                title: "Create a Project".into(),
                fragment: "Create-a-Project".into(),
            }]
        );
        let paths = graph.finite_paths_to(tutorial);
        assert_eq!(paths.len(), 1);
        let titles: Vec<&str> = paths[0].iter().map(|&id| graph.node(id).title.as_str()).collect();
        assert_eq!(titles, ["MyKit Tutorials", "Basics", "First Steps"]);
        assert_eq!(codes(&context), ["W011"]);
    }

    #[test]
    fn assets_group_variants() {
        let context = bundle(&[]);
        let asset = context.asset_named("hero.png").unwrap();
        let light = &asset.images[&ColorStyle::Light];
        assert_eq!(light[&1], "/images/org.example.MyKit/hero.png");
        assert_eq!(light[&2], "/images/org.example.MyKit/hero@2x.png");
        assert_eq!(
            asset.images[&ColorStyle::Dark][&1],
            "/images/org.example.MyKit/hero~dark.png"
        );
        assert!(context.asset_named("hero").is_some());
        assert!(context.asset_named("missing.png").is_none());
    }

    #[test]
    fn file_contents_by_suffix() {
        let context = bundle(&[]);
        assert_eq!(context.file_contents("example.swift").as_deref(), Some("let x = 1\n"));
        assert_eq!(
            context.file_contents("Snippets/example.swift").as_deref(),
            Some("let x = 1\n")
        );
        assert!(context.file_contents("other.swift").is_none());
    }

    #[test]
    fn duplicate_and_untitled_pages_are_reported() {
        let context = bundle(&[
            ("a/Guide.md", "# Guide\n"),
            ("b/Guide.md", "# Guide again\n"),
            ("Notes.md", "Just text.\n"),
        ]);
        assert_eq!(codes(&context), ["W012", "W009"]);
        assert_eq!(context.page("/documentation/MyKit/Notes").unwrap().title, "Notes");
    }

    #[test]
    fn technology_root_becomes_landing_page() {
        let context = bundle(&[
            ("Kit.md", "# Kit\n\nThe kit.\n\n@Metadata {\n    @TechnologyRoot\n}\n"),
            ("Guide.md", "# Guide\n"),
        ]);
        assert_eq!(context.root_name(), "Kit");
        let graph = context.graph();
        let root = graph.id_of_path("/documentation/Kit").unwrap();
        let guide = graph.id_of_path("/documentation/Kit/Guide").unwrap();
        assert_eq!(graph.parents(guide), &[root]);
        assert_eq!(graph.node(root).kind, NodeKind::TechnologyRoot);
    }
}
