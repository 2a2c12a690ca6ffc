//! HTML rendering of markup into [`RenderNode`]s.

use std::collections::BTreeMap;

use crate::hierarchy::ASSESSMENTS_TITLE;
use crate::markup::{BlockDirective, ColumnAlignment, ListItem, Markup, Table, TableCell, plain_text};
use crate::render::aside;
use crate::render::html_fragment::parse_fragment;
use crate::render::node::{RenderNode, to_html};
use crate::render::path::{relative_path, url_readable_fragment};
use crate::render::provider::{
    LinkProvider, LinkedElement, LinkedElementNames, LinkedName, RenderOptions, last_path_component,
};
use crate::render::{LinkListSection, LinkListState, RenderContext, resolve_symbol, with_sections};

/// Renders markup for one page.
///
/// Create one renderer per page; it holds no state between calls.
pub struct HtmlRenderer<'a> {
    provider: &'a dyn LinkProvider,
    options: &'a RenderOptions,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(provider: &'a dyn LinkProvider, options: &'a RenderOptions) -> Self {
        Self { provider, options }
    }

    /// Render a page body. Lists under `## Topics` and `## See Also` are
    /// rendered as link lists.
    pub fn render_document(&self, blocks: &[Markup]) -> Vec<RenderNode> {
        let mut out = Vec::new();
        for (block, section) in with_sections(blocks) {
            let ctx = match section {
                Some(section) => RenderContext::default().entering_link_list(section),
                None => RenderContext::default(),
            };
            self.render(block, ctx, &mut out);
        }
        out
    }

    /// Render a fragment such as an abstract.
    pub fn render_blocks(&self, blocks: &[Markup]) -> Vec<RenderNode> {
        self.render_children(blocks, RenderContext::default())
    }

    fn render_children(&self, nodes: &[Markup], ctx: RenderContext) -> Vec<RenderNode> {
        let mut out = Vec::new();
        let mut index = 0;
        while index < nodes.len() {
            if let Markup::InlineHtml { html } = &nodes[index] {
                index = self.merge_inline_html(html, nodes, index, ctx, &mut out);
                continue;
            }
            self.render(&nodes[index], ctx, &mut out);
            index += 1;
        }
        out
    }

    /// Append following siblings to an inline HTML fragment until it parses.
    ///
    /// Returns the index of the first sibling not consumed.
    fn merge_inline_html(
        &self,
        html: &str,
        nodes: &[Markup],
        start: usize,
        ctx: RenderContext,
        out: &mut Vec<RenderNode>,
    ) -> usize {
        let mut merged = html.to_string();
        let mut next = start + 1;
        loop {
            if let Ok(parsed) = parse_fragment(&merged) {
                out.extend(parsed);
                return next;
            }
            let Some(sibling) = nodes.get(next) else {
                tracing::warn!(html, page = %self.options.page_path, "dropping unbalanced inline HTML");
                return start + 1;
            };
            match sibling {
                Markup::InlineHtml { html } => merged.push_str(html),
                other => {
                    let mut rendered = Vec::new();
                    self.render(other, ctx, &mut rendered);
                    merged.push_str(&to_html(&rendered));
                }
            }
            next += 1;
        }
    }

    fn render(&self, node: &Markup, ctx: RenderContext, out: &mut Vec<RenderNode>) {
        match node {
            Markup::Paragraph { children } => {
                out.push(RenderNode::element("p", self.render_children(children, ctx)));
            }
            Markup::Heading { level, children } => {
                let id = url_readable_fragment(&plain_text(children));
                out.push(RenderNode::element_with(
                    &format!("h{level}"),
                    [("id", id)],
                    self.render_children(children, ctx),
                ));
            }
            Markup::Emphasis { children } => {
                out.push(RenderNode::element("i", self.render_children(children, ctx)));
            }
            Markup::Strong { children } => {
                out.push(RenderNode::element("b", self.render_children(children, ctx)));
            }
            Markup::Strikethrough { children } => {
                out.push(RenderNode::element("s", self.render_children(children, ctx)));
            }
            Markup::InlineCode { code } => out.push(code_voice(code)),
            Markup::Text { text } => out.push(RenderNode::text(text.as_str())),
            Markup::SoftBreak => out.push(RenderNode::text(" ")),
            Markup::LineBreak => out.push(RenderNode::element("br", Vec::new())),
            Markup::ThematicBreak => out.push(RenderNode::element("hr", Vec::new())),
            Markup::Link {
                destination,
                title,
                children,
            } => self.render_link(destination, title.as_deref(), children, ctx, out),
            Markup::SymbolLink { destination } => self.render_symbol_link(destination, ctx, out),
            Markup::Image {
                source,
                title,
                children,
            } => out.extend(self.render_image(source, &plain_text(children), title.as_deref())),
            Markup::Table(table) => out.push(self.render_table(table, ctx)),
            Markup::OrderedList { start, items } => {
                let mut list = RenderNode::element("ol", self.render_items(items, ctx));
                if *start != 1 {
                    list.set_attribute("start", start.to_string());
                }
                out.push(list);
            }
            Markup::UnorderedList { items } => {
                out.push(RenderNode::element("ul", self.render_items(items, ctx)));
            }
            Markup::CodeBlock { language, code } => out.push(code_block(language.as_deref(), code)),
            Markup::BlockQuote { children } => out.push(self.render_aside(children, ctx)),
            Markup::InlineHtml { html } => match parse_fragment(html) {
                Ok(nodes) => out.extend(nodes),
                Err(error) => {
                    tracing::warn!(html, %error, "dropping unbalanced inline HTML");
                }
            },
            Markup::HtmlBlock { html } => match parse_fragment(html) {
                Ok(nodes) => out.extend(nodes),
                Err(error) => {
                    tracing::warn!(%error, page = %self.options.page_path, "HTML block could not be parsed");
                    out.push(RenderNode::text(""));
                }
            },
            Markup::BlockDirective(directive) => self.render_directive(directive, ctx, out),
        }
    }

    fn render_items(&self, items: &[ListItem], ctx: RenderContext) -> Vec<RenderNode> {
        items
            .iter()
            .filter_map(|item| {
                let mut children = Vec::with_capacity(item.children.len() + 1);
                if let Some(checked) = item.checkbox {
                    let mut input = RenderNode::element_with(
                        "input",
                        [("disabled", ""), ("type", "checkbox")],
                        Vec::new(),
                    );
                    if checked {
                        input.set_attribute("checked", "");
                    }
                    children.push(input);
                }
                let content = self.render_children(&item.children, ctx);
                // Unresolved entries of a link list leave nothing behind.
                if ctx.link_list.is_on() && is_blank(&content) {
                    return None;
                }
                children.extend(content);
                Some(RenderNode::element("li", children))
            })
            .collect()
    }

    fn render_link(
        &self,
        destination: &str,
        title: Option<&str>,
        children: &[Markup],
        ctx: RenderContext,
        out: &mut Vec<RenderNode>,
    ) {
        if !destination.starts_with("doc:") {
            let content = if children.is_empty() {
                vec![RenderNode::text(destination)]
            } else {
                self.render_children(children, ctx)
            };
            let mut anchor = RenderNode::element_with("a", [("href", destination)], content);
            if let Some(title) = title {
                anchor.set_attribute("title", title);
            }
            out.push(anchor);
            return;
        }

        match self.provider.element(destination, &self.options.page_path) {
            Some(element) => self.push_resolved(&element, children, false, ctx, out),
            None => {
                tracing::debug!(destination, page = %self.options.page_path, "unresolved link");
                if children.is_empty() {
                    let text = self
                        .provider
                        .fallback_link_text(destination)
                        .unwrap_or_else(|| last_path_component(destination).to_string());
                    out.push(RenderNode::text(text));
                } else {
                    out.extend(self.render_children(children, ctx));
                }
            }
        }
    }

    fn render_symbol_link(&self, destination: &str, ctx: RenderContext, out: &mut Vec<RenderNode>) {
        match resolve_symbol(self.provider, destination, &self.options.page_path) {
            Some(element) => self.push_resolved(&element, &[], true, ctx, out),
            None => {
                tracing::debug!(destination, page = %self.options.page_path, "unresolved symbol link");
                if !ctx.link_list.is_on() {
                    out.push(code_voice(destination));
                }
            }
        }
    }

    fn push_resolved(
        &self,
        element: &LinkedElement,
        authored: &[Markup],
        force_code: bool,
        ctx: RenderContext,
        out: &mut Vec<RenderNode>,
    ) {
        let content = if authored.is_empty() {
            display_name(&element.names, force_code)
        } else {
            self.render_children(authored, ctx)
        };
        let href = relative_path(&self.options.page_path, &element.path);
        out.push(RenderNode::element_with("a", [("href", href)], content));

        if ctx.link_list == LinkListState::Active && !element.abstract_content.is_empty() {
            out.push(RenderNode::element_with(
                "span",
                [("class", "abstract")],
                self.render_children(&element.abstract_content, ctx.nested()),
            ));
        }
    }

    fn render_image(&self, source: &str, alt: &str, title: Option<&str>) -> Option<RenderNode> {
        let mut img = RenderNode::element_with(
            "img",
            [("alt", alt), ("decoding", "async"), ("loading", "lazy")],
            Vec::new(),
        );
        if let Some(title) = title {
            img.set_attribute("title", title);
        }
        if source.contains("://") {
            img.set_attribute("src", source);
            return Some(RenderNode::element("picture", vec![img]));
        }

        let Some(asset) = self.provider.asset_named(source) else {
            tracing::debug!(source, page = %self.options.page_path, "image asset not found");
            return None;
        };
        let styles: Vec<_> = asset.images.iter().filter(|(_, scales)| !scales.is_empty()).collect();
        match styles.as_slice() {
            [] => None,
            [(_, scales)] => {
                let (key, value) = self.scale_attribute(scales);
                img.set_attribute(key, value);
                Some(RenderNode::element("picture", vec![img]))
            }
            _ => {
                let mut children: Vec<RenderNode> = styles
                    .iter()
                    .map(|(style, scales)| {
                        let (key, value) = self.scale_attribute(scales);
                        RenderNode::element_with(
                            "source",
                            [("media", style.media_query().to_string()), (key, value)],
                            Vec::new(),
                        )
                    })
                    .collect();
                children.push(img);
                Some(RenderNode::element("picture", children))
            }
        }
    }

    /// `src` for a single scale, otherwise a `srcset` from highest scale down.
    fn scale_attribute(&self, scales: &BTreeMap<u32, String>) -> (&'static str, String) {
        if let [(_, url)] = scales.iter().collect::<Vec<_>>().as_slice() {
            return ("src", self.asset_url(url));
        }
        let srcset = scales
            .iter()
            .rev()
            .map(|(scale, url)| format!("{} {scale}x", self.asset_url(url)))
            .collect::<Vec<_>>()
            .join(", ");
        ("srcset", srcset)
    }

    fn asset_url(&self, url: &str) -> String {
        if url.starts_with('/') {
            relative_path(&self.options.page_path, url)
        } else {
            url.to_string()
        }
    }

    fn render_table(&self, table: &Table, ctx: RenderContext) -> RenderNode {
        let head = RenderNode::element(
            "thead",
            vec![self.render_row("th", &table.head, &table.alignments, ctx)],
        );
        let body = RenderNode::element(
            "tbody",
            table
                .body
                .iter()
                .map(|row| self.render_row("td", row, &table.alignments, ctx))
                .collect(),
        );
        RenderNode::element("table", vec![head, body])
    }

    fn render_row(
        &self,
        tag: &str,
        cells: &[TableCell],
        alignments: &[ColumnAlignment],
        ctx: RenderContext,
    ) -> RenderNode {
        let cells = cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_continuation())
            .map(|(column, cell)| {
                let mut node = RenderNode::element(tag, self.render_children(&cell.children, ctx));
                if cell.colspan != 1 {
                    node.set_attribute("colspan", cell.colspan.to_string());
                }
                if cell.rowspan != 1 {
                    node.set_attribute("rowspan", cell.rowspan.to_string());
                }
                let class = match alignments.get(column) {
                    Some(ColumnAlignment::Left) => Some("left"),
                    Some(ColumnAlignment::Center) => Some("center"),
                    Some(ColumnAlignment::Right) => Some("right"),
                    Some(ColumnAlignment::None) | None => None,
                };
                if let Some(class) = class {
                    node.set_attribute("class", class);
                }
                node
            })
            .collect();
        RenderNode::element("tr", cells)
    }

    fn render_aside(&self, children: &[Markup], ctx: RenderContext) -> RenderNode {
        let aside = aside::detect(children);
        let mut content = vec![RenderNode::element_with(
            "p",
            [("class", "label")],
            vec![RenderNode::text(aside.kind.display_name())],
        )];
        content.extend(self.render_children(&aside.content, ctx));
        RenderNode::element_with(
            "blockquote",
            [("class", format!("aside {}", aside.kind.css_class()))],
            content,
        )
    }

    fn render_directive(&self, directive: &BlockDirective, ctx: RenderContext, out: &mut Vec<RenderNode>) {
        let section = |class: &str, heading: Option<RenderNode>, out: &mut Vec<RenderNode>| {
            let mut children: Vec<RenderNode> = heading.into_iter().collect();
            children.extend(self.render_children(&directive.children, ctx));
            out.push(RenderNode::element_with("section", [("class", class)], children));
        };
        let titled = |level: u8, title: &str| {
            RenderNode::element_with(
                &format!("h{level}"),
                [("id", url_readable_fragment(title))],
                vec![RenderNode::text(title)],
            )
        };

        match directive.name.as_str() {
            "Metadata" | "TechnologyRoot" => {}
            "Row" => {
                let columns = directive
                    .child_directives("Column")
                    .map(|column| self.render_column(column, ctx.removing_indentation(&directive.source)))
                    .collect();
                out.push(RenderNode::element_with("div", [("class", "row")], columns));
            }
            "Column" => out.push(self.render_column(directive, ctx)),
            "TabNavigator" => {
                let mut tabs = Vec::new();
                for tab in directive.child_directives("Tab") {
                    let title = tab.unlabeled_argument().unwrap_or_default();
                    let inner = ctx.removing_indentation(&tab.source);
                    if !title.eq_ignore_ascii_case(&self.options.default_language) {
                        tabs.push(RenderNode::element(
                            "p",
                            vec![RenderNode::element("b", vec![RenderNode::text(format!("{title}:"))])],
                        ));
                    }
                    tabs.extend(self.render_children(&tab.children, inner));
                }
                out.push(RenderNode::element_with("div", [("class", "tab-navigator")], tabs));
            }
            "Tab" => out.extend(self.render_children(&directive.children, ctx)),
            "Links" => {
                let style = directive.argument("visualStyle").unwrap_or("list");
                let inner = ctx.entering_link_list(LinkListSection::Links);
                out.push(RenderNode::element_with(
                    "div",
                    [("class", format!("links {style}"))],
                    self.render_children(&directive.children, inner),
                ));
            }
            "Small" => {
                out.push(RenderNode::element("small", self.render_children(&directive.children, ctx)));
            }
            "Image" => {
                if let Some(source) = directive.argument("source") {
                    out.extend(self.render_image(source, directive.argument("alt").unwrap_or_default(), None));
                }
            }
            "Snippet" => {
                if let Some(path) = directive.argument("path") {
                    out.extend(self.file_code_block(path));
                }
            }
            "Code" => {
                if let Some(file) = directive.argument("file") {
                    let name = directive.argument("name").unwrap_or(file);
                    let mut children = vec![RenderNode::element("figcaption", vec![RenderNode::text(name)])];
                    children.extend(self.file_code_block(file));
                    out.push(RenderNode::element_with("figure", [("class", "code")], children));
                }
            }
            "Tutorials" => section("tutorials", None, out),
            "Intro" => section(
                "intro",
                Some(titled(1, directive.argument("title").unwrap_or_default())),
                out,
            ),
            "Volume" => section(
                "volume",
                Some(titled(2, directive.argument("name").unwrap_or_default())),
                out,
            ),
            "Chapter" => section(
                "chapter",
                Some(titled(3, directive.argument("name").unwrap_or_default())),
                out,
            ),
            "TutorialReference" => {
                if let Some(tutorial) = directive.argument("tutorial") {
                    let destination = tutorial.trim_start_matches('<').trim_end_matches('>');
                    let mut link = Vec::new();
                    self.render_link(destination, None, &[], ctx, &mut link);
                    out.push(RenderNode::element_with("p", [("class", "tutorial-reference")], link));
                }
            }
            "Tutorial" => section("tutorial", None, out),
            "Section" => section(
                "section",
                Some(titled(2, directive.argument("title").unwrap_or_default())),
                out,
            ),
            "Steps" => {
                let mut steps = Vec::new();
                for child in &directive.children {
                    match child {
                        Markup::BlockDirective(step) if step.name == "Step" => {
                            steps.push(RenderNode::element_with(
                                "li",
                                [("class", "step")],
                                self.render_children(&step.children, ctx),
                            ));
                        }
                        other => self.render(other, ctx, out),
                    }
                }
                out.push(RenderNode::element_with("ol", [("class", "steps")], steps));
            }
            "Step" => out.push(RenderNode::element_with(
                "div",
                [("class", "step")],
                self.render_children(&directive.children, ctx),
            )),
            "Assessments" => section("assessments", Some(titled(2, ASSESSMENTS_TITLE)), out),
            "MultipleChoice" => out.push(RenderNode::element_with(
                "div",
                [("class", "multiple-choice")],
                self.render_children(&directive.children, ctx),
            )),
            "Choice" => {
                let correct = directive.argument("isCorrect").unwrap_or("false");
                out.push(RenderNode::element_with(
                    "div",
                    [("class", "choice"), ("data-correct", correct)],
                    self.render_children(&directive.children, ctx),
                ));
            }
            "Justification" => out.push(RenderNode::element_with(
                "div",
                [("class", "justification")],
                self.render_children(&directive.children, ctx),
            )),
            other => {
                tracing::debug!(directive = other, "rendering contents of unknown directive");
                out.extend(self.render_children(&directive.children, ctx));
            }
        }
    }

    fn render_column(&self, column: &BlockDirective, ctx: RenderContext) -> RenderNode {
        let inner = ctx.removing_indentation(&column.source);
        let mut node = RenderNode::element_with(
            "div",
            [("class", "column")],
            self.render_children(&column.children, inner),
        );
        if let Some(size) = column.argument("size") {
            node.set_attribute("data-size", size);
        }
        node
    }

    fn file_code_block(&self, path: &str) -> Option<RenderNode> {
        let Some(contents) = self.provider.file_contents(path) else {
            tracing::debug!(path, page = %self.options.page_path, "referenced file not found");
            return None;
        };
        let language = path.rsplit_once('.').map(|(_, extension)| extension);
        Some(code_block(language, &contents))
    }
}

fn code_voice(code: &str) -> RenderNode {
    RenderNode::element("code", vec![RenderNode::text(code)])
}

fn code_block(language: Option<&str>, code: &str) -> RenderNode {
    let code = RenderNode::element("code", vec![RenderNode::text(code)]);
    match language {
        Some(language) if !language.is_empty() => {
            RenderNode::element_with("pre", [("class", language)], vec![code])
        }
        _ => RenderNode::element("pre", vec![code]),
    }
}

fn display_name(names: &LinkedElementNames, force_code: bool) -> Vec<RenderNode> {
    match names {
        LinkedElementNames::Single(LinkedName::Conceptual(title)) if !force_code => {
            vec![RenderNode::text(title.as_str())]
        }
        LinkedElementNames::Single(LinkedName::Conceptual(name) | LinkedName::Symbol(name)) => {
            vec![code_voice(name)]
        }
        LinkedElementNames::LanguageSpecificSymbol(names) => names
            .iter()
            .map(|(language, name)| {
                RenderNode::element_with(
                    "code",
                    [("class", format!("{language}-only"))],
                    vec![RenderNode::text(name.as_str())],
                )
            })
            .collect(),
    }
}

/// Whitespace-only text, possibly wrapped in empty paragraphs.
fn is_blank(nodes: &[RenderNode]) -> bool {
    nodes.iter().all(|node| match node {
        RenderNode::Text { text } => text.trim().is_empty(),
        RenderNode::Element { name, children, .. } => name == "p" && is_blank(children),
    })
}
