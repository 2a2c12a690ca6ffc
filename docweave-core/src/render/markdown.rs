//! Markdown rendering of markup.
//!
//! Links in Topics and See Also lists are also recorded as
//! [`Relationship`]s between pages.

use std::collections::BTreeSet;

use crate::manifest::{Relationship, RelationshipType};
use crate::markup::{BlockDirective, ColumnAlignment, ListItem, Markup, Table, TableCell, plain_text};
use crate::render::aside;
use crate::render::path::{relative_path, url_readable_fragment};
use crate::render::provider::{
    LinkProvider, LinkedElement, LinkedElementNames, LinkedName, RenderOptions, last_path_component,
};
use crate::render::{LinkListSection, LinkListState, RenderContext, resolve_symbol, with_sections};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkdownOutput {
    pub markdown: String,
    pub relationships: BTreeSet<Relationship>,
}

/// Renders markup for one page. Consumed by rendering.
pub struct MarkdownRenderer<'a> {
    provider: &'a dyn LinkProvider,
    options: &'a RenderOptions,
    out: String,
    relationships: BTreeSet<Relationship>,
    last_heading: Option<String>,
}

impl<'a> MarkdownRenderer<'a> {
    pub fn new(provider: &'a dyn LinkProvider, options: &'a RenderOptions) -> Self {
        Self {
            provider,
            options,
            out: String::new(),
            relationships: BTreeSet::new(),
            last_heading: None,
        }
    }

    /// Render a page body, treating `## Topics` and `## See Also` lists as link lists.
    pub fn render_document(mut self, blocks: &[Markup]) -> MarkdownOutput {
        for (block, section) in with_sections(blocks) {
            let ctx = match section {
                Some(section) => RenderContext::default().entering_link_list(section),
                None => RenderContext::default(),
            };
            self.render(block, ctx);
        }
        self.finish()
    }

    pub fn render_blocks(mut self, blocks: &[Markup]) -> MarkdownOutput {
        self.render_children(blocks, RenderContext::default());
        self.finish()
    }

    fn finish(self) -> MarkdownOutput {
        let mut markdown = self.out.trim_end().to_string();
        if !markdown.is_empty() {
            markdown.push('\n');
        }
        MarkdownOutput {
            markdown,
            relationships: self.relationships,
        }
    }

    /// Separate the next block from earlier output by one blank line.
    fn start_block(&mut self) {
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }

    /// Run `render` against an empty buffer and return what it wrote.
    fn capture(&mut self, render: impl FnOnce(&mut Self)) -> String {
        let saved = std::mem::take(&mut self.out);
        render(self);
        std::mem::replace(&mut self.out, saved)
    }

    fn render_children(&mut self, nodes: &[Markup], ctx: RenderContext) {
        for node in nodes {
            self.render(node, ctx);
        }
    }

    fn wrap(&mut self, marker: &str, children: &[Markup], ctx: RenderContext) {
        self.out.push_str(marker);
        self.render_children(children, ctx);
        self.out.push_str(marker);
    }

    fn render(&mut self, node: &Markup, ctx: RenderContext) {
        match node {
            Markup::Paragraph { children } => {
                self.start_block();
                self.render_children(children, ctx);
            }
            Markup::Heading { level, children } => {
                self.start_block();
                self.out.push_str(&"#".repeat(usize::from(*level)));
                self.out.push(' ');
                self.render_children(children, ctx);
                self.last_heading = Some(plain_text(children));
            }
            Markup::Emphasis { children } => self.wrap("*", children, ctx),
            Markup::Strong { children } => self.wrap("**", children, ctx),
            Markup::Strikethrough { children } => self.wrap("~~", children, ctx),
            Markup::InlineCode { code } => self.out.push_str(&inline_code(code)),
            Markup::Text { text } => self.out.push_str(text),
            Markup::SoftBreak => self.out.push('\n'),
            Markup::LineBreak => self.out.push_str("  \n"),
            Markup::ThematicBreak => {
                self.start_block();
                self.out.push_str("-----");
            }
            Markup::Link {
                destination,
                title: _,
                children,
            } => self.render_link(destination, children, ctx),
            Markup::SymbolLink { destination } => self.render_symbol_link(destination, ctx),
            Markup::Image {
                source, children, ..
            } => self.push_image(source, &plain_text(children)),
            Markup::Table(table) => {
                self.start_block();
                self.render_table(table, ctx);
            }
            Markup::OrderedList { start, items } => {
                self.start_block();
                self.render_list(items, Some(*start), ctx);
            }
            Markup::UnorderedList { items } => {
                self.start_block();
                self.render_list(items, None, ctx);
            }
            Markup::CodeBlock { language, code } => {
                self.start_block();
                self.push_code_block(language.as_deref().unwrap_or_default(), code);
            }
            Markup::BlockQuote { children } => {
                self.start_block();
                self.render_aside(children, ctx);
            }
            Markup::InlineHtml { html } => self.out.push_str(html),
            Markup::HtmlBlock { html } => {
                self.start_block();
                self.out.push_str(html.trim_end());
            }
            Markup::BlockDirective(directive) => self.render_directive(directive, ctx),
        }
    }

    fn render_list(&mut self, items: &[ListItem], start: Option<u64>, ctx: RenderContext) {
        let separator = if ctx.link_list.is_on() { "\n\n" } else { "\n" };
        let mut number = start.unwrap_or(1);
        let mut first = true;
        for item in items {
            let mut content = self.capture(|this| this.render_children(&item.children, ctx));
            if ctx.link_list.is_on() && content.trim().is_empty() {
                continue;
            }
            if let Some(checked) = item.checkbox {
                content.insert_str(0, if checked { "[x] " } else { "[ ] " });
            }
            let marker = match start {
                Some(_) => format!("{number}. "),
                None => "- ".to_string(),
            };
            number += 1;
            if !first {
                self.out.push_str(separator);
            }
            first = false;
            self.out.push_str(&marker);
            self.out.push_str(&indent_continuation(&content, marker.len()));
        }
    }

    fn render_link(&mut self, destination: &str, children: &[Markup], ctx: RenderContext) {
        if !destination.starts_with("doc:") {
            if children.is_empty() {
                self.out.push_str(&format!("<{destination}>"));
            } else {
                let text = self.capture(|this| this.render_children(children, ctx));
                self.out.push_str(&format!("[{text}]({destination})"));
            }
            return;
        }

        match self.provider.element(destination, &self.options.page_path) {
            Some(element) => self.push_resolved(&element, children, false, ctx),
            None => {
                tracing::debug!(destination, page = %self.options.page_path, "unresolved link");
                if children.is_empty() {
                    let text = self
                        .provider
                        .fallback_link_text(destination)
                        .unwrap_or_else(|| last_path_component(destination).to_string());
                    self.out.push_str(&text);
                } else {
                    self.render_children(children, ctx);
                }
            }
        }
    }

    fn render_symbol_link(&mut self, destination: &str, ctx: RenderContext) {
        match resolve_symbol(self.provider, destination, &self.options.page_path) {
            Some(element) => self.push_resolved(&element, &[], true, ctx),
            None => {
                tracing::debug!(destination, page = %self.options.page_path, "unresolved symbol link");
                if !ctx.link_list.is_on() {
                    self.out.push_str(&inline_code(destination));
                }
            }
        }
    }

    fn push_resolved(
        &mut self,
        element: &LinkedElement,
        authored: &[Markup],
        force_code: bool,
        ctx: RenderContext,
    ) {
        let text = if authored.is_empty() {
            self.display_name(&element.names, force_code)
        } else {
            self.capture(|this| this.render_children(authored, ctx))
        };
        let href = relative_path(&self.options.page_path, &element.path);
        self.out.push_str(&format!("[{text}]({href})"));

        if ctx.link_list == LinkListState::Active {
            self.record_relationship(element, ctx.section);
            if !element.abstract_content.is_empty() {
                self.out.push_str("\n\n");
                self.render_children(&element.abstract_content, ctx.nested());
            }
        }
    }

    fn display_name(&self, names: &LinkedElementNames, force_code: bool) -> String {
        match names {
            LinkedElementNames::Single(LinkedName::Conceptual(title)) if !force_code => title.clone(),
            LinkedElementNames::Single(LinkedName::Conceptual(name) | LinkedName::Symbol(name)) => {
                inline_code(name)
            }
            LinkedElementNames::LanguageSpecificSymbol(names) => names
                .get(&self.options.default_language)
                .or_else(|| names.values().next())
                .map(|name| inline_code(name))
                .unwrap_or_default(),
        }
    }

    fn record_relationship(&mut self, element: &LinkedElement, section: Option<LinkListSection>) {
        let page = &self.options.page_path;
        let relationship = match section {
            Some(LinkListSection::Topics) => Relationship {
                source_identifier: element.path.clone(),
                relationship_type: RelationshipType::BelongsToTopic,
                subtype: element.kind.clone(),
                target_identifier: match &self.last_heading {
                    Some(heading) => format!("{page}#{}", url_readable_fragment(heading)),
                    None => page.clone(),
                },
            },
            Some(LinkListSection::SeeAlso) => Relationship {
                source_identifier: page.clone(),
                relationship_type: RelationshipType::RelatedSymbol,
                subtype: element.kind.clone(),
                target_identifier: element.path.clone(),
            },
            Some(LinkListSection::Links) | None => return,
        };
        self.relationships.insert(relationship);
    }

    /// Images are re-pathed into the bundle's image directory.
    fn push_image(&mut self, source: &str, alt: &str) {
        if source.contains("://") {
            self.out.push_str(&format!("![{alt}]({source})"));
            return;
        }
        let Some(asset) = self.provider.asset_named(source) else {
            tracing::debug!(source, page = %self.options.page_path, "image asset not found");
            return;
        };
        let file = file_name(asset.primary_url().unwrap_or(source));
        self.out
            .push_str(&format!("![{alt}](images/{}/{file})", self.options.bundle_id));
    }

    fn render_table(&mut self, table: &Table, ctx: RenderContext) {
        let mut lines = vec![self.table_row(&table.head, ctx)];
        let alignments: String = table
            .alignments
            .iter()
            .map(|alignment| match alignment {
                ColumnAlignment::None => "---|",
                ColumnAlignment::Left => ":--|",
                ColumnAlignment::Center => ":-:|",
                ColumnAlignment::Right => "--:|",
            })
            .collect();
        lines.push(format!("|{alignments}"));
        for row in &table.body {
            lines.push(self.table_row(row, ctx));
        }
        self.out.push_str(&lines.join("\n"));
    }

    /// A pipe-table row; continuation cells are written back as `||` and `^`.
    fn table_row(&mut self, cells: &[TableCell], ctx: RenderContext) -> String {
        let mut line = String::from("|");
        for cell in cells {
            if cell.colspan == 0 {
                line.push('|');
                continue;
            }
            let text = if cell.rowspan == 0 {
                "^".to_string()
            } else {
                self.capture(|this| this.render_children(&cell.children, ctx))
            };
            line.push(' ');
            line.push_str(&text.replace('\n', " "));
            line.push_str(" |");
        }
        line
    }

    fn render_aside(&mut self, children: &[Markup], ctx: RenderContext) {
        let aside = aside::detect(children);
        let content = self.capture(|this| this.render_children(&aside.content, ctx));
        let text = format!("{}: {content}", aside.kind.raw_value());
        let quoted: Vec<String> = text
            .lines()
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect();
        self.out.push_str(&quoted.join("\n"));
    }

    fn push_code_block(&mut self, language: &str, code: &str) {
        let fence = if code.contains("```") { "````" } else { "```" };
        self.out.push_str(fence);
        self.out.push_str(language);
        self.out.push('\n');
        self.out.push_str(code);
        if !code.ends_with('\n') {
            self.out.push('\n');
        }
        self.out.push_str(fence);
    }

    fn push_file(&mut self, path: &str) {
        let Some(contents) = self.provider.file_contents(path) else {
            tracing::debug!(path, page = %self.options.page_path, "referenced file not found");
            return;
        };
        let language = path.rsplit_once('.').map_or("", |(_, extension)| extension);
        self.start_block();
        self.push_code_block(language, &contents);
    }

    fn render_directive(&mut self, directive: &BlockDirective, ctx: RenderContext) {
        match directive.name.as_str() {
            "Metadata" | "TechnologyRoot" => {}
            "Row" => {
                for column in directive.child_directives("Column") {
                    self.render_children(&column.children, ctx.removing_indentation(&column.source));
                }
            }
            "Column" | "Tab" | "Small" => {
                self.render_children(&directive.children, ctx.removing_indentation(&directive.source));
            }
            "TabNavigator" => {
                for tab in directive.child_directives("Tab") {
                    let title = tab.unlabeled_argument().unwrap_or_default();
                    if !title.eq_ignore_ascii_case(&self.options.default_language) {
                        self.start_block();
                        self.out.push_str(&format!("**{title}:**"));
                    }
                    self.render_children(&tab.children, ctx.removing_indentation(&tab.source));
                }
            }
            "Links" => {
                self.render_children(&directive.children, ctx.entering_link_list(LinkListSection::Links));
            }
            "Image" => {
                if let Some(source) = directive.argument("source") {
                    self.start_block();
                    self.push_image(source, directive.argument("alt").unwrap_or_default());
                }
            }
            "Snippet" => {
                if let Some(path) = directive.argument("path") {
                    self.push_file(path);
                }
            }
            "Code" => {
                if let Some(file) = directive.argument("file") {
                    self.push_file(file);
                }
            }
            _ => self.push_raw_directive(directive, ctx),
        }
    }

    /// Write a directive without a markdown form back out as source.
    fn push_raw_directive(&mut self, directive: &BlockDirective, ctx: RenderContext) {
        self.start_block();
        self.out.push('@');
        self.out.push_str(&directive.name);
        if !directive.arguments.is_empty() {
            self.out.push('(');
            self.out.push_str(&format_arguments(&directive.arguments));
            self.out.push(')');
        }
        if directive.source.is_empty() {
            return;
        }
        self.out.push_str(" {\n");
        for line in &directive.source {
            self.out.push_str(ctx.strip_indentation(line).trim_end());
            self.out.push('\n');
        }
        self.out.push('}');
    }
}

fn inline_code(code: &str) -> String {
    if code.contains('`') {
        format!("`` {code} ``")
    } else {
        format!("`{code}`")
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Indent every line after the first by `width` spaces.
fn indent_continuation(text: &str, width: usize) -> String {
    let padding = " ".repeat(width);
    let mut out = String::with_capacity(text.len());
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&padding);
            }
        }
        out.push_str(line);
    }
    out
}

fn format_arguments(arguments: &[(String, String)]) -> String {
    arguments
        .iter()
        .map(|(label, value)| {
            let value = if value.contains([',', '(', ')', '"', ' ']) || value.is_empty() {
                format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
            } else {
                value.clone()
            };
            if label.is_empty() {
                value
            } else {
                format!("{label}: {value}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::markup::parse;
    use crate::render::provider::{ColorStyle, LinkedAsset};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Fixture {
        elements: BTreeMap<String, LinkedElement>,
        symbols: BTreeMap<String, LinkedElement>,
        precise: BTreeMap<String, LinkedElement>,
        assets: BTreeMap<String, LinkedAsset>,
    }

    impl LinkProvider for Fixture {
        fn element(&self, destination: &str, _page: &str) -> Option<LinkedElement> {
            self.elements.get(destination).cloned()
        }
        fn symbol(&self, path: &str, _page: &str) -> Option<LinkedElement> {
            self.symbols.get(path).cloned()
        }
        fn symbol_by_precise_identifier(&self, precise: &str) -> Option<LinkedElement> {
            self.precise.get(precise).cloned()
        }
        fn asset_named(&self, name: &str) -> Option<LinkedAsset> {
            self.assets.get(name).cloned()
        }
    }

    fn fixture() -> Fixture {
        let mut fixture = Fixture::default();
        fixture.elements.insert(
            "doc:GettingStarted".into(),
            LinkedElement {
                path: "/documentation/MyKit/GettingStarted".into(),
                names: LinkedElementNames::Single(LinkedName::Conceptual("Getting Started".into())),
                abstract_content: vec![
                    Markup::text("Learn about "),
                    Markup::SymbolLink {
                        destination: "Foo".into(),
                    },
                    Markup::text("."),
                ],
                kind: None,
            },
        );
        fixture.symbols.insert(
            "Foo".into(),
            LinkedElement {
                path: "/documentation/MyKit/Foo".into(),
                names: LinkedElementNames::Single(LinkedName::Symbol("Foo".into())),
                abstract_content: vec![Markup::text("A foo.")],
                kind: Some("swift.struct".into()),
            },
        );
        let foo = fixture.symbols["Foo"].clone();
        fixture.precise.insert("s:5MyKit3FooV".into(), foo);
        let mut logo = LinkedAsset::default();
        logo.images.insert(
            ColorStyle::Light,
            BTreeMap::from([(1, "/images/org.example.MyKit/logo.png".to_string())]),
        );
        fixture.assets.insert("logo".into(), logo);
        fixture
    }

    fn render(source: &str) -> MarkdownOutput {
        let provider = fixture();
        let options = RenderOptions::new("/documentation/MyKit", "org.example.MyKit");
        let document = parse(source).document;
        MarkdownRenderer::new(&provider, &options).render_document(&document.blocks)
    }

    #[test]
    fn blocks_are_separated_by_single_blank_lines() {
        let output = render("# Title\n\nSome *em* and **strong** with `code`.\n\n## Overview\n\n- one\n- two\n");
        assert_eq!(
            output.markdown,
            "# Title\n\nSome *em* and **strong** with `code`.\n\n## Overview\n\n- one\n- two\n"
        );
        assert!(output.relationships.is_empty());
    }

    #[test]
    fn topics_and_see_also_record_relationships() {
        let output = render(
            "# MyKit\n\n## Topics\n\n### Essentials\n\n- <doc:GettingStarted>\n- ``Foo``\n- ``Missing``\n\n## See Also\n\n- ``Foo``\n",
        );
        assert_eq!(
            output.markdown,
            "# MyKit\n\n## Topics\n\n### Essentials\n\n\
             - [Getting Started](GettingStarted)\n\n  Learn about [`Foo`](Foo).\n\n\
             - [`Foo`](Foo)\n\n  A foo.\n\n\
             ## See Also\n\n\
             - [`Foo`](Foo)\n\n  A foo.\n"
        );
        let expected = BTreeSet::from([
            Relationship {
                source_identifier: "/documentation/MyKit/GettingStarted".into(),
                relationship_type: RelationshipType::BelongsToTopic,
                subtype: None,
                target_identifier: "/documentation/MyKit#Essentials".into(),
            },
            Relationship {
                source_identifier: "/documentation/MyKit/Foo".into(),
                relationship_type: RelationshipType::BelongsToTopic,
                subtype: Some("swift.struct".into()),
                target_identifier: "/documentation/MyKit#Essentials".into(),
            },
            Relationship {
                source_identifier: "/documentation/MyKit".into(),
                relationship_type: RelationshipType::RelatedSymbol,
                subtype: Some("swift.struct".into()),
                target_identifier: "/documentation/MyKit/Foo".into(),
            },
        ]);
        assert_eq!(output.relationships, expected);
    }

    #[test]
    fn symbol_links_fall_back_to_precise_identifiers() {
        let output = render("Use ``s:5MyKit3FooV`` or ``s:5MyKit3BarV``.");
        assert_eq!(output.markdown, "Use [`Foo`](Foo) or `s:5MyKit3BarV`.\n");
    }

    #[test]
    fn links_outside_lists_record_nothing() {
        let output = render("See <doc:GettingStarted>, <doc:Missing/Page> and <https://example.com>.");
        assert_eq!(
            output.markdown,
            "See [Getting Started](GettingStarted), Page and <https://example.com>.\n"
        );
        assert!(output.relationships.is_empty());
    }

    #[test]
    fn images_tables_and_asides() {
        let output = render(
            "![Logo](logo)\n\n> Warning: Careful.\n\n| A | B |\n|:--|--:|\n| wide ||\n",
        );
        assert_eq!(
            output.markdown,
            "![Logo](images/org.example.MyKit/logo.png)\n\n\
             > Warning: Careful.\n\n\
             | A | B |\n|:--|--:|\n| wide ||\n"
        );
    }

    #[test]
    fn raw_directives_lose_layout_indentation() {
        let output = render(
            "@Row {\n   @Column {\n      @Custom(title: \"A, B\") {\n         stuff\n      }\n   }\n}\n",
        );
        assert_eq!(output.markdown, "@Custom(title: \"A, B\") {\nstuff\n}\n");
    }

    #[test]
    fn layout_bodies_with_wide_whitespace_render() {
        let output = render(
            "@Row {\n   @Column {\n      @Custom {\n\u{a0}\u{a0}x\n      }\n   }\n}\n",
        );
        assert!(output.markdown.starts_with("@Custom"));
        assert!(output.markdown.contains('x'));
    }

    #[test]
    fn non_default_tabs_get_a_lead_in() {
        let output = render(
            "@TabNavigator {\n   @Tab(\"Swift\") {\n      Native.\n   }\n   @Tab(\"Objective-C\") {\n      Bridged.\n   }\n}\n",
        );
        assert_eq!(output.markdown, "Native.\n\n**Objective-C:**\n\nBridged.\n");
    }

    #[test]
    fn indentation_of_list_continuations() {
        assert_eq!(indent_continuation("a\n\nb\nc", 3), "a\n\n   b\n   c");
    }
}
