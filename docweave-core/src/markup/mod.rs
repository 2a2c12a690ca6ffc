//! The markup tree: markdown blocks and inlines plus `@Directive` blocks.
//!
//! Markup is a closed sum type. Every consumer matches it exhaustively, so a
//! new node kind cannot be added without updating each renderer.

pub mod arguments;
mod cmark;
mod scan;

use serde::{Deserialize, Serialize};

use crate::error::{Diagnostic, Error, Span};

pub use arguments::parse_arguments;

/// A parsed markup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Markup>,
    /// Original source text that was parsed.
    pub source: String,
}

/// Result of parsing markup source.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub document: Document,
    /// Non-fatal diagnostics collected during parsing.
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Markup {
    Paragraph {
        children: Vec<Markup>,
    },
    Heading {
        level: u8,
        children: Vec<Markup>,
    },
    Emphasis {
        children: Vec<Markup>,
    },
    Strong {
        children: Vec<Markup>,
    },
    Strikethrough {
        children: Vec<Markup>,
    },
    InlineCode {
        code: String,
    },
    Text {
        text: String,
    },
    SoftBreak,
    LineBreak,
    ThematicBreak,
    /// A link. Autolinks such as `<doc:Article>` have no children.
    Link {
        destination: String,
        title: Option<String>,
        children: Vec<Markup>,
    },
    /// A double-backtick symbol reference: ``` ``Foo/bar()`` ```.
    SymbolLink {
        destination: String,
    },
    Image {
        source: String,
        title: Option<String>,
        children: Vec<Markup>,
    },
    Table(Table),
    OrderedList {
        start: u64,
        items: Vec<ListItem>,
    },
    UnorderedList {
        items: Vec<ListItem>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    BlockQuote {
        children: Vec<Markup>,
    },
    InlineHtml {
        html: String,
    },
    HtmlBlock {
        html: String,
    },
    BlockDirective(BlockDirective),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub checkbox: Option<bool>,
    pub children: Vec<Markup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnAlignment {
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub alignments: Vec<ColumnAlignment>,
    pub head: Vec<TableCell>,
    pub body: Vec<Vec<TableCell>>,
}

/// A table cell. A span of 0 marks a continuation of a neighbouring cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub colspan: u32,
    pub rowspan: u32,
    pub children: Vec<Markup>,
}

impl TableCell {
    pub fn new(children: Vec<Markup>) -> Self {
        Self {
            colspan: 1,
            rowspan: 1,
            children,
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.colspan == 0 || self.rowspan == 0
    }
}

/// An `@Name(arguments) { ... }` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDirective {
    pub name: String,
    /// Arguments in source order; unlabeled arguments have an empty label.
    pub arguments: Vec<(String, String)>,
    pub children: Vec<Markup>,
    /// The body lines as written, before dedenting.
    pub source: Vec<String>,
    pub span: Span,
}

impl BlockDirective {
    pub fn argument(&self, label: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn unlabeled_argument(&self) -> Option<&str> {
        self.argument("")
    }

    /// Child directives with the given name, in order.
    pub fn child_directives<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a BlockDirective> {
        self.children.iter().filter_map(move |child| match child {
            Markup::BlockDirective(d) if d.name == name => Some(d),
            _ => None,
        })
    }
}

impl Markup {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn paragraph(children: Vec<Markup>) -> Self {
        Self::Paragraph { children }
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Self::Emphasis { .. }
                | Self::Strong { .. }
                | Self::Strikethrough { .. }
                | Self::InlineCode { .. }
                | Self::Text { .. }
                | Self::SoftBreak
                | Self::LineBreak
                | Self::Link { .. }
                | Self::SymbolLink { .. }
                | Self::Image { .. }
                | Self::InlineHtml { .. }
        )
    }

    /// Direct children, for the node kinds that have markup children.
    pub fn children(&self) -> &[Markup] {
        match self {
            Self::Paragraph { children }
            | Self::Heading { children, .. }
            | Self::Emphasis { children }
            | Self::Strong { children }
            | Self::Strikethrough { children }
            | Self::Link { children, .. }
            | Self::Image { children, .. }
            | Self::BlockQuote { children } => children,
            Self::BlockDirective(directive) => &directive.children,
            _ => &[],
        }
    }
}

/// Concatenated text content of `nodes`, without formatting.
pub fn plain_text(nodes: &[Markup]) -> String {
    let mut out = String::new();
    push_plain_text(nodes, &mut out);
    out
}

fn push_plain_text(nodes: &[Markup], out: &mut String) {
    for node in nodes {
        match node {
            Markup::Text { text } => out.push_str(text),
            Markup::InlineCode { code } => out.push_str(code),
            Markup::SymbolLink { destination } => out.push_str(destination),
            Markup::SoftBreak | Markup::LineBreak => out.push(' '),
            Markup::Table(_)
            | Markup::OrderedList { .. }
            | Markup::UnorderedList { .. }
            | Markup::CodeBlock { .. }
            | Markup::InlineHtml { .. }
            | Markup::HtmlBlock { .. }
            | Markup::ThematicBreak => {}
            other => push_plain_text(other.children(), out),
        }
    }
}

impl Document {
    /// Text of the first level-1 heading.
    pub fn title(&self) -> Option<String> {
        self.blocks.iter().find_map(|block| match block {
            Markup::Heading { level: 1, children } => Some(plain_text(children)),
            _ => None,
        })
    }

    /// The raw heading node, used for symbol-link titles in extension files.
    pub fn title_heading(&self) -> Option<&[Markup]> {
        self.blocks.iter().find_map(|block| match block {
            Markup::Heading { level: 1, children } => Some(children.as_slice()),
            _ => None,
        })
    }

    /// The first paragraph after the title.
    pub fn abstract_paragraph(&self) -> Option<&[Markup]> {
        let title = self
            .blocks
            .iter()
            .position(|b| matches!(b, Markup::Heading { level: 1, .. }))?;
        match self.blocks.get(title + 1) {
            Some(Markup::Paragraph { children }) => Some(children),
            _ => None,
        }
    }

    /// Blocks after the title and abstract.
    pub fn discussion(&self) -> &[Markup] {
        let mut start = self
            .blocks
            .iter()
            .position(|b| matches!(b, Markup::Heading { level: 1, .. }))
            .map_or(0, |title| title + 1);
        if matches!(self.blocks.get(start), Some(Markup::Paragraph { .. })) {
            start += 1;
        }
        &self.blocks[start.min(self.blocks.len())..]
    }

    /// Top-level directives with the given name.
    pub fn directives<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a BlockDirective> {
        self.blocks.iter().filter_map(move |block| match block {
            Markup::BlockDirective(d) if d.name == name => Some(d),
            _ => None,
        })
    }
}

/// Parse markup source into a `ParseResult`.
///
/// Never fails: malformed directives produce diagnostics and a best-effort
/// document.
pub fn parse(input: &str) -> ParseResult {
    let normalised = input.replace("\r\n", "\n");
    let mut diagnostics = Vec::new();
    let blocks = parse_blocks(&normalised, 0, &mut diagnostics);
    ParseResult {
        document: Document {
            blocks,
            source: normalised,
        },
        diagnostics,
    }
}

/// Parse a fragment whose first line is line `line_offset + 1` of the file.
fn parse_blocks(source: &str, line_offset: usize, diagnostics: &mut Vec<Diagnostic>) -> Vec<Markup> {
    let mut blocks = Vec::new();
    for segment in scan::scan_segments(source, line_offset, diagnostics) {
        match segment {
            scan::Segment::Markdown(text) => blocks.extend(cmark::convert(&text)),
            scan::Segment::Directive(raw) => {
                let arguments = match parse_arguments(&raw.arguments) {
                    Ok(arguments) => arguments,
                    Err(message) => {
                        let mut diagnostic = Diagnostic::from(Error::InvalidArguments {
                            name: raw.name.clone(),
                            message,
                        });
                        diagnostic.span = Some(raw.span);
                        diagnostics.push(diagnostic);
                        Vec::new()
                    }
                };
                let body = dedent(&raw.body);
                let children = parse_blocks(&body, raw.body_start_line, diagnostics);
                blocks.push(Markup::BlockDirective(BlockDirective {
                    name: raw.name,
                    arguments,
                    children,
                    source: raw.body,
                    span: raw.span,
                }));
            }
        }
    }
    blocks
}

/// Number of leading whitespace characters in `line`.
pub(crate) fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// `line` without up to `count` leading whitespace characters.
pub(crate) fn strip_leading_whitespace(line: &str, count: usize) -> &str {
    let mut rest = line;
    for _ in 0..count {
        match rest.chars().next() {
            Some(c) if c.is_whitespace() => rest = &rest[c.len_utf8()..],
            _ => break,
        }
    }
    rest
}

/// Remove the whitespace prefix shared by every non-blank line.
fn dedent(lines: &[String]) -> String {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| leading_whitespace(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| strip_leading_whitespace(l, indent).trim_end_matches(' '))
        .collect::<Vec<_>>()
        .join("\n")
}
