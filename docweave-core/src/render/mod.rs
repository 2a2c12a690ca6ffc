//! Rendering markup to HTML nodes and to markdown.
//!
//! Both walkers thread a small `Copy` context through their recursion, so
//! every mode they enter is restored when the nested call returns.

pub mod aside;
pub mod html;
pub mod html_fragment;
pub mod markdown;
pub mod node;
pub mod path;
pub mod provider;

use crate::markup::{Markup, leading_whitespace, plain_text, strip_leading_whitespace};

pub use html::HtmlRenderer;
pub use markdown::{MarkdownOutput, MarkdownRenderer};
pub use node::{RenderNode, escape_html, to_html};
pub use path::relative_path;
pub use provider::{
    ColorStyle, LinkProvider, LinkedAsset, LinkedElement, LinkedElementNames, LinkedName,
    RenderOptions,
};

/// Whether links are currently rendered as entries of a link list.
///
/// Only the outermost list expands entries with their abstracts; links
/// rendered inside an abstract are `Nested` and stay plain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum LinkListState {
    #[default]
    Off,
    Active,
    Nested,
}

impl LinkListState {
    pub(crate) fn is_on(self) -> bool {
        self != Self::Off
    }
}

/// The kind of section a link list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkListSection {
    Topics,
    SeeAlso,
    Links,
}

impl LinkListSection {
    /// The section a level-2 heading opens, if any.
    pub fn for_heading(children: &[Markup]) -> Option<Self> {
        match plain_text(children).trim() {
            "Topics" => Some(Self::Topics),
            "See Also" => Some(Self::SeeAlso),
            _ => None,
        }
    }
}

/// Mode flags in effect while rendering a subtree.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RenderContext {
    pub(crate) link_list: LinkListState,
    pub(crate) section: Option<LinkListSection>,
    /// Leading whitespace stripped from raw source lines.
    pub(crate) indentation: usize,
}

impl RenderContext {
    pub(crate) fn entering_link_list(self, section: LinkListSection) -> Self {
        let link_list = match self.link_list {
            LinkListState::Off => LinkListState::Active,
            LinkListState::Active | LinkListState::Nested => LinkListState::Nested,
        };
        Self {
            link_list,
            section: Some(section),
            ..self
        }
    }

    /// Context for content rendered inside a link-list entry.
    pub(crate) fn nested(self) -> Self {
        match self.link_list {
            LinkListState::Off => self,
            _ => Self {
                link_list: LinkListState::Nested,
                ..self
            },
        }
    }

    /// Context for the body of a layout directive whose body lines are `source`.
    pub(crate) fn removing_indentation(self, source: &[String]) -> Self {
        let indentation = source
            .first()
            .map_or(0, |line| leading_whitespace(line));
        Self {
            indentation,
            ..self
        }
    }

    /// Strip up to `indentation` leading whitespace characters from `line`.
    pub(crate) fn strip_indentation<'l>(&self, line: &'l str) -> &'l str {
        strip_leading_whitespace(line, self.indentation)
    }
}

/// A double-backtick link target: a symbol path, or a precise identifier
/// such as `s:5MyKit3FooC`.
pub(crate) fn resolve_symbol(
    provider: &dyn LinkProvider,
    destination: &str,
    page: &str,
) -> Option<LinkedElement> {
    provider
        .symbol(destination, page)
        .or_else(|| provider.symbol_by_precise_identifier(destination))
}

/// Top-level blocks paired with the link-list section each one falls in.
pub(crate) fn with_sections(blocks: &[Markup]) -> Vec<(&Markup, Option<LinkListSection>)> {
    let mut section = None;
    blocks
        .iter()
        .map(|block| {
            if let Markup::Heading { level, children } = block {
                if *level <= 2 {
                    section = LinkListSection::for_heading(children);
                }
            }
            (block, section)
        })
        .collect()
}
