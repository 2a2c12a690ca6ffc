//! Aside (callout) detection for block quotes.

use crate::markup::Markup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsideKind {
    Note,
    Tip,
    Important,
    Experiment,
    Warning,
    Attention,
    Author,
    Authors,
    Bug,
    Complexity,
    Copyright,
    Date,
    Invariant,
    MutatingVariant,
    NonMutatingVariant,
    Postcondition,
    Precondition,
    Remark,
    Requires,
    Since,
    ToDo,
    Version,
    Throws,
    SeeAlso,
}

const ALL: &[AsideKind] = &[
    AsideKind::Note,
    AsideKind::Tip,
    AsideKind::Important,
    AsideKind::Experiment,
    AsideKind::Warning,
    AsideKind::Attention,
    AsideKind::Author,
    AsideKind::Authors,
    AsideKind::Bug,
    AsideKind::Complexity,
    AsideKind::Copyright,
    AsideKind::Date,
    AsideKind::Invariant,
    AsideKind::MutatingVariant,
    AsideKind::NonMutatingVariant,
    AsideKind::Postcondition,
    AsideKind::Precondition,
    AsideKind::Remark,
    AsideKind::Requires,
    AsideKind::Since,
    AsideKind::ToDo,
    AsideKind::Version,
    AsideKind::Throws,
    AsideKind::SeeAlso,
];

impl AsideKind {
    pub fn raw_value(self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Tip => "Tip",
            Self::Important => "Important",
            Self::Experiment => "Experiment",
            Self::Warning => "Warning",
            Self::Attention => "Attention",
            Self::Author => "Author",
            Self::Authors => "Authors",
            Self::Bug => "Bug",
            Self::Complexity => "Complexity",
            Self::Copyright => "Copyright",
            Self::Date => "Date",
            Self::Invariant => "Invariant",
            Self::MutatingVariant => "MutatingVariant",
            Self::NonMutatingVariant => "NonMutatingVariant",
            Self::Postcondition => "Postcondition",
            Self::Precondition => "Precondition",
            Self::Remark => "Remark",
            Self::Requires => "Requires",
            Self::Since => "Since",
            Self::ToDo => "ToDo",
            Self::Version => "Version",
            Self::Throws => "Throws",
            Self::SeeAlso => "SeeAlso",
        }
    }

    /// Match a keyword case-insensitively, ignoring spaces (`See Also`, `seealso`).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let normalized: String = keyword.chars().filter(|c| !c.is_whitespace()).collect();
        ALL.iter()
            .copied()
            .find(|kind| kind.raw_value().eq_ignore_ascii_case(&normalized))
    }

    /// Label shown above the aside, e.g. `Non-Mutating Variant`.
    pub fn display_name(self) -> String {
        match self {
            Self::NonMutatingVariant => "Non-Mutating Variant".to_string(),
            Self::ToDo => "To Do".to_string(),
            Self::SeeAlso => "See Also".to_string(),
            other => split_camel_case(other.raw_value()),
        }
    }

    /// CSS class for the aside.
    pub fn css_class(self) -> String {
        self.raw_value().to_ascii_lowercase()
    }
}

fn split_camel_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    for (index, c) in text.char_indices() {
        if index > 0 && c.is_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// A block quote split into its aside kind and content.
#[derive(Debug, Clone, PartialEq)]
pub struct Aside {
    pub kind: AsideKind,
    pub content: Vec<Markup>,
}

/// Detect the aside kind from a leading `Keyword:` in the first paragraph.
///
/// The keyword and colon are removed from the content. Block quotes
/// without a known keyword are notes and keep their content unchanged.
pub fn detect(children: &[Markup]) -> Aside {
    let note = || Aside {
        kind: AsideKind::Note,
        content: children.to_vec(),
    };

    let Some(Markup::Paragraph {
        children: first_inlines,
    }) = children.first()
    else {
        return note();
    };
    let Some(Markup::Text { text }) = first_inlines.first() else {
        return note();
    };
    let Some((keyword, rest)) = text.split_once(':') else {
        return note();
    };
    if keyword.len() > 24 {
        return note();
    }
    let Some(kind) = AsideKind::from_keyword(keyword) else {
        return note();
    };

    let mut paragraph = Vec::with_capacity(first_inlines.len());
    let rest = rest.trim_start();
    if !rest.is_empty() {
        paragraph.push(Markup::text(rest));
    }
    paragraph.extend(first_inlines[1..].iter().cloned());
    // A keyword on its own line leaves a leading break behind.
    if matches!(paragraph.first(), Some(Markup::SoftBreak | Markup::LineBreak)) {
        paragraph.remove(0);
    }

    let mut content = Vec::with_capacity(children.len());
    if !paragraph.is_empty() {
        content.push(Markup::paragraph(paragraph));
    }
    content.extend(children[1..].iter().cloned());
    Aside { kind, content }
}
