//! Directive schemas and the generic checker that validates parsed
//! directives against them.
//!
//! Each directive declares its arguments and the child directives it accepts
//! as static tables. Problems are reported as diagnostics; the directive is
//! still rendered on a best-effort basis.

use crate::error::Diagnostic;
use crate::markup::{BlockDirective, Document, Markup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    Text,
    Integer,
    Bool,
    OneOf(&'static [&'static str]),
}

impl ArgumentKind {
    pub fn validate(self, value: &str) -> Result<(), String> {
        match self {
            Self::Text if value.is_empty() => Err("value must not be empty".into()),
            Self::Text => Ok(()),
            Self::Integer => value
                .parse::<i64>()
                .map(|_| ())
                .map_err(|_| format!("'{value}' is not an integer")),
            Self::Bool => match value {
                "true" | "false" => Ok(()),
                _ => Err(format!("'{value}' is not 'true' or 'false'")),
            },
            Self::OneOf(allowed) if allowed.contains(&value) => Ok(()),
            Self::OneOf(allowed) => Err(format!(
                "'{value}' is not one of {}",
                allowed.join(", ")
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArgumentSpec {
    /// Argument label; empty for the unlabeled argument.
    pub name: &'static str,
    pub required: bool,
    pub kind: ArgumentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ZeroOrOne,
    ExactlyOne,
    ZeroOrMore,
    OneOrMore,
}

impl Cardinality {
    fn accepts(self, count: usize) -> bool {
        match self {
            Self::ZeroOrOne => count <= 1,
            Self::ExactlyOne => count == 1,
            Self::ZeroOrMore => true,
            Self::OneOrMore => count >= 1,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::ZeroOrOne => "at most one",
            Self::ExactlyOne => "exactly one",
            Self::ZeroOrMore => "any number of",
            Self::OneOrMore => "at least one",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChildSpec {
    pub name: &'static str,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, Copy)]
pub struct DirectiveSchema {
    pub name: &'static str,
    pub arguments: &'static [ArgumentSpec],
    pub children: &'static [ChildSpec],
    /// Whether plain markdown content is allowed in the body.
    pub allows_markup: bool,
}

// These must expand to struct literals: const fn calls are not promoted to 'static.
macro_rules! arg {
    ($name:literal, $required:expr, $kind:expr) => {
        ArgumentSpec {
            name: $name,
            required: $required,
            kind: $kind,
        }
    };
}

macro_rules! child {
    ($name:literal, $cardinality:expr) => {
        ChildSpec {
            name: $name,
            cardinality: $cardinality,
        }
    };
}

const fn schema(
    name: &'static str,
    arguments: &'static [ArgumentSpec],
    children: &'static [ChildSpec],
    allows_markup: bool,
) -> DirectiveSchema {
    DirectiveSchema {
        name,
        arguments,
        children,
        allows_markup,
    }
}

use ArgumentKind::{Bool, Integer, OneOf, Text};
use Cardinality::{ExactlyOne, OneOrMore, ZeroOrMore, ZeroOrOne};

pub const LINKS_VISUAL_STYLES: &[&str] = &["list", "compactGrid", "detailedGrid"];

static SCHEMAS: &[DirectiveSchema] = &[
    schema("Metadata", &[], &[child!("TechnologyRoot", ZeroOrOne)], false),
    schema("TechnologyRoot", &[], &[], false),
    schema(
        "Row",
        &[arg!("numberOfColumns", false, Integer)],
        &[child!("Column", OneOrMore)],
        false,
    ),
    schema("Column", &[arg!("size", false, Integer)], &[], true),
    schema("TabNavigator", &[], &[child!("Tab", OneOrMore)], false),
    schema("Tab", &[arg!("", true, Text)], &[], true),
    schema(
        "Links",
        &[arg!("visualStyle", true, OneOf(LINKS_VISUAL_STYLES))],
        &[],
        true,
    ),
    schema(
        "Image",
        &[arg!("source", true, Text), arg!("alt", false, Text)],
        &[],
        false,
    ),
    schema("Small", &[], &[], true),
    schema(
        "Snippet",
        &[arg!("path", true, Text), arg!("slice", false, Text)],
        &[],
        false,
    ),
    schema(
        "Code",
        &[arg!("name", true, Text), arg!("file", true, Text)],
        &[],
        true,
    ),
    schema(
        "Tutorials",
        &[arg!("name", true, Text)],
        &[
            child!("Intro", ZeroOrOne),
            child!("Volume", ZeroOrMore),
            child!("Chapter", ZeroOrMore),
        ],
        false,
    ),
    schema(
        "Intro",
        &[arg!("title", true, Text)],
        &[child!("Image", ZeroOrOne)],
        true,
    ),
    schema(
        "Volume",
        &[arg!("name", true, Text)],
        &[child!("Image", ZeroOrOne), child!("Chapter", OneOrMore)],
        true,
    ),
    schema(
        "Chapter",
        &[arg!("name", true, Text)],
        &[
            child!("Image", ZeroOrOne),
            child!("TutorialReference", OneOrMore),
        ],
        true,
    ),
    schema(
        "TutorialReference",
        &[arg!("tutorial", true, Text)],
        &[],
        false,
    ),
    schema(
        "Tutorial",
        &[arg!("time", false, Integer), arg!("projectFiles", false, Text)],
        &[
            child!("Intro", ExactlyOne),
            child!("Section", OneOrMore),
            child!("Assessments", ZeroOrOne),
        ],
        false,
    ),
    schema(
        "Article",
        &[arg!("time", false, Integer)],
        &[child!("Intro", ZeroOrOne)],
        true,
    ),
    schema(
        "Section",
        &[arg!("title", true, Text)],
        &[child!("Image", ZeroOrMore), child!("Steps", ZeroOrOne)],
        true,
    ),
    schema("Steps", &[], &[child!("Step", ZeroOrMore)], true),
    schema(
        "Step",
        &[],
        &[child!("Code", ZeroOrOne), child!("Image", ZeroOrOne)],
        true,
    ),
    schema(
        "Assessments",
        &[],
        &[child!("MultipleChoice", OneOrMore)],
        false,
    ),
    schema(
        "MultipleChoice",
        &[],
        &[child!("Choice", OneOrMore), child!("Image", ZeroOrOne)],
        true,
    ),
    schema(
        "Choice",
        &[arg!("isCorrect", true, Bool)],
        &[child!("Justification", ExactlyOne), child!("Image", ZeroOrOne)],
        true,
    ),
    schema(
        "Justification",
        &[arg!("reaction", false, Text)],
        &[],
        true,
    ),
];

/// The schema for a directive name, if it is a known directive.
pub fn schema_for(name: &str) -> Option<&'static DirectiveSchema> {
    SCHEMAS.iter().find(|s| s.name == name)
}

/// Check every directive in `document`, including nested ones.
pub fn check_document(document: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_blocks(&document.blocks, &mut diagnostics);
    diagnostics
}

fn check_blocks(blocks: &[Markup], diagnostics: &mut Vec<Diagnostic>) {
    for block in blocks {
        match block {
            Markup::BlockDirective(directive) => check_into(directive, diagnostics),
            other => check_blocks(other.children(), diagnostics),
        }
    }
}

/// Check one directive and its descendants against their schemas.
pub fn check(directive: &BlockDirective) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_into(directive, &mut diagnostics);
    diagnostics
}

fn check_into(directive: &BlockDirective, diagnostics: &mut Vec<Diagnostic>) {
    let span = Some(directive.span);
    let Some(schema) = schema_for(&directive.name) else {
        tracing::warn!(name = %directive.name, "unknown directive");
        diagnostics.push(Diagnostic::warning(
            "W003",
            format!("Unknown directive '@{}'", directive.name),
            span,
        ));
        check_blocks(&directive.children, diagnostics);
        return;
    };

    for spec in schema.arguments {
        let value = directive.argument(spec.name);
        match value {
            None if spec.required => diagnostics.push(Diagnostic::warning(
                "W004",
                format!(
                    "'@{}' is missing required argument '{}'",
                    schema.name,
                    display_label(spec.name)
                ),
                span,
            )),
            None => {}
            Some(value) => {
                if let Err(message) = spec.kind.validate(value) {
                    diagnostics.push(Diagnostic::warning(
                        "W006",
                        format!(
                            "Invalid value for '{}' on '@{}': {message}",
                            display_label(spec.name),
                            schema.name
                        ),
                        span,
                    ));
                }
            }
        }
    }

    for (label, _) in &directive.arguments {
        if !schema.arguments.iter().any(|spec| spec.name == label) {
            diagnostics.push(Diagnostic::warning(
                "W005",
                format!(
                    "Unknown argument '{}' on '@{}'",
                    display_label(label),
                    schema.name
                ),
                span,
            ));
        }
    }

    let mut counts = vec![0usize; schema.children.len()];
    for child in &directive.children {
        match child {
            Markup::BlockDirective(nested) => {
                match schema.children.iter().position(|c| c.name == nested.name) {
                    Some(index) => counts[index] += 1,
                    None if schema.allows_markup => {}
                    None => diagnostics.push(Diagnostic::warning(
                        "W007",
                        format!("'@{}' is not allowed inside '@{}'", nested.name, schema.name),
                        Some(nested.span),
                    )),
                }
                check_into(nested, diagnostics);
            }
            _ if schema.allows_markup => {}
            _ => diagnostics.push(Diagnostic::warning(
                "W007",
                format!("'@{}' does not accept markdown content", schema.name),
                span,
            )),
        }
    }

    for (spec, count) in schema.children.iter().zip(counts) {
        if !spec.cardinality.accepts(count) {
            diagnostics.push(Diagnostic::warning(
                "W008",
                format!(
                    "'@{}' expects {} '@{}', found {count}",
                    schema.name,
                    spec.cardinality.describe(),
                    spec.name
                ),
                span,
            ));
        }
    }
}

fn display_label(label: &str) -> &str {
    if label.is_empty() { "(unlabeled)" } else { label }
}
