//! Line-by-line scan that splits source text into markdown runs and
//! top-level `@Directive` blocks.
//!
//! Only directives opened at the top level become segments. Nested
//! directives are tracked for brace matching but stay inside their parent's
//! body, which is scanned again when the parent is parsed.

use crate::error::{Diagnostic, Error, Span};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Markdown(String),
    Directive(RawDirective),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawDirective {
    pub name: String,
    /// The argument list as written, including parentheses.
    pub arguments: String,
    pub body: Vec<String>,
    /// 0-based file line of the first body line.
    pub body_start_line: usize,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
enum OpeningKind {
    /// `@Name(args)` with no body.
    Leaf,
    /// `@Name(args) {` with the body on the following lines.
    Block,
    /// `@Name(args) { body }` on one line.
    Inline(String),
}

#[derive(Debug)]
struct Opening {
    name: String,
    arguments: String,
    kind: OpeningKind,
}

/// State for an in-progress block directive on the nesting stack.
struct OpenBlock {
    name: String,
    arguments: String,
    line_index: usize,
}

struct Fence {
    marker: char,
    len: usize,
}

pub(crate) fn scan_segments(
    source: &str,
    line_offset: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Segment> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut segments = Vec::new();
    let mut stack: Vec<OpenBlock> = Vec::new();
    let mut markdown: Vec<&str> = Vec::new();
    let mut fence: Option<Fence> = None;

    for (idx, &line) in lines.iter().enumerate() {
        let trimmed = line.trim();

        if update_fence(&mut fence, trimmed) || fence.is_some() {
            if stack.is_empty() {
                markdown.push(line);
            }
            continue;
        }

        if trimmed == "}" && !stack.is_empty() {
            if let Some(open) = stack.pop() {
                if stack.is_empty() {
                    segments.push(Segment::Directive(RawDirective {
                        name: open.name,
                        arguments: open.arguments,
                        body: to_owned_lines(&lines[open.line_index + 1..idx]),
                        body_start_line: line_offset + open.line_index + 1,
                        span: Span::lines(line_offset + open.line_index + 1, line_offset + idx + 1),
                    }));
                }
            }
            continue;
        }

        if let Some(opening) = opening_directive(trimmed) {
            if stack.is_empty() {
                flush_markdown(&mut segments, &mut markdown);
            }
            match opening.kind {
                OpeningKind::Block => stack.push(OpenBlock {
                    name: opening.name,
                    arguments: opening.arguments,
                    line_index: idx,
                }),
                OpeningKind::Leaf | OpeningKind::Inline(_) if !stack.is_empty() => {}
                OpeningKind::Leaf => segments.push(Segment::Directive(RawDirective {
                    name: opening.name,
                    arguments: opening.arguments,
                    body: Vec::new(),
                    body_start_line: line_offset + idx,
                    span: Span::lines(line_offset + idx + 1, line_offset + idx + 1),
                })),
                OpeningKind::Inline(body) => segments.push(Segment::Directive(RawDirective {
                    name: opening.name,
                    arguments: opening.arguments,
                    body: vec![body],
                    body_start_line: line_offset + idx,
                    span: Span::lines(line_offset + idx + 1, line_offset + idx + 1),
                })),
            }
            continue;
        }

        if stack.is_empty() {
            markdown.push(line);
        }
    }

    flush_markdown(&mut segments, &mut markdown);

    // Force-close directives still open at the end of input. Only the
    // outermost one is emitted; every one of them is reported.
    while let Some(open) = stack.pop() {
        let line = line_offset + open.line_index + 1;
        diagnostics.push(Diagnostic::from(Error::UnclosedDirective {
            name: open.name.clone(),
            line,
        }));
        if stack.is_empty() {
            segments.push(Segment::Directive(RawDirective {
                name: open.name,
                arguments: open.arguments,
                body: to_owned_lines(&lines[open.line_index + 1..]),
                body_start_line: line,
                span: Span::lines(line, line_offset + lines.len()),
            }));
        }
    }

    segments
}

fn to_owned_lines(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

fn flush_markdown(segments: &mut Vec<Segment>, markdown: &mut Vec<&str>) {
    if markdown.iter().any(|l| !l.trim().is_empty()) {
        segments.push(Segment::Markdown(markdown.join("\n")));
    }
    markdown.clear();
}

/// Track fenced code blocks. Returns `true` when `trimmed` opens or closes a fence.
fn update_fence(fence: &mut Option<Fence>, trimmed: &str) -> bool {
    let marker = match trimmed.chars().next() {
        Some(c @ ('`' | '~')) => c,
        _ => return false,
    };
    let len = trimmed.chars().take_while(|&c| c == marker).count();
    if len < 3 {
        return false;
    }
    match fence {
        None => {
            *fence = Some(Fence { marker, len });
            true
        }
        Some(open) if open.marker == marker && len >= open.len && trimmed[len..].trim().is_empty() => {
            *fence = None;
            true
        }
        Some(_) => false,
    }
}

/// If the line opens a directive (`@Name`, `@Name(args)`, optionally followed
/// by `{` or `{ body }`), return its parts.
fn opening_directive(trimmed: &str) -> Option<Opening> {
    let rest = trimmed.strip_prefix('@')?;
    if !rest.chars().next()?.is_ascii_uppercase() {
        return None;
    }

    let name_end = rest
        .find(|c: char| !c.is_alphanumeric() && c != '_')
        .unwrap_or(rest.len());
    let name = rest[..name_end].to_string();
    let mut remainder = rest[name_end..].trim_start();

    let mut arguments = String::new();
    if remainder.starts_with('(') {
        let close = closing_paren(remainder)?;
        arguments = remainder[..=close].to_string();
        remainder = remainder[close + 1..].trim();
    }

    let kind = if remainder.is_empty() {
        OpeningKind::Leaf
    } else if remainder == "{" {
        OpeningKind::Block
    } else if remainder.starts_with('{') && remainder.ends_with('}') {
        OpeningKind::Inline(remainder[1..remainder.len() - 1].trim().to_string())
    } else {
        return None;
    };

    Some(Opening {
        name,
        arguments,
        kind,
    })
}

/// Index of the `)` closing the argument list that starts at byte 0.
///
/// Parentheses inside quoted values are ignored. An unbalanced quote falls
/// back to the last `)` on the line so the argument parser can report it.
fn closing_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        if in_quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quote = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_quote = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    text.rfind(')')
}
