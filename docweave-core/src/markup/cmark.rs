//! Markdown to [`Markup`] conversion on top of `pulldown-cmark`.

use std::ops::Range;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag};

use super::{ColumnAlignment, ListItem, Markup, Table, TableCell};

enum FrameKind {
    Root,
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock { language: Option<String>, code: String },
    HtmlBlock(String),
    List { start: Option<u64>, items: Vec<ListItem> },
    Item { checkbox: Option<bool> },
    Table(TableFrame),
    TableHead { cells: Vec<TableCell> },
    TableRow { cells: Vec<TableCell> },
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link { destination: String, title: Option<String>, autolink: bool },
    Image { source: String, title: Option<String> },
    /// Constructs without a markup counterpart; their children are kept.
    Transparent,
}

struct TableFrame {
    alignments: Vec<ColumnAlignment>,
    head: Vec<TableCell>,
    head_range: Range<usize>,
    body: Vec<Vec<TableCell>>,
    body_ranges: Vec<Range<usize>>,
}

struct Frame {
    kind: FrameKind,
    children: Vec<Markup>,
    range: Range<usize>,
}

pub(super) fn convert(source: &str) -> Vec<Markup> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut stack = vec![Frame {
        kind: FrameKind::Root,
        children: Vec::new(),
        range: 0..source.len(),
    }];

    for (event, range) in Parser::new_ext(source, options).into_offset_iter() {
        match event {
            Event::Start(tag) => stack.push(Frame {
                kind: frame_kind(tag),
                children: Vec::new(),
                range,
            }),
            Event::End(_) => {
                if stack.len() > 1 {
                    if let Some(frame) = stack.pop() {
                        close_frame(frame, &mut stack, source);
                    }
                }
            }
            Event::Text(text) => {
                let Some(top) = stack.last_mut() else { continue };
                match &mut top.kind {
                    FrameKind::CodeBlock { code, .. } => code.push_str(&text),
                    FrameKind::HtmlBlock(html) => html.push_str(&text),
                    _ => push_text(&mut top.children, &text),
                }
            }
            Event::Code(code) => {
                let raw = &source[range];
                let node = if raw.starts_with("``") && !raw.starts_with("```") {
                    Markup::SymbolLink {
                        destination: code.trim().to_string(),
                    }
                } else {
                    Markup::InlineCode {
                        code: code.to_string(),
                    }
                };
                push(&mut stack, node);
            }
            Event::Html(html) => {
                let Some(top) = stack.last_mut() else { continue };
                match &mut top.kind {
                    FrameKind::HtmlBlock(block) => block.push_str(&html),
                    _ => top.children.push(Markup::HtmlBlock {
                        html: html.to_string(),
                    }),
                }
            }
            Event::InlineHtml(html) => push(
                &mut stack,
                Markup::InlineHtml {
                    html: html.to_string(),
                },
            ),
            Event::SoftBreak => push(&mut stack, Markup::SoftBreak),
            Event::HardBreak => push(&mut stack, Markup::LineBreak),
            Event::Rule => push(&mut stack, Markup::ThematicBreak),
            Event::TaskListMarker(checked) => {
                if let Some(frame) = stack
                    .iter_mut()
                    .rev()
                    .find(|f| matches!(f.kind, FrameKind::Item { .. }))
                {
                    frame.kind = FrameKind::Item {
                        checkbox: Some(checked),
                    };
                }
            }
            _ => {}
        }
    }

    while stack.len() > 1 {
        if let Some(frame) = stack.pop() {
            close_frame(frame, &mut stack, source);
        }
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

fn frame_kind(tag: Tag<'_>) -> FrameKind {
    match tag {
        Tag::Paragraph => FrameKind::Paragraph,
        Tag::Heading { level, .. } => FrameKind::Heading(heading_level(level)),
        Tag::BlockQuote(_) => FrameKind::BlockQuote,
        Tag::CodeBlock(kind) => FrameKind::CodeBlock {
            language: match kind {
                CodeBlockKind::Fenced(info) => info
                    .split_whitespace()
                    .next()
                    .map(str::to_string),
                CodeBlockKind::Indented => None,
            },
            code: String::new(),
        },
        Tag::HtmlBlock => FrameKind::HtmlBlock(String::new()),
        Tag::List(start) => FrameKind::List {
            start,
            items: Vec::new(),
        },
        Tag::Item => FrameKind::Item { checkbox: None },
        Tag::Table(alignments) => FrameKind::Table(TableFrame {
            alignments: alignments.into_iter().map(column_alignment).collect(),
            head: Vec::new(),
            head_range: 0..0,
            body: Vec::new(),
            body_ranges: Vec::new(),
        }),
        Tag::TableHead => FrameKind::TableHead { cells: Vec::new() },
        Tag::TableRow => FrameKind::TableRow { cells: Vec::new() },
        Tag::TableCell => FrameKind::TableCell,
        Tag::Emphasis => FrameKind::Emphasis,
        Tag::Strong => FrameKind::Strong,
        Tag::Strikethrough => FrameKind::Strikethrough,
        Tag::Link {
            link_type,
            dest_url,
            title,
            ..
        } => FrameKind::Link {
            destination: dest_url.to_string(),
            title: non_empty(&title),
            autolink: matches!(link_type, LinkType::Autolink | LinkType::Email),
        },
        Tag::Image { dest_url, title, .. } => FrameKind::Image {
            source: dest_url.to_string(),
            title: non_empty(&title),
        },
        _ => FrameKind::Transparent,
    }
}

fn close_frame(frame: Frame, stack: &mut Vec<Frame>, source: &str) {
    let Frame {
        kind,
        children,
        range,
    } = frame;
    let Some(parent) = stack.last_mut() else {
        return;
    };

    let node = match kind {
        FrameKind::Root => return,
        FrameKind::Paragraph => Markup::Paragraph { children },
        FrameKind::Heading(level) => Markup::Heading { level, children },
        FrameKind::BlockQuote => Markup::BlockQuote { children },
        FrameKind::CodeBlock { language, code } => Markup::CodeBlock { language, code },
        FrameKind::HtmlBlock(html) => Markup::HtmlBlock { html },
        FrameKind::List { start, items } => match start {
            Some(start) => Markup::OrderedList { start, items },
            None => Markup::UnorderedList { items },
        },
        FrameKind::Item { checkbox } => {
            if let FrameKind::List { items, .. } = &mut parent.kind {
                items.push(ListItem {
                    checkbox,
                    children: wrap_inlines(children),
                });
            }
            return;
        }
        FrameKind::Table(mut table) => {
            apply_spans(&mut table, source);
            Markup::Table(Table {
                alignments: table.alignments,
                head: table.head,
                body: table.body,
            })
        }
        FrameKind::TableHead { cells } => {
            if let FrameKind::Table(table) = &mut parent.kind {
                table.head = cells;
                table.head_range = range;
            }
            return;
        }
        FrameKind::TableRow { cells } => {
            if let FrameKind::Table(table) = &mut parent.kind {
                table.body.push(cells);
                table.body_ranges.push(range);
            }
            return;
        }
        FrameKind::TableCell => {
            if let FrameKind::TableHead { cells } | FrameKind::TableRow { cells } = &mut parent.kind {
                cells.push(TableCell::new(children));
            }
            return;
        }
        FrameKind::Emphasis => Markup::Emphasis { children },
        FrameKind::Strong => Markup::Strong { children },
        FrameKind::Strikethrough => Markup::Strikethrough { children },
        FrameKind::Link {
            destination,
            title,
            autolink,
        } => Markup::Link {
            destination,
            title,
            children: if autolink { Vec::new() } else { children },
        },
        FrameKind::Image { source, title } => Markup::Image {
            source,
            title,
            children,
        },
        FrameKind::Transparent => {
            parent.children.extend(children);
            return;
        }
    };
    parent.children.push(node);
}

fn push(stack: &mut [Frame], node: Markup) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

/// Append text, merging with a preceding text node.
fn push_text(children: &mut Vec<Markup>, text: &str) {
    if let Some(Markup::Text { text: previous }) = children.last_mut() {
        previous.push_str(text);
    } else {
        children.push(Markup::text(text));
    }
}

/// Tight list items hold inlines directly; group them into paragraphs.
fn wrap_inlines(children: Vec<Markup>) -> Vec<Markup> {
    let mut blocks = Vec::new();
    let mut run = Vec::new();
    for child in children {
        if child.is_inline() {
            run.push(child);
        } else {
            if !run.is_empty() {
                blocks.push(Markup::paragraph(std::mem::take(&mut run)));
            }
            blocks.push(child);
        }
    }
    if !run.is_empty() {
        blocks.push(Markup::paragraph(run));
    }
    blocks
}

/// Apply cell spans written with the extended table syntax: an empty cell
/// written as `||` continues the cell to its left, and a cell containing
/// only `^` continues the cell above.
fn apply_spans(table: &mut TableFrame, source: &str) {
    let markers: Vec<Vec<SpanMarker>> = table
        .body_ranges
        .iter()
        .map(|range| row_markers(&source[range.clone()]))
        .collect();
    let head_markers = row_markers(&source[table.head_range.clone()]);

    mark_columns(&mut table.head, &head_markers);
    for (row, row_markers) in table.body.iter_mut().zip(&markers) {
        mark_columns(row, row_markers);
    }

    for row_index in 0..table.body.len() {
        let Some(row_markers) = markers.get(row_index) else { continue };
        if row_markers.len() != table.body[row_index].len() {
            continue;
        }
        for column in 0..row_markers.len() {
            if row_markers[column] != SpanMarker::Above {
                continue;
            }
            let above = (0..row_index)
                .rev()
                .find(|&r| table.body[r].get(column).is_some_and(|c| c.rowspan > 0));
            let Some(above) = above else { continue };
            table.body[above][column].rowspan += 1;
            table.body[row_index][column].rowspan = 0;
            table.body[row_index][column].children.clear();
        }
    }
}

fn mark_columns(cells: &mut [TableCell], markers: &[SpanMarker]) {
    if markers.len() != cells.len() {
        return;
    }
    for column in 1..cells.len() {
        if markers[column] != SpanMarker::Left {
            continue;
        }
        if let Some(owner) = (0..column).rev().find(|&c| cells[c].colspan > 0) {
            cells[owner].colspan += 1;
            cells[column].colspan = 0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanMarker {
    None,
    Left,
    Above,
}

fn row_markers(row: &str) -> Vec<SpanMarker> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = row.strip_suffix('|').unwrap_or(row);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in row.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if c == '|' {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    cells.push(current);

    cells
        .iter()
        .map(|cell| {
            if cell.is_empty() {
                SpanMarker::Left
            } else if cell.trim() == "^" {
                SpanMarker::Above
            } else {
                SpanMarker::None
            }
        })
        .collect()
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn column_alignment(alignment: Alignment) -> ColumnAlignment {
    match alignment {
        Alignment::None => ColumnAlignment::None,
        Alignment::Left => ColumnAlignment::Left,
        Alignment::Center => ColumnAlignment::Center,
        Alignment::Right => ColumnAlignment::Right,
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn paragraph_with_inlines() {
        let blocks = convert("Some *emphasis*, **strong**, ~~gone~~ and `code`.");
        assert_eq!(
            blocks,
            vec![Markup::paragraph(vec![
                Markup::text("Some "),
                Markup::Emphasis {
                    children: vec![Markup::text("emphasis")]
                },
                Markup::text(", "),
                Markup::Strong {
                    children: vec![Markup::text("strong")]
                },
                Markup::text(", "),
                Markup::Strikethrough {
                    children: vec![Markup::text("gone")]
                },
                Markup::text(" and "),
                Markup::InlineCode {
                    code: "code".into()
                },
                Markup::text("."),
            ])]
        );
    }

    #[test]
    fn symbol_links_use_double_backticks() {
        let blocks = convert("See ``Foo/bar()`` and `plain`.");
        let Markup::Paragraph { children } = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            children[1],
            Markup::SymbolLink {
                destination: "Foo/bar()".into()
            }
        );
        assert_eq!(
            children[3],
            Markup::InlineCode {
                code: "plain".into()
            }
        );
    }

    #[test]
    fn autolinks_have_no_children() {
        let blocks = convert("<doc:GettingStarted> and [text](https://example.com \"T\")");
        let Markup::Paragraph { children } = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            children[0],
            Markup::Link {
                destination: "doc:GettingStarted".into(),
                title: None,
                children: vec![],
            }
        );
        assert_eq!(
            children[2],
            Markup::Link {
                destination: "https://example.com".into(),
                title: Some("T".into()),
                children: vec![Markup::text("text")],
            }
        );
    }

    #[test]
    fn fenced_code_language() {
        let blocks = convert("```swift\nlet x = 1\n```\n");
        assert_eq!(
            blocks,
            vec![Markup::CodeBlock {
                language: Some("swift".into()),
                code: "let x = 1\n".into(),
            }]
        );
    }

    #[test]
    fn ordered_and_task_lists() {
        let blocks = convert("3. three\n4. four\n\n- [x] done\n- [ ] todo\n");
        let Markup::OrderedList { start, items } = &blocks[0] else {
            panic!("expected ordered list");
        };
        assert_eq!(*start, 3);
        assert_eq!(items.len(), 2);
        let Markup::UnorderedList { items } = &blocks[1] else {
            panic!("expected unordered list");
        };
        assert_eq!(items[0].checkbox, Some(true));
        assert_eq!(items[1].checkbox, Some(false));
        assert_eq!(items[1].children, vec![Markup::paragraph(vec![Markup::text("todo")])]);
    }

    #[test]
    fn table_alignment_and_spans() {
        let blocks = convert(
            "| A | B | C |\n|:--|:-:|--:|\n| wide || c |\n| x | y | z |\n| ^ | y2 | z2 |\n",
        );
        let Markup::Table(table) = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(
            table.alignments,
            vec![ColumnAlignment::Left, ColumnAlignment::Center, ColumnAlignment::Right]
        );
        assert_eq!(table.head.len(), 3);
        assert_eq!(table.body[0][0].colspan, 2);
        assert_eq!(table.body[0][1].colspan, 0);
        assert_eq!(table.body[1][0].rowspan, 2);
        assert_eq!(table.body[2][0].rowspan, 0);
        assert!(table.body[2][0].is_continuation());
    }

    #[test]
    fn block_quote_and_html() {
        let blocks = convert("> Note: Careful.\n\n<div>\nraw\n</div>\n");
        assert!(matches!(blocks[0], Markup::BlockQuote { .. }));
        let Markup::HtmlBlock { html } = &blocks[1] else {
            panic!("expected html block");
        };
        assert!(html.starts_with("<div>"));
    }
}
