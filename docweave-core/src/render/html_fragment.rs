//! A small parser for raw HTML embedded in markup.
//!
//! Raw HTML becomes ordinary [`RenderNode`]s so that it is escaped and
//! serialized like everything else. Comments are dropped. Input that does
//! not form balanced elements is rejected.

use crate::render::node::RenderNode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct FragmentError {
    pub message: String,
    pub offset: usize,
}

const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

struct OpenElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<RenderNode>,
}

/// Parse an HTML fragment into nodes.
pub fn parse_fragment(html: &str) -> Result<Vec<RenderNode>, FragmentError> {
    let mut stack: Vec<OpenElement> = vec![OpenElement {
        name: String::new(),
        attributes: Vec::new(),
        children: Vec::new(),
    }];
    let bytes = html.as_bytes();
    let mut pos = 0;

    while pos < html.len() {
        if bytes[pos] != b'<' {
            let end = html[pos..].find('<').map_or(html.len(), |i| pos + i);
            push_child(&mut stack, RenderNode::text(decode_entities(&html[pos..end])));
            pos = end;
            continue;
        }

        let rest = &html[pos..];
        if rest.starts_with("<!--") {
            let end = rest.find("-->").ok_or_else(|| error("unterminated comment", pos))?;
            pos += end + 3;
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').ok_or_else(|| error("unterminated declaration", pos))?;
            pos += end + 1;
            continue;
        }

        let close = tag_end(rest).ok_or_else(|| error("unterminated tag", pos))?;
        let tag = &rest[1..close];
        pos += close + 1;

        if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim().to_ascii_lowercase();
            if stack.len() < 2 || stack[stack.len() - 1].name != name {
                return Err(error(&format!("unexpected closing tag </{name}>"), pos));
            }
            if let Some(open) = stack.pop() {
                let node = RenderNode::Element {
                    name: open.name,
                    attributes: sorted(open.attributes),
                    children: open.children,
                };
                push_child(&mut stack, node);
            }
            continue;
        }

        let (self_closing, tag) = match tag.strip_suffix('/') {
            Some(inner) => (true, inner),
            None => (false, tag),
        };
        let (name, attributes) = parse_tag(tag).ok_or_else(|| error("malformed tag", pos))?;
        if self_closing || VOID.contains(&name.as_str()) {
            push_child(
                &mut stack,
                RenderNode::Element {
                    name,
                    attributes: sorted(attributes),
                    children: Vec::new(),
                },
            );
        } else {
            stack.push(OpenElement {
                name,
                attributes,
                children: Vec::new(),
            });
        }
    }

    if stack.len() > 1 {
        let open = &stack[stack.len() - 1];
        return Err(error(&format!("unclosed element <{}>", open.name), html.len()));
    }
    Ok(stack.pop().map(|root| root.children).unwrap_or_default())
}

fn push_child(stack: &mut [OpenElement], node: RenderNode) {
    if let Some(top) = stack.last_mut() {
        if let (RenderNode::Text { text }, Some(RenderNode::Text { text: previous })) =
            (&node, top.children.last_mut())
        {
            previous.push_str(text);
            return;
        }
        top.children.push(node);
    }
}

fn error(message: &str, offset: usize) -> FragmentError {
    FragmentError {
        message: message.to_string(),
        offset,
    }
}

fn sorted(mut attributes: Vec<(String, String)>) -> Vec<(String, String)> {
    attributes.sort_by(|a, b| a.0.cmp(&b.0));
    attributes
}

/// Index of the `>` ending the tag that starts at byte 0, skipping quoted values.
fn tag_end(text: &str) -> Option<usize> {
    let mut quote = None;
    for (index, c) in text.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(index),
            (None, '<') => return None,
            _ => {}
        }
    }
    None
}

fn parse_tag(tag: &str) -> Option<(String, Vec<(String, String)>)> {
    let chars: Vec<char> = tag.chars().collect();
    let len = chars.len();
    let mut pos = 0;

    while pos < len && (chars[pos].is_alphanumeric() || chars[pos] == '-') {
        pos += 1;
    }
    if pos == 0 || !chars[0].is_ascii_alphabetic() {
        return None;
    }
    let name = chars[..pos].iter().collect::<String>().to_ascii_lowercase();

    let mut attributes = Vec::new();
    loop {
        let before = pos;
        while pos < len && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos >= len {
            break;
        }
        if pos == before {
            return None;
        }

        let key_start = pos;
        while pos < len && !chars[pos].is_whitespace() && !matches!(chars[pos], '=' | '"' | '\'') {
            pos += 1;
        }
        if pos == key_start {
            return None;
        }
        let key = chars[key_start..pos].iter().collect::<String>().to_ascii_lowercase();

        if pos < len && chars[pos] == '=' {
            pos += 1;
            let value = match chars.get(pos) {
                Some(&quote @ ('"' | '\'')) => {
                    pos += 1;
                    let start = pos;
                    while pos < len && chars[pos] != quote {
                        pos += 1;
                    }
                    if pos >= len {
                        return None;
                    }
                    let value: String = chars[start..pos].iter().collect();
                    pos += 1;
                    value
                }
                Some(_) => {
                    let start = pos;
                    while pos < len && !chars[pos].is_whitespace() {
                        pos += 1;
                    }
                    chars[start..pos].iter().collect()
                }
                None => return None,
            };
            attributes.push((key, decode_entities(&value)));
        } else {
            attributes.push((key, String::new()));
        }
    }

    Some((name, attributes))
}

/// Decode the character references that commonly appear in authored HTML.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_elements_and_comments() {
        let nodes = parse_fragment("<div class=\"box\"><!-- hidden --><b>Hi</b> &amp; bye</div>").unwrap();
        assert_eq!(
            nodes,
            vec![RenderNode::element_with(
                "div",
                [("class", "box")],
                vec![
                    RenderNode::element("b", vec![RenderNode::text("Hi")]),
                    RenderNode::text(" & bye"),
                ]
            )]
        );
    }

    #[test]
    fn void_and_self_closing() {
        let nodes = parse_fragment("<br><img src='a.png' alt=x/><span/>").unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1].attribute("alt"), Some("x"));
        assert_eq!(nodes[1].attribute("src"), Some("a.png"));
    }

    #[test]
    fn unbalanced_input_is_rejected() {
        assert!(parse_fragment("<sup>").is_err());
        assert!(parse_fragment("</sup>").is_err());
        assert!(parse_fragment("<b><i>x</b></i>").is_err());
        assert!(parse_fragment("<a href=\"x").is_err());
    }

    #[test]
    fn errors_report_offsets() {
        let error = parse_fragment("<b>x</i>").unwrap_err();
        assert_eq!(error.to_string(), "unexpected closing tag </i> at offset 8");
    }

    #[test]
    fn entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#65;&#x42; &unknown; &"), "a <b> AB &unknown; &");
    }
}
