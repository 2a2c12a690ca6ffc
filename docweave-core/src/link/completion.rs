//! Link completion tools.
//!
//! A small stable facade for editors and other tools: parse a partially
//! written link into `(name, disambiguation)` pairs, suggest the suffix each
//! symbol in a collision group needs, and pick the overloads a parsed
//! disambiguation still matches.

use crate::link::disambiguation::{
    ContainerOptions, Disambiguation, DisambiguationContainer, SymbolMetadata,
};
use crate::link::hash::stable_hash_string;
use crate::link::kind::is_known_kind_identifier;

/// The disambiguation part of one parsed link component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDisambiguation {
    None,
    KindAndOrHash {
        kind: Option<String>,
        hash: Option<String>,
    },
    TypeSignature {
        parameter_types: Option<Vec<String>>,
        return_types: Option<Vec<String>>,
    },
}

impl ParsedDisambiguation {
    /// The container query this parsed suffix stands for.
    pub fn to_disambiguation(&self) -> Disambiguation {
        match self {
            Self::None => Disambiguation::None,
            Self::KindAndOrHash {
                kind: Some(kind),
                hash: Some(hash),
            } => Disambiguation::KindAndHash {
                kind: kind.clone(),
                hash: hash.clone(),
            },
            Self::KindAndOrHash {
                kind: Some(kind),
                hash: None,
            } => Disambiguation::Kind(kind.clone()),
            Self::KindAndOrHash {
                kind: None,
                hash: Some(hash),
            } => Disambiguation::Hash(hash.clone()),
            Self::KindAndOrHash {
                kind: None,
                hash: None,
            } => Disambiguation::None,
            Self::TypeSignature {
                parameter_types,
                return_types,
            } => Disambiguation::TypeSignature {
                parameter_types: parameter_types.clone(),
                return_types: return_types.clone(),
            },
        }
    }
}

/// What a tool knows about one symbol in a collision group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInformation {
    pub kind: String,
    pub symbol_id_hash: String,
    pub parameter_types: Option<Vec<String>>,
    pub return_types: Option<Vec<String>>,
}

impl SymbolInformation {
    /// Information for a symbol identified by its precise identifier.
    pub fn new(kind: impl Into<String>, precise_identifier: &str) -> Self {
        Self {
            kind: kind.into(),
            symbol_id_hash: Self::hash(precise_identifier),
            parameter_types: None,
            return_types: None,
        }
    }

    /// The short hash used in disambiguation suffixes.
    pub fn hash(precise_identifier: &str) -> String {
        stable_hash_string(precise_identifier)
    }

    fn metadata(&self) -> SymbolMetadata {
        SymbolMetadata::new(self.kind.clone(), self.symbol_id_hash.clone())
            .with_signature(self.parameter_types.clone(), self.return_types.clone())
    }
}

/// Parse a link (possibly partial, possibly with a `doc:` scheme) into its
/// path components.
pub fn parse(link: &str) -> Vec<(String, ParsedDisambiguation)> {
    split_components(strip_link_prefix(link))
        .into_iter()
        .map(parse_component)
        .collect()
}

/// The suffix each of `symbols` needs (in order) to be linked unambiguously.
pub fn suggested_disambiguation(symbols: &[SymbolInformation]) -> Vec<String> {
    suggested_disambiguation_with_options(symbols, ContainerOptions::default())
}

pub fn suggested_disambiguation_with_options(
    symbols: &[SymbolInformation],
    options: ContainerOptions,
) -> Vec<String> {
    let mut container = DisambiguationContainer::new(options);
    for (index, symbol) in symbols.iter().enumerate() {
        container.add(index, symbol.metadata());
    }

    let mut suffixes = vec![String::new(); symbols.len()];
    for (index, disambiguation) in container.disambiguated_values() {
        suffixes[*index] = disambiguation.make_suffix();
    }
    suffixes
}

/// The ids of the symbols `disambiguation` selects among `colliding`.
///
/// Returns exactly one id when the disambiguation is sufficient and an empty
/// list when it matches nothing or is still ambiguous.
pub fn disambiguate_between_overloaded_symbols<Id: Clone>(
    colliding: &[(Id, SymbolInformation)],
    disambiguation: &ParsedDisambiguation,
) -> Vec<Id> {
    let mut container = DisambiguationContainer::default();
    for (id, symbol) in colliding {
        container.add(id.clone(), symbol.metadata());
    }
    container
        .find(&disambiguation.to_disambiguation())
        .cloned()
        .into_iter()
        .collect()
}

fn strip_link_prefix(link: &str) -> &str {
    let mut link = link.trim();
    if let Some(rest) = link.strip_prefix("doc://") {
        link = rest.find('/').map_or("", |slash| &rest[slash..]);
    } else if let Some(rest) = link.strip_prefix("doc:") {
        link = rest;
    }
    if let Some(hash) = link.find('#') {
        link = &link[..hash];
    }
    let link = link.trim_start_matches('/');
    link.strip_prefix("documentation/")
        .or_else(|| link.strip_prefix("tutorials/"))
        .unwrap_or(link)
}

/// Split on `/` outside of parentheses so that `(_:_:)` argument labels and
/// type lists stay intact.
fn split_components(path: &str) -> Vec<&str> {
    let mut components = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in path.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                if index > start {
                    components.push(&path[start..index]);
                }
                start = index + 1;
            }
            _ => {}
        }
    }
    if start < path.len() {
        components.push(&path[start..]);
    }
    components
}

fn parse_component(component: &str) -> (String, ParsedDisambiguation) {
    let name_end = name_end(component);

    let rest = &component[name_end..];
    if let Some(signature) = find_signature_start(rest) {
        if let Some(parsed) = parse_type_signature(&rest[signature..]) {
            return (component[..name_end + signature].to_string(), parsed);
        }
    }

    let Some(dash) = rest.find('-') else {
        return (component.to_string(), ParsedDisambiguation::None);
    };

    let name = &component[..name_end + dash];
    let suffix = &rest[dash + 1..];
    let tokens: Vec<&str> = suffix.split('-').collect();
    let parsed = match tokens.as_slice() {
        [single] if !single.is_empty() && is_known_kind_identifier(single) => {
            ParsedDisambiguation::KindAndOrHash {
                kind: Some(single.to_string()),
                hash: None,
            }
        }
        [single] if !single.is_empty() => ParsedDisambiguation::KindAndOrHash {
            kind: None,
            hash: Some(single.to_string()),
        },
        [kind, hash] if !hash.is_empty() && is_known_kind_identifier(kind) => {
            ParsedDisambiguation::KindAndOrHash {
                kind: Some(kind.to_string()),
                hash: Some(hash.to_string()),
            }
        }
        _ => return (component.to_string(), ParsedDisambiguation::None),
    };
    (name.to_string(), parsed)
}

/// Byte offset where the symbol name ends and a suffix may begin.
///
/// A leading run of operator characters and a function's `(...)` argument
/// list both belong to the name.
fn name_end(component: &str) -> usize {
    let operator_len = component
        .char_indices()
        .find(|(_, c)| !is_operator_char(*c))
        .map_or(component.len(), |(index, _)| index);

    let search_from = operator_len.max(if component.starts_with('-') { 1 } else { 0 });
    let Some(open) = component[search_from..].find('(').map(|i| i + search_from) else {
        return search_from;
    };
    if open != operator_len && component[..open].ends_with(['-', '>']) {
        // `name-(Int)` is a parameter type list, not an argument list.
        return search_from;
    }
    matching_paren(component, open).map_or(search_from, |close| close + 1)
}

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '=' | '<' | '>' | '!' | '&' | '|' | '^' | '%' | '~' | '?' | '.'
    )
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + index);
                }
            }
            _ => {}
        }
    }
    None
}

fn find_signature_start(rest: &str) -> Option<usize> {
    let params = rest.find("-(");
    let returns = rest.find("->");
    match (params, returns) {
        (Some(p), Some(r)) => Some(p.min(r)),
        (p, r) => p.or(r),
    }
}

/// Parse `-(A,B)`, `->R`, `->(R1,R2)` or `-(A)->R`.
fn parse_type_signature(text: &str) -> Option<ParsedDisambiguation> {
    let mut rest = text;
    let mut parameter_types = None;

    if let Some(after) = rest.strip_prefix("-(") {
        let close = matching_paren(rest, 1)?;
        parameter_types = Some(split_type_list(&after[..close - 2]));
        rest = &rest[close + 1..];
    }

    let mut return_types = None;
    if let Some(after) = rest.strip_prefix("->") {
        let returns = if after.starts_with('(') {
            let close = matching_paren(after, 0)?;
            if close + 1 != after.len() {
                return None;
            }
            split_type_list(&after[1..close])
        } else if after.is_empty() {
            return None;
        } else {
            vec![after.trim().to_string()]
        };
        return_types = Some(returns);
        rest = "";
    }

    if !rest.is_empty() || (parameter_types.is_none() && return_types.is_none()) {
        return None;
    }
    Some(ParsedDisambiguation::TypeSignature {
        parameter_types,
        return_types,
    })
}

fn split_type_list(list: &str) -> Vec<String> {
    if list.trim().is_empty() {
        return Vec::new();
    }
    let mut types = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in list.char_indices() {
        match c {
            '(' | '[' | '<' => depth += 1,
            ')' | ']' | '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                types.push(list[start..index].trim().to_string());
                start = index + 1;
            }
            _ => {}
        }
    }
    types.push(list[start..].trim().to_string());
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kind_hash(kind: Option<&str>, hash: Option<&str>) -> ParsedDisambiguation {
        ParsedDisambiguation::KindAndOrHash {
            kind: kind.map(str::to_string),
            hash: hash.map(str::to_string),
        }
    }

    #[test]
    fn parse_plain_path() {
        assert_eq!(
            parse("doc:MyKit/Foo/bar(_:)"),
            vec![
                ("MyKit".to_string(), ParsedDisambiguation::None),
                ("Foo".to_string(), ParsedDisambiguation::None),
                ("bar(_:)".to_string(), ParsedDisambiguation::None),
            ]
        );
    }

    #[test]
    fn parse_absolute_link_with_suffixes() {
        assert_eq!(
            parse("doc://org.example.MyKit/documentation/MyKit/Foo-swift.class/bar-abc123#usage"),
            vec![
                ("MyKit".to_string(), ParsedDisambiguation::None),
                ("Foo".to_string(), kind_hash(Some("swift.class"), None)),
                ("bar".to_string(), kind_hash(None, Some("abc123"))),
            ]
        );
    }

    #[test]
    fn parse_kind_and_hash() {
        assert_eq!(
            parse("bar(_:)-swift.method-abc123"),
            vec![(
                "bar(_:)".to_string(),
                kind_hash(Some("swift.method"), Some("abc123"))
            )]
        );
    }

    #[test]
    fn invalid_suffix_stays_part_of_name() {
        assert_eq!(
            parse("some-hyphenated-article-name"),
            vec![(
                "some-hyphenated-article-name".to_string(),
                ParsedDisambiguation::None
            )]
        );
    }

    #[test]
    fn parse_type_signatures() {
        assert_eq!(
            parse("bar(_:)-(Int,[String:Int])->Bool"),
            vec![(
                "bar(_:)".to_string(),
                ParsedDisambiguation::TypeSignature {
                    parameter_types: Some(vec!["Int".into(), "[String:Int]".into()]),
                    return_types: Some(vec!["Bool".into()]),
                }
            )]
        );
        assert_eq!(
            parse("bar->()"),
            vec![(
                "bar".to_string(),
                ParsedDisambiguation::TypeSignature {
                    parameter_types: None,
                    return_types: Some(vec![]),
                }
            )]
        );
        assert_eq!(
            parse("bar-()"),
            vec![(
                "bar".to_string(),
                ParsedDisambiguation::TypeSignature {
                    parameter_types: Some(vec![]),
                    return_types: None,
                }
            )]
        );
    }

    #[test]
    fn operator_names_keep_their_dash() {
        assert_eq!(
            parse("Vector/-(_:_:)-abc12"),
            vec![
                ("Vector".to_string(), ParsedDisambiguation::None),
                ("-(_:_:)".to_string(), kind_hash(None, Some("abc12"))),
            ]
        );
    }

    #[test]
    fn suggestions_for_same_kind_overloads() {
        let symbols = vec![
            SymbolInformation {
                kind: "swift.method".into(),
                symbol_id_hash: "abc123".into(),
                parameter_types: Some(vec![]),
                return_types: None,
            },
            SymbolInformation {
                kind: "swift.method".into(),
                symbol_id_hash: "def456".into(),
                parameter_types: Some(vec!["Int".into()]),
                return_types: None,
            },
        ];
        assert_eq!(
            suggested_disambiguation(&symbols),
            vec!["-abc123".to_string(), "-def456".to_string()]
        );

        let parsed = parse("bar-abc123");
        let colliding: Vec<(&str, SymbolInformation)> =
            vec![("bar()", symbols[0].clone()), ("bar(_:)", symbols[1].clone())];
        assert_eq!(
            disambiguate_between_overloaded_symbols(&colliding, &parsed[0].1),
            vec!["bar()"]
        );

        let by_signature = ParsedDisambiguation::TypeSignature {
            parameter_types: Some(vec!["Int".into()]),
            return_types: None,
        };
        assert_eq!(
            disambiguate_between_overloaded_symbols(&colliding, &by_signature),
            vec!["bar(_:)"]
        );
    }

    #[test]
    fn ambiguous_disambiguation_yields_nothing() {
        let colliding = vec![
            (1, SymbolInformation::new("swift.method", "s:first")),
            (2, SymbolInformation::new("swift.method", "s:second")),
        ];
        let kind_only = kind_hash(Some("swift.method"), None);
        assert!(disambiguate_between_overloaded_symbols(&colliding, &kind_only).is_empty());
        assert!(
            disambiguate_between_overloaded_symbols(&colliding, &ParsedDisambiguation::None)
                .is_empty()
        );
    }
}
