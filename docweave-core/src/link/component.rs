//! Parsing of single symbol-link path segments such as `bar-swift.method-abc12`.

use std::fmt;

use crate::link::kind::is_known_kind_identifier;

/// The optional suffix after a link component's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisambiguationSuffix {
    None,
    KindIdentifier(String),
    PreciseIdentifierHash(String),
    KindAndPreciseIdentifier { kind: String, hash: String },
}

impl DisambiguationSuffix {
    /// Parse suffix text (without its leading `-`).
    ///
    /// Empty text means no suffix was given and yields `None`. A single token
    /// is a kind when the registry knows it and a hash otherwise; two tokens
    /// must be `kind-hash`. Anything else is malformed.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return Some(Self::None);
        }

        let tokens: Vec<&str> = text.split('-').collect();
        if tokens.iter().any(|t| t.is_empty()) {
            return None;
        }

        match tokens.as_slice() {
            [single] if is_known_kind_identifier(single) => {
                Some(Self::KindIdentifier(single.to_string()))
            }
            [single] => Some(Self::PreciseIdentifierHash(single.to_string())),
            [kind, hash] if is_known_kind_identifier(kind) => Some(Self::KindAndPreciseIdentifier {
                kind: kind.to_string(),
                hash: hash.to_string(),
            }),
            _ => None,
        }
    }

    /// The suffix as it appears in a link, including the leading `-`.
    pub fn as_link_suffix_string(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::KindIdentifier(kind) => format!("-{kind}"),
            Self::PreciseIdentifierHash(hash) => format!("-{hash}"),
            Self::KindAndPreciseIdentifier { kind, hash } => format!("-{kind}-{hash}"),
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::KindIdentifier(kind) | Self::KindAndPreciseIdentifier { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn hash(&self) -> Option<&str> {
        match self {
            Self::PreciseIdentifierHash(hash) | Self::KindAndPreciseIdentifier { hash, .. } => {
                Some(hash)
            }
            _ => None,
        }
    }
}

/// One path segment of a symbol link: a base name plus its disambiguation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkComponent {
    pub name: String,
    pub disambiguation_suffix: DisambiguationSuffix,
}

impl LinkComponent {
    pub fn new(name: impl Into<String>, disambiguation_suffix: DisambiguationSuffix) -> Self {
        Self {
            name: name.into(),
            disambiguation_suffix,
        }
    }

    /// Parse a raw path segment.
    ///
    /// The segment is split on its first `-` only. A suffix that is present
    /// but fails to parse invalidates the whole component.
    pub fn parse(segment: &str) -> Option<Self> {
        if segment.is_empty() {
            return None;
        }

        let Some((name, suffix)) = segment.split_once('-') else {
            return Some(Self::new(segment, DisambiguationSuffix::None));
        };

        if name.is_empty() || suffix.is_empty() {
            return None;
        }

        let disambiguation_suffix = DisambiguationSuffix::parse(suffix)?;
        Some(Self::new(name, disambiguation_suffix))
    }

    pub fn as_link_component_string(&self) -> String {
        format!(
            "{}{}",
            self.name,
            self.disambiguation_suffix.as_link_suffix_string()
        )
    }
}

impl fmt::Display for LinkComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_link_component_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_name_has_no_suffix() {
        let component = LinkComponent::parse("bar()").unwrap();
        assert_eq!(component.name, "bar()");
        assert_eq!(component.disambiguation_suffix, DisambiguationSuffix::None);
    }

    #[test]
    fn kind_suffix() {
        let component = LinkComponent::parse("Foo-swift.struct").unwrap();
        assert_eq!(component.name, "Foo");
        assert_eq!(
            component.disambiguation_suffix,
            DisambiguationSuffix::KindIdentifier("swift.struct".into())
        );
    }

    #[test]
    fn hash_suffix() {
        let component = LinkComponent::parse("bar-abc123").unwrap();
        assert_eq!(
            component.disambiguation_suffix,
            DisambiguationSuffix::PreciseIdentifierHash("abc123".into())
        );
    }

    #[test]
    fn kind_and_hash_suffix() {
        let component = LinkComponent::parse("bar-swift.method-abc123").unwrap();
        assert_eq!(component.name, "bar");
        assert_eq!(
            component.disambiguation_suffix,
            DisambiguationSuffix::KindAndPreciseIdentifier {
                kind: "swift.method".into(),
                hash: "abc123".into(),
            }
        );
    }

    #[test]
    fn two_tokens_require_known_kind_first() {
        assert!(LinkComponent::parse("bar-abc123-def456").is_none());
    }

    #[test]
    fn three_tokens_are_invalid() {
        assert!(LinkComponent::parse("bar-swift.method-abc-def").is_none());
    }

    #[test]
    fn trailing_or_leading_dash_is_invalid() {
        assert!(LinkComponent::parse("bar-").is_none());
        assert!(LinkComponent::parse("-bar").is_none());
        assert!(LinkComponent::parse("bar-swift.method-").is_none());
        assert!(LinkComponent::parse("").is_none());
    }

    #[test]
    fn empty_suffix_text_is_none_not_error() {
        assert_eq!(DisambiguationSuffix::parse(""), Some(DisambiguationSuffix::None));
    }

    #[test]
    fn serialization_is_inverse_of_parsing() {
        for text in ["bar", "bar-swift.func", "bar-1a2b3", "bar-swift.func-1a2b3"] {
            let component = LinkComponent::parse(text).unwrap();
            assert_eq!(component.as_link_component_string(), text);
            assert_eq!(component.to_string(), text);
        }
    }
}
