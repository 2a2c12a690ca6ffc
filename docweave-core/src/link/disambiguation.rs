//! Minimal disambiguation of symbols that share one name at one point in the
//! hierarchy.
//!
//! A [`DisambiguationContainer`] is a scratchpad for one collision group: it is
//! filled with [`DisambiguationContainer::add`], then queried with
//! [`DisambiguationContainer::find`] or
//! [`DisambiguationContainer::disambiguated_values`], and dropped.

use crate::link::component::DisambiguationSuffix;
use crate::link::hash::stable_hash_string;
use crate::link::kind::same_kind;

/// How a symbol is told apart from the other symbols with the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Disambiguation {
    None,
    Kind(String),
    Hash(String),
    KindAndHash {
        kind: String,
        hash: String,
    },
    TypeSignature {
        parameter_types: Option<Vec<String>>,
        return_types: Option<Vec<String>>,
    },
}

impl Disambiguation {
    /// Render as link suffix text, including the leading `-`.
    pub fn make_suffix(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Kind(kind) => format!("-{kind}"),
            Self::Hash(hash) => format!("-{hash}"),
            Self::KindAndHash { kind, hash } => format!("-{kind}-{hash}"),
            Self::TypeSignature {
                parameter_types,
                return_types,
            } => {
                let mut suffix = String::new();
                if let Some(parameters) = parameter_types {
                    suffix.push_str(&format!("-({})", parameters.join(",")));
                }
                if let Some(returns) = return_types {
                    match returns.as_slice() {
                        [single] => suffix.push_str(&format!("->{single}")),
                        many => suffix.push_str(&format!("->({})", many.join(","))),
                    }
                }
                suffix
            }
        }
    }
}

impl From<&DisambiguationSuffix> for Disambiguation {
    fn from(suffix: &DisambiguationSuffix) -> Self {
        match suffix {
            DisambiguationSuffix::None => Self::None,
            DisambiguationSuffix::KindIdentifier(kind) => Self::Kind(kind.clone()),
            DisambiguationSuffix::PreciseIdentifierHash(hash) => Self::Hash(hash.clone()),
            DisambiguationSuffix::KindAndPreciseIdentifier { kind, hash } => Self::KindAndHash {
                kind: kind.clone(),
                hash: hash.clone(),
            },
        }
    }
}

/// What the container knows about one registered symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMetadata {
    pub kind: String,
    pub hash: String,
    pub parameter_types: Option<Vec<String>>,
    pub return_types: Option<Vec<String>>,
}

impl SymbolMetadata {
    pub fn new(kind: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            hash: hash.into(),
            parameter_types: None,
            return_types: None,
        }
    }

    /// Metadata whose hash is computed from the symbol's precise identifier.
    pub fn from_precise_identifier(kind: impl Into<String>, precise_identifier: &str) -> Self {
        Self::new(kind, stable_hash_string(precise_identifier))
    }

    pub fn with_signature(
        mut self,
        parameter_types: Option<Vec<String>>,
        return_types: Option<Vec<String>>,
    ) -> Self {
        self.parameter_types = parameter_types;
        self.return_types = return_types;
        self
    }
}

/// Behavior switches for suffix computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerOptions {
    /// Always include the kind once kinds differ within a group, even when the
    /// hash alone would do. Links authored against the older resolver rely on
    /// these longer suffixes.
    pub legacy_always_add_kind: bool,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    metadata: SymbolMetadata,
}

/// Computes the minimal disambiguation for each symbol in one name-collision group.
#[derive(Debug, Clone)]
pub struct DisambiguationContainer<T> {
    entries: Vec<Entry<T>>,
    options: ContainerOptions,
}

impl<T> Default for DisambiguationContainer<T> {
    fn default() -> Self {
        Self::new(ContainerOptions::default())
    }
}

impl<T> DisambiguationContainer<T> {
    pub fn new(options: ContainerOptions) -> Self {
        Self {
            entries: Vec::new(),
            options,
        }
    }

    /// Register a symbol. A second registration with identical kind and hash
    /// is the same symbol seen twice and is ignored.
    pub fn add(&mut self, value: T, metadata: SymbolMetadata) {
        let duplicate = self
            .entries
            .iter()
            .any(|e| e.metadata.kind == metadata.kind && e.metadata.hash == metadata.hash);
        if !duplicate {
            self.entries.push(Entry { value, metadata });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every registered symbol paired with the shortest disambiguation that
    /// tells it apart from the rest of the group, in registration order.
    pub fn disambiguated_values(&self) -> Vec<(&T, Disambiguation)> {
        if self.entries.len() <= 1 {
            return self
                .entries
                .iter()
                .map(|e| (&e.value, Disambiguation::None))
                .collect();
        }

        let first_kind = &self.entries[0].metadata.kind;
        let all_same_kind = self
            .entries
            .iter()
            .all(|e| same_kind(&e.metadata.kind, first_kind));

        self.entries
            .iter()
            .map(|entry| {
                let metadata = &entry.metadata;
                let (add_kind, add_hash) = if all_same_kind {
                    (false, true)
                } else {
                    let kind_count = self
                        .entries
                        .iter()
                        .filter(|other| same_kind(&other.metadata.kind, &metadata.kind))
                        .count();
                    if self.options.legacy_always_add_kind {
                        (true, kind_count > 1)
                    } else {
                        (kind_count == 1, kind_count > 1)
                    }
                };

                let disambiguation = match (add_kind, add_hash) {
                    (true, true) => Disambiguation::KindAndHash {
                        kind: metadata.kind.clone(),
                        hash: metadata.hash.clone(),
                    },
                    (true, false) => Disambiguation::Kind(metadata.kind.clone()),
                    (false, true) => Disambiguation::Hash(metadata.hash.clone()),
                    (false, false) => Disambiguation::None,
                };
                (&entry.value, disambiguation)
            })
            .collect()
    }

    /// All registered symbols that `disambiguation` is compatible with.
    pub fn candidates(&self, disambiguation: &Disambiguation) -> Vec<&T> {
        self.entries
            .iter()
            .filter(|e| matches(&e.metadata, disambiguation))
            .map(|e| &e.value)
            .collect()
    }

    /// The one symbol `disambiguation` identifies, or `None` when it matches
    /// nothing or is still ambiguous.
    pub fn find(&self, disambiguation: &Disambiguation) -> Option<&T> {
        match self.candidates(disambiguation).as_slice() {
            [single] => Some(*single),
            [] => None,
            many => {
                tracing::debug!(
                    candidates = many.len(),
                    suffix = %disambiguation.make_suffix(),
                    "disambiguation is ambiguous"
                );
                None
            }
        }
    }
}

fn matches(metadata: &SymbolMetadata, disambiguation: &Disambiguation) -> bool {
    match disambiguation {
        Disambiguation::None => true,
        Disambiguation::Kind(kind) => same_kind(&metadata.kind, kind),
        Disambiguation::Hash(hash) => &metadata.hash == hash,
        Disambiguation::KindAndHash { kind, hash } => {
            same_kind(&metadata.kind, kind) && &metadata.hash == hash
        }
        Disambiguation::TypeSignature {
            parameter_types,
            return_types,
        } => {
            types_match(metadata.parameter_types.as_deref(), parameter_types.as_deref())
                && types_match(metadata.return_types.as_deref(), return_types.as_deref())
        }
    }
}

/// A missing query list matches anything; a given one must equal the
/// symbol's list once whitespace is removed from every type name.
fn types_match(known: Option<&[String]>, query: Option<&[String]>) -> bool {
    let Some(query) = query else {
        return true;
    };
    let Some(known) = known else {
        return false;
    };
    known.len() == query.len()
        && known
            .iter()
            .zip(query)
            .all(|(k, q)| normalize_type_name(k) == normalize_type_name(q))
}

pub(crate) fn normalize_type_name(name: &str) -> String {
    name.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn container(
        symbols: &[(&'static str, &str, &str)],
        options: ContainerOptions,
    ) -> DisambiguationContainer<&'static str> {
        let mut container = DisambiguationContainer::new(options);
        for (id, kind, hash) in symbols {
            container.add(*id, SymbolMetadata::new(*kind, *hash));
        }
        container
    }

    fn suffixes(container: &DisambiguationContainer<&'static str>) -> Vec<(String, String)> {
        container
            .disambiguated_values()
            .into_iter()
            .map(|(id, d)| (id.to_string(), d.make_suffix()))
            .collect()
    }

    #[test]
    fn single_symbol_needs_no_suffix() {
        let c = container(&[("a", "swift.class", "h1")], ContainerOptions::default());
        assert_eq!(suffixes(&c), vec![("a".to_string(), String::new())]);
        assert_eq!(c.find(&Disambiguation::None), Some(&"a"));
    }

    #[test]
    fn same_kind_uses_hash_only() {
        let c = container(
            &[("first", "swift.method", "abc123"), ("second", "swift.method", "def456")],
            ContainerOptions::default(),
        );
        assert_eq!(
            suffixes(&c),
            vec![
                ("first".to_string(), "-abc123".to_string()),
                ("second".to_string(), "-def456".to_string()),
            ]
        );
    }

    #[test]
    fn same_kind_uses_hash_only_in_legacy_mode_too() {
        let c = container(
            &[("first", "swift.method", "abc123"), ("second", "swift.method", "def456")],
            ContainerOptions {
                legacy_always_add_kind: true,
            },
        );
        assert_eq!(suffixes(&c)[0].1, "-abc123");
    }

    #[test]
    fn distinct_kinds_use_kind_only() {
        let c = container(
            &[("class", "swift.class", "h1"), ("prop", "swift.property", "h2")],
            ContainerOptions::default(),
        );
        assert_eq!(
            suffixes(&c),
            vec![
                ("class".to_string(), "-swift.class".to_string()),
                ("prop".to_string(), "-swift.property".to_string()),
            ]
        );
    }

    #[test]
    fn mixed_groups_hash_only_where_kind_repeats() {
        let c = container(
            &[
                ("m1", "swift.method", "aaa"),
                ("m2", "swift.method", "bbb"),
                ("p", "swift.property", "ccc"),
            ],
            ContainerOptions::default(),
        );
        assert_eq!(
            suffixes(&c),
            vec![
                ("m1".to_string(), "-aaa".to_string()),
                ("m2".to_string(), "-bbb".to_string()),
                ("p".to_string(), "-swift.property".to_string()),
            ]
        );
    }

    #[test]
    fn language_variants_of_one_kind_use_hashes() {
        let c = container(
            &[
                ("swift", "swift.method", "aaa"),
                ("objc", "objc.method", "bbb"),
                ("p", "swift.property", "ccc"),
            ],
            ContainerOptions::default(),
        );
        assert_eq!(
            suffixes(&c),
            vec![
                ("swift".to_string(), "-aaa".to_string()),
                ("objc".to_string(), "-bbb".to_string()),
                ("p".to_string(), "-swift.property".to_string()),
            ]
        );
        for (value, disambiguation) in c.disambiguated_values() {
            assert_eq!(c.find(&disambiguation), Some(value));
        }
    }

    #[test]
    fn legacy_mode_always_adds_kind_in_mixed_groups() {
        let c = container(
            &[
                ("m1", "swift.method", "aaa"),
                ("m2", "swift.method", "bbb"),
                ("p", "swift.property", "ccc"),
            ],
            ContainerOptions {
                legacy_always_add_kind: true,
            },
        );
        assert_eq!(
            suffixes(&c),
            vec![
                ("m1".to_string(), "-swift.method-aaa".to_string()),
                ("m2".to_string(), "-swift.method-bbb".to_string()),
                ("p".to_string(), "-swift.property".to_string()),
            ]
        );
    }

    #[test]
    fn find_by_partial_queries() {
        let c = container(
            &[
                ("m1", "swift.method", "aaa"),
                ("m2", "swift.method", "bbb"),
                ("p", "swift.property", "ccc"),
            ],
            ContainerOptions::default(),
        );
        assert_eq!(c.find(&Disambiguation::Kind("swift.property".into())), Some(&"p"));
        assert_eq!(c.find(&Disambiguation::Kind("property".into())), Some(&"p"));
        assert_eq!(c.find(&Disambiguation::Kind("swift.method".into())), None);
        assert_eq!(c.find(&Disambiguation::Hash("bbb".into())), Some(&"m2"));
        assert_eq!(
            c.find(&Disambiguation::KindAndHash {
                kind: "swift.method".into(),
                hash: "aaa".into()
            }),
            Some(&"m1")
        );
        assert_eq!(
            c.find(&Disambiguation::KindAndHash {
                kind: "swift.property".into(),
                hash: "aaa".into()
            }),
            None
        );
        assert_eq!(c.find(&Disambiguation::None), None);
        assert_eq!(c.find(&Disambiguation::Hash("zzz".into())), None);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut c = DisambiguationContainer::default();
        c.add(1, SymbolMetadata::new("swift.func", "aaa"));
        c.add(2, SymbolMetadata::new("swift.func", "aaa"));
        assert_eq!(c.len(), 1);
        assert_eq!(c.find(&Disambiguation::None), Some(&1));
    }

    #[test]
    fn type_signature_matching_ignores_whitespace() {
        let mut c = DisambiguationContainer::default();
        c.add(
            "int",
            SymbolMetadata::new("swift.func", "aaa")
                .with_signature(Some(vec!["Int".into()]), Some(vec!["[String : Int]".into()])),
        );
        c.add(
            "string",
            SymbolMetadata::new("swift.func", "bbb")
                .with_signature(Some(vec!["String".into()]), Some(vec!["Void".into()])),
        );

        let by_params = Disambiguation::TypeSignature {
            parameter_types: Some(vec![" String ".into()]),
            return_types: None,
        };
        assert_eq!(c.find(&by_params), Some(&"string"));

        let by_returns = Disambiguation::TypeSignature {
            parameter_types: None,
            return_types: Some(vec!["[String:Int]".into()]),
        };
        assert_eq!(c.find(&by_returns), Some(&"int"));

        let mismatch = Disambiguation::TypeSignature {
            parameter_types: Some(vec!["Int".into(), "Int".into()]),
            return_types: None,
        };
        assert_eq!(c.find(&mismatch), None);
    }

    #[test]
    fn type_signature_suffix_format() {
        let d = Disambiguation::TypeSignature {
            parameter_types: Some(vec!["Int".into(), "String".into()]),
            return_types: Some(vec!["Bool".into()]),
        };
        assert_eq!(d.make_suffix(), "-(Int,String)->Bool");

        let d = Disambiguation::TypeSignature {
            parameter_types: None,
            return_types: Some(vec![]),
        };
        assert_eq!(d.make_suffix(), "->()");
    }
}
