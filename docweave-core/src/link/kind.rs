//! Registry of known symbol kind identifiers.
//!
//! A disambiguation suffix token is only treated as a kind when it appears in
//! this registry. Anything else is assumed to be a precise identifier hash.

/// Kind identifiers without their language prefix.
const KNOWN_KINDS: &[&str] = &[
    "associatedtype",
    "class",
    "deinit",
    "dictionary",
    "dictionaryKey",
    "enum",
    "enum.case",
    "extension",
    "func",
    "func.op",
    "httpBody",
    "httpParameter",
    "httpRequest",
    "httpResponse",
    "init",
    "ivar",
    "macro",
    "method",
    "module",
    "namespace",
    "property",
    "protocol",
    "snippet",
    "snippetGroup",
    "struct",
    "subscript",
    "type.method",
    "type.property",
    "type.subscript",
    "typealias",
    "typedef",
    "union",
    "var",
];

/// Source-language prefixes that may precede a kind identifier.
const LANGUAGE_PREFIXES: &[&str] = &["swift.", "objc.", "c.", "data."];

/// Strip a known source-language prefix (`swift.`, `objc.`, …) from `identifier`.
pub fn strip_language_prefix(identifier: &str) -> &str {
    for prefix in LANGUAGE_PREFIXES {
        if let Some(rest) = identifier.strip_prefix(prefix) {
            if KNOWN_KINDS.contains(&rest) {
                return rest;
            }
        }
    }
    identifier
}

/// Whether `identifier` names a known symbol kind, with or without a language
/// prefix (`swift.class` and `class` are both known).
pub fn is_known_kind_identifier(identifier: &str) -> bool {
    KNOWN_KINDS.contains(&strip_language_prefix(identifier))
}

/// Whether two kind identifiers name the same kind once language prefixes are ignored.
pub fn same_kind(lhs: &str, rhs: &str) -> bool {
    lhs == rhs || strip_language_prefix(lhs) == strip_language_prefix(rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_and_bare_kinds_are_known() {
        assert!(is_known_kind_identifier("swift.class"));
        assert!(is_known_kind_identifier("swift.type.method"));
        assert!(is_known_kind_identifier("objc.ivar"));
        assert!(is_known_kind_identifier("method"));
    }

    #[test]
    fn hashes_and_unknown_prefixes_are_not_kinds() {
        assert!(!is_known_kind_identifier("abc123"));
        assert!(!is_known_kind_identifier("rust.struct"));
        assert!(!is_known_kind_identifier(""));
    }

    #[test]
    fn same_kind_ignores_language() {
        assert!(same_kind("swift.method", "method"));
        assert!(same_kind("swift.method", "objc.method"));
        assert!(!same_kind("swift.method", "swift.func"));
    }
}
