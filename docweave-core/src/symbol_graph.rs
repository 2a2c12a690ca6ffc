//! Symbol-graph JSON input.
//!
//! Only the fields the compiler reads are modeled; everything else in the
//! file is ignored.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolGraph {
    pub module: Module,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub identifier: SymbolIdentifier,
    pub kind: SymbolKind,
    pub names: Names,
    #[serde(default)]
    pub path_components: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_signature: Option<FunctionSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_comment: Option<DocComment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolIdentifier {
    pub precise: String,
    #[serde(default = "default_language")]
    pub interface_language: String,
}

fn default_language() -> String {
    "swift".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolKind {
    pub identifier: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Names {
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionSignature {
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub returns: Vec<DeclarationFragment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub declaration_fragments: Vec<DeclarationFragment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclarationFragment {
    pub kind: String,
    pub spelling: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocComment {
    #[serde(default)]
    pub lines: Vec<DocCommentLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocCommentLine {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: String,
    pub source: String,
    pub target: String,
}

impl Relationship {
    pub fn is_member_of(&self) -> bool {
        self.kind == "memberOf"
    }
}

impl SymbolGraph {
    /// Decode a symbol graph from JSON text. `name` labels errors.
    pub fn from_json(name: &str, json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|source| Error::SymbolGraph {
            name: name.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&path.display().to_string(), &json)
    }
}

impl Symbol {
    /// Parameter type names, one per parameter. Parameter names and the `:`
    /// separator are not part of the type.
    pub fn parameter_types(&self) -> Option<Vec<String>> {
        let signature = self.function_signature.as_ref()?;
        Some(
            signature
                .parameters
                .iter()
                .map(|p| type_spelling(&p.declaration_fragments))
                .collect(),
        )
    }

    /// Return type names. `Void` and `()` returns count as no return types.
    pub fn return_types(&self) -> Option<Vec<String>> {
        let signature = self.function_signature.as_ref()?;
        let spelling = type_spelling(&signature.returns);
        if spelling.is_empty() || spelling == "Void" || spelling == "()" {
            return Some(Vec::new());
        }
        Some(vec![spelling])
    }

    /// The doc comment as markdown source.
    pub fn doc_comment_markdown(&self) -> Option<String> {
        let comment = self.doc_comment.as_ref()?;
        if comment.lines.is_empty() {
            return None;
        }
        Some(
            comment
                .lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

fn type_spelling(fragments: &[DeclarationFragment]) -> String {
    fragments
        .iter()
        .filter(|f| !matches!(f.kind.as_str(), "identifier" | "internalParam" | "externalParam"))
        .map(|f| f.spelling.as_str())
        .collect::<String>()
        .trim()
        .trim_start_matches(':')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GRAPH: &str = r#"{
        "module": { "name": "MyKit" },
        "symbols": [
            {
                "identifier": { "precise": "s:5MyKit3FooC", "interfaceLanguage": "swift" },
                "kind": { "identifier": "swift.class", "displayName": "Class" },
                "names": { "title": "Foo" },
                "pathComponents": ["Foo"],
                "docComment": { "lines": [{ "text": "A foo." }, { "text": "" }, { "text": "More." }] }
            },
            {
                "identifier": { "precise": "s:5MyKit3FooC3baryySiF" },
                "kind": { "identifier": "swift.method" },
                "names": { "title": "bar(_:)" },
                "pathComponents": ["Foo", "bar(_:)"],
                "functionSignature": {
                    "parameters": [{
                        "name": "value",
                        "declarationFragments": [
                            { "kind": "identifier", "spelling": "value" },
                            { "kind": "text", "spelling": ": " },
                            { "kind": "typeIdentifier", "spelling": "Int" }
                        ]
                    }],
                    "returns": [{ "kind": "text", "spelling": "()" }]
                }
            }
        ],
        "relationships": [
            { "kind": "memberOf", "source": "s:5MyKit3FooC3baryySiF", "target": "s:5MyKit3FooC" }
        ]
    }"#;

    #[test]
    fn decodes_symbols_and_relationships() {
        let graph = SymbolGraph::from_json("MyKit", GRAPH).unwrap();
        assert_eq!(graph.module.name, "MyKit");
        assert_eq!(graph.symbols.len(), 2);
        assert_eq!(graph.symbols[1].identifier.interface_language, "swift");
        assert!(graph.relationships[0].is_member_of());
        assert_eq!(
            graph.symbols[0].doc_comment_markdown().as_deref(),
            Some("A foo.\n\nMore.")
        );
    }

    #[test]
    fn signature_types() {
        let graph = SymbolGraph::from_json("MyKit", GRAPH).unwrap();
        let bar = &graph.symbols[1];
        assert_eq!(bar.parameter_types(), Some(vec!["Int".to_string()]));
        assert_eq!(bar.return_types(), Some(vec![]));
        assert_eq!(graph.symbols[0].parameter_types(), None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = SymbolGraph::from_json("Broken", "{").unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }
}
