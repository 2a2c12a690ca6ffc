//! Relationship manifest emitted alongside markdown output.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipType {
    /// The source page is curated under a topic group of the target page.
    BelongsToTopic,
    /// The target page is listed in the source page's See Also section.
    RelatedSymbol,
}

/// One edge between two pages, identified by page path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub source_identifier: String,
    pub relationship_type: RelationshipType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Page path, optionally followed by `#fragment`.
    pub target_identifier: String,
}

/// All relationships of a bundle. Duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipManifest {
    pub bundle_id: String,
    pub relationships: BTreeSet<Relationship>,
}

impl RelationshipManifest {
    pub fn new(bundle_id: impl Into<String>) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            relationships: BTreeSet::new(),
        }
    }

    pub fn extend(&mut self, relationships: impl IntoIterator<Item = Relationship>) {
        self.relationships.extend(relationships);
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Relationships whose source is `page`.
    pub fn outgoing<'a>(&'a self, page: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.relationships
            .iter()
            .filter(move |r| r.source_identifier == page)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn topic(source: &str, target: &str) -> Relationship {
        Relationship {
            source_identifier: source.into(),
            relationship_type: RelationshipType::BelongsToTopic,
            subtype: None,
            target_identifier: target.into(),
        }
    }

    #[test]
    fn duplicates_collapse() {
        let mut manifest = RelationshipManifest::new("org.example.MyKit");
        manifest.extend([
            topic("/documentation/MyKit/Foo", "/documentation/MyKit#Essentials"),
            topic("/documentation/MyKit/Foo", "/documentation/MyKit#Essentials"),
        ]);
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.outgoing("/documentation/MyKit/Foo").count(), 1);
    }

    #[test]
    fn serializes_camel_case() {
        let mut manifest = RelationshipManifest::new("b");
        manifest.extend([Relationship {
            subtype: Some("swift.struct".into()),
            relationship_type: RelationshipType::RelatedSymbol,
            ..topic("/a", "/b")
        }]);
        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"relationshipType\": \"relatedSymbol\""));
        assert!(json.contains("\"sourceIdentifier\": \"/a\""));
        assert!(json.contains("\"subtype\": \"swift.struct\""));
        assert_eq!(RelationshipManifest::from_json(&json).unwrap(), manifest);

        let plain = RelationshipManifest {
            bundle_id: "b".into(),
            relationships: BTreeSet::from([topic("/a", "/b")]),
        };
        assert!(!plain.to_json().unwrap().contains("subtype"));
    }
}
