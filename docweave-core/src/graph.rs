//! The topic graph: documentation pages as nodes, curation as edges.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. A page may be
//! curated under several parents and curation may form cycles, so paths to
//! a node are enumerated with a per-path visited set.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

/// The identity of a page, or of a landmark on a page.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicReference {
    pub bundle_id: String,
    /// Page path, e.g. `/documentation/MyKit/Foo`.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

impl TopicReference {
    pub fn new(bundle_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            path: path.into(),
            fragment: None,
        }
    }

    pub fn with_fragment(&self, fragment: impl Into<String>) -> Self {
        Self {
            fragment: Some(fragment.into()),
            ..self.clone()
        }
    }

    /// `doc://bundle-id/path#fragment`.
    pub fn url(&self) -> String {
        match &self.fragment {
            Some(fragment) => format!("doc://{}{}#{fragment}", self.bundle_id, self.path),
            None => format!("doc://{}{}", self.bundle_id, self.path),
        }
    }

    /// The path with the fragment, if any.
    pub fn path_and_fragment(&self) -> String {
        match &self.fragment {
            Some(fragment) => format!("{}#{fragment}", self.path),
            None => self.path.clone(),
        }
    }
}

impl fmt::Display for TopicReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Module,
    Symbol,
    Article,
    /// An article marked with `@TechnologyRoot`.
    TechnologyRoot,
    /// A `@Tutorials` page.
    TutorialTableOfContents,
    Volume,
    Chapter,
    Tutorial,
    TutorialArticle,
    /// A heading or section on a page.
    Landmark,
}

impl NodeKind {
    /// Roots that tutorial breadcrumbs prefer.
    pub fn is_tutorial_root(self) -> bool {
        matches!(self, Self::TutorialTableOfContents | Self::TechnologyRoot)
    }

    /// Roots that reference breadcrumbs prefer.
    pub fn is_reference_root(self) -> bool {
        matches!(self, Self::Module | Self::TechnologyRoot)
    }

    pub fn is_tutorial_content(self) -> bool {
        matches!(
            self,
            Self::TutorialTableOfContents
                | Self::Volume
                | Self::Chapter
                | Self::Tutorial
                | Self::TutorialArticle
        )
    }
}

/// A titled location within a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landmark {
    pub title: String,
    pub fragment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicNode {
    pub reference: TopicReference,
    pub kind: NodeKind,
    pub title: String,
    /// Sections of a tutorial or headings of an article, in page order.
    pub landmarks: Vec<Landmark>,
    /// Whether the page has a non-empty `@Assessments` section.
    pub has_assessments: bool,
}

impl TopicNode {
    pub fn new(reference: TopicReference, kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            reference,
            kind,
            title: title.into(),
            landmarks: Vec::new(),
            has_assessments: false,
        }
    }
}

#[derive(Debug)]
pub struct TopicGraph {
    bundle_id: String,
    nodes: Vec<TopicNode>,
    by_reference: HashMap<TopicReference, NodeId>,
    children: Vec<Vec<NodeId>>,
    parents: Vec<Vec<NodeId>>,
}

impl TopicGraph {
    /// An empty graph for the pages of one bundle.
    pub fn new(bundle_id: impl Into<String>) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            nodes: Vec::new(),
            by_reference: HashMap::new(),
            children: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Add a node, or return the existing node with the same reference.
    pub fn add_node(&mut self, node: TopicNode) -> NodeId {
        if let Some(&id) = self.by_reference.get(&node.reference) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.by_reference.insert(node.reference.clone(), id);
        self.nodes.push(node);
        self.children.push(Vec::new());
        self.parents.push(Vec::new());
        id
    }

    /// Curate `child` under `parent`. Repeated and self edges are ignored.
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.children[parent.0].contains(&child) {
            return;
        }
        self.children[parent.0].push(child);
        self.parents[child.0].push(parent);
    }

    pub fn node(&self, id: NodeId) -> &TopicNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TopicNode {
        &mut self.nodes[id.0]
    }

    pub fn id_of(&self, reference: &TopicReference) -> Option<NodeId> {
        self.by_reference.get(reference).copied()
    }

    /// The page at `path` in this graph's bundle.
    pub fn id_of_path(&self, path: &str) -> Option<NodeId> {
        self.id_of(&TopicReference::new(self.bundle_id.as_str(), path))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id.0]
    }

    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        &self.parents[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TopicNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (NodeId(position), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every simple path from a root (a node without parents) down to
    /// `target`, root first and excluding `target` itself.
    ///
    /// A root has the single empty path. Routes that only lead back into a
    /// cycle never reach a root and are not returned.
    pub fn finite_paths_to(&self, target: NodeId) -> Vec<Vec<NodeId>> {
        let mut paths = Vec::new();
        let mut route = vec![target];
        self.collect_paths(&mut route, &mut paths);
        paths
    }

    fn collect_paths(&self, route: &mut Vec<NodeId>, paths: &mut Vec<Vec<NodeId>>) {
        let Some(&node) = route.last() else {
            return;
        };
        let parents = self.parents(node);
        if parents.is_empty() {
            paths.push(route[1..].iter().rev().copied().collect());
            return;
        }
        for &parent in parents {
            if route.contains(&parent) {
                tracing::debug!(
                    node = %self.node(node).reference,
                    parent = %self.node(parent).reference,
                    "skipping curation cycle"
                );
                continue;
            }
            route.push(parent);
            self.collect_paths(route, paths);
            route.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn add(graph: &mut TopicGraph, path: &str, kind: NodeKind) -> NodeId {
        graph.add_node(TopicNode::new(TopicReference::new("b", path), kind, path))
    }

    #[test]
    fn nodes_are_deduplicated_by_reference() {
        let mut graph = TopicGraph::new("b");
        let a = add(&mut graph, "/a", NodeKind::Article);
        let again = add(&mut graph, "/a", NodeKind::Symbol);
        assert_eq!(a, again);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.node(a).kind, NodeKind::Article);
    }

    #[test]
    fn pages_are_found_by_path_within_the_bundle() {
        let mut graph = TopicGraph::new("b");
        let intro = add(&mut graph, "/tutorials/Kit/Intro", NodeKind::Tutorial);
        let landmark = graph.add_node(TopicNode::new(
            TopicReference::new("b", "/tutorials/Kit/Intro").with_fragment("Start"),
            NodeKind::Landmark,
            "Start",
        ));
        graph.add_node(TopicNode::new(
            TopicReference::new("other", "/tutorials/Kit/Outro"),
            NodeKind::Tutorial,
            "Outro",
        ));

        assert_eq!(graph.id_of_path("/tutorials/Kit/Intro"), Some(intro));
        assert_ne!(graph.id_of_path("/tutorials/Kit/Intro"), Some(landmark));
        assert_eq!(graph.id_of_path("/tutorials/Kit/Outro"), None);
        assert_eq!(graph.id_of_path("/tutorials/Kit"), None);
    }

    #[test]
    fn root_has_single_empty_path() {
        let mut graph = TopicGraph::new("b");
        let root = add(&mut graph, "/root", NodeKind::Module);
        assert_eq!(graph.finite_paths_to(root), vec![Vec::<NodeId>::new()]);
    }

    #[test]
    fn multiple_curation_paths() {
        let mut graph = TopicGraph::new("b");
        let module = add(&mut graph, "/m", NodeKind::Module);
        let foo = add(&mut graph, "/m/Foo", NodeKind::Symbol);
        let article = add(&mut graph, "/m/Guide", NodeKind::Article);
        let bar = add(&mut graph, "/m/Foo/bar", NodeKind::Symbol);
        graph.add_edge(module, foo);
        graph.add_edge(module, article);
        graph.add_edge(foo, bar);
        graph.add_edge(article, bar);
        graph.add_edge(foo, bar);

        assert_eq!(graph.children(foo), &[bar]);
        assert_eq!(
            graph.finite_paths_to(bar),
            vec![vec![module, foo], vec![module, article]]
        );
    }

    #[test]
    fn cycles_terminate() {
        let mut graph = TopicGraph::new("b");
        let root = add(&mut graph, "/r", NodeKind::Module);
        let a = add(&mut graph, "/a", NodeKind::Article);
        let b = add(&mut graph, "/b", NodeKind::Article);
        graph.add_edge(root, a);
        graph.add_edge(a, b);
        graph.add_edge(b, a);

        assert_eq!(graph.finite_paths_to(b), vec![vec![root, a]]);
        assert_eq!(graph.finite_paths_to(a), vec![vec![root]]);

        let mut island = TopicGraph::new("b");
        let x = add(&mut island, "/x", NodeKind::Article);
        let y = add(&mut island, "/y", NodeKind::Article);
        island.add_edge(x, y);
        island.add_edge(y, x);
        assert!(island.finite_paths_to(x).is_empty());
    }

    #[test]
    fn reference_urls() {
        let reference = TopicReference::new("org.example", "/tutorials/Kit/Intro");
        assert_eq!(reference.url(), "doc://org.example/tutorials/Kit/Intro");
        assert_eq!(
            reference.with_fragment("Check-Your-Understanding").url(),
            "doc://org.example/tutorials/Kit/Intro#Check-Your-Understanding"
        );
    }
}
