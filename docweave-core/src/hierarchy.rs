//! Breadcrumb and tutorial hierarchies computed from the topic graph.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::graph::{NodeId, NodeKind, TopicGraph, TopicReference};
use crate::render::path::url_readable_fragment;

/// Title of the section listing a tutorial's assessments.
pub const ASSESSMENTS_TITLE: &str = "Check Your Understanding";

/// All curation paths to a reference page. The first path is canonical.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceHierarchy {
    pub paths: Vec<Vec<TopicReference>>,
}

impl ReferenceHierarchy {
    pub fn canonical_path(&self) -> &[TopicReference] {
        self.paths.first().map_or(&[], Vec::as_slice)
    }
}

/// One entry of a tutorial table of contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub reference: TopicReference,
    pub kind: NodeKind,
    pub title: String,
    pub children: Vec<HierarchyNode>,
}

/// The hierarchy of a tutorial page, rooted at its table of contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TutorialsHierarchy {
    /// The table of contents or technology root.
    pub reference: TopicReference,
    /// Volumes, chapters, tutorials and landmarks below the root.
    pub modules: Vec<HierarchyNode>,
    /// Curation paths to the page; the first is rooted at `reference`.
    pub paths: Vec<Vec<TopicReference>>,
}

/// Translates topic graph nodes into hierarchies for rendering.
///
/// Every reference the translator visits is recorded in
/// `collected_topic_references`. Use one translator per page.
pub struct RenderHierarchyTranslator<'g> {
    graph: &'g TopicGraph,
    pub collected_topic_references: BTreeSet<TopicReference>,
    /// Synthetic landmark references keyed by URL, such as assessment sections.
    pub link_references: BTreeMap<String, TopicReference>,
}

impl<'g> RenderHierarchyTranslator<'g> {
    pub fn new(graph: &'g TopicGraph) -> Self {
        Self {
            graph,
            collected_topic_references: BTreeSet::new(),
            link_references: BTreeMap::new(),
        }
    }

    /// The hierarchy of a tutorial page.
    ///
    /// Returns `None` when no curation path starts at a table of contents or
    /// technology root. With `omit_chapters` only the paths are computed.
    pub fn visit_technology_node(
        &mut self,
        target: NodeId,
        omit_chapters: bool,
    ) -> Option<TutorialsHierarchy> {
        let graph = self.graph;
        let mut paths = graph.finite_paths_to(target);
        let rooted_at_tutorials =
            |path: &Vec<NodeId>| path.first().is_some_and(|&root| graph.node(root).kind.is_tutorial_root());
        // Stable: the discovery order of equally preferred paths is kept.
        paths.sort_by_key(|path| !rooted_at_tutorials(path));

        let root = match paths.first() {
            Some(path) if rooted_at_tutorials(path) => path[0],
            _ if graph.node(target).kind.is_tutorial_root() => target,
            _ => return None,
        };

        let modules = if omit_chapters {
            Vec::new()
        } else {
            self.visit_children(root)
        };
        let reference = graph.node(root).reference.clone();
        self.collected_topic_references.insert(reference.clone());
        Some(TutorialsHierarchy {
            reference,
            modules,
            paths: self.references(&paths),
        })
    }

    /// Curation paths to a symbol or article page.
    ///
    /// Paths starting at a module or technology root come first, then shorter
    /// paths. A root page has one empty path.
    pub fn visit_reference_node(&mut self, target: NodeId) -> ReferenceHierarchy {
        let graph = self.graph;
        let mut paths = graph.finite_paths_to(target);
        paths.sort_by_key(|path| {
            let preferred = path
                .first()
                .is_some_and(|&root| graph.node(root).kind.is_reference_root());
            (!preferred, path.len())
        });
        ReferenceHierarchy {
            paths: self.references(&paths),
        }
    }

    fn references(&mut self, paths: &[Vec<NodeId>]) -> Vec<Vec<TopicReference>> {
        let graph = self.graph;
        paths
            .iter()
            .map(|path| {
                path.iter()
                    .map(|&id| {
                        let reference = graph.node(id).reference.clone();
                        self.collected_topic_references.insert(reference.clone());
                        reference
                    })
                    .collect()
            })
            .collect()
    }

    fn visit_children(&mut self, parent: NodeId) -> Vec<HierarchyNode> {
        let graph = self.graph;
        graph
            .children(parent)
            .iter()
            .filter_map(|&child| match graph.node(child).kind {
                NodeKind::Volume => Some(self.visit_volume(child)),
                NodeKind::Chapter => Some(self.visit_chapter(child)),
                NodeKind::Tutorial | NodeKind::TutorialArticle => Some(self.visit_tutorial(child)),
                _ => None,
            })
            .collect()
    }

    fn visit_volume(&mut self, volume: NodeId) -> HierarchyNode {
        let graph = self.graph;
        let children = graph
            .children(volume)
            .iter()
            .filter(|&&child| graph.node(child).kind == NodeKind::Chapter)
            .map(|&chapter| self.visit_chapter(chapter))
            .collect();
        self.hierarchy_node(volume, children)
    }

    fn visit_chapter(&mut self, chapter: NodeId) -> HierarchyNode {
        let graph = self.graph;
        let children = graph
            .children(chapter)
            .iter()
            .filter(|&&child| {
                matches!(
                    graph.node(child).kind,
                    NodeKind::Tutorial | NodeKind::TutorialArticle
                )
            })
            .map(|&tutorial| self.visit_tutorial(tutorial))
            .collect();
        self.hierarchy_node(chapter, children)
    }

    fn visit_tutorial(&mut self, tutorial: NodeId) -> HierarchyNode {
        let graph = self.graph;
        let node = graph.node(tutorial);
        let mut landmarks: Vec<HierarchyNode> = node
            .landmarks
            .iter()
            .map(|landmark| self.visit_tutorial_section(tutorial, &landmark.title, &landmark.fragment))
            .collect();

        if node.has_assessments {
            let fragment = url_readable_fragment(ASSESSMENTS_TITLE);
            let reference = node.reference.with_fragment(fragment.as_str());
            self.link_references.insert(reference.url(), reference);
            landmarks.push(self.visit_tutorial_section(tutorial, ASSESSMENTS_TITLE, &fragment));
        }
        self.hierarchy_node(tutorial, landmarks)
    }

    fn visit_tutorial_section(&mut self, tutorial: NodeId, title: &str, fragment: &str) -> HierarchyNode {
        let reference = self.graph.node(tutorial).reference.with_fragment(fragment);
        self.collected_topic_references.insert(reference.clone());
        HierarchyNode {
            reference,
            kind: NodeKind::Landmark,
            title: title.to_string(),
            children: Vec::new(),
        }
    }

    fn hierarchy_node(&mut self, id: NodeId, children: Vec<HierarchyNode>) -> HierarchyNode {
        let graph = self.graph;
        let node = graph.node(id);
        self.collected_topic_references.insert(node.reference.clone());
        HierarchyNode {
            reference: node.reference.clone(),
            kind: node.kind,
            title: node.title.clone(),
            children,
        }
    }
}
