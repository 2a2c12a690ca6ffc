//! Symbol path index.
//!
//! Built once from the loaded symbol graphs before any rendering starts and
//! read-only afterwards. Children of every module and symbol are grouped by
//! name; each group is disambiguated with a fresh [`DisambiguationContainer`]
//! whenever a link is resolved or a URL is computed.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::link::absolute::AbsoluteSymbolLink;
use crate::link::completion::{self, ParsedDisambiguation};
use crate::link::disambiguation::{
    ContainerOptions, Disambiguation, DisambiguationContainer, SymbolMetadata,
};
use crate::symbol_graph::SymbolGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

/// Where a group of same-named children lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Scope {
    Module(String),
    Symbol(SymbolId),
}

#[derive(Debug, Clone)]
pub struct IndexedSymbol {
    pub precise_identifier: String,
    pub module: String,
    /// The path component name, e.g. `bar(_:)`.
    pub name: String,
    pub title: String,
    pub kind: String,
    pub language: String,
    pub parent: Option<SymbolId>,
    pub metadata: SymbolMetadata,
    pub doc_comment: Option<String>,
}

#[derive(Debug, Default)]
pub struct SymbolIndex {
    symbols: Vec<IndexedSymbol>,
    by_precise: HashMap<String, SymbolId>,
    children: HashMap<Scope, BTreeMap<String, Vec<SymbolId>>>,
    modules: BTreeSet<String>,
    url_paths: Vec<String>,
    options: ContainerOptions,
}

impl SymbolIndex {
    pub fn build(graphs: &[SymbolGraph], options: ContainerOptions) -> Self {
        let mut index = Self {
            options,
            ..Self::default()
        };

        let mut by_path: HashMap<(String, Vec<String>), SymbolId> = HashMap::new();
        for graph in graphs {
            let module = graph.module.name.clone();
            index.modules.insert(module.clone());
            for symbol in &graph.symbols {
                if index.by_precise.contains_key(&symbol.identifier.precise) {
                    continue;
                }
                let id = SymbolId(index.symbols.len());
                let name = symbol
                    .path_components
                    .last()
                    .cloned()
                    .unwrap_or_else(|| symbol.names.title.clone());
                let metadata = SymbolMetadata::from_precise_identifier(
                    symbol.kind.identifier.clone(),
                    &symbol.identifier.precise,
                )
                .with_signature(symbol.parameter_types(), symbol.return_types());

                index.symbols.push(IndexedSymbol {
                    precise_identifier: symbol.identifier.precise.clone(),
                    module: module.clone(),
                    name,
                    title: symbol.names.title.clone(),
                    kind: symbol.kind.identifier.clone(),
                    language: symbol.identifier.interface_language.clone(),
                    parent: None,
                    metadata,
                    doc_comment: symbol.doc_comment_markdown(),
                });
                index.by_precise.insert(symbol.identifier.precise.clone(), id);
                by_path.insert((module.clone(), symbol.path_components.clone()), id);
            }
        }

        index.assign_parents(graphs, &by_path);

        for (position, symbol) in index.symbols.iter().enumerate() {
            let scope = match symbol.parent {
                Some(parent) => Scope::Symbol(parent),
                None => Scope::Module(symbol.module.clone()),
            };
            index
                .children
                .entry(scope)
                .or_default()
                .entry(symbol.name.clone())
                .or_default()
                .push(SymbolId(position));
        }

        index.url_paths = index.compute_url_paths();
        tracing::debug!(
            symbols = index.symbols.len(),
            modules = index.modules.len(),
            "built symbol index"
        );
        index
    }

    /// Parent from the path components first, then `memberOf` relationships.
    fn assign_parents(
        &mut self,
        graphs: &[SymbolGraph],
        by_path: &HashMap<(String, Vec<String>), SymbolId>,
    ) {
        for graph in graphs {
            let module = &graph.module.name;
            for symbol in &graph.symbols {
                let Some(&id) = self.by_precise.get(&symbol.identifier.precise) else {
                    continue;
                };
                let components = &symbol.path_components;
                if components.len() > 1 {
                    let parent_path = components[..components.len() - 1].to_vec();
                    if let Some(&parent) = by_path.get(&(module.clone(), parent_path)) {
                        self.set_parent(id, parent);
                    }
                }
            }

            for relationship in graph.relationships.iter().filter(|r| r.is_member_of()) {
                let (Some(&child), Some(&parent)) = (
                    self.by_precise.get(&relationship.source),
                    self.by_precise.get(&relationship.target),
                ) else {
                    continue;
                };
                if self.symbols[child.0].parent.is_none() {
                    self.set_parent(child, parent);
                }
            }
        }
    }

    fn set_parent(&mut self, child: SymbolId, parent: SymbolId) {
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                tracing::debug!(
                    symbol = %self.symbols[child.0].precise_identifier,
                    "ignoring membership that would form a cycle"
                );
                return;
            }
            ancestor = self.symbols[current.0].parent;
        }
        self.symbols[child.0].parent = Some(parent);
    }

    fn compute_url_paths(&self) -> Vec<String> {
        let mut suffixes = vec![String::new(); self.symbols.len()];
        for groups in self.children.values() {
            for ids in groups.values() {
                let container = self.container(ids);
                for (id, disambiguation) in container.disambiguated_values() {
                    suffixes[id.0] = disambiguation.make_suffix();
                }
            }
        }

        let mut paths: Vec<Option<String>> = vec![None; self.symbols.len()];
        for position in 0..self.symbols.len() {
            self.url_path_into(SymbolId(position), &suffixes, &mut paths);
        }
        paths.into_iter().map(Option::unwrap_or_default).collect()
    }

    fn url_path_into(&self, id: SymbolId, suffixes: &[String], paths: &mut [Option<String>]) {
        // Walk up to the first ancestor with a known path, then fill in downwards.
        let mut chain = vec![id];
        while let Some(parent) = self.symbols[chain[chain.len() - 1].0].parent {
            if paths[parent.0].is_some() {
                break;
            }
            chain.push(parent);
        }
        for current in chain.into_iter().rev() {
            if paths[current.0].is_some() {
                continue;
            }
            let symbol = &self.symbols[current.0];
            let prefix = match symbol.parent.and_then(|p| paths[p.0].clone()) {
                Some(parent_path) => parent_path,
                None => format!("/documentation/{}", symbol.module),
            };
            paths[current.0] = Some(format!(
                "{prefix}/{}{}",
                symbol.name, suffixes[current.0]
            ));
        }
    }

    fn container<'a>(&self, ids: &'a [SymbolId]) -> DisambiguationContainer<&'a SymbolId> {
        let mut container = DisambiguationContainer::new(self.options);
        for id in ids {
            container.add(id, self.symbols[id.0].metadata.clone());
        }
        container
    }

    pub fn options(&self) -> ContainerOptions {
        self.options
    }

    pub fn symbol(&self, id: SymbolId) -> &IndexedSymbol {
        &self.symbols[id.0]
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &IndexedSymbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(position, symbol)| (SymbolId(position), symbol))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(String::as_str)
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.modules.contains(name)
    }

    pub fn lookup_precise(&self, precise_identifier: &str) -> Option<SymbolId> {
        self.by_precise.get(precise_identifier).copied()
    }

    /// The symbol's page path, e.g. `/documentation/MyKit/Foo/bar(_:)-abc12`.
    pub fn url_path(&self, id: SymbolId) -> &str {
        &self.url_paths[id.0]
    }

    /// Children of a module or symbol, ordered by name.
    pub fn children_of(&self, module: &str, parent: Option<SymbolId>) -> Vec<SymbolId> {
        let scope = match parent {
            Some(parent) => Scope::Symbol(parent),
            None => Scope::Module(module.to_string()),
        };
        self.children
            .get(&scope)
            .map(|groups| groups.values().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// Resolve a link of the form `doc://bundle/documentation/Module/...`.
    ///
    /// A link that names only the module resolves to no symbol.
    pub fn resolve_absolute(&self, link: &AbsoluteSymbolLink) -> Option<SymbolId> {
        if !self.modules.contains(&link.module) || link.represents_module {
            return None;
        }
        let components: Vec<(String, Disambiguation)> = link
            .symbol_components()
            .map(|c| (c.name.clone(), Disambiguation::from(&c.disambiguation_suffix)))
            .collect();
        let resolved = self.walk(Scope::Module(link.module.clone()), &components);
        if resolved.is_none() {
            tracing::debug!(link = %link, "unresolved absolute symbol link");
        }
        resolved
    }

    /// Resolve a relative symbol path such as `Foo/bar(_:)-abc12`.
    ///
    /// The path is tried relative to `from`, then to each of its ancestors,
    /// then to its module, and finally as a module-qualified path.
    pub fn resolve_relative(&self, path: &str, from: Option<SymbolId>) -> Option<SymbolId> {
        let parsed = completion::parse(path);
        if parsed.is_empty() {
            return None;
        }
        let components: Vec<(String, Disambiguation)> = parsed
            .iter()
            .map(|(name, d)| (name.clone(), d.to_disambiguation()))
            .collect();

        let mut scopes = Vec::new();
        let mut current = from;
        while let Some(id) = current {
            scopes.push(Scope::Symbol(id));
            current = self.symbols[id.0].parent;
        }
        match from {
            Some(id) => scopes.push(Scope::Module(self.symbols[id.0].module.clone())),
            None => scopes.extend(self.modules.iter().cloned().map(Scope::Module)),
        }

        for scope in scopes {
            if let Some(found) = self.walk(scope, &components) {
                return Some(found);
            }
        }

        if let Some((module, _)) = parsed.first().filter(|(name, d)| {
            *d == ParsedDisambiguation::None && self.modules.contains(name)
        }) {
            if let Some(found) = self.walk(Scope::Module(module.clone()), &components[1..]) {
                return Some(found);
            }
        }

        tracing::debug!(path, "unresolved relative symbol link");
        None
    }

    fn walk(&self, mut scope: Scope, components: &[(String, Disambiguation)]) -> Option<SymbolId> {
        let mut found = None;
        for (name, disambiguation) in components {
            let id = self.find_in_scope(&scope, name, disambiguation)?;
            found = Some(id);
            scope = Scope::Symbol(id);
        }
        found
    }

    fn find_in_scope(
        &self,
        scope: &Scope,
        name: &str,
        disambiguation: &Disambiguation,
    ) -> Option<SymbolId> {
        let groups = self.children.get(scope)?;
        let ids = groups.get(name)?;
        if ids.len() == 1 && *disambiguation == Disambiguation::None {
            return Some(ids[0]);
        }
        self.container(ids).find(disambiguation).map(|id| **id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::hash::stable_hash_string;
    use pretty_assertions::assert_eq;

    fn graph() -> SymbolGraph {
        SymbolGraph::from_json(
            "MyKit",
            r#"{
                "module": { "name": "MyKit" },
                "symbols": [
                    { "identifier": { "precise": "s:Foo" }, "kind": { "identifier": "swift.class" },
                      "names": { "title": "Foo" }, "pathComponents": ["Foo"] },
                    { "identifier": { "precise": "s:Foo.bar" }, "kind": { "identifier": "swift.method" },
                      "names": { "title": "bar()" }, "pathComponents": ["Foo", "bar"] },
                    { "identifier": { "precise": "s:Foo.bar2" }, "kind": { "identifier": "swift.method" },
                      "names": { "title": "bar(_:)" }, "pathComponents": ["Foo", "bar"] },
                    { "identifier": { "precise": "s:Foo.baz" }, "kind": { "identifier": "swift.property" },
                      "names": { "title": "baz" }, "pathComponents": ["Foo", "baz"] },
                    { "identifier": { "precise": "s:Foo.bazM" }, "kind": { "identifier": "swift.method" },
                      "names": { "title": "baz()" }, "pathComponents": ["Foo", "baz"] },
                    { "identifier": { "precise": "s:Helper" }, "kind": { "identifier": "swift.struct" },
                      "names": { "title": "Helper" } },
                    { "identifier": { "precise": "s:Helper.run" }, "kind": { "identifier": "swift.method" },
                      "names": { "title": "run()" } }
                ],
                "relationships": [
                    { "kind": "memberOf", "source": "s:Helper.run", "target": "s:Helper" },
                    { "kind": "memberOf", "source": "s:Helper", "target": "s:Helper.run" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn url_paths_use_minimal_suffixes() {
        let index = SymbolIndex::build(&[graph()], ContainerOptions::default());
        let path = |precise: &str| index.url_path(index.lookup_precise(precise).unwrap()).to_string();

        assert_eq!(path("s:Foo"), "/documentation/MyKit/Foo");
        assert_eq!(
            path("s:Foo.bar"),
            format!("/documentation/MyKit/Foo/bar-{}", stable_hash_string("s:Foo.bar"))
        );
        assert_eq!(path("s:Foo.baz"), "/documentation/MyKit/Foo/baz-swift.property");
        assert_eq!(path("s:Foo.bazM"), "/documentation/MyKit/Foo/baz-swift.method");
    }

    #[test]
    fn member_of_fallback_and_cycle_guard() {
        let index = SymbolIndex::build(&[graph()], ContainerOptions::default());
        let run = index.lookup_precise("s:Helper.run").unwrap();
        let helper = index.lookup_precise("s:Helper").unwrap();
        assert_eq!(index.symbol(run).parent, Some(helper));
        assert_eq!(index.symbol(helper).parent, None);
        assert_eq!(index.url_path(run), "/documentation/MyKit/Helper/run()");
    }

    #[test]
    fn legacy_mode_always_adds_kind() {
        let index = SymbolIndex::build(
            &[graph()],
            ContainerOptions {
                legacy_always_add_kind: true,
            },
        );
        let baz = index.lookup_precise("s:Foo.baz").unwrap();
        assert_eq!(index.url_path(baz), "/documentation/MyKit/Foo/baz-swift.property");
    }

    #[test]
    fn resolve_absolute_links() {
        let index = SymbolIndex::build(&[graph()], ContainerOptions::default());
        let hash = stable_hash_string("s:Foo.bar2");
        let link = AbsoluteSymbolLink::parse(&format!(
            "doc://org.example.MyKit/documentation/MyKit/Foo/bar-{hash}"
        ))
        .unwrap();
        assert_eq!(index.resolve_absolute(&link), index.lookup_precise("s:Foo.bar2"));

        let ambiguous =
            AbsoluteSymbolLink::parse("doc://org.example.MyKit/documentation/MyKit/Foo/bar").unwrap();
        assert_eq!(index.resolve_absolute(&ambiguous), None);

        let module = AbsoluteSymbolLink::parse("doc://org.example.MyKit/documentation/MyKit").unwrap();
        assert_eq!(index.resolve_absolute(&module), None);
    }

    #[test]
    fn resolve_relative_walks_up_scopes() {
        let index = SymbolIndex::build(&[graph()], ContainerOptions::default());
        let foo = index.lookup_precise("s:Foo").unwrap();
        let baz_method = index.lookup_precise("s:Foo.bazM").unwrap();

        assert_eq!(
            index.resolve_relative("baz-swift.method", Some(foo)),
            Some(baz_method)
        );
        assert_eq!(index.resolve_relative("Helper", Some(baz_method)), index.lookup_precise("s:Helper"));
        assert_eq!(index.resolve_relative("MyKit/Foo", None), Some(foo));
        assert_eq!(index.resolve_relative("Foo/baz-swift.property", None), index.lookup_precise("s:Foo.baz"));
        assert_eq!(index.resolve_relative("Missing", Some(foo)), None);
    }
}
