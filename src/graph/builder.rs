//! Graph builder
//!
//! Turns the module list into a [`DependencyGraph`]:
//!
//! ```text
//! Phase 1: one node per module (duplicate paths merge)
//! Phase 2: resolve import targets against the module index
//!          (relative path, absolute path, or absolute-under-root)
//!          unresolved targets are dropped
//! Phase 3: Tarjan SCC over a petgraph DiGraph built in sorted order,
//!          keeping components with >1 member
//! ```

use super::DependencyGraph;
use crate::source::{normalize_path, SourceModule};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::debug;

/// Builds the dependency graph for one analysis run
pub struct GraphBuilder<'a> {
    root: &'a Path,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Build a graph from `modules` whose paths are relative to `root`
    pub fn build(modules: &[SourceModule], root: &Path) -> DependencyGraph {
        GraphBuilder::new(root).build_graph(modules)
    }

    pub fn build_graph(&self, modules: &[SourceModule]) -> DependencyGraph {
        let mut graph = DependencyGraph::default();
        let mut index: FxHashMap<String, String> = FxHashMap::default();

        for module in modules {
            let path = normalize_path(&module.path);
            graph.add_node(&path);
            index.insert(path.clone(), path.clone());
            if !module.absolute_path.as_os_str().is_empty() {
                let abs = normalize_path(&module.absolute_path.to_string_lossy());
                index.entry(abs).or_insert_with(|| path.clone());
            }
        }

        let mut unresolved = 0usize;
        for module in modules {
            let from = normalize_path(&module.path);
            for target in &module.imports {
                match self.resolve(target, &index) {
                    Some(to) => graph.add_edge(&from, to),
                    None => unresolved += 1,
                }
            }
        }

        let groups = find_cyclic_groups(&graph);

        debug!(
            "Built dependency graph: {} modules, {} edges, {} cyclic groups, {} unresolved imports",
            graph.node_count(),
            graph.edge_count(),
            groups.len(),
            unresolved
        );

        graph.set_cyclic_groups(groups);
        graph
    }

    fn resolve<'i>(&self, target: &str, index: &'i FxHashMap<String, String>) -> Option<&'i str> {
        let normalized = normalize_path(target);
        if let Some(path) = index.get(&normalized) {
            return Some(path.as_str());
        }

        // Absolute target under the project root
        let target_path = Path::new(target);
        if target_path.is_absolute() {
            if let Ok(relative) = target_path.strip_prefix(self.root) {
                let relative = normalize_path(&relative.to_string_lossy());
                return index.get(&relative).map(String::as_str);
            }
        }

        None
    }
}

/// Strongly connected components with two or more members.
///
/// Nodes and edges go into the petgraph in sorted path order, so the
/// component order returned by Tarjan is the same on every run.
fn find_cyclic_groups(graph: &DependencyGraph) -> Vec<BTreeSet<String>> {
    let mut digraph: DiGraph<&str, ()> =
        DiGraph::with_capacity(graph.node_count(), graph.edge_count());
    let mut indices: HashMap<&str, NodeIndex> = HashMap::with_capacity(graph.node_count());

    for path in graph.paths() {
        indices.insert(path, digraph.add_node(path));
    }

    for (from, to) in graph.edges() {
        if let (Some(&src), Some(&dst)) = (indices.get(from), indices.get(to)) {
            digraph.add_edge(src, dst, ());
        }
    }

    tarjan_scc(&digraph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| scc.into_iter().map(|idx| digraph[idx].to_string()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(path: &str, imports: &[&str]) -> SourceModule {
        SourceModule::new(path, "").with_imports(imports.iter().copied())
    }

    #[test]
    fn test_simple_cycle() {
        let modules = vec![
            module("a.ts", &["b.ts"]),
            module("b.ts", &["c.ts"]),
            module("c.ts", &["a.ts"]),
            module("d.ts", &["a.ts"]),
        ];
        let graph = GraphBuilder::build(&modules, Path::new("/repo"));

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.cyclic_groups().len(), 1);

        let group = &graph.cyclic_groups()[0];
        let expected: BTreeSet<String> = ["a.ts", "b.ts", "c.ts"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(group, &expected);
        assert!(graph.group_of("d.ts").is_none());
    }

    #[test]
    fn test_no_cycles() {
        let modules = vec![
            module("a.ts", &["b.ts"]),
            module("b.ts", &["c.ts"]),
            module("c.ts", &[]),
        ];
        let graph = GraphBuilder::build(&modules, Path::new("/repo"));
        assert!(graph.cyclic_groups().is_empty());
    }

    #[test]
    fn test_unresolved_imports_are_ignored() {
        let modules = vec![
            module("a.ts", &["react", "../outside/x.ts", "b.ts"]),
            module("b.ts", &[]),
        ];
        let graph = GraphBuilder::build(&modules, Path::new("/repo"));

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependencies("a.ts").collect::<Vec<_>>(), vec!["b.ts"]);
    }

    #[test]
    fn test_self_import_is_not_a_group() {
        let modules = vec![module("a.ts", &["a.ts"])];
        let graph = GraphBuilder::build(&modules, Path::new("/repo"));

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.cyclic_groups().is_empty());
    }

    #[test]
    fn test_absolute_and_dotted_targets_resolve() {
        let modules = vec![
            module("src/a.ts", &["/repo/src/b.ts", "./src/c.ts"]),
            module("src/b.ts", &[]),
            module("src/c.ts", &[]),
        ];
        let graph = GraphBuilder::build(&modules, Path::new("/repo"));

        assert_eq!(
            graph.dependencies("src/a.ts").collect::<Vec<_>>(),
            vec!["src/b.ts", "src/c.ts"]
        );
    }

    #[test]
    fn test_two_groups_deterministic() {
        let modules = vec![
            module("x/1.ts", &["x/2.ts"]),
            module("x/2.ts", &["x/1.ts"]),
            module("y/1.ts", &["y/2.ts"]),
            module("y/2.ts", &["y/1.ts", "x/1.ts"]),
        ];
        let first = GraphBuilder::build(&modules, Path::new("/repo"));
        let second = GraphBuilder::build(&modules, Path::new("/repo"));

        assert_eq!(first.cyclic_groups().len(), 2);
        assert_eq!(first.cyclic_groups(), second.cyclic_groups());
        for group in first.cyclic_groups() {
            for member in group {
                assert!(first.contains(member));
            }
        }
    }

    #[test]
    fn test_empty_input() {
        let graph = GraphBuilder::build(&[], Path::new("/repo"));
        assert!(graph.is_empty());
        assert!(graph.cyclic_groups().is_empty());
    }
}
