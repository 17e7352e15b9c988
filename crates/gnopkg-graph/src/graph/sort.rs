//! Topological sort with cycle detection over any node shape.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::package::{FileKind, Package};

/// A node that knows its own id and the ids it depends on.
pub trait DependencyNode {
    type Id: Clone + Eq + Hash + fmt::Display;

    fn id(&self) -> Self::Id;

    fn dependency_ids(&self) -> Vec<Self::Id>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortError<Id> {
    /// Ids along the cycle; the first id is repeated at the end.
    Cycle(Vec<Id>),
    Missing { missing: Id, importer: Id },
}

impl<Id: fmt::Display> fmt::Display for SortError<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::Cycle(path) => write!(f, "cycle detected: {}", format_cycle(path)),
            SortError::Missing { missing, importer } => {
                write!(f, "missing dependency '{missing}' for '{importer}'")
            }
        }
    }
}

impl<Id: fmt::Debug + fmt::Display> std::error::Error for SortError<Id> {}

/// Render `[a, b, a]` as `a -> b -> a`.
pub fn format_cycle<Id: fmt::Display>(path: &[Id]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

struct Sorter<'a, 'f, N: DependencyNode> {
    index: FxHashMap<N::Id, &'a N>,
    exempt: &'f dyn Fn(&N::Id) -> bool,
    marks: FxHashMap<N::Id, Mark>,
    stack: Vec<N::Id>,
    order: Vec<&'a N>,
}

impl<'a, N: DependencyNode> Sorter<'a, '_, N> {
    fn visit(&mut self, id: &N::Id, importer: Option<&N::Id>) -> Result<(), SortError<N::Id>> {
        match self.marks.get(id).copied().unwrap_or(Mark::Unvisited) {
            Mark::Done => return Ok(()),
            Mark::OnStack => {
                let start = self.stack.iter().position(|s| s == id).unwrap_or(0);
                let mut cycle = self.stack[start..].to_vec();
                cycle.push(id.clone());
                return Err(SortError::Cycle(cycle));
            }
            Mark::Unvisited => {}
        }

        let Some(node) = self.index.get(id).copied() else {
            return Err(SortError::Missing {
                missing: id.clone(),
                importer: importer.unwrap_or(id).clone(),
            });
        };

        self.marks.insert(id.clone(), Mark::OnStack);
        self.stack.push(id.clone());
        for dep in node.dependency_ids() {
            if (self.exempt)(&dep) {
                continue;
            }
            self.visit(&dep, Some(id))?;
        }
        self.stack.pop();
        self.marks.insert(id.clone(), Mark::Done);
        self.order.push(node);
        Ok(())
    }
}

/// Sort every node so that dependencies come before their dependents.
///
/// Nodes are visited in slice order and emitted in depth-first finishing
/// order. Dependencies for which `exempt` returns true are not followed and
/// never reported missing.
pub fn topological_sort<'a, N, F>(nodes: &'a [N], exempt: F) -> Result<Vec<&'a N>, SortError<N::Id>>
where
    N: DependencyNode,
    F: Fn(&N::Id) -> bool,
{
    let starts: Vec<N::Id> = nodes.iter().map(DependencyNode::id).collect();
    topological_sort_from(nodes, &starts, exempt)
}

/// Like [`topological_sort`], but only emits nodes reachable from `starts`.
pub fn topological_sort_from<'a, N, F>(
    nodes: &'a [N],
    starts: &[N::Id],
    exempt: F,
) -> Result<Vec<&'a N>, SortError<N::Id>>
where
    N: DependencyNode,
    F: Fn(&N::Id) -> bool,
{
    let mut sorter = Sorter {
        index: nodes.iter().map(|n| (n.id(), n)).collect(),
        exempt: &exempt,
        marks: FxHashMap::default(),
        stack: Vec::new(),
        order: Vec::with_capacity(nodes.len()),
    };
    for id in starts {
        sorter.visit(id, None)?;
    }
    Ok(sorter.order)
}

impl DependencyNode for Arc<Package> {
    type Id = String;

    fn id(&self) -> String {
        self.import_path.clone()
    }

    fn dependency_ids(&self) -> Vec<String> {
        self.imports_of(FileKind::PackageSource).to_vec()
    }
}

/// Sort a flat package list by its source imports.
pub fn sort_packages<F>(packages: &[Arc<Package>], exempt: F) -> Result<Vec<Arc<Package>>, SortError<String>>
where
    F: Fn(&String) -> bool,
{
    Ok(topological_sort(packages, exempt)?
        .into_iter()
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Node(&'static str, Vec<&'static str>);

    impl DependencyNode for Node {
        type Id = &'static str;

        fn id(&self) -> &'static str {
            self.0
        }

        fn dependency_ids(&self) -> Vec<&'static str> {
            self.1.clone()
        }
    }

    fn ids(sorted: &[&Node]) -> Vec<&'static str> {
        sorted.iter().map(|n| n.0).collect()
    }

    #[test]
    fn dependencies_come_first() {
        let nodes = vec![
            Node("c", vec!["b"]),
            Node("b", vec!["a"]),
            Node("a", vec![]),
        ];
        let sorted = topological_sort(&nodes, |_| false).unwrap();
        assert_eq!(ids(&sorted), vec!["a", "b", "c"]);
    }

    #[test]
    fn diamond_emits_each_node_once() {
        let nodes = vec![
            Node("top", vec!["left", "right"]),
            Node("left", vec!["base"]),
            Node("right", vec!["base"]),
            Node("base", vec![]),
        ];
        let sorted = topological_sort(&nodes, |_| false).unwrap();
        assert_eq!(ids(&sorted), vec!["base", "left", "right", "top"]);
    }

    #[test]
    fn cycle_names_full_path() {
        let nodes = vec![
            Node("a", vec!["b"]),
            Node("b", vec!["c"]),
            Node("c", vec!["a"]),
        ];
        let err = topological_sort(&nodes, |_| false).unwrap_err();
        assert_eq!(err, SortError::Cycle(vec!["a", "b", "c", "a"]));
        assert_eq!(err.to_string(), "cycle detected: a -> b -> c -> a");
    }

    #[test]
    fn cycle_path_starts_at_reentry() {
        let nodes = vec![
            Node("root", vec!["x"]),
            Node("x", vec!["y"]),
            Node("y", vec!["x"]),
        ];
        let err = topological_sort(&nodes, |_| false).unwrap_err();
        assert_eq!(err, SortError::Cycle(vec!["x", "y", "x"]));
    }

    #[test]
    fn self_import_is_a_cycle() {
        let nodes = vec![Node("a", vec!["a"])];
        let err = topological_sort(&nodes, |_| false).unwrap_err();
        assert_eq!(err, SortError::Cycle(vec!["a", "a"]));
    }

    #[test]
    fn missing_dependency_names_both() {
        let nodes = vec![Node("a", vec!["ghost"])];
        let err = topological_sort(&nodes, |_| false).unwrap_err();
        assert_eq!(
            err,
            SortError::Missing {
                missing: "ghost",
                importer: "a"
            }
        );
    }

    #[test]
    fn exempt_ids_are_not_followed() {
        let nodes = vec![Node("a", vec!["std", "testing"])];
        let sorted = topological_sort(&nodes, |id| matches!(*id, "std" | "testing")).unwrap();
        assert_eq!(ids(&sorted), vec!["a"]);
    }

    #[test]
    fn sort_from_only_emits_reachable() {
        let nodes = vec![
            Node("a", vec![]),
            Node("b", vec!["a"]),
            Node("unrelated", vec![]),
        ];
        let sorted = topological_sort_from(&nodes, &["b"], |_| false).unwrap();
        assert_eq!(ids(&sorted), vec!["a", "b"]);
    }
}
