use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Summary of dependency graph structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for dependency ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphReport {
    pub summary: GraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Arena of named nodes with parent and child adjacency lists.
///
/// Node indices follow insertion order and are never reused; nodes and
/// edges are only ever added.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    parents: Vec<Vec<usize>>,
    children: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index of `name`, inserting it first when unknown.
    pub fn ensure_node(&mut self, name: &str) -> usize {
        if let Some(idx) = self.index.get(name) {
            return *idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        self.parents.push(Vec::new());
        self.children.push(Vec::new());
        idx
    }

    /// Add `parent -> child`; returns false when the edge already existed.
    pub fn add_edge(&mut self, parent: usize, child: usize) -> bool {
        if self.parents[child].contains(&parent) {
            return false;
        }
        self.parents[child].push(parent);
        self.children[parent].push(child);
        true
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn parents_of(&self, idx: usize) -> &[usize] {
        &self.parents[idx]
    }

    pub fn children_of(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.parents.iter().map(|parents| parents.len()).sum()
    }

    /// Kahn's algorithm; ready nodes are taken in insertion order.
    ///
    /// On failure returns the nodes that lie on a cycle, in insertion order.
    /// Nodes that are only blocked because they sit downstream of a cycle
    /// are left out.
    pub fn toposort(&self) -> Result<Vec<usize>, Vec<usize>> {
        let mut indegree: Vec<usize> = self.parents.iter().map(|parents| parents.len()).collect();

        let mut ready: BTreeSet<usize> = indegree
            .iter()
            .enumerate()
            .filter_map(|(idx, count)| if *count == 0 { Some(idx) } else { None })
            .collect();

        let mut order = Vec::with_capacity(self.len());

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for child in &self.children[node] {
                let count = &mut indegree[*child];
                *count = count.saturating_sub(1);
                if *count == 0 {
                    ready.insert(*child);
                }
            }
        }

        if order.len() == self.len() {
            Ok(order)
        } else {
            let blocked: Vec<bool> = indegree.iter().map(|count| *count > 0).collect();
            Err((0..self.len())
                .filter(|idx| blocked[*idx] && self.reaches_itself(*idx, &blocked))
                .collect())
        }
    }

    /// Depth-first search from `start` through `allowed` nodes only.
    fn reaches_itself(&self, start: usize, allowed: &[bool]) -> bool {
        let mut seen = vec![false; self.len()];
        let mut stack: Vec<usize> = self.children[start].clone();
        while let Some(node) = stack.pop() {
            if node == start {
                return true;
            }
            if !allowed[node] || seen[node] {
                continue;
            }
            seen[node] = true;
            stack.extend(&self.children[node]);
        }
        false
    }

    /// Build a deterministic ordering report for this graph.
    pub fn report(&self) -> GraphReport {
        let summary = GraphSummary {
            nodes: self.len(),
            edges: self.edge_count(),
        };
        let to_names = |nodes: Vec<usize>| -> Vec<String> {
            nodes.into_iter().map(|idx| self.names[idx].clone()).collect()
        };

        match self.toposort() {
            Ok(order) => GraphReport {
                summary,
                topo_order: Some(to_names(order)),
                cycle: None,
            },
            Err(cycle) => GraphReport {
                summary,
                topo_order: None,
                cycle: Some(to_names(cycle)),
            },
        }
    }
}
