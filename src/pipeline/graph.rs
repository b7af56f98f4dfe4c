// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Dependency graph with deterministic topological ordering
//!
//! Edges point from a node to the nodes it depends on, so a depth-first
//! post-order already lists dependencies before their dependents and needs
//! no reversal. Traversal follows the caller-supplied node order and edge
//! insertion order, which makes the output reproducible.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};
use std::hash::Hash;

/// A cycle found while ordering the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle<N> {
    /// Members in path order; the first node is repeated at the end
    pub members: Vec<N>,
}

impl<N: Display> Display for Cycle<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.members.iter().map(ToString::to_string).collect();
        write!(f, "{}", names.join(" -> "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current traversal path
    OnStack,
    /// Fully expanded and emitted
    Done,
}

struct Frame {
    node: NodeIndex,
    edges: Vec<NodeIndex>,
    cursor: usize,
}

/// Directed graph over arbitrary node keys
#[derive(Debug, Clone)]
pub struct DependencyGraph<N> {
    graph: DiGraph<N, ()>,
    index: HashMap<N, NodeIndex>,
}

impl<N> DependencyGraph<N>
where
    N: Clone + Eq + Hash,
{
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Create a graph holding `nodes`, in order
    pub fn with_nodes(nodes: impl IntoIterator<Item = N>) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node);
        }
        graph
    }

    /// Add a node if it is not present yet
    pub fn add_node(&mut self, node: N) -> NodeIndex {
        if let Some(idx) = self.index.get(&node) {
            return *idx;
        }

        let idx = self.graph.add_node(node.clone());
        self.index.insert(node, idx);
        idx
    }

    /// Record that `from` depends on `to`; duplicate edges are ignored
    pub fn add_edge(&mut self, from: N, to: N) {
        let from = self.add_node(from);
        let to = self.add_node(to);

        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Check whether a node is present
    pub fn contains(&self, node: &N) -> bool {
        self.index.contains_key(node)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Direct dependencies of a node, in insertion order
    pub fn dependencies(&self, node: &N) -> Option<Vec<N>> {
        let idx = self.index.get(node)?;
        Some(
            self.ordered_neighbors(*idx, Direction::Outgoing)
                .into_iter()
                .map(|n| self.graph[n].clone())
                .collect(),
        )
    }

    /// Direct dependents of a node, in insertion order
    pub fn dependents(&self, node: &N) -> Option<Vec<N>> {
        let idx = self.index.get(node)?;
        Some(
            self.ordered_neighbors(*idx, Direction::Incoming)
                .into_iter()
                .map(|n| self.graph[n].clone())
                .collect(),
        )
    }

    /// Check if `a` depends (directly or transitively) on `b`
    pub fn depends_on(&self, a: &N, b: &N) -> bool {
        let (Some(a), Some(b)) = (self.index.get(a), self.index.get(b)) else {
            return false;
        };

        a != b && petgraph::algo::has_path_connecting(&self.graph, *a, *b, None)
    }

    /// Topological order seeded with every node in insertion order
    pub fn topological_order(&self) -> Result<Vec<N>, Cycle<N>> {
        let seeds: Vec<N> = self.nodes().cloned().collect();
        self.topological_order_from(&seeds)
    }

    /// Topological order seeded with `seeds`, in the given order
    ///
    /// The result holds every seed and everything reachable from the seeds
    /// exactly once, with each node placed after all of its dependencies.
    /// Seeds unknown to the graph are treated as isolated nodes.
    pub fn topological_order_from(&self, seeds: &[N]) -> Result<Vec<N>, Cycle<N>> {
        let mut marks: HashMap<NodeIndex, Mark> = HashMap::new();
        let mut isolated: HashSet<&N> = HashSet::new();
        let mut order = Vec::with_capacity(self.graph.node_count());

        for seed in seeds {
            let Some(&start) = self.index.get(seed) else {
                if isolated.insert(seed) {
                    order.push(seed.clone());
                }
                continue;
            };

            if marks.contains_key(&start) {
                continue;
            }

            let mut stack = vec![self.frame(start)];
            marks.insert(start, Mark::OnStack);

            while let Some(frame) = stack.last_mut() {
                let Some(&next) = frame.edges.get(frame.cursor) else {
                    let node = frame.node;
                    stack.pop();
                    marks.insert(node, Mark::Done);
                    order.push(self.graph[node].clone());
                    continue;
                };
                frame.cursor += 1;

                match marks.get(&next) {
                    None => {
                        marks.insert(next, Mark::OnStack);
                        stack.push(self.frame(next));
                    }
                    Some(Mark::OnStack) => return Err(self.cycle_through(&stack, next)),
                    Some(Mark::Done) => {}
                }
            }
        }

        Ok(order)
    }

    /// Render as Mermaid, edges drawn from dependency to dependent
    pub fn to_mermaid(&self) -> String
    where
        N: Display,
    {
        let mut out = String::from("graph TD\n");

        for node in self.nodes() {
            out.push_str(&format!("    {}[{}]\n", node, node));
        }

        for (from, to) in self.edge_pairs() {
            out.push_str(&format!("    {} --> {}\n", to, from));
        }

        out
    }

    /// Render as DOT, edges drawn from dependency to dependent
    pub fn to_dot(&self) -> String
    where
        N: Display,
    {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for (from, to) in self.edge_pairs() {
            out.push_str(&format!("    \"{}\" -> \"{}\";\n", to, from));
        }

        // Add isolated nodes (no edges)
        for idx in self.graph.node_indices() {
            if self.graph.neighbors_undirected(idx).next().is_none() {
                out.push_str(&format!("    \"{}\";\n", self.graph[idx]));
            }
        }

        out.push_str("}\n");
        out
    }

    fn frame(&self, node: NodeIndex) -> Frame {
        Frame {
            node,
            edges: self.ordered_neighbors(node, Direction::Outgoing),
            cursor: 0,
        }
    }

    // petgraph lists neighbors most recent edge first
    fn ordered_neighbors(&self, node: NodeIndex, dir: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors_directed(node, dir).collect();
        neighbors.reverse();
        neighbors
    }

    fn cycle_through(&self, stack: &[Frame], entry: NodeIndex) -> Cycle<N> {
        let start = stack
            .iter()
            .position(|frame| frame.node == entry)
            .unwrap_or(0);

        let mut members: Vec<N> = stack[start..]
            .iter()
            .map(|frame| self.graph[frame.node].clone())
            .collect();
        members.push(self.graph[entry].clone());

        Cycle { members }
    }

    fn edge_pairs(&self) -> Vec<(&N, &N)> {
        self.graph
            .node_indices()
            .flat_map(|from| {
                self.ordered_neighbors(from, Direction::Outgoing)
                    .into_iter()
                    .map(move |to| (&self.graph[from], &self.graph[to]))
            })
            .collect()
    }
}

impl<N> Default for DependencyGraph<N>
where
    N: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
