//! Implements a directed graph.
//!
//! Vertices are keyed by their index. Edges live in an arena and are
//! addressed by their `EdgeId`, so parallel edges between the same pair of
//! vertices are permitted, and predecessor/successor lists keep the order in
//! which edges were inserted.
//!
//! The `FlowGraph` trait is the set of capabilities the fixed point iterator
//! needs from a graph. `Reversed` flips any `FlowGraph` so forward iterators
//! can run backward analyses.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::Error;

/// The index of an `Edge` in a `Graph`.
pub type EdgeId = usize;

pub trait Vertex: Clone {
    // The index of this vertex.
    fn index(&self) -> usize;
    // A string to display in dot graphviz format.
    fn dot_label(&self) -> String;
    // Fill color in dot graphviz format.
    fn dot_fill_color(&self) -> String {
        "#ffddcc".to_string()
    }
}

pub trait Edge: Clone {
    /// The index of the head vertex.
    fn head(&self) -> usize;
    /// The index of the tail vertex.
    fn tail(&self) -> usize;
    /// A string to display in dot graphviz format.
    fn dot_label(&self) -> String;
}

/// The capabilities a fixed point iterator requires of a graph.
pub trait FlowGraph {
    type NodeId: Copy + Debug + Eq + Hash + Ord;
    type EdgeId: Copy + Debug + Eq;

    /// The node where analysis begins, if one has been set.
    fn entry(&self) -> Option<Self::NodeId>;
    /// The node where analysis ends, if one has been set.
    fn exit(&self) -> Option<Self::NodeId>;
    /// Edges entering `node`, in insertion order.
    fn predecessors(&self, node: Self::NodeId) -> Result<Vec<Self::EdgeId>, Error>;
    /// Edges leaving `node`, in insertion order.
    fn successors(&self, node: Self::NodeId) -> Result<Vec<Self::EdgeId>, Error>;
    fn source(&self, edge: Self::EdgeId) -> Result<Self::NodeId, Error>;
    fn target(&self, edge: Self::EdgeId) -> Result<Self::NodeId, Error>;
}

/// A `FlowGraph` with every edge turned around.
///
/// The entry of a reversed graph is the exit of the original graph, and
/// vice-versa.
#[derive(Clone, Copy, Debug)]
pub struct Reversed<'g, G: FlowGraph> {
    graph: &'g G,
}

impl<'g, G: FlowGraph> Reversed<'g, G> {
    pub fn new(graph: &'g G) -> Reversed<'g, G> {
        Reversed { graph }
    }

    /// The graph this graph reverses.
    pub fn inner(&self) -> &'g G {
        self.graph
    }
}

impl<G: FlowGraph> FlowGraph for Reversed<'_, G> {
    type NodeId = G::NodeId;
    type EdgeId = G::EdgeId;

    fn entry(&self) -> Option<G::NodeId> {
        self.graph.exit()
    }
    fn exit(&self) -> Option<G::NodeId> {
        self.graph.entry()
    }
    fn predecessors(&self, node: G::NodeId) -> Result<Vec<G::EdgeId>, Error> {
        self.graph.successors(node)
    }
    fn successors(&self, node: G::NodeId) -> Result<Vec<G::EdgeId>, Error> {
        self.graph.predecessors(node)
    }
    fn source(&self, edge: G::EdgeId) -> Result<G::NodeId, Error> {
        self.graph.target(edge)
    }
    fn target(&self, edge: G::EdgeId) -> Result<G::NodeId, Error> {
        self.graph.source(edge)
    }
}

/// Computes the reverse post order of every node reachable from the entry of
/// a `FlowGraph`.
///
/// Returns an empty order when the graph has no entry.
pub fn reverse_post_order<G: FlowGraph>(graph: &G) -> Result<Vec<G::NodeId>, Error> {
    let entry = match graph.entry() {
        Some(entry) => entry,
        None => return Ok(Vec::new()),
    };

    let mut visited: FxHashSet<G::NodeId> = FxHashSet::default();
    let mut order: Vec<G::NodeId> = Vec::new();
    // Each frame is a node, and the successor edges we have yet to walk.
    let mut stack: Vec<(G::NodeId, std::vec::IntoIter<G::EdgeId>)> = Vec::new();

    visited.insert(entry);
    stack.push((entry, graph.successors(entry)?.into_iter()));

    while let Some((node, mut edges)) = stack.pop() {
        match edges.next() {
            Some(edge) => {
                let target = graph.target(edge)?;
                stack.push((node, edges));
                if visited.insert(target) {
                    stack.push((target, graph.successors(target)?.into_iter()));
                }
            }
            None => order.push(node),
        }
    }

    order.reverse();
    Ok(order)
}

/// A directed graph.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Graph<V: Vertex, E: Edge> {
    vertices: BTreeMap<usize, V>,
    edges: Vec<E>,
    successors: BTreeMap<usize, Vec<EdgeId>>,
    predecessors: BTreeMap<usize, Vec<EdgeId>>,
}

impl<V: Vertex, E: Edge> Default for Graph<V, E> {
    fn default() -> Graph<V, E> {
        Graph::new()
    }
}

impl<V, E> Graph<V, E>
where
    V: Vertex,
    E: Edge,
{
    pub fn new() -> Graph<V, E> {
        Graph {
            vertices: BTreeMap::new(),
            edges: Vec::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if the vertex with the given index exists in this graph
    pub fn has_vertex(&self, index: usize) -> bool {
        self.vertices.contains_key(&index)
    }

    /// Inserts a vertex into the graph.
    /// # Errors
    /// Error if the vertex already exists by index.
    pub fn insert_vertex(&mut self, v: V) -> Result<(), Error> {
        if self.vertices.contains_key(&v.index()) {
            return Err(Error::GraphDuplicateVertex(v.index()));
        }
        self.successors.insert(v.index(), Vec::new());
        self.predecessors.insert(v.index(), Vec::new());
        self.vertices.insert(v.index(), v);
        Ok(())
    }

    /// Inserts an edge into the graph, and returns its `EdgeId`.
    /// # Errors
    /// Error if either the head or tail vertex does not exist.
    pub fn insert_edge(&mut self, edge: E) -> Result<EdgeId, Error> {
        if !self.vertices.contains_key(&edge.head()) {
            return Err(Error::GraphVertexNotFound(edge.head()));
        }
        if !self.vertices.contains_key(&edge.tail()) {
            return Err(Error::GraphVertexNotFound(edge.tail()));
        }

        let id = self.edges.len();
        self.successors
            .get_mut(&edge.head())
            .ok_or(Error::GraphVertexNotFound(edge.head()))?
            .push(id);
        self.predecessors
            .get_mut(&edge.tail())
            .ok_or(Error::GraphVertexNotFound(edge.tail()))?
            .push(id);
        self.edges.push(edge);

        Ok(id)
    }

    /// Fetches a vertex by index.
    pub fn vertex(&self, index: usize) -> Result<&V, Error> {
        self.vertices
            .get(&index)
            .ok_or(Error::GraphVertexNotFound(index))
    }

    /// Fetches a mutable reference to a vertex by index.
    pub fn vertex_mut(&mut self, index: usize) -> Result<&mut V, Error> {
        self.vertices
            .get_mut(&index)
            .ok_or(Error::GraphVertexNotFound(index))
    }

    /// Every vertex in this graph, ordered by index.
    pub fn vertices(&self) -> Vec<&V> {
        self.vertices.values().collect()
    }

    /// Fetches an edge by id.
    pub fn edge(&self, id: EdgeId) -> Result<&E, Error> {
        self.edges.get(id).ok_or(Error::GraphEdgeNotFound(id))
    }

    /// Every edge in this graph, ordered by `EdgeId`.
    pub fn edges(&self) -> &[E] {
        &self.edges
    }

    /// The ids of every edge leaving a vertex.
    pub fn edges_out(&self, index: usize) -> Result<&[EdgeId], Error> {
        self.successors
            .get(&index)
            .map(|edges| edges.as_slice())
            .ok_or(Error::GraphVertexNotFound(index))
    }

    /// The ids of every edge entering a vertex.
    pub fn edges_in(&self, index: usize) -> Result<&[EdgeId], Error> {
        self.predecessors
            .get(&index)
            .map(|edges| edges.as_slice())
            .ok_or(Error::GraphVertexNotFound(index))
    }

    /// Returns the indices of all immediate successors of a vertex, without
    /// duplicates, in edge order.
    pub fn successor_indices(&self, index: usize) -> Result<Vec<usize>, Error> {
        let mut seen = FxHashSet::default();
        Ok(self
            .edges_out(index)?
            .iter()
            .map(|&id| self.edges[id].tail())
            .filter(|tail| seen.insert(*tail))
            .collect())
    }

    /// Returns the indices of all immediate predecessors of a vertex, without
    /// duplicates, in edge order.
    pub fn predecessor_indices(&self, index: usize) -> Result<Vec<usize>, Error> {
        let mut seen = FxHashSet::default();
        Ok(self
            .edges_in(index)?
            .iter()
            .map(|&id| self.edges[id].head())
            .filter(|head| seen.insert(*head))
            .collect())
    }

    /// Computes the set of vertices reachable from the given index.
    pub fn reachable_vertices(&self, index: usize) -> Result<FxHashSet<usize>, Error> {
        if !self.has_vertex(index) {
            return Err(Error::GraphVertexNotFound(index));
        }

        let mut reachable_vertices: FxHashSet<usize> = FxHashSet::default();
        let mut queue: Vec<usize> = vec![index];

        reachable_vertices.insert(index);

        while let Some(vertex) = queue.pop() {
            for successor in self.successor_indices(vertex)? {
                if reachable_vertices.insert(successor) {
                    queue.push(successor)
                }
            }
        }

        Ok(reachable_vertices)
    }

    /// Computes the set of vertices unreachable from the given index.
    pub fn unreachable_vertices(&self, index: usize) -> Result<FxHashSet<usize>, Error> {
        let reachable_vertices = self.reachable_vertices(index)?;
        Ok(self
            .vertices
            .keys()
            .filter(|index| !reachable_vertices.contains(index))
            .cloned()
            .collect())
    }

    /// Compute the pre order of all vertices reachable from root
    pub fn compute_pre_order(&self, root: usize) -> Result<Vec<usize>, Error> {
        if !self.has_vertex(root) {
            return Err(Error::GraphVertexNotFound(root));
        }

        let mut visited: FxHashSet<usize> = FxHashSet::default();
        let mut stack: Vec<usize> = vec![root];
        let mut order: Vec<usize> = Vec::new();

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            order.push(node);
            // Push in reverse so the first successor is walked first.
            for successor in self.successor_indices(node)?.into_iter().rev() {
                if !visited.contains(&successor) {
                    stack.push(successor);
                }
            }
        }

        Ok(order)
    }

    /// Compute the post order of all vertices reachable from root
    pub fn compute_post_order(&self, root: usize) -> Result<Vec<usize>, Error> {
        if !self.has_vertex(root) {
            return Err(Error::GraphVertexNotFound(root));
        }

        let mut visited: FxHashSet<usize> = FxHashSet::default();
        let mut order: Vec<usize> = Vec::new();
        // Each frame is a vertex, and the successors we have yet to walk.
        let mut stack: Vec<(usize, std::vec::IntoIter<usize>)> = Vec::new();

        visited.insert(root);
        stack.push((root, self.successor_indices(root)?.into_iter()));

        while let Some((node, mut successors)) = stack.pop() {
            match successors.next() {
                Some(successor) => {
                    stack.push((node, successors));
                    if visited.insert(successor) {
                        stack.push((successor, self.successor_indices(successor)?.into_iter()));
                    }
                }
                None => order.push(node),
            }
        }

        Ok(order)
    }

    /// Compute the reverse post order of all vertices reachable from root
    pub fn compute_reverse_post_order(&self, root: usize) -> Result<Vec<usize>, Error> {
        let mut order = self.compute_post_order(root)?;
        order.reverse();
        Ok(order)
    }

    /// Returns a string in the graphviz format
    pub fn dot_graph(&self) -> String {
        let vertices = self
            .vertices
            .values()
            .map(|v| {
                let label = v.dot_label().replace('\n', "\\l");
                format!(
                    "{} [shape=\"box\", label=\"{}\", style=\"filled\", fillcolor=\"{}\"];",
                    v.index(),
                    label,
                    v.dot_fill_color(),
                )
            })
            .collect::<Vec<String>>();

        let edges = self
            .edges
            .iter()
            .map(|e| {
                let label = e.dot_label().replace('\n', "\\l");
                format!("{} -> {} [label=\"{}\"];", e.head(), e.tail(), label)
            })
            .collect::<Vec<String>>();

        let options = [
            "graph [fontname = \"Courier New\", splines=\"polyline\"]",
            "node [fontname = \"Courier New\"]",
            "edge [fontname = \"Courier New\"]",
        ];

        format!(
            "digraph G {{\n{}\n\n{}\n{}\n}}",
            options.join("\n"),
            vertices.join("\n"),
            edges.join("\n")
        )
    }
}
