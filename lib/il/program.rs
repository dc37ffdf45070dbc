//! A `Program` is a directed `Graph` of `Block` and `Edge`.

use crate::graph::{self, EdgeId, FlowGraph};
use crate::il::*;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A control-flow graph of `Block` and `Edge`.
///
/// # Entry and Exit
/// A `Program` has an optional, "Entry," and an optional, "Exit." Analyses
/// require an entry. The exit may be the same block as the entry, and is only
/// required when running an analysis backward.
///
/// Blocks and edges are owned by the `Program`, and addressed by index. Once
/// analysis begins the `Program` is only ever borrowed immutably.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Program {
    // The internal graph used to store our blocks.
    graph: graph::Graph<Block, Edge>,
    // The next index to use when creating a basic block.
    next_index: usize,
    // An optional entry index for the graph.
    entry: Option<usize>,
    // An optional exit index for the graph.
    exit: Option<usize>,
}

impl Program {
    pub fn new() -> Program {
        Program {
            graph: graph::Graph::new(),
            next_index: 0,
            entry: None,
            exit: None,
        }
    }

    /// Returns the underlying graph
    pub fn graph(&self) -> &graph::Graph<Block, Edge> {
        &self.graph
    }

    /// Creates a new, empty basic block, adds it to the graph, and returns it
    pub fn create_block(&mut self) -> Result<&mut Block, Error> {
        let next_index = self.next_index;
        self.next_index += 1;
        self.graph.insert_vertex(Block::new(next_index))?;
        self.graph.vertex_mut(next_index)
    }

    /// Appends a `Mnemonic` to the `Block` at the given index.
    pub fn add(&mut self, block: usize, mnemonic: Mnemonic) -> Result<(), Error> {
        self.block_mut(block)?.push(mnemonic);
        Ok(())
    }

    /// Creates an edge from one block to another block, and returns its id
    pub fn add_successor(&mut self, head: usize, tail: usize) -> Result<EdgeId, Error> {
        self.graph.insert_edge(Edge::new(head, tail))
    }

    /// Sets the entry point for this `Program` to the given `Block` index.
    pub fn set_entry(&mut self, entry: usize) -> Result<(), Error> {
        if !self.graph.has_vertex(entry) {
            return Err(Error::GraphVertexNotFound(entry));
        }
        self.entry = Some(entry);
        Ok(())
    }

    /// Sets the exit point for this `Program` to the given `Block` index.
    pub fn set_exit(&mut self, exit: usize) -> Result<(), Error> {
        if !self.graph.has_vertex(exit) {
            return Err(Error::GraphVertexNotFound(exit));
        }
        self.exit = Some(exit);
        Ok(())
    }

    /// Get the entry `Block` index for this `Program`.
    pub fn entry(&self) -> Option<usize> {
        self.entry
    }

    /// Get the exit `Block` index for this `Program`.
    pub fn exit(&self) -> Option<usize> {
        self.exit
    }

    /// Get a `Block` by index.
    pub fn block(&self, index: usize) -> Result<&Block, Error> {
        self.graph.vertex(index)
    }

    /// Get a mutable reference to a `Block` by index.
    pub fn block_mut(&mut self, index: usize) -> Result<&mut Block, Error> {
        self.graph.vertex_mut(index)
    }

    /// Get every `Block` in this `Program`.
    pub fn blocks(&self) -> Vec<&Block> {
        self.graph.vertices()
    }

    /// Get an `Edge` by id.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge, Error> {
        self.graph.edge(id)
    }

    /// Get every `Edge` in this `Program`.
    pub fn edges(&self) -> &[Edge] {
        self.graph.edges()
    }

    /// Get the ids of every edge entering a block
    pub fn edges_in(&self, index: usize) -> Result<&[EdgeId], Error> {
        self.graph.edges_in(index)
    }

    /// Get the ids of every edge leaving a block
    pub fn edges_out(&self, index: usize) -> Result<&[EdgeId], Error> {
        self.graph.edges_out(index)
    }

    /// Get the indices of every predecessor of a `Block` in this `Program`.
    pub fn predecessor_indices(&self, index: usize) -> Result<Vec<usize>, Error> {
        self.graph.predecessor_indices(index)
    }

    /// Get the indices of every successor of a `Block` in this `Program`.
    pub fn successor_indices(&self, index: usize) -> Result<Vec<usize>, Error> {
        self.graph.successor_indices(index)
    }

    /// Every distinct variable named by a mnemonic in this `Program`.
    pub fn variables(&self) -> BTreeSet<&str> {
        self.blocks()
            .into_iter()
            .flat_map(|block| block.mnemonics())
            .flat_map(|mnemonic| {
                mnemonic
                    .variables_read()
                    .into_iter()
                    .chain(mnemonic.variable_written())
            })
            .collect()
    }

    /// Returns a string in the graphviz format
    pub fn dot_graph(&self) -> String {
        self.graph.dot_graph()
    }
}

impl FlowGraph for Program {
    type NodeId = usize;
    type EdgeId = EdgeId;

    fn entry(&self) -> Option<usize> {
        self.entry
    }

    fn exit(&self) -> Option<usize> {
        self.exit
    }

    fn predecessors(&self, node: usize) -> Result<Vec<EdgeId>, Error> {
        Ok(self.edges_in(node)?.to_vec())
    }

    fn successors(&self, node: usize) -> Result<Vec<EdgeId>, Error> {
        Ok(self.edges_out(node)?.to_vec())
    }

    fn source(&self, edge: EdgeId) -> Result<usize, Error> {
        Ok(self.edge(edge)?.head())
    }

    fn target(&self, edge: EdgeId) -> Result<usize, Error> {
        Ok(self.edge(edge)?.tail())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for block in self.blocks() {
            writeln!(f, "{}", block)?;
        }
        for edge in self.edges() {
            writeln!(f, "edge {}", edge)?;
        }
        Ok(())
    }
}
