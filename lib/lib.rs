//! Typeflow: monotonic dataflow type analysis.
//!
//! Typeflow computes, for every basic block of a control-flow graph, a sound
//! over-approximation of whether each variable holds a number or a pointer.
//!
//! * `graph` provides a generic directed graph, and the `FlowGraph` trait
//! consumed by the fixed point iterator.
//! * `il` provides the instruction set, basic blocks, and the `Program`
//! control-flow graph.
//! * `analysis` provides the abstract domains, the monotonic fixed point
//! iterator, and the number/pointer type check built on top of them.

pub mod analysis;
pub mod graph;
pub mod il;
#[cfg(test)]
mod tests;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Analysis error: {0}")]
    Analysis(String),
    #[error("Unreachable instruction kind: {0}")]
    UnreachableInstruction(String),
    #[error("Cannot get a concrete value out of {0}")]
    DomainMisuse(String),
    #[error("Graph vertex not found: {0}")]
    GraphVertexNotFound(usize),
    #[error("Graph edge not found: {0}")]
    GraphEdgeNotFound(usize),
    #[error("Duplicate graph vertex: {0}")]
    GraphDuplicateVertex(usize),
    #[error("Entry has not been set for this graph")]
    EntryNotSet,
    #[error("Fixed point iteration limit of {0} visits reached")]
    IterationLimit(usize),
    #[error("{0}")]
    Custom(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Error {
        Error::Custom(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
