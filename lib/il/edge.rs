//! An `Edge` is a directed edge between `Block` in a `Program`.
//!
//! To create a new edge, call `Program::add_successor`.

use crate::graph;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge between blocks
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Edge {
    head: usize,
    tail: usize,
}

impl Edge {
    pub(crate) fn new(head: usize, tail: usize) -> Edge {
        Edge { head, tail }
    }

    /// Retrieve the index of the `Block` this `Edge` leaves.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Retrieve the index of the `Block` this `Edge` enters.
    pub fn tail(&self) -> usize {
        self.tail
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(0x{:X}->0x{:X})", self.head, self.tail)
    }
}

impl graph::Edge for Edge {
    fn head(&self) -> usize {
        self.head
    }
    fn tail(&self) -> usize {
        self.tail
    }
    fn dot_label(&self) -> String {
        "".to_string()
    }
}
