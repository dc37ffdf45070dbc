//! A `Block` is a linear sequence of `Mnemonic`.
//!
//! A `Block` is created by calling `Program::create_block`, which hands back
//! the new `Block` so it can be filled in program order.

use crate::graph;
use crate::il::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A basic block.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Block {
    /// The index of the block.
    index: usize,
    /// The mnemonics for this block.
    mnemonics: Vec<Mnemonic>,
}

impl Block {
    pub(crate) fn new(index: usize) -> Block {
        Block {
            index,
            mnemonics: Vec::new(),
        }
    }

    /// Returns the index of this block
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns this block's mnemonics
    pub fn mnemonics(&self) -> &[Mnemonic] {
        &self.mnemonics
    }

    /// Returns true if this block holds no mnemonics
    pub fn is_empty(&self) -> bool {
        self.mnemonics.is_empty()
    }

    /// Appends a mnemonic to the end of this block.
    pub fn push(&mut self, mnemonic: Mnemonic) {
        self.mnemonics.push(mnemonic);
    }

    /// Adds an assignment to the end of this block.
    pub fn assign<S: Into<String>>(&mut self, variable: S, class: Class) {
        self.push(Mnemonic::assignment(variable, class));
    }

    /// Adds an add to the end of this block.
    pub fn add<S: Into<String>, D: Into<String>>(&mut self, src: S, dest: D) {
        self.push(Mnemonic::add(src, dest));
    }
}

impl graph::Vertex for Block {
    fn index(&self) -> usize {
        self.index
    }

    fn dot_label(&self) -> String {
        format!("{}", self)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "[ Block: 0x{:X} ]", self.index)?;
        for mnemonic in self.mnemonics() {
            writeln!(f, "{}", mnemonic)?;
        }
        Ok(())
    }
}
