//! Typeflow Intermediate Language.
//!
//! The IL is a minimal instruction set which exists to drive the abstract
//! domains and fixed point machinery in `analysis`.
//!
//! * `Mnemonic`: a single instruction. `Assignment` binds a variable to a
//! fresh value of a `Class`, and `Add` copies one variable into another.
//! * `Block`: a basic block, or a sequence of `Mnemonic`.
//! * `Edge`: a directed edge between two `Block`s.
//! * `Program`: a control-flow graph of `Block` and `Edge`, with an entry and
//! an exit.
//!
//! A `Program` is built once, by calling `Program::create_block`,
//! `Program::add`, and `Program::add_successor`, and is read-only while it is
//! analyzed.

mod block;
mod edge;
mod mnemonic;
mod program;

pub use self::block::*;
pub use self::edge::*;
pub use self::mnemonic::*;
pub use self::program::*;
