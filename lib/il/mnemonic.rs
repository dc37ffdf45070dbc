//! A `Mnemonic` is a single instruction in a `Block`.
//!
//! The instruction set is deliberately small:
//!
//! * `Assignment` binds a variable to a fresh value of a `Class`.
//! * `Add` copies the class of one variable into another.
//!
//! Graph builders which meet an instruction they cannot express emit
//! `Unsupported`. Analyses refuse to run over `Unsupported` instructions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The class of value a variable may hold.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Class {
    Number,
    Pointer,
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Class::Number => write!(f, "number"),
            Class::Pointer => write!(f, "pointer"),
        }
    }
}

/// An instruction.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Mnemonic {
    /// Assign a fresh value of `class` to `variable`.
    Assignment { variable: String, class: Class },
    /// `dest` takes on whatever `src` currently holds.
    Add { src: String, dest: String },
    /// An instruction with no known semantics.
    Unsupported { opcode: String },
}

impl Mnemonic {
    /// Create a new `Assignment` mnemonic.
    pub fn assignment<S: Into<String>>(variable: S, class: Class) -> Mnemonic {
        Mnemonic::Assignment {
            variable: variable.into(),
            class,
        }
    }

    /// Create a new `Add` mnemonic.
    pub fn add<S: Into<String>, D: Into<String>>(src: S, dest: D) -> Mnemonic {
        Mnemonic::Add {
            src: src.into(),
            dest: dest.into(),
        }
    }

    /// Create a new `Unsupported` mnemonic.
    pub fn unsupported<S: Into<String>>(opcode: S) -> Mnemonic {
        Mnemonic::Unsupported {
            opcode: opcode.into(),
        }
    }

    /// The variables this mnemonic reads.
    pub fn variables_read(&self) -> Vec<&str> {
        match *self {
            Mnemonic::Add { ref src, .. } => vec![src.as_str()],
            Mnemonic::Assignment { .. } | Mnemonic::Unsupported { .. } => Vec::new(),
        }
    }

    /// The variable this mnemonic writes, if any.
    pub fn variable_written(&self) -> Option<&str> {
        match *self {
            Mnemonic::Assignment { ref variable, .. } => Some(variable.as_str()),
            Mnemonic::Add { ref dest, .. } => Some(dest.as_str()),
            Mnemonic::Unsupported { .. } => None,
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Mnemonic::Assignment {
                ref variable,
                ref class,
            } => write!(f, "{} = {}", variable, class),
            Mnemonic::Add { ref src, ref dest } => write!(f, "{} = add {}", dest, src),
            Mnemonic::Unsupported { ref opcode } => write!(f, "unsupported {}", opcode),
        }
    }
}
