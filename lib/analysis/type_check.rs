//! Determine whether each variable holds a number or a pointer.
//!
//! Every variable is tracked in a `PointerNumberDomain`, the disjoint union
//! of a flat domain of numbers and a flat domain of pointer classes. A
//! variable which may hold a number along one path and a pointer along
//! another goes to `Top`.
//!
//! Only the class of a value matters. Assigning a number binds the constant
//! `0`, and assigning a pointer binds a pointer with one level of
//! indirection.

use crate::analysis::constant::ConstantDomain;
use crate::analysis::disjoint_union::{DisjointUnionDomain, Left, Right};
use crate::analysis::environment::Environment;
use crate::analysis::fixed_point::{
    FixpointOptions, FixpointTransformer, MonotonicFixpointIterator,
};
use crate::analysis::lattice::AbstractDomain;
use crate::il;
use crate::Error;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A pointer, described by its number of levels of indirection.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct PointerClass {
    indirections: u32,
}

impl PointerClass {
    pub fn new(indirections: u32) -> PointerClass {
        PointerClass { indirections }
    }

    pub fn indirections(&self) -> u32 {
        self.indirections
    }
}

impl fmt::Display for PointerClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "pointer({})", self.indirections)
    }
}

pub type NumberDomain = ConstantDomain<u64>;
pub type PointerDomain = ConstantDomain<PointerClass>;
pub type PointerNumberDomain = DisjointUnionDomain<NumberDomain, PointerDomain>;
pub type AbstractEnvironment = Environment<String, PointerNumberDomain>;

impl From<NumberDomain> for PointerNumberDomain {
    fn from(number: NumberDomain) -> PointerNumberDomain {
        PointerNumberDomain::left(number)
    }
}

impl From<PointerDomain> for PointerNumberDomain {
    fn from(pointer: PointerDomain) -> PointerNumberDomain {
        PointerNumberDomain::right(pointer)
    }
}

impl PointerNumberDomain {
    pub fn number(value: u64) -> PointerNumberDomain {
        NumberDomain::value(value).into()
    }

    pub fn pointer(pointer_class: PointerClass) -> PointerNumberDomain {
        PointerDomain::value(pointer_class).into()
    }

    /// The number held, if this value is exactly one number.
    pub fn number_value(&self) -> Option<u64> {
        self.maybe_get::<Left>()
            .and_then(|number| number.maybe_get())
            .copied()
    }

    /// The pointer held, if this value is exactly one pointer.
    pub fn pointer_value(&self) -> Option<PointerClass> {
        self.maybe_get::<Right>()
            .and_then(|pointer| pointer.maybe_get())
            .copied()
    }

    /// The class of this value, if it is known to be exactly one class.
    pub fn class(&self) -> Option<il::Class> {
        if self.maybe_get::<Left>().is_some() {
            Some(il::Class::Number)
        } else if self.maybe_get::<Right>().is_some() {
            Some(il::Class::Pointer)
        } else {
            None
        }
    }
}

/// Apply the transfer function for one `Mnemonic` to `state`.
///
/// # Errors
/// `Error::UnreachableInstruction` for `Mnemonic::Unsupported`. `state` may
/// not be used after an error.
pub fn transfer(mnemonic: &il::Mnemonic, state: &mut AbstractEnvironment) -> Result<(), Error> {
    match *mnemonic {
        il::Mnemonic::Assignment {
            ref variable,
            class,
        } => {
            let value = match class {
                il::Class::Number => PointerNumberDomain::number(0),
                il::Class::Pointer => PointerNumberDomain::pointer(PointerClass::new(1)),
            };
            state.set_mut(variable.clone(), value);
        }
        il::Mnemonic::Add { ref src, ref dest } => {
            let value = state.get(src.as_str());
            state.set_mut(dest.clone(), value);
        }
        il::Mnemonic::Unsupported { ref opcode } => {
            warn!("no transfer function for {}", mnemonic);
            return Err(Error::UnreachableInstruction(opcode.clone()));
        }
    }
    Ok(())
}

/// The transfer functions of the type check over a `Program`.
pub struct TypeCheckAnalysis<'p> {
    program: &'p il::Program,
}

impl<'p> TypeCheckAnalysis<'p> {
    pub fn new(program: &'p il::Program) -> TypeCheckAnalysis<'p> {
        TypeCheckAnalysis { program }
    }
}

impl FixpointTransformer<il::Program, AbstractEnvironment> for TypeCheckAnalysis<'_> {
    fn analyze_node(&self, node: usize, state: &mut AbstractEnvironment) -> Result<(), Error> {
        // Mnemonics run over a working copy, so a failure leaves `state`
        // as it was.
        let mut working = state.clone();
        for mnemonic in self.program.block(node)?.mnemonics() {
            transfer(mnemonic, &mut working)?;
        }
        *state = working;
        Ok(())
    }
}

pub type TypeCheckIterator<'p> =
    MonotonicFixpointIterator<'p, il::Program, AbstractEnvironment, TypeCheckAnalysis<'p>>;

/// The environments on entry to, and exit from, every block of a `Program`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TypeStates {
    entry: BTreeMap<usize, AbstractEnvironment>,
    exit: BTreeMap<usize, AbstractEnvironment>,
    iterations: usize,
}

impl TypeStates {
    /// The environment on entry to a block.
    pub fn entry(&self, block: usize) -> Result<&AbstractEnvironment, Error> {
        self.entry
            .get(&block)
            .ok_or(Error::GraphVertexNotFound(block))
    }

    /// The environment on exit from a block.
    pub fn exit(&self, block: usize) -> Result<&AbstractEnvironment, Error> {
        self.exit
            .get(&block)
            .ok_or(Error::GraphVertexNotFound(block))
    }

    /// The indices of every block with states.
    pub fn blocks(&self) -> Vec<usize> {
        self.entry.keys().copied().collect()
    }

    /// The number of blocks visited to reach these states.
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Determine the class of every variable at every block in `program`, where
/// no variable is defined on entry.
pub fn type_check(program: &il::Program) -> Result<TypeStates, Error> {
    type_check_with(
        program,
        AbstractEnvironment::new(),
        FixpointOptions::default(),
    )
}

/// Determine the class of every variable at every block in `program`,
/// starting from `initial` on entry.
pub fn type_check_with(
    program: &il::Program,
    initial: AbstractEnvironment,
    options: FixpointOptions,
) -> Result<TypeStates, Error> {
    let mut iterator =
        TypeCheckIterator::with_options(program, TypeCheckAnalysis::new(program), options);
    iterator.run(initial)?;

    let mut entry = BTreeMap::new();
    let mut exit = BTreeMap::new();
    for block in program.blocks() {
        entry.insert(block.index(), iterator.entry_state_at(block.index()));
        exit.insert(block.index(), iterator.exit_state_at(block.index()));
    }

    let unreached = exit.values().filter(|state| state.is_bottom()).count();
    debug!(
        "type check of {} blocks done, {} blocks unreached",
        exit.len(),
        unreached
    );

    Ok(TypeStates {
        entry,
        exit,
        iterations: iterator.iterations(),
    })
}
