//! Abstract domains, and analyses computed over them.
//!
//! Domains implement `AbstractDomain`. They are composed from the flat
//! `ConstantDomain`, the `DisjointUnionDomain` of two domains, and the
//! `Environment` mapping variables to values of a domain.
//!
//! An analysis provides a `FixpointTransformer`, which the
//! `MonotonicFixpointIterator` drives to a fixed point over any `FlowGraph`.

pub mod constant;
pub mod disjoint_union;
pub mod environment;
pub mod fixed_point;
pub mod lattice;
pub mod type_check;

pub use self::constant::ConstantDomain;
pub use self::disjoint_union::{DisjointUnionDomain, Left, Right};
pub use self::environment::Environment;
pub use self::fixed_point::{
    FixpointOptions, FixpointOptionsBuilder, FixpointTransformer, MonotonicFixpointIterator,
    WorklistOrder,
};
pub use self::lattice::AbstractDomain;
pub use self::type_check::{type_check, type_check_with, TypeStates};
