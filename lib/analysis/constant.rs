//! A flat lattice over values compared by equality.
//!
//! ```text
//!            Top
//!        /  /   \  \
//!      v0  v1 ... vn
//!        \  \   /  /
//!           Bottom
//! ```
//!
//! Two distinct values are incomparable, and their join is `Top`. Any chain
//! in this lattice has at most three elements, so a monotone iteration over
//! it updates a value at most twice.

use crate::analysis::lattice::AbstractDomain;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, PartialOrd};
use std::fmt;

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ConstantDomain<T> {
    Top,
    Value(T),
    Bottom,
}

impl<T> ConstantDomain<T> {
    /// Create a new `ConstantDomain` holding exactly `value`.
    pub fn value(value: T) -> ConstantDomain<T> {
        ConstantDomain::Value(value)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, ConstantDomain::Value(_))
    }

    /// The value held by this domain.
    ///
    /// # Errors
    /// `Error::DomainMisuse` if this domain is `Top` or `Bottom`. Use
    /// `maybe_get` when that is an expected outcome.
    pub fn get(&self) -> Result<&T, Error> {
        match *self {
            ConstantDomain::Value(ref value) => Ok(value),
            ConstantDomain::Top => Err(Error::DomainMisuse("top".to_string())),
            ConstantDomain::Bottom => Err(Error::DomainMisuse("bottom".to_string())),
        }
    }

    /// The value held by this domain, if it holds exactly one.
    pub fn maybe_get(&self) -> Option<&T> {
        match *self {
            ConstantDomain::Value(ref value) => Some(value),
            ConstantDomain::Top | ConstantDomain::Bottom => None,
        }
    }
}

impl<T: PartialEq> PartialOrd for ConstantDomain<T> {
    fn partial_cmp(&self, other: &ConstantDomain<T>) -> Option<Ordering> {
        match (self, other) {
            (ConstantDomain::Top, ConstantDomain::Top)
            | (ConstantDomain::Bottom, ConstantDomain::Bottom) => Some(Ordering::Equal),
            (ConstantDomain::Top, _) | (_, ConstantDomain::Bottom) => Some(Ordering::Greater),
            (_, ConstantDomain::Top) | (ConstantDomain::Bottom, _) => Some(Ordering::Less),
            (ConstantDomain::Value(lhs), ConstantDomain::Value(rhs)) => {
                if lhs == rhs {
                    Some(Ordering::Equal)
                } else {
                    None
                }
            }
        }
    }
}

impl<T> AbstractDomain for ConstantDomain<T>
where
    T: Clone + fmt::Debug + PartialEq,
{
    fn bottom() -> Self {
        ConstantDomain::Bottom
    }

    fn top() -> Self {
        ConstantDomain::Top
    }

    fn is_bottom(&self) -> bool {
        matches!(self, ConstantDomain::Bottom)
    }

    fn is_top(&self) -> bool {
        matches!(self, ConstantDomain::Top)
    }

    fn leq(&self, other: &Self) -> bool {
        self <= other
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (ConstantDomain::Bottom, _) => other.clone(),
            (_, ConstantDomain::Bottom) => self.clone(),
            (ConstantDomain::Value(lhs), ConstantDomain::Value(rhs)) if lhs == rhs => {
                self.clone()
            }
            _ => ConstantDomain::Top,
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (ConstantDomain::Top, _) => other.clone(),
            (_, ConstantDomain::Top) => self.clone(),
            (ConstantDomain::Value(lhs), ConstantDomain::Value(rhs)) if lhs == rhs => {
                self.clone()
            }
            _ => ConstantDomain::Bottom,
        }
    }
}

impl<T: fmt::Display> fmt::Display for ConstantDomain<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConstantDomain::Top => write!(f, "Top"),
            ConstantDomain::Value(ref value) => write!(f, "{}", value),
            ConstantDomain::Bottom => write!(f, "Bottom"),
        }
    }
}
