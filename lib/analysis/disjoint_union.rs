//! The disjoint union of two abstract domains.
//!
//! A `DisjointUnionDomain<A, B>` holds either a value of `A`, tagged `Left`,
//! or a value of `B`, tagged `Right`. Values of different tags have no
//! common refinement, so their join is `Top` and their meet is `Bottom`.
//!
//! A tagged value never holds the `top` or `bottom` of its sub-domain. Those
//! collapse into the union's own `Top` and `Bottom` on construction, which
//! keeps equality between unions structural.

use crate::analysis::lattice::AbstractDomain;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(
    from = "RawDisjointUnion<A, B>",
    bound(deserialize = "A: Deserialize<'de> + AbstractDomain, \
                         B: Deserialize<'de> + AbstractDomain")
)]
pub enum DisjointUnionDomain<A, B> {
    Top,
    Left(A),
    Right(B),
    Bottom,
}

/// The serialized form of a `DisjointUnionDomain`, which may tag a `top` or
/// `bottom` sub-domain value.
#[derive(Deserialize)]
enum RawDisjointUnion<A, B> {
    Top,
    Left(A),
    Right(B),
    Bottom,
}

impl<A, B> From<RawDisjointUnion<A, B>> for DisjointUnionDomain<A, B>
where
    A: AbstractDomain,
    B: AbstractDomain,
{
    fn from(raw: RawDisjointUnion<A, B>) -> DisjointUnionDomain<A, B> {
        match raw {
            RawDisjointUnion::Top => DisjointUnionDomain::Top,
            RawDisjointUnion::Left(a) => DisjointUnionDomain::left(a),
            RawDisjointUnion::Right(b) => DisjointUnionDomain::right(b),
            RawDisjointUnion::Bottom => DisjointUnionDomain::Bottom,
        }
    }
}

/// Selects one side of a `DisjointUnionDomain`.
///
/// Used with `DisjointUnionDomain::maybe_get`, for example
/// `union.maybe_get::<Left>()`.
pub trait Side<A, B> {
    /// The sub-domain on this side.
    type Domain;

    fn select(union: &DisjointUnionDomain<A, B>) -> Option<&Self::Domain>;
}

/// The `A` side of a `DisjointUnionDomain<A, B>`.
#[derive(Clone, Copy, Debug)]
pub enum Left {}

/// The `B` side of a `DisjointUnionDomain<A, B>`.
#[derive(Clone, Copy, Debug)]
pub enum Right {}

impl<A, B> Side<A, B> for Left {
    type Domain = A;

    fn select(union: &DisjointUnionDomain<A, B>) -> Option<&A> {
        match union {
            DisjointUnionDomain::Left(a) => Some(a),
            _ => None,
        }
    }
}

impl<A, B> Side<A, B> for Right {
    type Domain = B;

    fn select(union: &DisjointUnionDomain<A, B>) -> Option<&B> {
        match union {
            DisjointUnionDomain::Right(b) => Some(b),
            _ => None,
        }
    }
}

/// A borrowed view of the active side of a `DisjointUnionDomain`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tagged<'a, A, B> {
    Left(&'a A),
    Right(&'a B),
}

impl<A, B> DisjointUnionDomain<A, B>
where
    A: AbstractDomain,
    B: AbstractDomain,
{
    /// Tag a value of `A`, collapsing its top and bottom into ours.
    pub fn left(a: A) -> Self {
        if a.is_top() {
            DisjointUnionDomain::Top
        } else if a.is_bottom() {
            DisjointUnionDomain::Bottom
        } else {
            DisjointUnionDomain::Left(a)
        }
    }

    /// Tag a value of `B`, collapsing its top and bottom into ours.
    pub fn right(b: B) -> Self {
        if b.is_top() {
            DisjointUnionDomain::Top
        } else if b.is_bottom() {
            DisjointUnionDomain::Bottom
        } else {
            DisjointUnionDomain::Right(b)
        }
    }

    pub fn is_left(&self) -> bool {
        matches!(self, DisjointUnionDomain::Left(_))
    }

    pub fn is_right(&self) -> bool {
        matches!(self, DisjointUnionDomain::Right(_))
    }

    /// The sub-domain value on side `S`, if this union is tagged `S`.
    ///
    /// Returns `None` when the union is tagged for the other side, or is
    /// `Top` or `Bottom`. A tagged value is never the sub-domain's `top` or
    /// `bottom`, so the payload itself is the sub-domain's `maybe_get`.
    pub fn maybe_get<S: Side<A, B>>(&self) -> Option<&S::Domain> {
        S::select(self)
    }

    /// The active side of this union.
    ///
    /// # Errors
    /// `Error::DomainMisuse` if this union is `Top` or `Bottom`.
    pub fn get(&self) -> Result<Tagged<'_, A, B>, Error> {
        match self {
            DisjointUnionDomain::Left(a) => Ok(Tagged::Left(a)),
            DisjointUnionDomain::Right(b) => Ok(Tagged::Right(b)),
            DisjointUnionDomain::Top => Err(Error::DomainMisuse("top".to_string())),
            DisjointUnionDomain::Bottom => Err(Error::DomainMisuse("bottom".to_string())),
        }
    }
}

impl<A, B> AbstractDomain for DisjointUnionDomain<A, B>
where
    A: AbstractDomain,
    B: AbstractDomain,
{
    fn bottom() -> Self {
        DisjointUnionDomain::Bottom
    }

    fn top() -> Self {
        DisjointUnionDomain::Top
    }

    fn is_bottom(&self) -> bool {
        matches!(self, DisjointUnionDomain::Bottom)
    }

    fn is_top(&self) -> bool {
        matches!(self, DisjointUnionDomain::Top)
    }

    fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (DisjointUnionDomain::Bottom, _) | (_, DisjointUnionDomain::Top) => true,
            (DisjointUnionDomain::Top, _) | (_, DisjointUnionDomain::Bottom) => false,
            (DisjointUnionDomain::Left(lhs), DisjointUnionDomain::Left(rhs)) => lhs.leq(rhs),
            (DisjointUnionDomain::Right(lhs), DisjointUnionDomain::Right(rhs)) => lhs.leq(rhs),
            (DisjointUnionDomain::Left(_), DisjointUnionDomain::Right(_))
            | (DisjointUnionDomain::Right(_), DisjointUnionDomain::Left(_)) => false,
        }
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (DisjointUnionDomain::Bottom, _) => other.clone(),
            (_, DisjointUnionDomain::Bottom) => self.clone(),
            (DisjointUnionDomain::Left(lhs), DisjointUnionDomain::Left(rhs)) => {
                Self::left(lhs.join(rhs))
            }
            (DisjointUnionDomain::Right(lhs), DisjointUnionDomain::Right(rhs)) => {
                Self::right(lhs.join(rhs))
            }
            _ => DisjointUnionDomain::Top,
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (DisjointUnionDomain::Top, _) => other.clone(),
            (_, DisjointUnionDomain::Top) => self.clone(),
            (DisjointUnionDomain::Left(lhs), DisjointUnionDomain::Left(rhs)) => {
                Self::left(lhs.meet(rhs))
            }
            (DisjointUnionDomain::Right(lhs), DisjointUnionDomain::Right(rhs)) => {
                Self::right(lhs.meet(rhs))
            }
            _ => DisjointUnionDomain::Bottom,
        }
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for DisjointUnionDomain<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DisjointUnionDomain::Top => write!(f, "Top"),
            DisjointUnionDomain::Left(ref a) => write!(f, "Left({})", a),
            DisjointUnionDomain::Right(ref b) => write!(f, "Right({})", b),
            DisjointUnionDomain::Bottom => write!(f, "Bottom"),
        }
    }
}
