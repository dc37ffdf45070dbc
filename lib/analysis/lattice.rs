//! The algebra every abstract domain provides.
//!
//! An abstract domain is a lattice. Every lattice has a least element,
//! `bottom`, and a greatest element, `top`, and any two elements have a least
//! upper bound, `join`, and a greatest lower bound, `meet`.
//!
//! Values are immutable. `join` and `meet` return new values.

use std::fmt::Debug;

/// An abstract value ordered by precision.
pub trait AbstractDomain: Clone + Debug + PartialEq {
    /// The least element, representing no possible values.
    fn bottom() -> Self;

    /// The greatest element, representing every possible value.
    fn top() -> Self;

    fn is_bottom(&self) -> bool;

    fn is_top(&self) -> bool;

    /// Returns true if `self` is at least as precise as `other`.
    fn leq(&self, other: &Self) -> bool;

    /// The least upper bound of `self` and `other`.
    fn join(&self, other: &Self) -> Self;

    /// The greatest lower bound of `self` and `other`.
    fn meet(&self, other: &Self) -> Self;

    /// Join `other` into `self`.
    fn join_with(&mut self, other: &Self) {
        *self = self.join(other);
    }

    /// Meet `other` into `self`.
    fn meet_with(&mut self, other: &Self) {
        *self = self.meet(other);
    }

    /// Returns true if `self` and `other` are ordered both ways.
    fn equals(&self, other: &Self) -> bool {
        self.leq(other) && other.leq(self)
    }
}

/// Checks the lattice laws over every combination of the given values.
#[cfg(test)]
pub(crate) fn assert_lattice_laws<D: AbstractDomain>(values: &[D]) {
    let top = D::top();
    let bottom = D::bottom();

    assert!(top.is_top());
    assert!(bottom.is_bottom());

    for a in values {
        assert!(bottom.leq(a), "bottom <= {:?}", a);
        assert!(a.leq(&top), "{:?} <= top", a);
        assert_eq!(a.join(a), *a, "join idempotent for {:?}", a);
        assert_eq!(a.meet(a), *a, "meet idempotent for {:?}", a);
        assert_eq!(a.join(&bottom), *a);
        assert_eq!(a.meet(&top), *a);
        assert!(a.join(&top).is_top());
        assert!(a.meet(&bottom).is_bottom());

        for b in values {
            let join = a.join(b);
            let meet = a.meet(b);
            assert_eq!(join, b.join(a), "join commutes for {:?}, {:?}", a, b);
            assert_eq!(meet, b.meet(a), "meet commutes for {:?}, {:?}", a, b);
            assert!(a.leq(&join) && b.leq(&join));
            assert!(meet.leq(a) && meet.leq(b));
            assert_eq!(a.leq(b), a.join(b) == *b, "leq agrees with join");

            for c in values {
                assert_eq!(
                    join.join(c),
                    a.join(&b.join(c)),
                    "join associates for {:?}, {:?}, {:?}",
                    a,
                    b,
                    c
                );
            }
        }
    }
}
