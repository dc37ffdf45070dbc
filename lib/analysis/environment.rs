//! An abstract environment maps variables to abstract values.
//!
//! Environments are ordered pointwise: `e1 <= e2` when every variable is
//! bound in `e1` to something at most as large as its binding in `e2`.
//!
//! A reachable environment holds explicit bindings, and a default value for
//! every variable it does not bind. `Environment::new()` defaults to
//! `bottom`, meaning no definition has reached any variable yet. The top
//! environment defaults to `top` and binds nothing, so nothing is known about
//! any variable. `Bottom` is the distinguished environment of code which has
//! not been reached.
//!
//! A binding is never equal to the default. Setting a variable to the
//! default removes its binding, so equal environments are structurally
//! equal.
//!
//! Bindings are held in an `im::OrdMap`, so cloning an environment is cheap,
//! and an environment produced by `set` shares all unchanged bindings with
//! the environment it was produced from.

use crate::analysis::lattice::AbstractDomain;
use im::OrdMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(
    from = "RawEnvironment<K, D>",
    bound(deserialize = "K: Deserialize<'de> + Ord + Clone + fmt::Debug, \
                         D: Deserialize<'de> + AbstractDomain")
)]
pub enum Environment<K: Ord + Clone, D: Clone> {
    /// Every variable missing from `bindings` is bound to `default`.
    Bindings { default: D, bindings: OrdMap<K, D> },
    Bottom,
}

/// The serialized form of an `Environment`, before bindings equal to the
/// default are dropped.
#[derive(Deserialize)]
enum RawEnvironment<K: Ord + Clone, D: Clone> {
    Bindings { default: D, bindings: OrdMap<K, D> },
    Bottom,
}

impl<K, D> From<RawEnvironment<K, D>> for Environment<K, D>
where
    K: Ord + Clone + fmt::Debug,
    D: AbstractDomain,
{
    fn from(raw: RawEnvironment<K, D>) -> Environment<K, D> {
        match raw {
            RawEnvironment::Bottom => Environment::Bottom,
            RawEnvironment::Bindings { default, bindings } => {
                let mut environment = Environment::with_default(default);
                for (key, value) in bindings {
                    environment.set_mut(key, value);
                }
                environment
            }
        }
    }
}

impl<K, D> Environment<K, D>
where
    K: Ord + Clone + fmt::Debug,
    D: AbstractDomain,
{
    /// An environment where no variable has been defined.
    pub fn new() -> Environment<K, D> {
        Environment::with_default(D::bottom())
    }

    /// An environment binding every variable to `default`.
    pub fn with_default(default: D) -> Environment<K, D> {
        Environment::Bindings {
            default,
            bindings: OrdMap::new(),
        }
    }

    /// The value of every variable without an explicit binding.
    pub fn default_value(&self) -> D {
        match *self {
            Environment::Bindings { ref default, .. } => default.clone(),
            Environment::Bottom => D::bottom(),
        }
    }

    /// The value bound to `key`.
    pub fn get<Q>(&self, key: &Q) -> D
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match *self {
            Environment::Bottom => D::bottom(),
            Environment::Bindings {
                ref default,
                ref bindings,
            } => bindings.get(key).cloned().unwrap_or_else(|| default.clone()),
        }
    }

    /// A new environment with `key` bound to `value`.
    ///
    /// `Bottom` is unchanged by `set`.
    pub fn set(&self, key: K, value: D) -> Environment<K, D> {
        let mut environment = self.clone();
        environment.set_mut(key, value);
        environment
    }

    /// Bind `key` to `value` in place.
    pub fn set_mut(&mut self, key: K, value: D) {
        if let Environment::Bindings {
            ref default,
            ref mut bindings,
        } = *self
        {
            if value == *default {
                bindings.remove(&key);
            } else {
                bindings.insert(key, value);
            }
        }
    }

    /// A new environment with `key` bound to `f` of its current value.
    pub fn update<F>(&self, key: K, f: F) -> Environment<K, D>
    where
        F: FnOnce(&D) -> D,
    {
        let value = f(&self.get(&key));
        self.set(key, value)
    }

    /// Every explicit binding in this environment, ordered by key.
    pub fn bindings(&self) -> Box<dyn Iterator<Item = (&K, &D)> + '_> {
        match *self {
            Environment::Bindings { ref bindings, .. } => Box::new(bindings.iter()),
            Environment::Bottom => Box::new(std::iter::empty()),
        }
    }

    /// The number of explicit bindings in this environment.
    pub fn len(&self) -> usize {
        match *self {
            Environment::Bindings { ref bindings, .. } => bindings.len(),
            Environment::Bottom => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Combine two sets of bindings key by key, defaults included.
    fn pointwise<F>(
        lhs_default: &D,
        lhs: &OrdMap<K, D>,
        rhs_default: &D,
        rhs: &OrdMap<K, D>,
        f: F,
    ) -> Environment<K, D>
    where
        F: Fn(&D, &D) -> D,
    {
        let mut environment = Environment::with_default(f(lhs_default, rhs_default));
        let keys = lhs
            .keys()
            .chain(rhs.keys().filter(|key| !lhs.contains_key(*key)));
        for key in keys {
            let value = f(
                lhs.get(key).unwrap_or(lhs_default),
                rhs.get(key).unwrap_or(rhs_default),
            );
            environment.set_mut(key.clone(), value);
        }
        environment
    }
}

impl<K, D> Default for Environment<K, D>
where
    K: Ord + Clone + fmt::Debug,
    D: AbstractDomain,
{
    fn default() -> Environment<K, D> {
        Environment::new()
    }
}

impl<K, D> AbstractDomain for Environment<K, D>
where
    K: Ord + Clone + fmt::Debug,
    D: AbstractDomain,
{
    fn bottom() -> Self {
        Environment::Bottom
    }

    fn top() -> Self {
        Environment::with_default(D::top())
    }

    fn is_bottom(&self) -> bool {
        matches!(self, Environment::Bottom)
    }

    fn is_top(&self) -> bool {
        match *self {
            Environment::Bindings {
                ref default,
                ref bindings,
            } => default.is_top() && bindings.is_empty(),
            Environment::Bottom => false,
        }
    }

    fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (Environment::Bottom, _) => true,
            (_, Environment::Bottom) => false,
            (
                Environment::Bindings {
                    default: lhs_default,
                    bindings: lhs,
                },
                Environment::Bindings {
                    default: rhs_default,
                    bindings: rhs,
                },
            ) => {
                lhs_default.leq(rhs_default)
                    && lhs
                        .keys()
                        .chain(rhs.keys())
                        .all(|key| self.get(key).leq(&other.get(key)))
            }
        }
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Environment::Bottom, _) => other.clone(),
            (_, Environment::Bottom) => self.clone(),
            (
                Environment::Bindings {
                    default: lhs_default,
                    bindings: lhs,
                },
                Environment::Bindings {
                    default: rhs_default,
                    bindings: rhs,
                },
            ) => Self::pointwise(lhs_default, lhs, rhs_default, rhs, |a, b| a.join(b)),
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Environment::Bottom, _) | (_, Environment::Bottom) => Environment::Bottom,
            (
                Environment::Bindings {
                    default: lhs_default,
                    bindings: lhs,
                },
                Environment::Bindings {
                    default: rhs_default,
                    bindings: rhs,
                },
            ) => Self::pointwise(lhs_default, lhs, rhs_default, rhs, |a, b| a.meet(b)),
        }
    }
}

impl<K, D> fmt::Display for Environment<K, D>
where
    K: Ord + Clone + fmt::Debug + fmt::Display,
    D: AbstractDomain + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_top() {
            return write!(f, "Top");
        }
        match *self {
            Environment::Bottom => write!(f, "Bottom"),
            Environment::Bindings {
                ref default,
                ref bindings,
            } => {
                let mut entries = bindings
                    .iter()
                    .map(|(key, value)| format!("{} -> {}", key, value))
                    .collect::<Vec<String>>();
                if !default.is_bottom() {
                    entries.push(format!("_ -> {}", default));
                }
                write!(f, "{{{}}}", entries.join(", "))
            }
        }
    }
}
