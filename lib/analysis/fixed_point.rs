//! A monotonic fixed point iterator over any `FlowGraph`.
//!
//! The iterator holds, for every node, the abstract state on entry to the
//! node and the abstract state on exit from the node. States start at
//! `bottom`, and only ever grow.
//!
//! Nodes are processed from a worklist seeded with the graph's entry. When a
//! node is popped, its entry state is the join, over every incoming edge, of
//! `analyze_edge` applied to the exit state of that edge's source. The entry
//! of the graph additionally joins in the initial state. If this entry state
//! adds nothing to the state already held for the node, the node is done.
//! Otherwise `analyze_node` produces the node's new exit state, and every
//! successor of the node is pushed back onto the worklist.
//!
//! Iteration terminates when the worklist is empty, provided the abstract
//! domain has no infinite ascending chains.

use crate::analysis::lattice::AbstractDomain;
use crate::graph::{self, FlowGraph};
use crate::Error;
use log::{debug, trace, warn};
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::hash::{BuildHasher, BuildHasherDefault};

/// The transfer functions of an analysis over a `FlowGraph`.
pub trait FixpointTransformer<G: FlowGraph, D: AbstractDomain> {
    /// Transform the state on entry to `node` into the state on exit from
    /// `node`, in place.
    ///
    /// When this returns an error, analysis stops, and the state is
    /// discarded.
    fn analyze_node(&self, node: G::NodeId, state: &mut D) -> Result<(), Error>;

    /// Transform the state on exit from the source of `edge` into the state
    /// flowing along `edge`. This is the identity unless an analysis needs to
    /// refine states along edges.
    fn analyze_edge(&self, _edge: G::EdgeId, state: &D) -> Result<D, Error> {
        Ok(state.clone())
    }
}

/// The order in which nodes are taken from the worklist.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WorklistOrder {
    /// Take the node earliest in a reverse post order from the entry. Nodes
    /// in a loop are revisited before anything after the loop.
    #[default]
    ReversePostOrder,
    /// Take nodes in the order they were pushed.
    Fifo,
}

/// Options which change the behavior of a `MonotonicFixpointIterator`.
#[derive(Clone, Debug, Default)]
pub struct FixpointOptions {
    iteration_limit: Option<usize>,
    order: WorklistOrder,
}

impl FixpointOptions {
    /// Create a new set of options with the default settings.
    pub fn new() -> FixpointOptions {
        FixpointOptions::default()
    }

    /// Set the maximum number of node visits.
    pub fn set_iteration_limit(&mut self, iteration_limit: Option<usize>) {
        self.iteration_limit = iteration_limit;
    }

    /// The maximum number of node visits before the iterator gives up with
    /// `Error::IterationLimit`. `None`, the default, is unlimited.
    pub fn iteration_limit(&self) -> Option<usize> {
        self.iteration_limit
    }

    pub fn set_order(&mut self, order: WorklistOrder) {
        self.order = order;
    }

    /// The order in which nodes are taken from the worklist.
    pub fn order(&self) -> WorklistOrder {
        self.order
    }
}

/// Create your options with the builder pattern.
///
/// For more details on the options, see `FixpointOptions`
#[derive(Debug, Default)]
pub struct FixpointOptionsBuilder {
    options: FixpointOptions,
}

impl FixpointOptionsBuilder {
    pub fn new() -> FixpointOptionsBuilder {
        FixpointOptionsBuilder {
            options: FixpointOptions::default(),
        }
    }

    /// Set the iteration limit. By default there is none.
    pub fn iteration_limit(mut self, iteration_limit: usize) -> FixpointOptionsBuilder {
        self.options.iteration_limit = Some(iteration_limit);
        self
    }

    /// Set the worklist order. By default this is reverse post order.
    pub fn order(mut self, order: WorklistOrder) -> FixpointOptionsBuilder {
        self.options.order = order;
        self
    }

    pub fn build(self) -> FixpointOptions {
        self.options
    }
}

enum Worklist<N> {
    Ranked {
        queue: BTreeSet<(usize, N)>,
        rank: FxHashMap<N, usize>,
    },
    Fifo {
        queue: VecDeque<N>,
        queued: FxHashSet<N>,
    },
}

impl<N: Copy + Eq + std::hash::Hash + Ord> Worklist<N> {
    fn new(order: WorklistOrder, reverse_post_order: &[N]) -> Worklist<N> {
        match order {
            WorklistOrder::ReversePostOrder => Worklist::Ranked {
                queue: BTreeSet::new(),
                rank: reverse_post_order
                    .iter()
                    .enumerate()
                    .map(|(rank, node)| (*node, rank))
                    .collect(),
            },
            WorklistOrder::Fifo => Worklist::Fifo {
                queue: VecDeque::new(),
                queued: FxHashSet::default(),
            },
        }
    }

    fn push(&mut self, node: N) {
        match self {
            Worklist::Ranked { queue, rank } => {
                let rank = rank.get(&node).copied().unwrap_or(usize::MAX);
                queue.insert((rank, node));
            }
            Worklist::Fifo { queue, queued } => {
                if queued.insert(node) {
                    queue.push_back(node);
                }
            }
        }
    }

    fn pop(&mut self) -> Option<N> {
        match self {
            Worklist::Ranked { queue, .. } => queue.pop_first().map(|(_, node)| node),
            Worklist::Fifo { queue, queued } => {
                let node = queue.pop_front()?;
                queued.remove(&node);
                Some(node)
            }
        }
    }
}

/// Computes the least fixed point of a `FixpointTransformer` over a graph.
///
/// * `G` is the graph, borrowed for the life of the iterator.
/// * `D` is the abstract domain of states.
/// * `T` provides the transfer functions.
/// * `S` hashes node identities, and defaults to `rustc_hash`'s `FxHasher`.
///
/// One iterator computes one analysis at a time. Analyses with different
/// initial states over the same graph each use their own iterator.
pub struct MonotonicFixpointIterator<'g, G, D, T, S = BuildHasherDefault<FxHasher>>
where
    G: FlowGraph,
{
    graph: &'g G,
    transformer: T,
    options: FixpointOptions,
    entry_states: HashMap<G::NodeId, D, S>,
    exit_states: HashMap<G::NodeId, D, S>,
    iterations: usize,
}

impl<'g, G, D, T, S> MonotonicFixpointIterator<'g, G, D, T, S>
where
    G: FlowGraph,
    D: AbstractDomain,
    T: FixpointTransformer<G, D>,
    S: BuildHasher + Default,
{
    pub fn new(graph: &'g G, transformer: T) -> Self {
        Self::with_options(graph, transformer, FixpointOptions::default())
    }

    pub fn with_options(graph: &'g G, transformer: T, options: FixpointOptions) -> Self {
        MonotonicFixpointIterator {
            graph,
            transformer,
            options,
            entry_states: HashMap::default(),
            exit_states: HashMap::default(),
            iterations: 0,
        }
    }

    pub fn graph(&self) -> &'g G {
        self.graph
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    pub fn options(&self) -> &FixpointOptions {
        &self.options
    }

    /// Run the analysis to a fixed point, starting from `init` at the entry
    /// of the graph.
    ///
    /// Any states from a previous run are discarded first. When an error
    /// occurs, no states are kept.
    pub fn run(&mut self, init: D) -> Result<(), Error> {
        self.entry_states.clear();
        self.exit_states.clear();
        self.iterations = 0;

        let result = self.iterate(init);
        if result.is_err() {
            self.entry_states.clear();
            self.exit_states.clear();
        }
        result
    }

    fn iterate(&mut self, init: D) -> Result<(), Error> {
        let entry = self.graph.entry().ok_or(Error::EntryNotSet)?;
        let order = graph::reverse_post_order(self.graph)?;

        debug!(
            "fixed point iteration begins at {:?} over {} reachable nodes",
            entry,
            order.len()
        );

        let mut worklist = Worklist::new(self.options.order, &order);
        worklist.push(entry);

        while let Some(node) = worklist.pop() {
            self.iterations += 1;
            if let Some(limit) = self.options.iteration_limit {
                if self.iterations > limit {
                    warn!("fixed point iteration limit of {} reached", limit);
                    return Err(Error::IterationLimit(limit));
                }
            }

            let mut entry_state = if node == entry {
                init.clone()
            } else {
                D::bottom()
            };
            for edge in self.graph.predecessors(node)? {
                let source = self.graph.source(edge)?;
                if let Some(exit_state) = self.exit_states.get(&source) {
                    entry_state.join_with(&self.transformer.analyze_edge(edge, exit_state)?);
                }
            }

            if let Some(previous) = self.entry_states.get(&node) {
                if entry_state.leq(previous) {
                    trace!("{:?} is stable", node);
                    continue;
                }
                entry_state = previous.join(&entry_state);
            }

            trace!("analyzing {:?}", node);

            let mut exit_state = entry_state.clone();
            self.transformer.analyze_node(node, &mut exit_state)?;

            self.entry_states.insert(node, entry_state);
            self.exit_states.insert(node, exit_state);

            for edge in self.graph.successors(node)? {
                worklist.push(self.graph.target(edge)?);
            }
        }

        debug!(
            "fixed point reached after {} iterations, {} nodes analyzed",
            self.iterations,
            self.entry_states.len()
        );

        Ok(())
    }

    /// The state on entry to `node`. Nodes never reached are `bottom`.
    pub fn entry_state_at(&self, node: G::NodeId) -> D {
        self.entry_states
            .get(&node)
            .cloned()
            .unwrap_or_else(D::bottom)
    }

    /// The state on exit from `node`. Nodes never reached are `bottom`.
    pub fn exit_state_at(&self, node: G::NodeId) -> D {
        self.exit_states
            .get(&node)
            .cloned()
            .unwrap_or_else(D::bottom)
    }

    /// The number of nodes popped from the worklist in the last run.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Every node analyzed in the last run, in order.
    pub fn visited_nodes(&self) -> Vec<G::NodeId> {
        let mut nodes = self.entry_states.keys().copied().collect::<Vec<G::NodeId>>();
        nodes.sort();
        nodes
    }
}
