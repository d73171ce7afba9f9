//! Deterministic topological ordering for build graphs.
//!
//! Backends order targets and link steps through [`topologically_sorted`].
//! The sequencer knows nothing about build semantics: it sees opaque nodes and
//! asks an [`EdgeLookup`] strategy which nodes must follow each one.
//!
//! The ordering contract is "source before targets": for every node `n` and
//! every `m` returned by `edges_of(n)`, `n` precedes `m` in the result. Callers
//! pick the edge direction that yields the order they need.
//!
//! # Examples
//!
//! ```
//! use shikumi::graph::topologically_sorted;
//! use std::collections::HashMap;
//!
//! let graph: HashMap<&str, Vec<&str>> = HashMap::from([
//!     ("a", vec!["b", "c"]),
//!     ("b", vec![]),
//!     ("c", vec!["d"]),
//!     ("d", vec!["b"]),
//! ]);
//! let order = topologically_sorted(["a", "b", "c", "d"], &|node: &&str| {
//!     graph.get(node).cloned().unwrap_or_default()
//! })?;
//! assert_eq!(order, ["a", "c", "d", "b"]);
//! # Ok::<(), shikumi::graph::CycleError<&str>>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

/// Strategy yielding the nodes that must appear after a given node.
pub trait EdgeLookup<N> {
    /// Return the successors of `node` in the order they should be visited.
    fn edges_of(&self, node: &N) -> Vec<N>;
}

impl<N, F, I> EdgeLookup<N> for F
where
    F: Fn(&N) -> I,
    I: IntoIterator<Item = N>,
{
    fn edges_of(&self, node: &N) -> Vec<N> {
        self(node).into_iter().collect()
    }
}

/// Raised when the edge relation admits no linear order.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("dependency cycle detected: {}", format_cycle(.cycle))]
#[diagnostic(
    code(shikumi::graph::cycle),
    help("break the cycle by removing one of the listed dependencies")
)]
pub struct CycleError<N: fmt::Debug> {
    /// Nodes on the cycle in traversal order; the first node is repeated at
    /// the end.
    pub cycle: Vec<N>,
}

impl<N: fmt::Debug> CycleError<N> {
    /// Nodes participating in the cycle, closing node included.
    #[must_use]
    pub fn nodes(&self) -> &[N] {
        &self.cycle
    }
}

fn format_cycle<N: fmt::Debug>(cycle: &[N]) -> String {
    cycle.iter().map(|node| format!("{node:?}")).join(" -> ")
}

/// Order `nodes` so every node precedes the nodes its edges name.
///
/// Roots are entered from the last input node to the first and the
/// post-order is reversed at the end, so independent subgraphs keep their
/// relative input order. Nodes that are only reachable through edges are
/// included in the result as well. The lookup is queried once per node.
///
/// # Errors
///
/// Returns [`CycleError`] naming the nodes of the first cycle encountered.
pub fn topologically_sorted<N, I, E>(nodes: I, edges: &E) -> Result<Vec<N>, CycleError<N>>
where
    N: Clone + Eq + Hash + fmt::Debug,
    I: IntoIterator<Item = N>,
    E: EdgeLookup<N> + ?Sized,
{
    let roots: Vec<N> = nodes.into_iter().collect();
    let mut sequencer = Sequencer::new(edges);
    for node in roots.into_iter().rev() {
        if let Some(cycle) = sequencer.visit(node) {
            tracing::debug!(cycle = %format_cycle(&cycle), "sequencing aborted on cycle");
            return Err(CycleError { cycle });
        }
    }
    let mut ordered = sequencer.post_order;
    ordered.reverse();
    Ok(ordered)
}

/// Tracks the visitation state of a node during traversal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// A node on the traversal path and the edges not yet followed from it.
struct Frame<N> {
    node: N,
    pending: std::vec::IntoIter<N>,
}

/// Depth-first traversal with an explicit path stack, so chain length is
/// bounded by heap rather than thread stack.
struct Sequencer<'a, N, E: ?Sized> {
    edges: &'a E,
    states: HashMap<N, VisitState>,
    stack: Vec<Frame<N>>,
    post_order: Vec<N>,
}

impl<'a, N, E> Sequencer<'a, N, E>
where
    N: Clone + Eq + Hash,
    E: EdgeLookup<N> + ?Sized,
{
    fn new(edges: &'a E) -> Self {
        Self {
            edges,
            states: HashMap::new(),
            stack: Vec::new(),
            post_order: Vec::new(),
        }
    }

    /// Finish every node reachable from `root`, returning the cycle path if
    /// one is found.
    fn visit(&mut self, root: N) -> Option<Vec<N>> {
        if self.states.contains_key(&root) {
            return None;
        }
        self.enter(root);
        loop {
            let next = match self.stack.last_mut() {
                None => return None,
                Some(frame) => frame.pending.next(),
            };
            match next {
                Some(node) => match self.states.get(&node).copied() {
                    Some(VisitState::Visited) => {}
                    Some(VisitState::Visiting) => return Some(self.cycle_through(node)),
                    None => self.enter(node),
                },
                None => self.finish(),
            }
        }
    }

    fn enter(&mut self, node: N) {
        self.states.insert(node.clone(), VisitState::Visiting);
        let pending = self.edges.edges_of(&node).into_iter();
        self.stack.push(Frame { node, pending });
    }

    fn finish(&mut self) {
        if let Some(Frame { node, .. }) = self.stack.pop() {
            self.states.insert(node.clone(), VisitState::Visited);
            self.post_order.push(node);
        }
    }

    /// Path from the first visit of `node` back to `node`.
    fn cycle_through(&self, node: N) -> Vec<N> {
        let start = self
            .stack
            .iter()
            .position(|frame| frame.node == node)
            .unwrap_or_default();
        let mut cycle: Vec<N> = self
            .stack
            .iter()
            .skip(start)
            .map(|frame| frame.node.clone())
            .collect();
        cycle.push(node);
        cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::RefCell;

    fn lookup<'a>(graph: &'a [(&'a str, &'a [&'a str])]) -> impl Fn(&&'a str) -> Vec<&'a str> {
        move |node| {
            graph
                .iter()
                .find(|(name, _)| name == node)
                .map(|(_, edges)| edges.to_vec())
                .unwrap_or_default()
        }
    }

    #[test]
    fn sorts_graph_with_single_valid_order() {
        let graph: &[(&str, &[&str])] = &[("a", &["b", "c"]), ("b", &[]), ("c", &["d"]), ("d", &["b"])];
        let order = topologically_sorted(["a", "b", "c", "d"], &lookup(graph)).expect("acyclic");
        assert_eq!(order, vec!["a", "c", "d", "b"]);
    }

    #[test]
    fn reports_four_node_cycle() {
        let graph: &[(&str, &[&str])] = &[("a", &["b"]), ("b", &["c"]), ("c", &["d"]), ("d", &["a"])];
        let err = topologically_sorted(["a", "b", "c", "d"], &lookup(graph)).expect_err("cycle");
        assert_eq!(err.nodes(), &["d", "a", "b", "c", "d"]);
    }

    #[test]
    fn self_edge_is_a_cycle() {
        let graph: &[(&str, &[&str])] = &[("a", &["a"])];
        let err = topologically_sorted(["a"], &lookup(graph)).expect_err("cycle");
        assert_eq!(err.nodes(), &["a", "a"]);
    }

    #[test]
    fn duplicate_edges_are_idempotent() {
        let graph: &[(&str, &[&str])] = &[("a", &["b", "b"]), ("b", &[])];
        let order = topologically_sorted(["b", "a"], &lookup(graph)).expect("acyclic");
        assert_eq!(order, vec!["a", "b"]);
    }

    #[rstest]
    #[case(&["x", "y", "z"], &["x", "y", "z"])]
    #[case(&["z", "x", "y"], &["z", "x", "y"])]
    fn disconnected_nodes_keep_input_order(#[case] input: &[&str], #[case] expected: &[&str]) {
        let order = topologically_sorted(input.iter().copied(), &|_: &&str| Vec::<&str>::new())
            .expect("no edges");
        assert_eq!(order, expected);
    }

    #[test]
    fn nodes_reached_only_through_edges_are_included() {
        let graph: &[(&str, &[&str])] = &[("app", &["lib"])];
        let order = topologically_sorted(["app"], &lookup(graph)).expect("acyclic");
        assert_eq!(order, vec!["app", "lib"]);
    }

    #[test]
    fn queries_each_node_once() {
        let calls = RefCell::new(Vec::new());
        let graph: &[(&str, &[&str])] = &[("a", &["c"]), ("b", &["c"]), ("c", &[])];
        let inner = lookup(graph);
        let counting = |node: &&'static str| {
            calls.borrow_mut().push(*node);
            inner(node)
        };
        topologically_sorted(["a", "b", "c"], &counting).expect("acyclic");
        let mut seen = calls.into_inner();
        seen.sort_unstable();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn sequencer_clears_stack_after_traversal() {
        let graph: &[(&str, &[&str])] = &[("a", &["b"]), ("b", &[])];
        let edges = lookup(graph);
        let mut sequencer = Sequencer::new(&edges);
        assert!(sequencer.visit("a").is_none());
        assert!(sequencer.stack.is_empty(), "stack should be empty after traversal");
        assert_eq!(sequencer.post_order, vec!["b", "a"]);
    }

    #[test]
    fn long_chains_do_not_exhaust_the_stack() {
        const LENGTH: u32 = 200_000;
        let order = topologically_sorted(0..LENGTH, &|node: &u32| node.checked_sub(1))
            .expect("a chain is acyclic");
        assert_eq!(order.len(), 200_000);
        assert_eq!(order.first(), Some(&(LENGTH - 1)));
        assert_eq!(order.last(), Some(&0));
    }

    #[test]
    fn long_rings_report_the_full_cycle() {
        const LENGTH: u32 = 50_000;
        let edges = |node: &u32| Some(node.checked_sub(1).unwrap_or(LENGTH - 1));
        let err = topologically_sorted([LENGTH - 1], &edges).expect_err("ring");
        assert_eq!(err.nodes().len(), 50_001);
        assert_eq!(err.nodes().first(), err.nodes().last());
    }

    #[test]
    fn cycle_error_lists_path() {
        let err = CycleError {
            cycle: vec!["a", "b", "a"],
        };
        assert_eq!(
            err.to_string(),
            "dependency cycle detected: \"a\" -> \"b\" -> \"a\""
        );
    }
}
