//! Deadlock detection over the resource-allocation graph.
//!
//! Resource instances are not merged into a single-instance wait-for graph:
//! the search runs on the bipartite allocation/request graph directly. For
//! single-instance resources a cycle is a deadlock. For multi-instance
//! resources a cycle only means a deadlock is *possible*; a process may be
//! waiting on a resource that another, non-cycle holder will release.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::graph::{Node, ResourceGraph};
use crate::state::SystemState;

/// Outcome of [`detect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlockReport {
    pub has_deadlock: bool,
    /// Every simple cycle, each starting at its lowest node id.
    pub cycles: Vec<Vec<Node>>,
    /// Processes appearing in at least one cycle, ascending.
    pub processes_in_cycles: Vec<usize>,
}

/// Search the current allocation/request graph for cycles.
#[must_use]
pub fn detect(state: &SystemState) -> DeadlockReport {
    let cycles = ResourceGraph::from_state(state).simple_cycles();
    let processes_in_cycles: BTreeSet<usize> = cycles
        .iter()
        .flatten()
        .filter_map(|node| match node {
            Node::Process(p) => Some(*p),
            Node::Resource(_) => None,
        })
        .collect();
    DeadlockReport {
        has_deadlock: !cycles.is_empty(),
        cycles,
        processes_in_cycles: processes_in_cycles.into_iter().collect(),
    }
}
