//! Resource-allocation graph and simple-cycle enumeration.
//!
//! The graph is rebuilt from a [`SystemState`] on every call and never
//! cached, so it always reflects the current allocation and request tables.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::matrix::Units;
use crate::state::SystemState;

/// A process or resource vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Process(usize),
    Resource(usize),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process(p) => write!(f, "P{p}"),
            Self::Resource(r) => write!(f, "R{r}"),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Direction/meaning of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// `R -> P`: the resource is held by the process.
    Holds,
    /// `P -> R`: the process is waiting for the resource.
    Waits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: Node,
    pub to: Node,
    pub kind: EdgeKind,
    /// Units held or requested.
    pub units: Units,
}

/// Directed graph over `P` process nodes and `R` resource nodes.
///
/// Node ids are dense: processes occupy `0..P`, resources `P..P+R`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceGraph {
    num_processes: usize,
    num_resources: usize,
    edges: Vec<Edge>,
    #[serde(skip)]
    adjacency: Vec<Vec<usize>>,
}

impl ResourceGraph {
    /// Build the graph: `R_r -> P_p` for every positive allocation cell and
    /// `P_p -> R_r` for every positive request cell.
    #[must_use]
    pub fn from_state(state: &SystemState) -> Self {
        let (processes, resources) = (state.num_processes(), state.num_resources());
        let mut graph = Self {
            num_processes: processes,
            num_resources: resources,
            edges: Vec::new(),
            adjacency: vec![Vec::new(); processes + resources],
        };
        for p in 0..processes {
            for r in 0..resources {
                let held = state.allocation().get(p, r);
                if held > 0 {
                    graph.add_edge(Node::Resource(r), Node::Process(p), EdgeKind::Holds, held);
                }
                let wanted = state.request().get(p, r);
                if wanted > 0 {
                    graph.add_edge(Node::Process(p), Node::Resource(r), EdgeKind::Waits, wanted);
                }
            }
        }
        for successors in &mut graph.adjacency {
            successors.sort_unstable();
            successors.dedup();
        }
        graph
    }

    fn add_edge(&mut self, from: Node, to: Node, kind: EdgeKind, units: Units) {
        let (a, b) = (self.index_of(from), self.index_of(to));
        self.adjacency[a].push(b);
        self.edges.push(Edge {
            from,
            to,
            kind,
            units,
        });
    }

    #[must_use]
    pub fn num_processes(&self) -> usize {
        self.num_processes
    }

    #[must_use]
    pub fn num_resources(&self) -> usize {
        self.num_resources
    }

    /// All nodes in id order, including isolated ones.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        (0..self.num_processes + self.num_resources).map(|i| self.node_at(i))
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    fn index_of(&self, node: Node) -> usize {
        match node {
            Node::Process(p) => p,
            Node::Resource(r) => self.num_processes + r,
        }
    }

    fn node_at(&self, index: usize) -> Node {
        if index < self.num_processes {
            Node::Process(index)
        } else {
            Node::Resource(index - self.num_processes)
        }
    }

    /// Every simple directed cycle, via Johnson's algorithm.
    ///
    /// Each cycle starts at its lowest-id node and follows edge direction.
    /// Cycles are grouped by start node; within a group they appear in
    /// depth-first order with successors taken in ascending id.
    #[must_use]
    pub fn simple_cycles(&self) -> Vec<Vec<Node>> {
        let mut search = CycleSearch::new(&self.adjacency);
        for start in 0..self.adjacency.len() {
            search.run_from(start);
        }
        search
            .cycles
            .into_iter()
            .map(|cycle| cycle.into_iter().map(|i| self.node_at(i)).collect())
            .collect()
    }
}

/// Johnson's blocked-set backtracking, restricted per start node to the
/// subgraph of ids `>= start`.
struct CycleSearch<'a> {
    adjacency: &'a [Vec<usize>],
    blocked: Vec<bool>,
    blocked_by: Vec<Vec<usize>>,
    stack: Vec<usize>,
    cycles: Vec<Vec<usize>>,
}

impl<'a> CycleSearch<'a> {
    fn new(adjacency: &'a [Vec<usize>]) -> Self {
        let n = adjacency.len();
        Self {
            adjacency,
            blocked: vec![false; n],
            blocked_by: vec![Vec::new(); n],
            stack: Vec::new(),
            cycles: Vec::new(),
        }
    }

    fn run_from(&mut self, start: usize) {
        self.blocked.fill(false);
        for list in &mut self.blocked_by {
            list.clear();
        }
        self.circuit(start, start);
    }

    fn circuit(&mut self, v: usize, start: usize) -> bool {
        let mut found = false;
        self.stack.push(v);
        self.blocked[v] = true;

        let adjacency = self.adjacency;
        for &w in adjacency[v].iter().filter(|&&w| w >= start) {
            if w == start {
                self.cycles.push(self.stack.clone());
                found = true;
            } else if !self.blocked[w] && self.circuit(w, start) {
                found = true;
            }
        }

        if found {
            self.unblock(v);
        } else {
            for &w in adjacency[v].iter().filter(|&&w| w >= start) {
                if !self.blocked_by[w].contains(&v) {
                    self.blocked_by[w].push(v);
                }
            }
        }
        self.stack.pop();
        found
    }

    fn unblock(&mut self, u: usize) {
        self.blocked[u] = false;
        while let Some(w) = self.blocked_by[u].pop() {
            if self.blocked[w] {
                self.unblock(w);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(allocation: &[Vec<Units>], requests: &[(usize, Vec<Units>)]) -> SystemState {
        let p = allocation.len();
        let r = allocation[0].len();
        let mut s = SystemState::new(p, r).unwrap();
        let max = vec![vec![Units::MAX; r]; p];
        s.set_initial_state(allocation, &max, &vec![0; r]).unwrap();
        for (process, units) in requests {
            s.set_request(*process, units).unwrap();
        }
        s
    }

    #[test]
    fn builds_holds_and_waits_edges() {
        let g = ResourceGraph::from_state(&state(&[vec![2, 0], vec![0, 0]], &[(1, vec![1, 0])]));
        assert_eq!(g.nodes().count(), 4);
        assert_eq!(
            g.edges(),
            &[
                Edge {
                    from: Node::Resource(0),
                    to: Node::Process(0),
                    kind: EdgeKind::Holds,
                    units: 2,
                },
                Edge {
                    from: Node::Process(1),
                    to: Node::Resource(0),
                    kind: EdgeKind::Waits,
                    units: 1,
                },
            ]
        );
    }

    #[test]
    fn two_process_cycle() {
        let g = ResourceGraph::from_state(&state(
            &[vec![1, 0], vec![0, 1]],
            &[(0, vec![0, 1]), (1, vec![1, 0])],
        ));
        assert_eq!(
            g.simple_cycles(),
            vec![vec![
                Node::Process(0),
                Node::Resource(1),
                Node::Process(1),
                Node::Resource(0),
            ]]
        );
    }

    #[test]
    fn acyclic_chain_has_no_cycles() {
        // P0 waits R0, R0 held by P1, P1 waits R1 which nobody holds.
        let g = ResourceGraph::from_state(&state(
            &[vec![0, 0], vec![1, 0]],
            &[(0, vec![1, 0]), (1, vec![0, 1])],
        ));
        assert!(g.simple_cycles().is_empty());
    }

    #[test]
    fn request_on_own_resource_is_a_two_node_cycle() {
        let g = ResourceGraph::from_state(&state(&[vec![1]], &[(0, vec![1])]));
        assert_eq!(
            g.simple_cycles(),
            vec![vec![Node::Process(0), Node::Resource(0)]]
        );
    }

    #[test]
    fn overlapping_cycles_are_all_reported() {
        // R0 held by P0 and P1; P0 waits R1, P1 waits R1; R1 held by P2;
        // P2 waits R0.
        let g = ResourceGraph::from_state(&state(
            &[vec![1, 0], vec![1, 0], vec![0, 1]],
            &[(0, vec![0, 1]), (1, vec![0, 1]), (2, vec![1, 0])],
        ));
        let cycles = g.simple_cycles();
        assert_eq!(cycles.len(), 2);
        assert_eq!(
            cycles[0],
            vec![Node::Process(0), Node::Resource(1), Node::Process(2), Node::Resource(0)]
        );
        assert_eq!(
            cycles[1],
            vec![Node::Process(1), Node::Resource(1), Node::Process(2), Node::Resource(0)]
        );
    }

    #[test]
    fn complete_bipartite_cycle_count() {
        // Every process holds one unit of every resource and requests all
        // of them: K(2,2) in both directions.
        let g = ResourceGraph::from_state(&state(
            &[vec![1, 1], vec![1, 1]],
            &[(0, vec![1, 1]), (1, vec![1, 1])],
        ));
        // 4 two-node cycles + 2 four-node cycles.
        let cycles = g.simple_cycles();
        assert_eq!(cycles.iter().filter(|c| c.len() == 2).count(), 4);
        assert_eq!(cycles.iter().filter(|c| c.len() == 4).count(), 2);
    }

    #[test]
    fn node_labels() {
        assert_eq!(Node::Process(3).to_string(), "P3");
        assert_eq!(Node::Resource(0).to_string(), "R0");
        assert_eq!(serde_json::to_string(&Node::Resource(2)).unwrap(), "\"R2\"");
    }
}
