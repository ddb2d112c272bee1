use std::collections::{HashSet, VecDeque};

use crate::error::EPS_RESIDUAL;

/// An internal directed edge. Every edge added via `Graph::add_edge` gets a
/// paired reverse edge with zero initial capacity, exactly like a textbook
/// residual-graph representation: `flow = cap - residual` at any point.
#[derive(Debug, Clone, Copy)]
pub struct InternalEdge {
    pub to: usize,
    /// Original working capacity of this directed edge (0 for the reverse
    /// shadow edge paired with every real edge).
    pub cap: f64,
    pub residual: f64,
    pub rev: usize,
}

/// The working graph a Belts solve mutates: original nodes, their split
/// halves, and the virtual source/sink pairs, all addressed by a single
/// dense index space.
#[derive(Debug)]
pub struct Graph {
    adj: Vec<Vec<usize>>,
    edges: Vec<InternalEdge>,
    /// Sort key used to make adjacency iteration order deterministic:
    /// destination-node label, then insertion order among ties (a stable
    /// sort preserves that automatically).
    labels: Vec<String>,
}

impl Graph {
    pub fn new(n: usize) -> Self {
        Graph {
            adj: vec![Vec::new(); n],
            edges: Vec::new(),
            labels: vec![String::new(); n],
        }
    }

    pub fn set_label(&mut self, node: usize, label: String) {
        self.labels[node] = label;
    }

    /// Adds a forward edge `from -> to` with capacity `cap` and its paired
    /// zero-capacity reverse edge. Returns the forward edge's index.
    pub fn add_edge(&mut self, from: usize, to: usize, cap: f64) -> usize {
        let fwd = self.edges.len();
        let rev = fwd + 1;
        self.edges.push(InternalEdge {
            to,
            cap,
            residual: cap,
            rev,
        });
        self.adj[from].push(fwd);
        self.edges.push(InternalEdge {
            to: from,
            cap: 0.0,
            residual: 0.0,
            rev: fwd,
        });
        self.adj[to].push(rev);
        fwd
    }

    pub fn edge(&self, idx: usize) -> InternalEdge {
        self.edges[idx]
    }

    pub fn outgoing(&self, node: usize) -> &[usize] {
        &self.adj[node]
    }

    pub fn node_count(&self) -> usize {
        self.adj.len()
    }

    /// Sorts every node's adjacency list by destination label, stably, so
    /// BFS traversal order is a pure function of the input.
    pub fn finalize_adjacency(&mut self) {
        let to_label: Vec<&str> = self
            .edges
            .iter()
            .map(|e| self.labels[e.to].as_str())
            .collect();
        for list in self.adj.iter_mut() {
            list.sort_by(|&a, &b| to_label[a].cmp(to_label[b]));
        }
    }

    fn augment(&mut self, path: &[usize], amount: f64) {
        for &e in path {
            self.edges[e].residual -= amount;
            let rev = self.edges[e].rev;
            self.edges[rev].residual += amount;
        }
    }
}

struct AugPath {
    edges: Vec<usize>,
    bottleneck: f64,
}

/// Finds a shortest (fewest-edges) augmenting path from `source` to `sink`
/// in the residual graph via BFS, skipping any edge in `forbidden_edges`
/// and any edge whose destination is in `forbidden_nodes`. This is how
/// phase 2 "removes" the super-source/super-sink and the feasibility
/// back-edge without mutating the graph.
fn bfs_augmenting_path(
    graph: &Graph,
    source: usize,
    sink: usize,
    forbidden_nodes: &HashSet<usize>,
    forbidden_edges: &HashSet<usize>,
) -> Option<AugPath> {
    if source == sink {
        return None;
    }

    let n = graph.node_count();
    let mut visited = vec![false; n];
    let mut parent_edge: Vec<Option<usize>> = vec![None; n];
    let mut queue = VecDeque::new();
    visited[source] = true;
    queue.push_back(source);

    'bfs: while let Some(u) = queue.pop_front() {
        for &e in graph.outgoing(u) {
            if forbidden_edges.contains(&e) {
                continue;
            }
            let edge = graph.edge(e);
            if edge.residual <= EPS_RESIDUAL {
                continue;
            }
            if forbidden_nodes.contains(&edge.to) || visited[edge.to] {
                continue;
            }
            visited[edge.to] = true;
            parent_edge[edge.to] = Some(e);
            if edge.to == sink {
                break 'bfs;
            }
            queue.push_back(edge.to);
        }
    }

    if !visited[sink] {
        return None;
    }

    let mut path = Vec::new();
    let mut bottleneck = f64::INFINITY;
    let mut cur = sink;
    while cur != source {
        let e = parent_edge[cur].expect("reachable node must have a parent edge");
        bottleneck = bottleneck.min(graph.edge(e).residual);
        path.push(e);
        cur = graph.edge(graph.edge(e).rev).to;
    }
    path.reverse();
    Some(AugPath {
        edges: path,
        bottleneck,
    })
}

/// Repeatedly augments along shortest residual paths until none remain
/// (Edmonds-Karp), returning the total flow pushed.
pub fn max_flow(
    graph: &mut Graph,
    source: usize,
    sink: usize,
    forbidden_nodes: &HashSet<usize>,
    forbidden_edges: &HashSet<usize>,
) -> f64 {
    let mut total = 0.0;
    while let Some(path) = bfs_augmenting_path(graph, source, sink, forbidden_nodes, forbidden_edges) {
        graph.augment(&path.edges, path.bottleneck);
        total += path.bottleneck;
    }
    total
}

/// The set of nodes reachable from `source` via edges with residual
/// capacity, used for min-cut certificate extraction.
pub fn reachable_from(
    graph: &Graph,
    source: usize,
    forbidden_nodes: &HashSet<usize>,
    forbidden_edges: &HashSet<usize>,
) -> HashSet<usize> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(source);
    queue.push_back(source);
    while let Some(u) = queue.pop_front() {
        for &e in graph.outgoing(u) {
            if forbidden_edges.contains(&e) {
                continue;
            }
            let edge = graph.edge(e);
            if edge.residual <= EPS_RESIDUAL {
                continue;
            }
            if forbidden_nodes.contains(&edge.to) || visited.contains(&edge.to) {
                continue;
            }
            visited.insert(edge.to);
            queue.push_back(edge.to);
        }
    }
    visited
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_max_flow() {
        // 0 -> 1 (10), 1 -> 2 (3)
        let mut g = Graph::new(3);
        for i in 0..3 {
            g.set_label(i, i.to_string());
        }
        g.add_edge(0, 1, 10.0);
        g.add_edge(1, 2, 3.0);
        g.finalize_adjacency();
        let flow = max_flow(&mut g, 0, 2, &HashSet::new(), &HashSet::new());
        assert!((flow - 3.0).abs() < 1e-9);
    }

    #[test]
    fn parallel_paths_sum() {
        let mut g = Graph::new(4);
        for i in 0..4 {
            g.set_label(i, i.to_string());
        }
        g.add_edge(0, 1, 10.0);
        g.add_edge(1, 3, 10.0);
        g.add_edge(0, 2, 10.0);
        g.add_edge(2, 3, 10.0);
        g.finalize_adjacency();
        let flow = max_flow(&mut g, 0, 3, &HashSet::new(), &HashSet::new());
        assert!((flow - 20.0).abs() < 1e-9);
    }

    #[test]
    fn forbidden_node_is_never_traversed() {
        let mut g = Graph::new(3);
        for i in 0..3 {
            g.set_label(i, i.to_string());
        }
        g.add_edge(0, 1, 5.0);
        g.add_edge(1, 2, 5.0);
        g.finalize_adjacency();
        let mut forbidden = HashSet::new();
        forbidden.insert(1);
        let flow = max_flow(&mut g, 0, 2, &forbidden, &HashSet::new());
        assert_eq!(flow, 0.0);
    }
}
