use std::collections::{BTreeMap, BTreeSet};

use crate::error::{EngineError, EngineResult};

use super::graph::Graph;
use super::model::BeltsInput;

/// Label used for the feasibility super-source, never collides with a real
/// node id since real ids come straight from user JSON and these carry a
/// NUL byte prefix.
const LBL_MAIN_SOURCE: &str = "\0S";
const LBL_MAIN_SINK: &str = "\0T";
const LBL_AUX_SOURCE: &str = "\0S*";
const LBL_AUX_SINK: &str = "\0T*";

/// Where a declared or implicit node sits in the split working graph.
#[derive(Debug, Clone, Copy)]
struct NodeSlot {
    /// Index used as the tail of an outgoing edge.
    out_idx: usize,
    /// Index used as the head of an incoming edge.
    in_idx: usize,
}

/// An original edge's representative in the working graph, kept so flow
/// reconstruction and the certificate can be reported in terms of the
/// caller's own `from`/`to` ids rather than split/virtual indices.
pub struct RealEdge {
    pub from: String,
    pub to: String,
    pub lo: f64,
    pub hi: f64,
    /// Forward working edge standing in for this original edge.
    pub working_edge: usize,
}

/// A node that was split into an in/out pair, with the capacity edge
/// `v_in -> v_out` that represents its throughput cap in the working graph.
pub struct SplitNode {
    pub id: String,
    pub cap_edge: usize,
}

/// The fully built working graph for a Belts solve, plus the bookkeeping
/// needed to translate results back into the caller's vocabulary.
pub struct Normalized {
    pub graph: Graph,
    pub main_source: usize,
    pub main_sink: usize,
    pub aux_source: usize,
    pub aux_sink: usize,
    /// Forward and reverse indices of the phase-1-only `T -> S` back edge.
    pub back_edge: (usize, usize),
    pub real_edges: Vec<RealEdge>,
    pub split_nodes: Vec<SplitNode>,
    /// Working node index -> original id, for every non-virtual node.
    pub node_id: BTreeMap<usize, String>,
    /// Super-source outgoing edges (one per node with positive excess),
    /// used both to check phase-1 saturation and to size `demand_balance`.
    pub aux_source_edges: Vec<usize>,
}

fn validate_id(field: &str, id: &str) -> EngineResult<()> {
    if id.is_empty() {
        return Err(EngineError::MalformedProblem(format!(
            "{field} has an empty identifier"
        )));
    }
    Ok(())
}

/// Builds the working graph: node splitting, the lower-bound offset with
/// its imbalance accounting, the feasibility super-source/sink, and the
/// main virtual source/sink with their back edge.
pub fn build(input: &BeltsInput) -> EngineResult<Normalized> {
    let mut source_ids = BTreeSet::new();
    for s in &input.sources {
        validate_id("a source", &s.id)?;
        if matches!(s.capacity, Some(cap) if cap < 0.0) {
            return Err(EngineError::MalformedProblem(format!(
                "source '{}' has a negative capacity",
                s.id
            )));
        }
        if !source_ids.insert(s.id.clone()) {
            return Err(EngineError::MalformedProblem(format!(
                "source '{}' declared more than once",
                s.id
            )));
        }
    }

    let mut sink_ids = BTreeSet::new();
    for t in &input.sinks {
        validate_id("a sink", t)?;
        if !sink_ids.insert(t.clone()) {
            return Err(EngineError::MalformedProblem(format!(
                "sink '{t}' declared more than once"
            )));
        }
    }

    for id in source_ids.intersection(&sink_ids) {
        return Err(EngineError::MalformedProblem(format!(
            "'{id}' is declared as both a source and a sink"
        )));
    }

    let mut node_caps: BTreeMap<String, Option<f64>> = BTreeMap::new();
    for n in &input.nodes {
        validate_id("a node", &n.id)?;
        if matches!(n.capacity, Some(cap) if cap < 0.0) {
            return Err(EngineError::MalformedProblem(format!(
                "node '{}' has a negative capacity",
                n.id
            )));
        }
        if node_caps.insert(n.id.clone(), n.capacity).is_some() {
            return Err(EngineError::MalformedProblem(format!(
                "node '{}' declared more than once",
                n.id
            )));
        }
    }

    if input.edges.is_empty() {
        return Err(EngineError::MalformedProblem(
            "problem has no edges".into(),
        ));
    }

    let mut all_ids: BTreeSet<String> = BTreeSet::new();
    all_ids.extend(source_ids.iter().cloned());
    all_ids.extend(sink_ids.iter().cloned());
    all_ids.extend(node_caps.keys().cloned());
    for e in &input.edges {
        validate_id("an edge endpoint", &e.from)?;
        validate_id("an edge endpoint", &e.to)?;
        if e.lo < 0.0 {
            return Err(EngineError::MalformedProblem(format!(
                "edge {}->{} has a negative lower bound",
                e.from, e.to
            )));
        }
        if e.hi < e.lo {
            return Err(EngineError::MalformedProblem(format!(
                "edge {}->{} has hi < lo",
                e.from, e.to
            )));
        }
        all_ids.insert(e.from.clone());
        all_ids.insert(e.to.clone());
    }

    // Source capacities, keyed by id, for the main admission edges.
    let source_caps: BTreeMap<String, Option<f64>> = input
        .sources
        .iter()
        .map(|s| (s.id.clone(), s.capacity))
        .collect();

    // A sentinel far larger than any real flow that could pass through the
    // graph, used for "unlimited" admission/back-edge capacities so BFS
    // augmentation never treats them as the bottleneck.
    let total_hi: f64 = input.edges.iter().map(|e| e.hi).sum::<f64>().max(1.0);
    let sentinel = total_hi * 1e6 + 1e9;

    // Every real/split node gets one or two working indices; four more for
    // the virtual source/sink pair and the feasibility super-source/sink.
    let split_eligible: BTreeSet<&String> = node_caps
        .iter()
        .filter(|(id, cap)| cap.is_some() && !source_ids.contains(*id) && !sink_ids.contains(*id))
        .map(|(id, _)| id)
        .collect();

    let mut next_idx = 0usize;
    let mut slots: BTreeMap<String, NodeSlot> = BTreeMap::new();
    for id in &all_ids {
        if split_eligible.contains(id) {
            let in_idx = next_idx;
            let out_idx = next_idx + 1;
            next_idx += 2;
            slots.insert(id.clone(), NodeSlot { in_idx, out_idx });
        } else {
            let idx = next_idx;
            next_idx += 1;
            slots.insert(id.clone(), NodeSlot { in_idx: idx, out_idx: idx });
        }
    }

    let main_source = next_idx;
    let main_sink = next_idx + 1;
    let aux_source = next_idx + 2;
    let aux_sink = next_idx + 3;
    let node_count = next_idx + 4;

    let mut graph = Graph::new(node_count);
    let mut node_id = BTreeMap::new();
    for (id, slot) in &slots {
        graph.set_label(slot.in_idx, id.clone());
        node_id.insert(slot.in_idx, id.clone());
        if slot.out_idx != slot.in_idx {
            graph.set_label(slot.out_idx, id.clone());
            node_id.insert(slot.out_idx, id.clone());
        }
    }
    graph.set_label(main_source, LBL_MAIN_SOURCE.to_string());
    graph.set_label(main_sink, LBL_MAIN_SINK.to_string());
    graph.set_label(aux_source, LBL_AUX_SOURCE.to_string());
    graph.set_label(aux_sink, LBL_AUX_SINK.to_string());

    let mut split_nodes = Vec::new();
    for id in &split_eligible {
        let slot = slots[*id];
        let cap = node_caps[*id].expect("split_eligible nodes always carry Some(capacity)");
        let cap_edge = graph.add_edge(slot.in_idx, slot.out_idx, cap);
        split_nodes.push(SplitNode {
            id: (*id).clone(),
            cap_edge,
        });
    }

    let mut excess: BTreeMap<String, f64> = BTreeMap::new();
    let mut real_edges = Vec::with_capacity(input.edges.len());
    for e in &input.edges {
        let from_slot = slots[&e.from];
        let to_slot = slots[&e.to];
        let working_cap = e.hi - e.lo;
        let working_edge = graph.add_edge(from_slot.out_idx, to_slot.in_idx, working_cap);
        *excess.entry(e.from.clone()).or_insert(0.0) -= e.lo;
        *excess.entry(e.to.clone()).or_insert(0.0) += e.lo;
        real_edges.push(RealEdge {
            from: e.from.clone(),
            to: e.to.clone(),
            lo: e.lo,
            hi: e.hi,
            working_edge,
        });
    }

    let mut aux_source_edges = Vec::new();
    for id in &all_ids {
        let slot = slots[id];
        let e = excess.get(id).copied().unwrap_or(0.0);
        if e > crate::error::EPS_TOL {
            let idx = graph.add_edge(aux_source, slot.in_idx, e);
            aux_source_edges.push(idx);
        } else if e < -crate::error::EPS_TOL {
            graph.add_edge(slot.out_idx, aux_sink, -e);
        }
    }

    for id in &source_ids {
        let slot = slots[id];
        let cap = source_caps.get(id).copied().flatten().unwrap_or(sentinel);
        graph.add_edge(main_source, slot.in_idx, cap);
    }
    for id in &sink_ids {
        let slot = slots[id];
        graph.add_edge(slot.out_idx, main_sink, sentinel);
    }
    let back_fwd = graph.add_edge(main_sink, main_source, sentinel);
    let back_rev = graph.edge(back_fwd).rev;

    graph.finalize_adjacency();

    Ok(Normalized {
        graph,
        main_source,
        main_sink,
        aux_source,
        aux_sink,
        back_edge: (back_fwd, back_rev),
        real_edges,
        split_nodes,
        node_id,
        aux_source_edges,
    })
}
