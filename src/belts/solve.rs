use std::collections::{BTreeSet, HashSet};

use log::{debug, info, warn};

use crate::error::{round6, EngineResult, EPS_TOL};

use super::graph::{max_flow, reachable_from};
use super::model::{BeltsInput, BeltsOutput, Certificate, EdgeRef, FlowOut};
use super::normalize::{self, Normalized};

/// Runs the Belts two-phase solve and shapes the result.
pub fn solve(input: &BeltsInput) -> EngineResult<BeltsOutput> {
    let mut norm = normalize::build(input)?;

    debug!(
        "solving belts problem: {} sources, {} sinks, {} edges",
        input.sources.len(),
        input.sinks.len(),
        input.edges.len()
    );

    // Phase 1: feasibility. Nothing is forbidden yet; the main source/sink
    // admission edges and the T->S back edge are present so feasibility
    // flow can circulate through the declared topology.
    let phase1_flow = max_flow(
        &mut norm.graph,
        norm.aux_source,
        norm.aux_sink,
        &HashSet::new(),
        &HashSet::new(),
    );
    debug!("belts phase 1 (feasibility) pushed {phase1_flow}");

    let unmet: f64 = norm
        .aux_source_edges
        .iter()
        .map(|&e| norm.graph.edge(e).residual)
        .filter(|r| *r > EPS_TOL)
        .sum();

    if unmet > EPS_TOL {
        warn!("belts phase 1 infeasible: {unmet} of lower-bound demand unmet");
        return Ok(BeltsOutput::Infeasible {
            certificate: certificate(&norm, unmet),
        });
    }

    // Flow already circulating through the T->S back edge is real
    // source-to-sink flow that phase 1 happened to realize while
    // satisfying lower bounds (it can carry a required minimum even when
    // no augmenting path in phase 2 ever touches the edges involved, as
    // with two parallel edges whose combined lower bound alone forces
    // routing). It must be counted once, here, since phase 2 forbids the
    // back edge and will never re-derive it.
    let back_edge_flow = {
        let e = norm.graph.edge(norm.back_edge.0);
        e.cap - e.residual
    };

    // Phase 2: remove S*/T* and the feasibility back edge from
    // consideration, then maximize real source-to-sink flow on top of the
    // residual state phase 1 left behind.
    let mut forbidden_nodes = HashSet::new();
    forbidden_nodes.insert(norm.aux_source);
    forbidden_nodes.insert(norm.aux_sink);
    let mut forbidden_edges = HashSet::new();
    forbidden_edges.insert(norm.back_edge.0);
    forbidden_edges.insert(norm.back_edge.1);

    let phase2_flow = max_flow(
        &mut norm.graph,
        norm.main_source,
        norm.main_sink,
        &forbidden_nodes,
        &forbidden_edges,
    );
    let max_flow_value = back_edge_flow + phase2_flow;
    info!("belts phase 2 (main) pushed {phase2_flow}, total max flow {max_flow_value}");

    let mut flows = Vec::with_capacity(norm.real_edges.len());
    for re in &norm.real_edges {
        let edge = norm.graph.edge(re.working_edge);
        let working_flow = edge.cap - edge.residual;
        let flow = re.lo + working_flow;
        debug_assert!(flow >= re.lo - EPS_TOL && flow <= re.hi + EPS_TOL);
        flows.push(FlowOut {
            from: re.from.clone(),
            to: re.to.clone(),
            flow: round6(flow),
        });
    }

    Ok(BeltsOutput::Ok {
        max_flow_per_min: round6(max_flow_value),
        flows,
    })
}

/// Extracts the infeasibility certificate from the current (post phase-1)
/// residual graph.
fn certificate(norm: &Normalized, demand_balance: f64) -> Certificate {
    let reachable = reachable_from(&norm.graph, norm.aux_source, &HashSet::new(), &HashSet::new());

    // An original node counts as reachable if either split half is; a plain
    // BTreeSet dedups the two indices back down to one reported id.
    let cut_reachable: Vec<String> = reachable
        .iter()
        .filter_map(|idx| norm.node_id.get(idx).cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut tight_nodes = Vec::new();
    for sn in &norm.split_nodes {
        let edge = norm.graph.edge(sn.cap_edge);
        let from_in_r = reachable.contains(&node_of_edge_tail(norm, sn.cap_edge));
        let to_in_r = reachable.contains(&edge.to);
        if from_in_r && !to_in_r {
            tight_nodes.push(sn.id.clone());
        }
    }
    tight_nodes.sort();

    let mut tight_edges = Vec::new();
    for re in &norm.real_edges {
        let tail = node_of_edge_tail(norm, re.working_edge);
        let head = norm.graph.edge(re.working_edge).to;
        if reachable.contains(&tail) && !reachable.contains(&head) {
            tight_edges.push(EdgeRef {
                from: re.from.clone(),
                to: re.to.clone(),
            });
        }
    }
    tight_edges.sort_by(|a, b| {
        (a.from.as_str(), a.to.as_str()).cmp(&(b.from.as_str(), b.to.as_str()))
    });

    Certificate {
        cut_reachable,
        tight_nodes,
        tight_edges,
        demand_balance: round6(demand_balance),
    }
}

/// The tail node index of a forward working edge, found via its reverse
/// edge's `to` field (the reverse edge always points back at the tail).
fn node_of_edge_tail(norm: &Normalized, working_edge: usize) -> usize {
    let rev = norm.graph.edge(working_edge).rev;
    norm.graph.edge(rev).to
}
