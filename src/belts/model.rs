use serde::{Deserialize, Serialize};

/// A declared source, with an optional capacity (`None` = unlimited).
#[derive(Debug, Deserialize)]
pub struct SourceInput {
    pub id: String,
    #[serde(default)]
    pub capacity: Option<f64>,
}

/// A capacity-bounded interior node eligible for the node split.
#[derive(Debug, Deserialize)]
pub struct NodeInput {
    pub id: String,
    #[serde(default)]
    pub capacity: Option<f64>,
}

/// A directed edge with a required lower bound and an upper bound.
#[derive(Debug, Deserialize, Clone)]
pub struct EdgeInput {
    pub from: String,
    pub to: String,
    pub lo: f64,
    pub hi: f64,
}

/// Top-level Belts problem document.
#[derive(Debug, Deserialize)]
pub struct BeltsInput {
    pub sources: Vec<SourceInput>,
    pub sinks: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<NodeInput>,
    pub edges: Vec<EdgeInput>,
}

/// One edge's realized flow in the success output.
#[derive(Debug, Serialize, Clone)]
pub struct FlowOut {
    pub from: String,
    pub to: String,
    pub flow: f64,
}

/// An edge identity, used to reference tight/cut edges without flow values.
#[derive(Debug, Serialize, Clone)]
pub struct EdgeRef {
    pub from: String,
    pub to: String,
}

/// Infeasibility certificate: the cut that proves the solve could not
/// satisfy every demand.
#[derive(Debug, Serialize)]
pub struct Certificate {
    pub cut_reachable: Vec<String>,
    pub tight_nodes: Vec<String>,
    pub tight_edges: Vec<EdgeRef>,
    pub demand_balance: f64,
}

/// Result document emitted on stdout, tagged by `status`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BeltsOutput {
    Ok {
        max_flow_per_min: f64,
        flows: Vec<FlowOut>,
    },
    Infeasible {
        certificate: Certificate,
    },
}
