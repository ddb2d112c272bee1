use thiserror::Error;

/// Errors that abort an engine invocation with exit code 1.
///
/// `SolverInfeasible` is deliberately absent: constraint infeasibility is
/// not an error, it is a normal solve outcome reported through the
/// `status` field of the result document (see `factory::run` /
/// `belts::run`).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed problem: {0}")]
    MalformedProblem(String),

    #[error("numeric anomaly: {0}")]
    NumericAnomaly(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::MalformedProblem(format!("invalid JSON: {err}"))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Rounds to six decimal places, half-away-from-zero.
///
/// The six-decimal precision is fixed by spec; the rounding rule is an
/// implementer decision recorded in DESIGN.md.
pub fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

/// Tolerance for conservation/saturation/bound classification, used
/// identically by both engines so certificate and outcome never disagree.
pub const EPS_TOL: f64 = 1e-9;

/// Tolerance below which a residual capacity is treated as exhausted.
pub const EPS_RESIDUAL: f64 = 1e-12;
