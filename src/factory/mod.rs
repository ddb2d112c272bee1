//! Factory engine: steady-state production-rate optimization.

mod classify;
mod lp;
mod model;
mod rate;
mod solve;

pub use model::{FactoryInput, FactoryOutput, Problem};

use crate::error::EngineResult;

/// Parses a Factory problem document, solves it, and serializes the result.
///
/// This is the single entry point both the `factory` binary and the
/// integration tests use; it never panics on malformed input, returning
/// `EngineError::MalformedProblem` instead.
pub fn run(input_json: &str) -> EngineResult<String> {
    let input: FactoryInput = serde_json::from_str(input_json)?;
    let problem = Problem::from_input(input)?;
    let output = solve::solve(problem)?;
    Ok(serde_json::to_string(&output)
        .expect("FactoryOutput serialization cannot fail: all fields are plain numbers/strings"))
}
