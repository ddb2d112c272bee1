//! Belts engine: generalized max-flow with lower bounds.

mod graph;
mod model;
mod normalize;
mod solve;

pub use model::{BeltsInput, BeltsOutput};

use crate::error::EngineResult;

/// Parses a Belts problem document, solves it, and serializes the result.
///
/// This is the single entry point both the `belts` binary and the
/// integration tests use; it never panics on malformed input, returning
/// `EngineError::MalformedProblem` instead.
pub fn run(input_json: &str) -> EngineResult<String> {
    let input: BeltsInput = serde_json::from_str(input_json)?;
    let output = solve::solve(&input)?;
    Ok(serde_json::to_string(&output)
        .expect("BeltsOutput serialization cannot fail: all fields are plain numbers/strings"))
}
