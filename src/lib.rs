pub mod belts;
pub mod error;
pub mod factory;

pub use error::{EngineError, EngineResult};
