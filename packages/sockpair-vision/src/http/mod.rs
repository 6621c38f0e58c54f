mod engine;
pub mod wire;

pub use engine::{HttpAnalysisEngine, DEFAULT_ENDPOINT};
