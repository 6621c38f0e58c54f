//! Data model and client side of the sock pairing analysis service.
pub mod engine;
pub mod http;
pub mod image_data;
pub mod region;

pub use engine::{AnalysisEngine, AnalysisError};
pub use http::{HttpAnalysisEngine, DEFAULT_ENDPOINT};
pub use image_data::{ImageData, MAX_IMAGE_BYTES};
pub use region::{AnalysisResult, Confidence, NormalizedBox, SockPair};
