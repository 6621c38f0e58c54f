use async_trait::async_trait;
use thiserror::Error;

use crate::image_data::ImageData;
use crate::region::AnalysisResult;

/// Failures reported by an analysis engine. The `Display` text is what the
/// user gets to see.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("invalid image: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Service(String),
    #[error("request failed: {0}")]
    Http(String),
    #[error("malformed analysis response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    async fn analyze(&self, image: &ImageData) -> Result<AnalysisResult, AnalysisError>;
}
