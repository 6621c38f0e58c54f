use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};

use crate::engine::{AnalysisEngine, AnalysisError};
use crate::image_data::ImageData;
use crate::region::AnalysisResult;

use super::wire::{decode_response, AnalyzeRequest};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/analyze-socks";

/// Posts images to the sock analysis proxy.
pub struct HttpAnalysisEngine {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalysisEngine {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Http(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisEngine for HttpAnalysisEngine {
    async fn analyze(&self, image: &ImageData) -> Result<AnalysisResult, AnalysisError> {
        image.validate()?;
        debug!(
            "posting {} image (~{} bytes) to {}",
            image.mime(),
            image.estimated_size(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest::new(image))
            .send()
            .await
            .map_err(|e| AnalysisError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::Http(e.to_string()))?;

        let result = decode_response(status, &body);
        if let Err(e) = &result {
            warn!("analysis request to {} failed: {}", self.endpoint, e);
        }
        result
    }
}
