use serde::{Deserialize, Serialize};

use crate::engine::AnalysisError;
use crate::image_data::ImageData;
use crate::region::AnalysisResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub base64_image: String,
}

impl AnalyzeRequest {
    pub fn new(image: &ImageData) -> Self {
        Self {
            base64_image: image.to_data_uri(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Turns a proxy response into a result or an error, never both.
///
/// Success bodies must decode as a complete `AnalysisResult`. Error bodies
/// carry `{"error": "..."}`; anything else falls back to the status code.
pub fn decode_response(status: u16, body: &str) -> Result<AnalysisResult, AnalysisError> {
    if (200..300).contains(&status) {
        return serde_json::from_str::<AnalysisResult>(body)
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()));
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));
    Err(AnalysisError::Service(message))
}
