//! Data URI payloads sent to the analysis service.
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::engine::AnalysisError;

/// Largest decoded image accepted by the analysis service.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

const DEFAULT_MIME: &str = "image/jpeg";

/// An image encoded as `data:<mime>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    mime: String,
    payload: String,
}

impl ImageData {
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self {
            mime: mime.to_string(),
            payload: BASE64.encode(bytes),
        }
    }

    /// Reads an image file, taking the MIME type from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let mime = mime_for_path(path)?;
        let bytes = std::fs::read(path).map_err(|e| {
            AnalysisError::InvalidInput(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::from_bytes(mime, &bytes))
    }

    /// Splits a data URI into header and payload. A header that does not
    /// name a MIME type falls back to JPEG.
    pub fn parse(uri: &str) -> Result<Self, AnalysisError> {
        let (header, payload) = uri
            .split_once(',')
            .ok_or_else(|| AnalysisError::InvalidInput("missing data URI separator".into()))?;
        if header.is_empty() || payload.is_empty() {
            return Err(AnalysisError::InvalidInput("empty data URI section".into()));
        }
        let mime = header
            .strip_prefix("data:")
            .and_then(|rest| rest.strip_suffix(";base64"))
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME);
        Ok(Self {
            mime: mime.to_string(),
            payload: payload.to_string(),
        })
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.payload)
    }

    /// Decoded size estimated from the base64 length.
    pub fn estimated_size(&self) -> usize {
        self.payload.len() * 3 / 4
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !ALLOWED_MIME_TYPES.contains(&self.mime.as_str()) {
            return Err(AnalysisError::InvalidInput(format!(
                "unsupported image type {} (JPEG, PNG and WebP only)",
                self.mime
            )));
        }
        if self.estimated_size() > MAX_IMAGE_BYTES {
            return Err(AnalysisError::InvalidInput(
                "image is too large (10MB max)".into(),
            ));
        }
        Ok(())
    }

    pub fn decode(&self) -> Result<Vec<u8>, AnalysisError> {
        BASE64
            .decode(&self.payload)
            .map_err(|e| AnalysisError::InvalidInput(format!("invalid base64 payload: {}", e)))
    }
}

pub fn mime_for_path(path: &Path) -> Result<&'static str, AnalysisError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "webp" => Ok("image/webp"),
        _ => Err(AnalysisError::InvalidInput(format!(
            "unsupported image file {}",
            path.display()
        ))),
    }
}
