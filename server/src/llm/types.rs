//! LLM types — provider-neutral vision request types and errors.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The HTTP request to the LLM provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The LLM provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The LLM provider response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl LlmError {
    /// Whether retrying the same request could plausibly succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::ApiRequest(_) | Self::ApiResponse { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// IMAGE PAYLOAD
// =============================================================================

/// A base64-encoded image ready for a vision request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedImage {
    /// MIME type, e.g. `image/png`.
    pub media_type: String,
    /// Standard base64 of the raw file bytes.
    pub base64: String,
}

impl EncodedImage {
    /// Data URL form used by OpenAI-style APIs.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64)
    }
}

/// Map a file extension to the MIME type sent to the provider. Unknown
/// extensions fall back to JPEG, matching what plan scans usually are.
#[must_use]
pub fn media_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "image/jpeg",
    }
}

// =============================================================================
// VISION TRAIT
// =============================================================================

/// Provider-neutral async trait for single-image vision extraction. Enables
/// mocking in tests.
#[async_trait::async_trait]
pub trait VisionExtract: Send + Sync {
    /// Send one system-prompted vision request and return the raw model text.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails, the response is
    /// malformed, or the API key is absent.
    async fn extract(
        &self,
        system: &str,
        prompt: &str,
        image: &EncodedImage,
    ) -> Result<String, LlmError>;
}
