//! LLM — multi-provider vision adapter for dimension extraction.
//!
//! DESIGN
//! ======
//! The extraction service talks to a single [`VisionExtract`] trait object.
//! `VisionClient` is the concrete implementation, dispatching to Anthropic
//! or `OpenAI` based on `LLM_PROVIDER`, configured entirely from environment
//! variables.

pub mod anthropic;
pub mod config;
pub mod openai;
pub mod types;

use config::{LlmConfig, LlmProviderKind};
pub use types::{EncodedImage, LlmError, VisionExtract, media_type_for};

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete vision client that dispatches to either Anthropic or OpenAI.
///
/// Configured from environment variables by [`VisionClient::from_env`].
pub struct VisionClient {
    inner: VisionProvider,
    model: String,
}

enum VisionProvider {
    Anthropic(anthropic::AnthropicClient),
    OpenAi(openai::OpenAiClient),
}

impl VisionClient {
    /// Build a vision client from environment variables.
    ///
    /// - `LLM_PROVIDER`: "openai" (default) or "anthropic"
    /// - `LLM_API_KEY_ENV`: name of env var holding the key (e.g. `OPENAI_API_KEY`)
    /// - `LLM_MODEL`: model name (e.g. "gpt-4o")
    /// - `LLM_OPENAI_BASE_URL`: custom base URL for OpenAI-compatible APIs
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        let config = LlmConfig::from_env()?;
        Self::from_config(config)
    }

    /// Build a vision client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let model = config.model.clone();
        let inner = match config.provider {
            LlmProviderKind::Anthropic => {
                VisionProvider::Anthropic(anthropic::AnthropicClient::new(config.api_key, config.timeouts)?)
            }
            LlmProviderKind::OpenAi => VisionProvider::OpenAi(openai::OpenAiClient::new(
                config.api_key,
                config.openai_base_url,
                config.timeouts,
            )?),
        };
        Ok(Self { inner, model })
    }

    /// Return the configured model name (e.g. `"gpt-4o"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl VisionExtract for VisionClient {
    async fn extract(
        &self,
        system: &str,
        prompt: &str,
        image: &EncodedImage,
    ) -> Result<String, LlmError> {
        match &self.inner {
            VisionProvider::Anthropic(c) => c.extract(&self.model, system, prompt, image).await,
            VisionProvider::OpenAi(c) => c.extract(&self.model, system, prompt, image).await,
        }
    }
}
