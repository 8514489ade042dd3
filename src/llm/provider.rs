use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AiConfig;
use crate::types::{AiCallOptions, AiResponse, AppError, AppResult};

#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn generate(&self, options: &AiCallOptions) -> AppResult<AiResponse>;
}

/// Entry point for every call to the external model.
#[derive(Clone)]
pub struct AiGateway {
    provider: Arc<dyn AiProvider>,
    default_model: String,
}

impl AiGateway {
    /// Build the gateway for the provider named in configuration.
    pub fn from_config(config: &AiConfig) -> AppResult<Self> {
        let provider: Arc<dyn AiProvider> = match config.provider.to_lowercase().as_str() {
            "gemini" | "google" => Arc::new(crate::llm::gemini::GeminiAdapter::with_base_url(
                &config.api_key,
                &config.base_url,
            )?),
            other => {
                return Err(AppError::Internal(format!("Unsupported AI provider: {}", other)))
            }
        };

        if config.api_key.is_empty() {
            warn!("No AI API key configured, model calls will be rejected upstream");
        }

        Ok(Self::with_provider(provider, &config.default_model))
    }

    pub fn with_provider(provider: Arc<dyn AiProvider>, default_model: &str) -> Self {
        Self {
            provider,
            default_model: default_model.to_string(),
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub async fn call_ai(&self, mut options: AiCallOptions) -> AppResult<AiResponse> {
        if options.model.is_empty() {
            options.model = self.default_model.clone();
        }

        let call_id = Uuid::new_v4();
        let started = Instant::now();
        info!(
            %call_id,
            model = %options.model,
            prompt_len = options.prompt.len(),
            images = options.images.len(),
            format = ?options.response_format,
            "Calling AI model"
        );

        let result = self.provider.generate(&options).await;
        match &result {
            Ok(response) => info!(
                %call_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                response_len = response.text.len(),
                "AI call completed"
            ),
            Err(e) => warn!(%call_id, error = %e, "AI call failed"),
        }
        result
    }
}
