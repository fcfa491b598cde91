use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::llm::openai_compatible_llm::OpenAICompatibleLLM;
use crate::llm::StatelessLLMInterface;
use crate::settings::{LLMConfig, StartupConfigError};

/// Factory for creating stateless LLM instances
pub struct StatelessLLMFactory;

impl StatelessLLMFactory {
    /// Create an LLM based on the configuration.
    ///
    /// # Arguments
    /// * `config` - LLM section of the service configuration
    /// * `api_key` - Provider key, already checked to be non-empty
    pub fn create_llm(
        config: &LLMConfig,
        api_key: String,
    ) -> Result<Arc<dyn StatelessLLMInterface>> {
        info!("Initializing LLM: {}", config.provider);

        match config.provider.as_str() {
            "openai_llm" | "openai_compatible_llm" => Ok(Arc::new(OpenAICompatibleLLM::new(
                config.model.clone(),
                config.base_url.clone(),
                api_key,
                Duration::from_secs(config.timeout_secs),
            )?)),
            other => Err(StartupConfigError::UnsupportedProvider(other.to_string()).into()),
        }
    }
}
