use std::sync::Arc;

use crate::llm::StatelessLLMInterface;
use crate::middleware::RateLimiter;
use crate::settings::Config;
use crate::translate::TranslationService;

/// Everything a handler needs, constructed once at start-up and shared by clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub translator: TranslationService,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn StatelessLLMInterface>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::from_settings(&config.rate_limit));

        Self {
            config: Arc::new(config),
            translator: TranslationService::new(llm),
            rate_limiter,
        }
    }
}
