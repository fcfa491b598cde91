use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LLMConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// `openai_llm` or `openai_compatible_llm`
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_translate_max_chars")]
    pub translate_max_chars: usize,
    #[serde(default = "default_detect_max_chars")]
    pub detect_max_chars: usize,
    /// Target used when the request does not name one.
    #[serde(default = "default_target")]
    pub default_target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Key clients on `X-Forwarded-For`/`X-Real-IP` instead of the socket peer.
    /// Only enable behind a proxy that overwrites these headers.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_provider() -> String {
    "openai_llm".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_translate_max_chars() -> usize {
    500
}

fn default_detect_max_chars() -> usize {
    1000
}

fn default_target() -> String {
    "ko".to_string()
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            translate_max_chars: default_translate_max_chars(),
            detect_max_chars: default_detect_max_chars(),
            default_target: default_target(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            trust_forwarded_headers: false,
        }
    }
}

/// Fatal problems found before the server starts accepting traffic.
#[derive(Debug, Error)]
pub enum StartupConfigError {
    #[error("OPENAI_API_KEY environment variable is required")]
    MissingApiKey,

    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    #[error("Unsupported default target language: {0}")]
    UnsupportedDefaultTarget(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl Config {
    /// Load configuration from an optional YAML file and `TRANSLATE__*` environment variables.
    ///
    /// Later sources win: built-in defaults, then the file, then the environment.
    pub fn load(path: &str) -> Result<Self, StartupConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("TRANSLATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), StartupConfigError> {
        if crate::translate::languages::lookup(&self.limits.default_target).is_none() {
            return Err(StartupConfigError::UnsupportedDefaultTarget(
                self.limits.default_target.clone(),
            ));
        }
        Ok(())
    }
}

/// Read the provider API key from the environment.
///
/// A missing or blank key is fatal; the process must not serve traffic without it.
pub fn load_api_key() -> Result<String, StartupConfigError> {
    api_key_from(std::env::var(API_KEY_ENV).ok())
}

fn api_key_from(value: Option<String>) -> Result<String, StartupConfigError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(StartupConfigError::MissingApiKey),
    }
}
