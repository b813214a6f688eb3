use std::env;
use std::time::Duration;

use crate::gateway::{Provider, ProviderConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("unknown LLM_PROVIDER {0:?}, expected openrouter or openai")]
    UnknownProvider(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub provider: Option<ProviderConfig>,
    pub openrouter_base_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub rate_limit_max_keys: usize,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    pub cache_sweep_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub model_timeout_secs: u64,
    pub article_char_budget: usize,
    pub pdf_char_budget: usize,
    pub max_upload_bytes: usize,
}

pub const DEFAULT_OPENROUTER_MODEL: &str = "anthropic/claude-3.7-sonnet";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".into(),
            server_port: 3000,
            api_base_uri: "/api".into(),
            provider: None,
            openrouter_base_url: DEFAULT_OPENROUTER_BASE_URL.into(),
            rate_limit_window_secs: 600,
            rate_limit_requests: 20,
            rate_limit_max_keys: 10_000,
            cache_ttl_secs: 3600,
            cache_max_entries: 1000,
            cache_sweep_interval_secs: 300,
            fetch_timeout_secs: 20,
            model_timeout_secs: 90,
            article_char_budget: 4000,
            pdf_char_budget: 2_000_000,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Durations may carry a trailing `s` (`RATE_LIMIT_WINDOW=600s`).
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim_end_matches('s')
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let defaults = Config::default();
        let openrouter_base_url =
            var("OPENROUTER_BASE_URL").unwrap_or(defaults.openrouter_base_url);

        Ok(Config {
            server_host: var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or("SERVER_PORT", defaults.server_port)?,
            api_base_uri: var("API_BASE_URI").unwrap_or(defaults.api_base_uri),
            provider: provider_from_env(&openrouter_base_url)?,
            openrouter_base_url,
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW", defaults.rate_limit_window_secs)?,
            rate_limit_requests: parse_or("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests)?,
            rate_limit_max_keys: parse_or("RATE_LIMIT_MAX_KEYS", defaults.rate_limit_max_keys)?,
            cache_ttl_secs: parse_or("CACHE_TTL", defaults.cache_ttl_secs)?,
            cache_max_entries: parse_or("CACHE_MAX_ENTRIES", defaults.cache_max_entries)?,
            cache_sweep_interval_secs: parse_or(
                "CACHE_SWEEP_INTERVAL",
                defaults.cache_sweep_interval_secs,
            )?,
            fetch_timeout_secs: parse_or("FETCH_TIMEOUT", defaults.fetch_timeout_secs)?,
            model_timeout_secs: parse_or("MODEL_TIMEOUT", defaults.model_timeout_secs)?,
            article_char_budget: parse_or("ARTICLE_CHAR_BUDGET", defaults.article_char_budget)?,
            pdf_char_budget: parse_or("PDF_CHAR_BUDGET", defaults.pdf_char_budget)?,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    /// Provider for a request: caller-supplied OpenRouter credentials win over
    /// the environment configuration. A caller model without a key only
    /// applies when the environment provider is OpenRouter. `None` means no
    /// usable key anywhere.
    pub fn resolve_provider(
        &self,
        api_key: Option<&str>,
        model: Option<&str>,
    ) -> Option<ProviderConfig> {
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty());
        let model = model.map(str::trim).filter(|m| !m.is_empty());

        if let Some(key) = api_key {
            return Some(ProviderConfig {
                provider: Provider::OpenRouter,
                api_key: Some(key.to_string()),
                model: model.unwrap_or(DEFAULT_OPENROUTER_MODEL).to_string(),
                base_url: self.openrouter_base_url.clone(),
            });
        }

        // Caller model ids are OpenRouter ids; other vendors keep their own.
        let mut provider = self.provider.clone().filter(|p| p.api_key.is_some())?;
        if let Some(model) = model.filter(|_| provider.provider == Provider::OpenRouter) {
            provider.model = model.to_string();
        }
        Some(provider)
    }
}

fn provider_from_env(openrouter_base_url: &str) -> Result<Option<ProviderConfig>, ConfigError> {
    let openrouter = || ProviderConfig {
        provider: Provider::OpenRouter,
        api_key: var("OPENROUTER_API_KEY"),
        model: var("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.into()),
        base_url: openrouter_base_url.to_string(),
    };
    let openai = || ProviderConfig {
        provider: Provider::OpenAi,
        api_key: var("OPENAI_API_KEY"),
        model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into()),
        base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into()),
    };

    match var("LLM_PROVIDER").map(|p| p.to_lowercase()).as_deref() {
        Some("openrouter") => Ok(Some(openrouter())),
        Some("openai") => Ok(Some(openai())),
        Some(other) => Err(ConfigError::UnknownProvider(other.to_string())),
        None => {
            let candidates = [openrouter(), openai()];
            Ok(candidates.into_iter().find(|p| p.api_key.is_some()))
        }
    }
}
