use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenRouter,
    OpenAi,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::OpenRouter => "OpenRouter",
            Provider::OpenAi => "OpenAI",
        }
    }

    /// Routing headers sent on every request besides the bearer token.
    pub(crate) fn extra_headers(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Provider::OpenRouter => &[
                ("HTTP-Referer", "https://threadcraft.ai"),
                ("X-Title", "ThreadCraft"),
            ],
            Provider::OpenAi => &[],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Model id prefixes whose upstream rejects `response_format`.
const JSON_MODE_UNSUPPORTED: &[(Provider, &str)] = &[
    (Provider::OpenRouter, "anthropic/"),
    (Provider::OpenRouter, "google/gemma"),
    (Provider::OpenRouter, "meta-llama/"),
    (Provider::OpenRouter, "perplexity/"),
    (Provider::OpenRouter, "deepseek/deepseek-r1"),
];

#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderConfig {
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    pub fn supports_json_mode(&self) -> bool {
        let model = self.model.to_ascii_lowercase();
        !JSON_MODE_UNSUPPORTED
            .iter()
            .any(|(provider, prefix)| *provider == self.provider && model.starts_with(prefix))
    }
}
