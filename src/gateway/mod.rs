//! Chat-completions client for the configured LLM provider.

mod provider;
pub mod retry;

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

pub use provider::{Provider, ProviderConfig};
use retry::PayloadMutation;

/// Appended to the system prompt whenever strict JSON mode is not sent.
pub const STRICT_JSON_SUFFIX: &str = "Respond with a single valid JSON object and nothing else. \
Do not wrap it in markdown code fences and do not add commentary.";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{provider} error: {status} {body}")]
    Upstream {
        provider: Provider,
        status: u16,
        body: String,
    },
    #[error("{0} returned empty content")]
    EmptyContent(Provider),
    #[error("{provider} returned an unreadable response: {message}")]
    Decode { provider: Provider, message: String },
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} did not answer within {secs}s")]
    Timeout { provider: Provider, secs: u64 },
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// What the caller wants from one completion.
#[derive(Debug, Clone, Copy)]
pub struct Completion<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub json_mode: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    pub fn build(provider: &ProviderConfig, completion: &Completion<'_>) -> Self {
        let strict = completion.json_mode && provider.supports_json_mode();
        let system = if completion.json_mode && !strict {
            format!("{} {}", completion.system, STRICT_JSON_SUFFIX)
        } else {
            completion.system.to_string()
        };

        ChatRequest {
            model: provider.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: completion.prompt.to_string(),
                },
            ],
            temperature: completion.temperature,
            response_format: strict.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }

    pub(crate) fn can_apply(&self, mutation: PayloadMutation) -> bool {
        match mutation {
            PayloadMutation::DropJsonMode => self.response_format.is_some(),
            PayloadMutation::FoldSystemMessage => self.messages.iter().any(|m| m.role == "system"),
        }
    }

    /// Relaxed copy of the request for the single retry.
    pub fn relaxed(&self, mutation: PayloadMutation) -> Self {
        let mut next = self.clone();
        next.temperature = next.temperature.min(retry::RETRY_TEMPERATURE);

        match mutation {
            PayloadMutation::DropJsonMode => {
                next.response_format = None;
                if let Some(system) = next.messages.iter_mut().find(|m| m.role == "system") {
                    if !system.content.contains(STRICT_JSON_SUFFIX) {
                        system.content.push(' ');
                        system.content.push_str(STRICT_JSON_SUFFIX);
                    }
                }
            }
            PayloadMutation::FoldSystemMessage => {
                let system: Vec<String> = next
                    .messages
                    .iter()
                    .filter(|m| m.role == "system")
                    .map(|m| m.content.clone())
                    .collect();
                next.messages.retain(|m| m.role != "system");
                if let Some(user) = next.messages.iter_mut().find(|m| m.role == "user") {
                    user.content = format!("{}\n\n{}", system.join("\n"), user.content);
                }
            }
        }
        next
    }
}

#[derive(Clone)]
pub struct ModelGateway {
    client: reqwest::Client,
    timeout: Duration,
}

impl ModelGateway {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        // The deadline in `call` bounds the whole exchange, retry included.
        let client = reqwest::Client::builder().connect_timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    /// Sends one completion and returns the raw model text.
    ///
    /// A failure whose signature appears in [`retry::RETRY_RULES`] is retried
    /// exactly once with the matching relaxation; anything else is returned as
    /// is. The whole exchange, retry included, runs under the configured
    /// deadline.
    pub async fn call(
        &self,
        provider: &ProviderConfig,
        completion: Completion<'_>,
    ) -> Result<String, GatewayError> {
        let request = ChatRequest::build(provider, &completion);
        match tokio::time::timeout(self.timeout, self.call_with_retry(provider, request)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                provider: provider.provider,
                secs: self.timeout.as_secs(),
            }),
        }
    }

    async fn call_with_retry(
        &self,
        provider: &ProviderConfig,
        request: ChatRequest,
    ) -> Result<String, GatewayError> {
        let err = match self.send(provider, &request).await {
            Ok(content) => return Ok(content),
            Err(err) => err,
        };

        let mutation = match &err {
            GatewayError::Upstream { status, body, .. } => {
                retry::find_mutation(provider.provider, *status, body, &request)
            }
            _ => None,
        };
        let Some(mutation) = mutation else {
            return Err(err);
        };

        tracing::warn!(
            provider = %provider.provider,
            model = %provider.model,
            ?mutation,
            "Provider rejected request shape, retrying once: {}",
            err
        );
        self.send(provider, &request.relaxed(mutation)).await
    }

    async fn send(
        &self,
        provider: &ProviderConfig,
        request: &ChatRequest,
    ) -> Result<String, GatewayError> {
        let name = provider.provider;
        let mut builder = self
            .client
            .post(provider.endpoint())
            .bearer_auth(provider.api_key.as_deref().unwrap_or_default())
            .json(request);
        for (header, value) in name.extra_headers() {
            builder = builder.header(*header, *value);
        }

        let response = builder.send().await.map_err(|source| GatewayError::Transport {
            provider: name,
            source,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| GatewayError::Transport {
            provider: name,
            source,
        })?;

        if !status.is_success() {
            return Err(GatewayError::Upstream {
                provider: name,
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
            provider: name,
            message: e.to_string(),
        })?;

        match completion_content(&json) {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(GatewayError::EmptyContent(name)),
        }
    }
}

/// `choices[0].message.content`, either a string or a list of text parts.
fn completion_content(json: &Value) -> Option<String> {
    let content = json.pointer("/choices/0/message/content")?;
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let text: String = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            Some(text)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider(model: &str) -> ProviderConfig {
        ProviderConfig {
            provider: Provider::OpenRouter,
            api_key: Some("k".into()),
            model: model.into(),
            base_url: "http://localhost".into(),
        }
    }

    fn completion(json_mode: bool) -> Completion<'static> {
        Completion {
            system: "Be precise.",
            prompt: "Analyze this.",
            temperature: 0.2,
            json_mode,
        }
    }

    #[test]
    fn json_mode_sets_response_format_when_supported() {
        let request = ChatRequest::build(&provider("openai/gpt-4o"), &completion(true));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
        assert_eq!(body["messages"][0]["content"], "Be precise.");
    }

    #[test]
    fn unsupported_vendor_gets_stricter_wording_instead() {
        let request = ChatRequest::build(&provider("anthropic/claude-3.7-sonnet"), &completion(true));
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("response_format").is_none());
        assert!(request.messages[0].content.ends_with(STRICT_JSON_SUFFIX));
    }

    #[test]
    fn relaxed_drop_json_mode_lowers_temperature() {
        let request = ChatRequest::build(&provider("openai/gpt-4o"), &completion(true));
        let relaxed = request.relaxed(PayloadMutation::DropJsonMode);
        assert!(relaxed.response_format.is_none());
        assert_eq!(relaxed.temperature, retry::RETRY_TEMPERATURE);
        assert!(relaxed.messages[0].content.contains(STRICT_JSON_SUFFIX));
    }

    #[test]
    fn relaxed_fold_system_leaves_single_user_message() {
        let request = ChatRequest::build(&provider("openai/gpt-4o"), &completion(false));
        let relaxed = request.relaxed(PayloadMutation::FoldSystemMessage);
        assert_eq!(relaxed.messages.len(), 1);
        assert_eq!(relaxed.messages[0].role, "user");
        assert_eq!(relaxed.messages[0].content, "Be precise.\n\nAnalyze this.");
    }

    #[test]
    fn content_parts_are_concatenated() {
        let body = json!({
            "choices": [{"message": {"content": [
                {"type": "text", "text": "{\"a\":"},
                {"type": "text", "text": "1}"}
            ]}}]
        });
        assert_eq!(completion_content(&body).as_deref(), Some("{\"a\":1}"));
        assert_eq!(completion_content(&json!({"choices": []})), None);
    }
}
