//! Provider quirks that earn a single relaxed retry.
//!
//! Each row maps a provider (or any provider) and an error signature found in
//! the upstream status and body to the payload change applied before retrying.

use super::provider::Provider;
use super::ChatRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMutation {
    /// Remove `response_format` and tighten the system wording instead.
    DropJsonMode,
    /// Merge the system instruction into the user message.
    FoldSystemMessage,
}

pub struct RetryRule {
    pub provider: Option<Provider>,
    pub statuses: &'static [u16],
    pub signatures: &'static [&'static str],
    pub mutation: PayloadMutation,
}

pub const RETRY_RULES: &[RetryRule] = &[
    RetryRule {
        provider: None,
        statuses: &[400],
        signatures: &["response_format"],
        mutation: PayloadMutation::DropJsonMode,
    },
    RetryRule {
        provider: Some(Provider::OpenRouter),
        statuses: &[400, 422],
        signatures: &["json_object", "json mode", "structured output"],
        mutation: PayloadMutation::DropJsonMode,
    },
    RetryRule {
        provider: None,
        statuses: &[400, 422],
        signatures: &["system role", "role 'system'", "system message", "system prompt"],
        mutation: PayloadMutation::FoldSystemMessage,
    },
];

/// Temperature used for the relaxed retry.
pub const RETRY_TEMPERATURE: f32 = 0.1;

/// First rule matching the failure that still has something to change in
/// `request`.
pub fn find_mutation(
    provider: Provider,
    status: u16,
    body: &str,
    request: &ChatRequest,
) -> Option<PayloadMutation> {
    let body = body.to_ascii_lowercase();
    RETRY_RULES
        .iter()
        .filter(|rule| rule.provider.is_none_or(|p| p == provider))
        .filter(|rule| rule.statuses.contains(&status))
        .filter(|rule| rule.signatures.iter().any(|sig| body.contains(sig)))
        .map(|rule| rule.mutation)
        .find(|mutation| request.can_apply(*mutation))
}
