use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use super::model::{CacheKey, GenerateRequest, GenerateResponse, STUB_MODEL};
use crate::{
    AppState,
    cache::fingerprint,
    error::AppError,
    gateway::Completion,
    normalizer::{SocialContent, normalize},
    prompt::{SOCIAL_SYSTEM_PROMPT, build_social_prompt},
    routes::parse_source_url,
};

const SOCIAL_TEMPERATURE: f32 = 0.7;

/// Article URL in, X thread and LinkedIn post out.
///
/// Results are cached per URL, style options and model. The cache is written
/// only after the whole pipeline succeeded; a dropped connection leaves it
/// untouched.
#[axum::debug_handler]
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(req) =
        payload.map_err(|e| AppError::Validation(format!("Invalid request: {}", e.body_text())))?;
    let url = parse_source_url(&req.url)?;

    let provider = state.config.resolve_provider(
        req.openrouter_api_key.as_deref(),
        req.openrouter_model.as_deref(),
    );
    let model = provider
        .as_ref()
        .map(|p| p.model.clone())
        .unwrap_or_else(|| STUB_MODEL.to_string());

    let key = fingerprint(&CacheKey {
        url: url.as_str(),
        options: &req.options,
        model: &model,
    })
    .map_err(|e| AppError::Internal(e.to_string()))?;

    if let Some(mut hit) = state.cache.get(&key) {
        tracing::debug!(url = %url, "Serving cached generation");
        hit.cached = true;
        return Ok(Json(hit));
    }

    let article = state.fetcher.fetch_article(url.as_str()).await?;

    let content = match &provider {
        Some(provider) => {
            let prompt = build_social_prompt(&article, &req.options);
            let raw = state
                .gateway
                .call(
                    provider,
                    Completion {
                        system: SOCIAL_SYSTEM_PROMPT,
                        prompt: &prompt,
                        temperature: SOCIAL_TEMPERATURE,
                        json_mode: false,
                    },
                )
                .await?;
            normalize::<SocialContent>(&raw)
        }
        None => {
            tracing::info!("No provider credentials configured, serving canned content");
            SocialContent::canned()
        }
    };

    let response = GenerateResponse::new(content, &article, req.options, model);
    state.cache.put(key, response.clone());
    Ok(Json(response))
}
