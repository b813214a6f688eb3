pub mod generate;
pub mod health;
pub mod research;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue,
        header::{REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS},
    },
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use url::Url;

use crate::{
    AppState,
    error::AppError,
    middleware::{log_errors, rate_limit, require_json, require_json_or_multipart},
};

const MAX_URL_LEN: usize = 2048;
/// Room for multipart framing and text fields on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Accepts absolute http(s) URLs of at most 2048 characters.
pub(crate) fn parse_source_url(raw: &str) -> Result<Url, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("Invalid request: url: Required".into()));
    }
    if raw.len() > MAX_URL_LEN {
        return Err(AppError::Validation(format!(
            "Invalid request: url: must be at most {MAX_URL_LEN} characters"
        )));
    }
    let url = Url::parse(raw)
        .map_err(|e| AppError::Validation(format!("Invalid request: url: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Validation(format!(
            "Invalid request: url: unsupported scheme {other:?}"
        ))),
    }
}

fn base_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('/');
    (!trimmed.is_empty()).then(|| format!("/{trimmed}"))
}

pub fn create_router(state: AppState) -> Router {
    let generate = Router::new()
        .route("/generate", post(generate::generate))
        .route_layer(from_fn(require_json));

    let research = Router::new()
        .route("/research/analyze", post(research::analyze))
        .route_layer(from_fn(require_json_or_multipart))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + FORM_OVERHEAD_BYTES,
        ));

    let limited = Router::new()
        .merge(generate)
        .merge(research)
        .route_layer(from_fn_with_state(state.rate_limiter.clone(), rate_limit));

    let api = Router::new()
        .route("/health", get(health::ping))
        .merge(limited);

    let router = match base_path(&state.config.api_base_uri) {
        Some(base) => Router::new().nest(&base, api),
        None => api,
    };

    let router = router.layer(
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::overriding(
                X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
            .layer(from_fn(log_errors)),
    );

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding permissive CORS layer for development");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_url_validation() {
        assert!(parse_source_url(" https://blog.example/post ").is_ok());
        assert!(parse_source_url("ftp://files.example/a").is_err());
        assert!(parse_source_url("not a url").is_err());
        assert!(parse_source_url("").is_err());
        let long = format!("https://a.example/{}", "x".repeat(MAX_URL_LEN));
        assert!(parse_source_url(&long).is_err());
    }

    #[test]
    fn base_path_normalization() {
        assert_eq!(base_path("/api/").as_deref(), Some("/api"));
        assert_eq!(base_path("v1").as_deref(), Some("/v1"));
        assert_eq!(base_path("/"), None);
        assert_eq!(base_path(""), None);
    }
}
