use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::{
    cache::{RateDecision, RateLimiter},
    error::AppError,
    utils::caller_identity,
};

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let caller = caller_identity(&req);
    let decision = limiter.check(&caller);

    if let RateDecision::Deny { .. } = decision {
        let retry_after = decision.retry_after_secs().unwrap_or(1);
        tracing::warn!(caller = %caller, retry_after, "Rate limit exceeded");
        return Err(AppError::RateLimited { retry_after });
    }

    Ok(next.run(req).await)
}
