use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::{error::AppError, utils::media_type};

const JSON: &str = "application/json";
const MULTIPART: &str = "multipart/form-data";

fn guard(req: &Request<Body>, allowed: &[&str], message: &str) -> Result<(), AppError> {
    match media_type(req.headers()) {
        Some(mt) if allowed.contains(&mt.as_str()) => Ok(()),
        _ => Err(AppError::UnsupportedMediaType(message.to_string())),
    }
}

pub async fn require_json(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    guard(&req, &[JSON], "Content-Type must be application/json")?;
    Ok(next.run(req).await)
}

pub async fn require_json_or_multipart(
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    guard(
        &req,
        &[JSON, MULTIPART],
        "Content-Type must be application/json or multipart/form-data",
    )?;
    Ok(next.run(req).await)
}
