use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, State},
};
use base64::{Engine, engine::general_purpose::STANDARD};

use super::model::{AnalyzeInput, AnalyzeJsonRequest};
use crate::{
    AppState,
    error::AppError,
    fetcher::{document_url, is_document_target, truncate},
    gateway::Completion,
    normalizer::{PaperAnalysis, normalize},
    prompt::{RESEARCH_SYSTEM_PROMPT, build_paper_upload_prompt, build_paper_url_prompt},
    routes::parse_source_url,
    utils::media_type,
};

const RESEARCH_TEMPERATURE: f32 = 0.2;

async fn read_input(state: &AppState, req: Request) -> Result<AnalyzeInput, AppError> {
    if media_type(req.headers()).as_deref() == Some("multipart/form-data") {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Invalid form data: {}", e.body_text())))?;
        return AnalyzeInput::from_multipart(multipart, state.config.max_upload_bytes).await;
    }

    let Json(body) = Json::<AnalyzeJsonRequest>::from_request(req, state)
        .await
        .map_err(|e| AppError::Validation(format!("Invalid request: {}", e.body_text())))?;
    Ok(body.into())
}

/// Builds the analysis prompt. Direct PDF links and preprint pages are
/// downloaded and embedded when they really are PDFs; any other URL is left
/// for the model to read.
async fn build_prompt(state: &AppState, input: &AnalyzeInput) -> Result<String, AppError> {
    let budget = state.config.pdf_char_budget;

    if let Some(bytes) = &input.upload {
        let encoded = truncate(&STANDARD.encode(bytes), budget);
        return Ok(build_paper_upload_prompt(&encoded, input.url.as_deref()));
    }

    let Some(raw_url) = input.url.as_deref() else {
        return Err(AppError::Validation(
            "Provide a PDF or preprint URL or upload a PDF via multipart/form-data".into(),
        ));
    };
    let url = parse_source_url(raw_url)?;

    if is_document_target(&url) {
        let document = state.fetcher.fetch_document(document_url(&url).as_str()).await?;
        if document.is_pdf() {
            tracing::debug!(url = %document.url, bytes = document.bytes.len(), "Embedding fetched PDF");
            let encoded = truncate(&STANDARD.encode(&document.bytes), budget);
            return Ok(build_paper_upload_prompt(&encoded, Some(raw_url)));
        }
    }

    Ok(build_paper_url_prompt(raw_url))
}

/// Paper URL or PDF upload in, structured analysis out.
#[axum::debug_handler]
pub async fn analyze(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<PaperAnalysis>, AppError> {
    let input = read_input(&state, req).await?;

    if input.upload.is_none() && input.url.is_none() {
        return Err(AppError::Validation(
            "Provide a PDF or preprint URL or upload a PDF via multipart/form-data".into(),
        ));
    }
    if let Some(url) = input.url.as_deref() {
        parse_source_url(url)?;
    }

    let provider = state
        .config
        .resolve_provider(input.api_key.as_deref(), input.model.as_deref())
        .ok_or_else(|| AppError::Validation("Missing model credentials".into()))?;

    let prompt = build_prompt(&state, &input).await?;
    let raw = state
        .gateway
        .call(
            &provider,
            Completion {
                system: RESEARCH_SYSTEM_PROMPT,
                prompt: &prompt,
                temperature: RESEARCH_TEMPERATURE,
                json_mode: true,
            },
        )
        .await?;

    let analysis = normalize::<PaperAnalysis>(&raw).with_canonical_link(input.url.as_deref());
    Ok(Json(analysis))
}
