use axum::extract::Multipart;
use serde::Deserialize;

use crate::error::AppError;
use crate::fetcher::looks_like_pdf;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeJsonRequest {
    pub url: Option<String>,
    #[serde(rename = "apiKey", alias = "openrouterApiKey")]
    pub api_key: Option<String>,
    #[serde(rename = "model", alias = "openrouterModel")]
    pub model: Option<String>,
}

/// Either body shape, reduced to the same fields.
#[derive(Debug, Default)]
pub struct AnalyzeInput {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub upload: Option<Vec<u8>>,
}

impl From<AnalyzeJsonRequest> for AnalyzeInput {
    fn from(req: AnalyzeJsonRequest) -> Self {
        AnalyzeInput {
            url: non_empty(req.url),
            api_key: req.api_key,
            model: req.model,
            upload: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid form data: {}", e.body_text()))
}

impl AnalyzeInput {
    /// Reads the `file`, `url` and credential fields of an upload form.
    pub async fn from_multipart(
        mut multipart: Multipart,
        max_upload_bytes: usize,
    ) -> Result<Self, AppError> {
        let mut input = AnalyzeInput::default();
        let mut file: Option<(Option<String>, Vec<u8>)> = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let content_type = field.content_type().map(str::to_ascii_lowercase);
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    file = Some((content_type, bytes.to_vec()));
                }
                "url" => input.url = non_empty(Some(field.text().await.map_err(multipart_error)?)),
                "apiKey" | "openrouterApiKey" => {
                    input.api_key = Some(field.text().await.map_err(multipart_error)?)
                }
                "model" | "openrouterModel" => {
                    input.model = Some(field.text().await.map_err(multipart_error)?)
                }
                _ => {}
            }
        }

        let Some((content_type, bytes)) = file.filter(|(_, bytes)| !bytes.is_empty()) else {
            return Err(AppError::Validation("No file uploaded".into()));
        };
        let declared_pdf = content_type.as_deref() == Some("application/pdf");
        if !declared_pdf && !looks_like_pdf(&bytes) {
            return Err(AppError::UnsupportedMediaType(
                "Only PDF uploads are supported".into(),
            ));
        }
        if bytes.len() > max_upload_bytes {
            return Err(AppError::Validation(format!(
                "PDF too large (max {}MB)",
                max_upload_bytes / (1024 * 1024)
            )));
        }

        input.upload = Some(bytes);
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_accepts_both_credential_spellings() {
        let short: AnalyzeJsonRequest =
            serde_json::from_str(r#"{"url":"https://arxiv.org/abs/1","apiKey":"k","model":"m"}"#).unwrap();
        assert_eq!(short.api_key.as_deref(), Some("k"));
        assert_eq!(short.model.as_deref(), Some("m"));

        let long: AnalyzeJsonRequest =
            serde_json::from_str(r#"{"openrouterApiKey":"k2","openrouterModel":"m2"}"#).unwrap();
        assert_eq!(long.api_key.as_deref(), Some("k2"));
        assert_eq!(long.model.as_deref(), Some("m2"));
    }

    #[test]
    fn blank_url_is_absent() {
        let input = AnalyzeInput::from(AnalyzeJsonRequest {
            url: Some("   ".into()),
            ..Default::default()
        });
        assert!(input.url.is_none());
    }
}
