use serde::{Deserialize, Serialize};

use crate::fetcher::Article;
use crate::normalizer::SocialContent;
use crate::prompt::StyleOptions;

/// `meta.model` when no provider credentials are available.
pub const STUB_MODEL: &str = "stub";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub url: String,
    #[serde(flatten)]
    pub options: StyleOptions,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub title: String,
    #[serde(rename = "siteName")]
    pub site_name: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Counts {
    pub x: Vec<usize>,
    pub linkedin: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationMeta {
    pub options: StyleOptions,
    pub counts: Counts,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub thread: Vec<String>,
    pub linkedin: String,
    pub source: SourceInfo,
    pub meta: GenerationMeta,
    pub cached: bool,
}

/// Parameters that decide a generation result; hashed into the cache key.
#[derive(Serialize)]
pub(super) struct CacheKey<'a> {
    pub url: &'a str,
    pub options: &'a StyleOptions,
    pub model: &'a str,
}

impl GenerateResponse {
    pub fn new(content: SocialContent, article: &Article, options: StyleOptions, model: String) -> Self {
        let counts = Counts {
            x: content.thread.iter().map(|t| t.chars().count()).collect(),
            linkedin: content.linkedin.chars().count(),
        };

        GenerateResponse {
            thread: content.thread,
            linkedin: content.linkedin,
            source: SourceInfo {
                title: article.title.clone(),
                site_name: article.site_name.clone(),
                url: article.url.clone(),
            },
            meta: GenerationMeta {
                options,
                counts,
                model,
            },
            cached: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{Industry, ThreadType, Tone};

    #[test]
    fn request_accepts_camel_case_options() {
        let req: GenerateRequest = serde_json::from_str(
            r#"{"url":"https://a.example","threadType":"viral","industry":"finance","openrouterApiKey":"k"}"#,
        )
        .unwrap();
        assert_eq!(req.options.thread_type, ThreadType::Viral);
        assert_eq!(req.options.tone, Tone::Professional);
        assert_eq!(req.options.industry, Industry::Finance);
        assert_eq!(req.openrouter_api_key.as_deref(), Some("k"));
    }

    #[test]
    fn response_counts_characters() {
        let article = Article {
            title: "T".into(),
            site_name: Some("S".into()),
            url: "https://a.example/post".into(),
            description: None,
            text: String::new(),
        };
        let content = SocialContent {
            thread: vec!["héllo 🧵".into()],
            linkedin: "abc".into(),
        };
        let response = GenerateResponse::new(content, &article, StyleOptions::default(), "m".into());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["meta"]["counts"]["x"][0], 7);
        assert_eq!(json["meta"]["counts"]["linkedin"], 3);
        assert_eq!(json["source"]["siteName"], "S");
        assert_eq!(json["meta"]["options"]["threadType"], "regular");
        assert_eq!(json["cached"], false);
    }
}
