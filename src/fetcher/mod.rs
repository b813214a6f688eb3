//! Retrieves source pages and documents over HTTP.

mod extract;

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use url::Url;

pub use extract::{extract_article, extract_text, Article};

const USER_AGENT: &str = "ThreadCraftBot/0.1";

/// Marker appended to any payload cut down to its character budget.
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

const PREPRINT_HOSTS: &[&str] = &["arxiv.org", "biorxiv.org", "medrxiv.org"];

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Fetch failed: {0}")]
    Status(u16),
    #[error("Could not reach {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Document too large (max {}MB)", .limit / (1024 * 1024))]
    TooLarge { url: String, limit: usize },
}

/// Raw bytes of a fetched document and the content type the server reported.
#[derive(Debug, Clone)]
pub struct Document {
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn is_pdf(&self) -> bool {
        looks_like_pdf(&self.bytes)
            || self
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("application/pdf"))
    }
}

pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    article_char_budget: usize,
    max_body_bytes: usize,
}

/// Body read up to a byte cap; `complete` is false when the cap cut it short.
struct CappedBody {
    bytes: Vec<u8>,
    complete: bool,
}

impl Fetcher {
    pub fn new(
        timeout: Duration,
        article_char_budget: usize,
        max_body_bytes: usize,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            article_char_budget,
            max_body_bytes,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Unreachable {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        Ok(response)
    }

    async fn read_capped(
        &self,
        url: &str,
        mut response: reqwest::Response,
    ) -> Result<CappedBody, FetchError> {
        let cap = self.max_body_bytes;
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })? {
            let room = cap - bytes.len();
            if chunk.len() > room {
                bytes.extend_from_slice(&chunk[..room]);
                return Ok(CappedBody {
                    bytes,
                    complete: false,
                });
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(CappedBody {
            bytes,
            complete: true,
        })
    }

    /// Fetches an HTML page and extracts its article text, truncated to the
    /// configured budget. Pages larger than the body cap are read up to the cap.
    pub async fn fetch_article(&self, url: &str) -> Result<Article, FetchError> {
        let response = self.get(url).await?;
        let body = self.read_capped(url, response).await?;
        if !body.complete {
            tracing::warn!(url, limit = self.max_body_bytes, "Page exceeds body cap, extracting prefix");
        }
        let html = String::from_utf8_lossy(&body.bytes);

        let mut article = extract_article(url, &html);
        article.text = truncate(&article.text, self.article_char_budget);
        tracing::debug!(
            url,
            title = %article.title,
            chars = article.text.chars().count(),
            "Extracted article"
        );
        Ok(article)
    }

    /// Downloads a document whole. Anything over the body cap is rejected
    /// rather than embedded partially.
    pub async fn fetch_document(&self, url: &str) -> Result<Document, FetchError> {
        let response = self.get(url).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = self.read_capped(url, response).await?;
        if !body.complete {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                limit: self.max_body_bytes,
            });
        }

        Ok(Document {
            url: url.to_string(),
            content_type,
            bytes: body.bytes,
        })
    }
}

/// Cuts `text` to at most `budget` characters, marking the cut.
pub fn truncate(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => format!("{}{}", &text[..idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Whether a paper URL should be downloaded rather than handed to the model.
pub fn is_document_target(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".pdf") || is_preprint_host(url)
}

pub fn is_preprint_host(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        PREPRINT_HOSTS
            .iter()
            .any(|known| host == *known || host.ends_with(&format!(".{known}")))
    })
}

/// Points arXiv abstract pages at the matching PDF; other URLs pass through.
pub fn document_url(url: &Url) -> Url {
    let is_arxiv = url
        .host_str()
        .is_some_and(|h| h.eq_ignore_ascii_case("arxiv.org") || h.ends_with(".arxiv.org"));
    match url.path().strip_prefix("/abs/") {
        Some(id) if is_arxiv => {
            let mut pdf = url.clone();
            pdf.set_path(&format!("/pdf/{id}"));
            pdf
        }
        _ => url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn truncate_marks_cut_and_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo wörld", 5), format!("héllo{TRUNCATION_MARKER}"));
        assert_eq!(truncate("exact", 5), "exact");
    }

    #[test]
    fn detects_document_targets() {
        assert!(is_document_target(&url("https://example.org/papers/x.PDF")));
        assert!(is_document_target(&url("https://arxiv.org/abs/1706.03762")));
        assert!(is_document_target(&url("https://www.biorxiv.org/content/10.1101/2020")));
        assert!(!is_document_target(&url("https://blog.example/post")));
        assert!(!is_document_target(&url("https://notarxiv.org/abs/1")));
    }

    #[test]
    fn arxiv_abstract_rewritten_to_pdf() {
        assert_eq!(
            document_url(&url("https://arxiv.org/abs/1706.03762v7")).as_str(),
            "https://arxiv.org/pdf/1706.03762v7"
        );
        assert_eq!(
            document_url(&url("https://example.org/abs/1")).as_str(),
            "https://example.org/abs/1"
        );
    }

    #[test]
    fn pdf_sniffed_from_bytes_or_header() {
        let doc = Document {
            url: "u".into(),
            content_type: None,
            bytes: b"%PDF-1.7 ...".to_vec(),
        };
        assert!(doc.is_pdf());

        let html = Document {
            url: "u".into(),
            content_type: Some("text/html; charset=utf-8".into()),
            bytes: b"<html>".to_vec(),
        };
        assert!(!html.is_pdf());
    }
}
