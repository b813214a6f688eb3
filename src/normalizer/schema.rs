use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{object_field, string_field, string_list, Normalize};

/// Tweets kept from a model reply.
pub const MAX_THREAD_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialContent {
    pub thread: Vec<String>,
    pub linkedin: String,
}

impl SocialContent {
    /// Canned thread and post, also served when no provider is configured.
    pub fn canned() -> Self {
        SocialContent {
            thread: vec![
                "Hook about the article. Key insight. 🧵 1/4".into(),
                "Insight #1 with value. 🧵 2/4".into(),
                "Insight #2 with value. 🧵 3/4".into(),
                "CTA. [URL] @account1 @account2 @account3 #tag1 #tag2 🧵 4/4".into(),
            ],
            linkedin: "🚀 Hook about the article.\n\n\
                💡 Insight 1 with actionable value\n\
                📈 Insight 2 with practical application\n\
                🎯 Insight 3 with clear takeaway\n\n\
                What are your thoughts on this?\n\n\
                Read the full article: [URL]\n\n\
                #marketing #content #growth"
                .into(),
        }
    }
}

impl Normalize for SocialContent {
    fn fallback() -> Self {
        SocialContent::canned()
    }

    fn reconcile(object: &Map<String, Value>) -> Self {
        let mut thread = string_list(object, "thread");
        thread.truncate(MAX_THREAD_LEN);
        SocialContent {
            thread,
            linkedin: string_field(object, "linkedin"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub venue_year: String,
    pub link: String,
    pub code_or_data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Significance {
    pub classification: String,
    pub justification: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperAnalysis {
    pub metadata: PaperMetadata,
    pub core_contribution: String,
    pub innovations_methodology: Vec<String>,
    pub significance: Significance,
    pub limitations: Vec<String>,
    pub open_questions: Vec<String>,
    pub plain_english_summary: String,
}

impl PaperAnalysis {
    /// The link the caller asked about replaces whatever the model reported.
    pub fn with_canonical_link(mut self, link: Option<&str>) -> Self {
        self.metadata.link = link.unwrap_or_default().to_string();
        self
    }
}

impl Normalize for PaperAnalysis {
    fn fallback() -> Self {
        PaperAnalysis::default()
    }

    fn reconcile(object: &Map<String, Value>) -> Self {
        let empty = Map::new();
        let metadata = object_field(object, "metadata").unwrap_or(&empty);
        let significance = object_field(object, "significance").unwrap_or(&empty);

        PaperAnalysis {
            metadata: PaperMetadata {
                title: string_field(metadata, "title"),
                authors: string_list(metadata, "authors"),
                venue_year: string_field(metadata, "venue_year"),
                link: string_field(metadata, "link"),
                code_or_data: string_field(metadata, "code_or_data"),
            },
            core_contribution: string_field(object, "core_contribution"),
            innovations_methodology: string_list(object, "innovations_methodology"),
            significance: Significance {
                classification: string_field(significance, "classification"),
                justification: string_field(significance, "justification"),
            },
            limitations: string_list(object, "limitations"),
            open_questions: string_list(object, "open_questions"),
            plain_english_summary: string_field(object, "plain_english_summary"),
        }
    }
}
