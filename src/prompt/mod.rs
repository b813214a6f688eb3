//! Instruction templates sent to the model.

use serde::{Deserialize, Serialize};

use crate::fetcher::{Article, truncate};

pub const SOCIAL_SYSTEM_PROMPT: &str =
    "You generate concise social content following platform best practices.";

pub const RESEARCH_SYSTEM_PROMPT: &str = "You are a precise research-paper analyst. \
Return ONLY valid JSON per the user's schema. If information is unavailable, leave empty string or [].";

/// Excerpt length quoted in the social prompt.
const EXCERPT_CHARS: usize = 1200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadType {
    #[default]
    Regular,
    Viral,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Engaging,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    #[default]
    General,
    Saas,
    Developer,
    Marketing,
    Ai,
    Product,
    Design,
    Finance,
    Health,
    Education,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Engaging => "engaging",
        }
    }
}

impl Industry {
    pub fn as_str(self) -> &'static str {
        match self {
            Industry::General => "general",
            Industry::Saas => "saas",
            Industry::Developer => "developer",
            Industry::Marketing => "marketing",
            Industry::Ai => "ai",
            Industry::Product => "product",
            Industry::Design => "design",
            Industry::Finance => "finance",
            Industry::Health => "health",
            Industry::Education => "education",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOptions {
    #[serde(default)]
    pub thread_type: ThreadType,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub industry: Industry,
}

pub fn build_social_prompt(article: &Article, options: &StyleOptions) -> String {
    let thread_style = match options.thread_type {
        ThreadType::Viral => {
            "Viral style: short, punchy, curiosity-driven hooks, strong emotional resonance, \
             occasional emoji allowed, but avoid spammy clickbait."
        }
        ThreadType::Regular => {
            "Regular style: informative, clear, numbered tweets with concise value in each. \
             No hashtags inside tweets."
        }
    };

    let tone_instruction = match options.tone {
        Tone::Engaging => "Tone: engaging, energetic, accessible. Use simple language.",
        Tone::Professional => "Tone: professional, concise, credible. Avoid slang.",
    };

    let industry_context = match options.industry {
        Industry::General => "Industry context: General audience; avoid niche jargon.".to_string(),
        other => format!(
            "Industry context: The audience works in {}. Tailor examples and terminology accordingly.",
            other.as_str()
        ),
    };

    let excerpt = truncate(&article.text, EXCERPT_CHARS);

    format!(
        r#"Source:
- Title: {title}
- Site: {site}
- URL: {url}
- Description: {description}
- Excerpt:
{excerpt}

Guidelines:
- {thread_style}
- {tone_instruction}
- {industry_context}

Tasks:
1) Create an X thread of up to 4 tweets. Each tweet MUST BE ≤ 280 chars (CRITICAL), strong hook, concrete insights, and END each tweet with the thread emoji and count (🧵 1/4, 🧵 2/4, 🧵 3/4, 🧵 4/4). The FINAL tweet (4/4) must include: the original article link, 3 highly relevant well-known accounts to tag (research based on article topic and industry), and 2-3 relevant hashtags. Keep content concise to fit character limits.
2) Create a LinkedIn post 1300–1700 chars, {tone} tone, using PLAIN TEXT ONLY (no markdown formatting), professional emojis for visual appeal, 3 actionable insights, include the original source URL, closing CTA, and 3-5 relevant hashtags at the end.

Return JSON ONLY with keys:
{{
  "thread": ["tweet1", "tweet2", "tweet3", "tweet4"],
  "linkedin": "full post text"
}}"#,
        title = article.title,
        site = article.site_name.as_deref().unwrap_or("Unknown"),
        url = article.url,
        description = article.description.as_deref().unwrap_or("n/a"),
        tone = options.tone.as_str(),
    )
}

const PAPER_SCHEMA: &str = r#"{
  "metadata": { "title": string, "authors": string[], "venue_year": string, "link": string, "code_or_data": string },
  "core_contribution": string,
  "innovations_methodology": string[],
  "significance": { "classification": "Fundamental Advance" | "Significant Increment" | "Niche Contribution" | string, "justification": string },
  "limitations": string[],
  "open_questions": string[],
  "plain_english_summary": string
}"#;

/// Asks the model to read the paper at `url` itself.
pub fn build_paper_url_prompt(url: &str) -> String {
    format!(
        "You will fetch and read the research paper available at this URL and output ONLY JSON \
(no markdown fences) that matches exactly this schema:
{PAPER_SCHEMA}
Constraints:
- Fill fields from the paper. If unknown, use empty string or [].
- metadata.link must be \"{url}\".
- Return only the JSON object."
    )
}

/// Embeds an already base64-encoded PDF.
pub fn build_paper_upload_prompt(pdf_base64: &str, source_url: Option<&str>) -> String {
    let link_rule = match source_url {
        Some(url) => format!("metadata.link must be \"{url}\"."),
        None => "If a source link is not known, set metadata.link to \"\".".to_string(),
    };
    format!(
        "A research paper PDF is provided as base64 below. Read it and output ONLY JSON that \
matches exactly this schema:
{PAPER_SCHEMA}
Constraints:
- Fill fields from the paper. If unknown, use empty string or [].
- {link_rule}
- Return only the JSON object.

PDF_BASE64:
{pdf_base64}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::TRUNCATION_MARKER;

    fn article() -> Article {
        Article {
            title: "Rust in Production".into(),
            site_name: None,
            url: "https://blog.example/rust".into(),
            description: Some("How a team shipped Rust.".into()),
            text: "x".repeat(5000),
        }
    }

    #[test]
    fn social_prompt_embeds_source_and_options() {
        let options = StyleOptions {
            thread_type: ThreadType::Viral,
            tone: Tone::Engaging,
            industry: Industry::Ai,
        };
        let prompt = build_social_prompt(&article(), &options);
        assert!(prompt.starts_with("Source:\n- Title: Rust in Production"));
        assert!(prompt.contains("- Site: Unknown"));
        assert!(prompt.contains("Viral style"));
        assert!(prompt.contains("The audience works in ai."));
        assert!(prompt.contains("engaging tone"));
        assert!(prompt.contains("\"thread\": [\"tweet1\""));
        assert!(!prompt.contains(&"x".repeat(EXCERPT_CHARS + 1)));
    }

    #[test]
    fn long_excerpt_carries_truncation_marker() {
        let prompt = build_social_prompt(&article(), &StyleOptions::default());
        let expected = format!("{}{}\n\nGuidelines:", "x".repeat(EXCERPT_CHARS), TRUNCATION_MARKER);
        assert!(prompt.contains(&expected));

        let mut short = article();
        short.text = "y".repeat(EXCERPT_CHARS);
        let prompt = build_social_prompt(&short, &StyleOptions::default());
        assert!(!prompt.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn general_industry_avoids_jargon() {
        let prompt = build_social_prompt(&article(), &StyleOptions::default());
        assert!(prompt.contains("General audience"));
        assert!(prompt.contains("Regular style"));
        assert!(prompt.contains("professional tone"));
    }

    #[test]
    fn style_options_parse_with_defaults() {
        let options: StyleOptions = serde_json::from_str(r#"{"tone":"engaging"}"#).unwrap();
        assert_eq!(options.tone, Tone::Engaging);
        assert_eq!(options.thread_type, ThreadType::Regular);
        assert_eq!(options.industry, Industry::General);
        assert!(serde_json::from_str::<StyleOptions>(r#"{"tone":"sarcastic"}"#).is_err());
    }

    #[test]
    fn paper_prompts_pin_the_link() {
        let url_prompt = build_paper_url_prompt("https://arxiv.org/abs/1");
        assert!(url_prompt.contains("metadata.link must be \"https://arxiv.org/abs/1\"."));
        assert!(url_prompt.contains("\"plain_english_summary\": string"));

        let upload = build_paper_upload_prompt("JVBERi0=", None);
        assert!(upload.contains("set metadata.link to \"\""));
        assert!(upload.ends_with("PDF_BASE64:\nJVBERi0="));
    }
}
