use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Best-effort text pulled out of an article page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub site_name: Option<String>,
    pub url: String,
    pub description: Option<String>,
    pub text: String,
}

const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, blockquote, pre";
const SKIPPED_ANCESTORS: &[&str] = &["script", "style", "noscript", "nav", "footer", "header", "aside"];

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn meta_content(doc: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    doc.select(&sel)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    doc.select(&sel)
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn inside_chrome(el: &ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| SKIPPED_ANCESTORS.contains(&ancestor.value().name()))
}

/// Collects heading and paragraph-like blocks outside page chrome, joined by
/// blank lines. Nested blocks (a `p` inside an `li`) are taken once, at the
/// outermost level. Returns an empty string when nothing matched.
pub fn extract_text(doc: &Html) -> String {
    let Some(blocks) = selector(BLOCK_SELECTOR) else {
        return String::new();
    };
    let block_names: Vec<&str> = BLOCK_SELECTOR.split(", ").collect();

    doc.select(&blocks)
        .filter(|el| !inside_chrome(el))
        .filter(|el| {
            !el.ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| block_names.contains(&ancestor.value().name()))
        })
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn extract_article(url: &str, html: &str) -> Article {
    let doc = Html::parse_document(html);

    let title = meta_content(&doc, r#"meta[property="og:title"]"#)
        .or_else(|| meta_content(&doc, r#"meta[name="twitter:title"]"#))
        .or_else(|| first_text(&doc, "title"))
        .unwrap_or_else(|| "Untitled".to_string());

    Article {
        title,
        site_name: meta_content(&doc, r#"meta[property="og:site_name"]"#),
        url: url.to_string(),
        description: meta_content(&doc, r#"meta[property="og:description"]"#)
            .or_else(|| meta_content(&doc, r#"meta[name="description"]"#)),
        text: extract_text(&doc),
    }
}
