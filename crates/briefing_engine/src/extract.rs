use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub content_html: String,
}

pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> ExtractedContent;
}

/// Elements that never carry story text.
const NOISE: &str = "script, style, noscript, nav, header, footer, aside, form, iframe, svg";

/// Lightweight "readability-like" extractor:
/// picks the first `<article>`, else `<main>`, else `<body>`, and drops
/// navigation, scripts and other page chrome inside it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadabilityLikeExtractor;

impl Extractor for ReadabilityLikeExtractor {
    fn extract(&self, html: &str) -> ExtractedContent {
        let doc = Html::parse_document(html);

        let title = select_first(&doc, "title")
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty());

        let root = select_first(&doc, "article")
            .or_else(|| select_first(&doc, "main"))
            .or_else(|| select_first(&doc, "body"))
            .unwrap_or_else(|| doc.root_element());

        ExtractedContent {
            title,
            content_html: strip_noise(root),
        }
    }
}

fn select_first<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector).next()
}

fn strip_noise(root: ElementRef<'_>) -> String {
    let mut content = root.inner_html();
    let Ok(noise) = Selector::parse(NOISE) else {
        return content;
    };
    // Outer matches first, so nested noise is gone with its parent.
    for element in root.select(&noise) {
        let fragment = element.html();
        if !fragment.is_empty() {
            content = content.replacen(&fragment, "", 1);
        }
    }
    content
}
