use std::time::Duration;

use briefing_logging::briefing_debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::convert::{Converter, Html2MdConverter};
use crate::decode::decode_page;
use crate::extract::{Extractor, ReadabilityLikeExtractor};
use crate::fetch::{map_reqwest_error, FetchSettings, ReqwestFetcher};
use crate::{ContentFetchError, FailureKind};

/// Given a URL, returns normalized page text or fails.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, ContentFetchError>;
}

/// Downloads the page itself and turns its main content into markdown.
pub struct HtmlPageSource {
    fetcher: ReqwestFetcher,
    extractor: Box<dyn Extractor>,
    converter: Box<dyn Converter>,
}

impl HtmlPageSource {
    pub fn new(settings: FetchSettings) -> Self {
        Self {
            fetcher: ReqwestFetcher::new(settings),
            extractor: Box::new(ReadabilityLikeExtractor),
            converter: Box::new(Html2MdConverter),
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for HtmlPageSource {
    async fn fetch_text(&self, url: &str) -> Result<String, ContentFetchError> {
        let output = self.fetcher.fetch(url).await?;
        let decoded = decode_page(&output.bytes, output.metadata.content_type.as_deref());
        if decoded.lossy {
            briefing_debug!(
                "Lossy {} decode for {}",
                decoded.encoding_label,
                output.metadata.final_url
            );
        }

        let is_plain_text = output
            .metadata
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.trim_start().starts_with("text/plain"));
        let text = if is_plain_text {
            decoded.text
        } else {
            let extracted = self.extractor.extract(&decoded.text);
            let body = self.converter.to_markdown(&extracted.content_html);
            match extracted.title {
                Some(title) if !body.is_empty() => format!("# {title}\n\n{body}"),
                _ => body,
            }
        };

        non_empty(text)
    }
}

pub const FIRECRAWL_BASE_URL: &str = "https://api.firecrawl.dev";

/// Delegates scraping to the Firecrawl API and keeps its markdown rendition.
pub struct FirecrawlSource {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'a str; 1],
}

#[derive(Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
}

impl FirecrawlSource {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: FIRECRAWL_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl ContentSource for FirecrawlSource {
    async fn fetch_text(&self, url: &str) -> Result<String, ContentFetchError> {
        let endpoint = format!("{}/v1/scrape", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(60))
            .json(&ScrapeRequest {
                url,
                formats: ["markdown"],
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentFetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body: ScrapeResponse = response
            .json()
            .await
            .map_err(|err| ContentFetchError::new(FailureKind::Decode, err.to_string()))?;
        if !body.success {
            return Err(ContentFetchError::new(
                FailureKind::Scraper,
                body.error.unwrap_or_else(|| "scrape unsuccessful".to_string()),
            ));
        }

        let markdown = body.data.and_then(|data| data.markdown).unwrap_or_default();
        non_empty(markdown)
    }
}

fn non_empty(text: String) -> Result<String, ContentFetchError> {
    if text.trim().is_empty() {
        return Err(ContentFetchError::new(
            FailureKind::Empty,
            "page has no readable text",
        ));
    }
    Ok(text)
}
