use std::sync::Arc;

use briefing_core::ContentFragment;
use briefing_logging::{briefing_info, briefing_warn};
use futures_util::future::join_all;

use crate::ContentSource;

/// Fetches every URL of a job concurrently and joins the results.
#[derive(Clone)]
pub struct ContentCollector {
    source: Arc<dyn ContentSource>,
}

impl ContentCollector {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }

    /// One fragment per URL, in input order regardless of completion order.
    /// Every URL gets its own request, all in flight at once.
    ///
    /// Failed fetches are logged and come back with `ok == false`; they are
    /// never retried. Dropping the returned future abandons in-flight fetches.
    pub async fn collect(&self, urls: &[String]) -> Vec<ContentFragment> {
        let fetches = urls.iter().cloned().map(|url| {
            let source = Arc::clone(&self.source);
            async move {
                match source.fetch_text(&url).await {
                    Ok(text) => {
                        briefing_info!("Collected {} chars from {}", text.len(), url);
                        ContentFragment::fetched(url, text)
                    }
                    Err(err) => {
                        briefing_warn!("Skipping {}: {}", url, err);
                        ContentFragment::failed(url)
                    }
                }
            }
        });
        join_all(fetches).await
    }
}
