//! Loading the index feed and article documents from the data host.

use std::time::Instant;

use async_trait::async_trait;
use findaily_feed_types::{ArticleDocument, FeedDocument};
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::articles::Article;
use crate::domain::feed::{self, IndexEntry};

pub const METRIC_FETCH_TOTAL: &str = "findaily_fetch_total";
pub const METRIC_FETCH_FAILED_TOTAL: &str = "findaily_fetch_failed_total";
pub const METRIC_FEED_DROPPED_TOTAL: &str = "findaily_feed_dropped_total";
pub const METRIC_FETCH_MS: &str = "findaily_fetch_ms";

const LOG_TARGET: &str = "findaily::content";

#[derive(Debug, Clone, Error)]
pub enum ContentError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("malformed document at {url}: {message}")]
    Parse { url: String, message: String },
}

impl ContentError {
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn parse(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// The URL whose fetch or parse failed.
    pub fn url(&self) -> &str {
        match self {
            ContentError::Status { url, .. }
            | ContentError::Transport { url, .. }
            | ContentError::Parse { url, .. } => url,
        }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            ContentError::Status { .. } | ContentError::Transport { .. }
        )
    }
}

/// Read-only access to the published data files.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Location of `data/index.json`.
    fn feed_url(&self) -> String;

    /// Location of `data/articles/{slug}.json`.
    fn article_url(&self, slug: &str) -> String;

    /// Fetch the body at `url`, failing on transport errors and non-success statuses.
    async fn fetch(&self, url: &str) -> Result<String, ContentError>;
}

/// Fetch and normalize the index feed. Records without a slug are dropped.
pub async fn load_feed(source: &dyn ContentSource) -> Result<Vec<IndexEntry>, ContentError> {
    let url = source.feed_url();
    let body = fetch_document(source, &url, "feed").await?;

    let document: FeedDocument = serde_json::from_str(&body).map_err(|err| {
        ContentError::parse(
            &url,
            format!("expected an array or an object with `items`: {err}"),
        )
    })?;

    let normalized = feed::normalize(&document.into_items());
    if !normalized.rejected.is_empty() {
        let dropped = normalized.rejected.len();
        counter!(METRIC_FEED_DROPPED_TOTAL).increment(dropped as u64);
        debug!(
            target: LOG_TARGET,
            url = %url,
            dropped,
            first = %normalized.rejected[0],
            "dropped feed records without a slug"
        );
    }

    Ok(normalized.entries)
}

/// Fetch one article document by slug.
pub async fn load_article(source: &dyn ContentSource, slug: &str) -> Result<Article, ContentError> {
    let url = source.article_url(slug);
    let body = fetch_document(source, &url, "article").await?;

    let document: ArticleDocument =
        serde_json::from_str(&body).map_err(|err| ContentError::parse(&url, err.to_string()))?;

    Ok(Article::from(document))
}

async fn fetch_document(
    source: &dyn ContentSource,
    url: &str,
    document: &'static str,
) -> Result<String, ContentError> {
    counter!(METRIC_FETCH_TOTAL, "document" => document).increment(1);
    debug!(target: LOG_TARGET, url = %url, document, "fetching document");

    let started_at = Instant::now();
    let result = source.fetch(url).await;
    histogram!(METRIC_FETCH_MS, "document" => document)
        .record(started_at.elapsed().as_secs_f64() * 1000.0);

    result.inspect_err(|err| {
        counter!(METRIC_FETCH_FAILED_TOTAL, "document" => document).increment(1);
        warn!(target: LOG_TARGET, url = %url, document, error = %err, "document fetch failed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedSource {
        bodies: HashMap<String, Result<String, ContentError>>,
    }

    impl FixedSource {
        fn with(url: &str, body: Result<&str, ContentError>) -> Self {
            let mut bodies = HashMap::new();
            bodies.insert(url.to_string(), body.map(str::to_string));
            Self { bodies }
        }
    }

    #[async_trait]
    impl ContentSource for FixedSource {
        fn feed_url(&self) -> String {
            "https://data.test/data/index.json".to_string()
        }

        fn article_url(&self, slug: &str) -> String {
            format!("https://data.test/data/articles/{slug}.json")
        }

        async fn fetch(&self, url: &str) -> Result<String, ContentError> {
            self.bodies
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(ContentError::status(url, 404)))
        }
    }

    #[tokio::test]
    async fn feed_accepts_wrapped_items_and_drops_slugless_records() {
        let source = FixedSource::with(
            "https://data.test/data/index.json",
            Ok(r#"{ "items": [{ "slug": "a" }, { "title": "orphan" }] }"#),
        );

        let entries = load_feed(&source).await.expect("feed");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Fin Daily a");
    }

    #[tokio::test]
    async fn feed_with_wrong_shape_is_a_parse_error() {
        let source = FixedSource::with(
            "https://data.test/data/index.json",
            Ok(r#"{ "entries": [] }"#),
        );

        let err = load_feed(&source).await.expect_err("shape error");
        assert!(matches!(err, ContentError::Parse { .. }));
        assert_eq!(err.url(), "https://data.test/data/index.json");
    }

    #[tokio::test]
    async fn missing_article_is_a_fetch_error_with_url() {
        let source = FixedSource {
            bodies: HashMap::new(),
        };

        let err = load_article(&source, "2025-01-10")
            .await
            .expect_err("fetch error");
        assert!(err.is_fetch());
        assert_eq!(err.url(), "https://data.test/data/articles/2025-01-10.json");
        assert_eq!(
            err.to_string(),
            "HTTP 404 from https://data.test/data/articles/2025-01-10.json"
        );
    }

    #[tokio::test]
    async fn invalid_article_json_is_a_parse_error() {
        let source = FixedSource::with(
            "https://data.test/data/articles/x.json",
            Ok("{ not json"),
        );

        let err = load_article(&source, "x").await.expect_err("parse error");
        assert!(!err.is_fetch());
    }
}
