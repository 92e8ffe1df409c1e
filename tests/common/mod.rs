#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use findaily::{
    application::content::{ContentError, ContentSource},
    config::{self, CliArgs, Command, ContentOverrides, ServeArgs, ServeOverrides},
    infra::http::{HttpState, build_router},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};

pub const DATA_BASE: &str = "https://data.test";
pub const SITE_BASE: &str = "https://fin-daily.test";

/// In-memory data host keyed by absolute URL.
#[derive(Default)]
pub struct MemorySource {
    documents: HashMap<String, Result<String, ContentError>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, feed: Value) -> Self {
        let url = self.feed_url();
        self.documents.insert(url, Ok(feed.to_string()));
        self
    }

    pub fn with_feed_error(mut self, status: u16) -> Self {
        let url = self.feed_url();
        self.documents
            .insert(url.clone(), Err(ContentError::status(url, status)));
        self
    }

    pub fn with_article(mut self, slug: &str, article: Value) -> Self {
        let url = self.article_url(slug);
        self.documents.insert(url, Ok(article.to_string()));
        self
    }

    pub fn with_raw_article(mut self, slug: &str, body: &str) -> Self {
        let url = self.article_url(slug);
        self.documents.insert(url, Ok(body.to_string()));
        self
    }

    pub fn with_article_error(mut self, slug: &str, status: u16) -> Self {
        let url = self.article_url(slug);
        self.documents
            .insert(url.clone(), Err(ContentError::status(url, status)));
        self
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    fn feed_url(&self) -> String {
        format!("{DATA_BASE}/data/index.json")
    }

    fn article_url(&self, slug: &str) -> String {
        format!("{DATA_BASE}/data/articles/{slug}.json")
    }

    async fn fetch(&self, url: &str) -> Result<String, ContentError> {
        self.documents
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(ContentError::status(url, 404)))
    }
}

/// Twenty-five January issues; even days are tagged `macro`, odd days `fx`.
pub fn january_feed() -> Value {
    let items: Vec<Value> = (1..=25)
        .map(|day| {
            let tag = if day % 2 == 0 { "macro" } else { "fx" };
            json!({
                "slug": format!("2025-01-{day:02}"),
                "title": format!("Issue {day:02}"),
                "published_at": format!("2025-01-{day:02}T07:30:00+09:00"),
                "tags": [tag],
            })
        })
        .collect();
    json!({ "items": items })
}

pub fn sample_article() -> Value {
    json!({
        "title": "FinDaily 2025-01-10",
        "published_at": "2025-01-10T07:30:00+09:00",
        "seo": { "description": "Yen slides as yields climb." },
        "sections": [
            { "type": "highlight", "heading": "Today", "items": ["Stocks up", "Yen down"] },
            {
                "type": "market_table",
                "heading": "株価・為替・債券",
                "columns": ["Name", "Latest", "Change %"],
                "data": [["Nikkei 225", 39500.12, 1.2], ["USD/JPY", null, "NaN"]]
            },
            {
                "type": "news_summary",
                "articles": [
                    {
                        "headline": "Yen slides",
                        "sentiment": "bearish",
                        "summary": "Exporters <b>rally</b>",
                        "source": { "name": "Wire", "url": "https://news.example/yen" }
                    }
                ]
            }
        ]
    })
}

fn settings() -> config::Settings {
    let cli = CliArgs {
        config_file: None,
        command: Some(Command::Serve(Box::new(ServeArgs {
            overrides: ServeOverrides {
                content: ContentOverrides {
                    site_base_url: Some(SITE_BASE.to_string()),
                    feed_base_url: Some(DATA_BASE.to_string()),
                    ..Default::default()
                },
                archive_page_size: Some(20),
                archive_debounce_ms: Some(200),
                ..Default::default()
            },
        }))),
    };
    config::load(&cli).expect("settings load")
}

pub fn router(source: MemorySource) -> Router {
    let content: Arc<dyn ContentSource> = Arc::new(source);
    build_router(HttpState::new(&settings(), content))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

pub fn datastar_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("datastar-request", "true")
        .body(Body::empty())
        .expect("request should build")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}

pub fn content_type(response: &Response<Body>) -> String {
    response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
