//! HTTP-backed content source for the published data files.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url, header::CACHE_CONTROL};

use crate::application::content::{ContentError, ContentSource};

use super::error::InfraError;

#[derive(Clone, Debug)]
pub struct HttpContentSource {
    client: Client,
    base: Url,
}

impl HttpContentSource {
    pub fn new(data_base_url: &str, timeout: Duration) -> Result<Self, InfraError> {
        let base = Url::parse(data_base_url).map_err(|err| {
            InfraError::configuration(format!("invalid data base URL `{data_base_url}`: {err}"))
        })?;
        if base.cannot_be_a_base() {
            return Err(InfraError::configuration(format!(
                "data base URL `{data_base_url}` cannot carry a path"
            )));
        }

        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("findaily/", env!("CARGO_PKG_VERSION"))
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    fn feed_url(&self) -> String {
        self.endpoint(&["data", "index.json"]).into()
    }

    fn article_url(&self, slug: &str) -> String {
        let file = format!("{slug}.json");
        self.endpoint(&["data", "articles", &file]).into()
    }

    async fn fetch(&self, url: &str) -> Result<String, ContentError> {
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|err| ContentError::transport(url, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::status(url, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|err| ContentError::transport(url, err.to_string()))
    }
}
