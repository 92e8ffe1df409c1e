//! Home page: the most recent issue in the feed.

use std::sync::Arc;

use chrono_tz::Tz;
use thiserror::Error;

use crate::application::archive::entry_card;
use crate::application::content::{self, ContentError, ContentSource};
use crate::domain::archive::sort_newest_first;
use crate::domain::feed::IndexEntry;
use crate::presentation::views::LatestView;

#[derive(Debug, Error)]
pub enum LatestError {
    #[error("feed is empty")]
    EmptyFeed,
    #[error(transparent)]
    Content(#[from] ContentError),
}

#[derive(Clone)]
pub struct LatestService {
    content: Arc<dyn ContentSource>,
    timezone: Tz,
}

impl LatestService {
    pub fn new(content: Arc<dyn ContentSource>, timezone: Tz) -> Self {
        Self { content, timezone }
    }

    pub fn feed_url(&self) -> String {
        self.content.feed_url()
    }

    pub async fn latest(&self) -> Result<LatestView, LatestError> {
        let entries = content::load_feed(self.content.as_ref()).await?;
        let entry = latest_entry(entries).ok_or(LatestError::EmptyFeed)?;

        Ok(LatestView {
            entry: entry_card(&entry, self.timezone),
            archive_href: "/archive".to_string(),
        })
    }
}

/// Newest entry by publication instant; undated entries only win when nothing is dated.
pub fn latest_entry(mut entries: Vec<IndexEntry>) -> Option<IndexEntry> {
    sort_newest_first(&mut entries);
    entries.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feed::normalize;
    use serde_json::json;

    fn entries(value: serde_json::Value) -> Vec<IndexEntry> {
        let raw = value.as_array().cloned().expect("array");
        normalize(&raw).entries
    }

    #[test]
    fn picks_the_newest_dated_entry() {
        let feed = entries(json!([
            { "slug": "undated" },
            { "slug": "old", "published_at": "2024-12-31T23:00:00Z" },
            { "slug": "new", "published_at": "2025-02-01" }
        ]));

        let latest = latest_entry(feed).expect("latest");
        assert_eq!(latest.slug, "new");
    }

    #[test]
    fn undated_feed_falls_back_to_first_record() {
        let feed = entries(json!([{ "slug": "a" }, { "slug": "b" }]));
        assert_eq!(latest_entry(feed).expect("latest").slug, "a");
    }

    #[test]
    fn empty_feed_has_no_latest() {
        assert!(latest_entry(Vec::new()).is_none());
        assert_eq!(LatestError::EmptyFeed.to_string(), "feed is empty");
    }
}
