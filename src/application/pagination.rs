//! Opaque "load more" cursor for the archive listing.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::archive::MonthKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ArchiveCursorPayload {
    page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_month: Option<String>,
}

/// Position within a filtered archive view: the next page to render and the
/// month heading the previous page ended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveCursor {
    page: usize,
    last_month: Option<MonthKey>,
}

impl ArchiveCursor {
    pub fn new(page: usize, last_month: Option<MonthKey>) -> Self {
        Self { page, last_month }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn last_month(&self) -> Option<MonthKey> {
        self.last_month
    }

    pub fn encode(&self) -> String {
        let payload = ArchiveCursorPayload {
            page: self.page,
            last_month: self.last_month.map(|key| key.to_string()),
        };
        let serialized = serde_json::to_vec(&payload).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(serialized)
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let payload: ArchiveCursorPayload = serde_json::from_slice(&bytes)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let last_month = payload
            .last_month
            .map(|raw| {
                MonthKey::parse(&raw).ok_or_else(|| {
                    PaginationError::InvalidCursor(format!("unknown month key `{raw}`"))
                })
            })
            .transpose()?;
        Ok(Self {
            page: payload.page,
            last_month,
        })
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}
