//! Index feed records and their normalization.

use serde_json::Value;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::FormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use super::error::DomainError;

const DATE_ONLY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

const LOCAL_DATETIME_FORMATS: &[&[FormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

/// One archive listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub slug: String,
    pub title: String,
    /// Publication timestamp exactly as the feed spelled it.
    pub published_at: String,
    /// Parsed instant; `None` when missing or unparsable.
    pub published: Option<OffsetDateTime>,
    pub kind: String,
    pub tags: Vec<String>,
}

impl IndexEntry {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }

    /// Lower-cased text the keyword filter searches.
    pub fn haystack(&self) -> String {
        format!("{} {}", self.title, self.tags.join(" ")).to_lowercase()
    }
}

/// Outcome of [`normalize`]: kept entries plus the per-record rejections.
#[derive(Debug, Default)]
pub struct Normalized {
    pub entries: Vec<IndexEntry>,
    pub rejected: Vec<DomainError>,
}

/// Turn raw feed records into [`IndexEntry`] values, dropping records without a slug.
pub fn normalize(raw: &[Value]) -> Normalized {
    let mut normalized = Normalized::default();
    for (index, value) in raw.iter().enumerate() {
        match entry_from_value(index, value) {
            Ok(entry) => normalized.entries.push(entry),
            Err(err) => normalized.rejected.push(err),
        }
    }
    normalized
}

fn entry_from_value(index: usize, value: &Value) -> Result<IndexEntry, DomainError> {
    let slug = non_empty_str(value.get("slug"))
        .ok_or_else(|| DomainError::missing_identifier(index, "slug"))?
        .to_string();

    let title = non_empty_str(value.get("title"))
        .map(str::to_string)
        .unwrap_or_else(|| default_title(&slug));

    let published_at = non_empty_str(value.get("published_at"))
        .unwrap_or_default()
        .to_string();
    let published = parse_published_at(&published_at);

    let kind = non_empty_str(value.get("type"))
        .unwrap_or_default()
        .to_string();

    let tags = value
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(IndexEntry {
        slug,
        title,
        published_at,
        published,
        kind,
        tags,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

pub fn default_title(slug: &str) -> String {
    format!("Fin Daily {slug}")
}

/// Parse the feed's timestamp spellings. Values without an offset are read as UTC.
pub fn parse_published_at(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(parsed);
    }

    if let Ok(date) = Date::parse(trimmed, DATE_ONLY_FORMAT) {
        return Some(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc());
    }

    LOCAL_DATETIME_FORMATS.iter().find_map(|format| {
        PrimitiveDateTime::parse(trimmed, format)
            .ok()
            .map(PrimitiveDateTime::assume_utc)
    })
}
