//! Archive filtering, ordering, pagination, and month grouping.
//!
//! Everything here is a pure function of the loaded entries and a
//! [`FilterState`]; the HTTP layer only decides which slice to render.

use std::collections::BTreeSet;
use std::fmt;

use chrono_tz::Tz;
use time::{Date, Month, format_description::FormatItem, macros::format_description};

use super::feed::IndexEntry;
use crate::util::timezone;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
const INPUT_DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

const UNKNOWN_MONTH_KEY: &str = "unknown";

/// User-controlled narrowing of the archive listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Trimmed, lower-cased keyword. Empty means no keyword filter.
    pub query: String,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub active_tag: Option<String>,
}

impl FilterState {
    /// Build a filter from raw form inputs. Unparsable dates disable that bound.
    pub fn from_inputs(
        query: Option<&str>,
        date_from: Option<&str>,
        date_to: Option<&str>,
        tag: Option<&str>,
    ) -> Self {
        Self {
            query: query.unwrap_or_default().trim().to_lowercase(),
            date_from: date_from.and_then(parse_input_date),
            date_to: date_to.and_then(parse_input_date),
            active_tag: tag
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.active_tag.is_none()
    }

    /// Whether `entry` satisfies every active predicate.
    pub fn matches(&self, entry: &IndexEntry, tz: Tz) -> bool {
        if let Some(published) = entry.published {
            if let Some(from) = self.date_from.and_then(|date| timezone::day_start(date, tz))
                && published < from
            {
                return false;
            }
            if let Some(to) = self.date_to.and_then(|date| timezone::day_end(date, tz))
                && published > to
            {
                return false;
            }
        }

        if let Some(tag) = self.active_tag.as_deref()
            && !entry.has_tag(tag)
        {
            return false;
        }

        self.query.is_empty() || entry.haystack().contains(&self.query)
    }
}

pub fn parse_input_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), INPUT_DATE_FORMAT).ok()
}

pub fn format_input_date(date: Date) -> String {
    date.format(INPUT_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

pub fn format_human_date(date: Date) -> String {
    date.format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Filter and order entries: newest first, undated last, ties in feed order.
pub fn apply_filters(entries: &[IndexEntry], state: &FilterState, tz: Tz) -> Vec<IndexEntry> {
    let mut filtered: Vec<IndexEntry> = entries
        .iter()
        .filter(|entry| state.matches(entry, tz))
        .cloned()
        .collect();
    sort_newest_first(&mut filtered);
    filtered
}

/// Stable descending sort by instant; `None` compares lowest so it lands last.
pub fn sort_newest_first(entries: &mut [IndexEntry]) {
    entries.sort_by(|left, right| right.published.cmp(&left.published));
}

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub items: &'a [IndexEntry],
    pub has_more: bool,
}

/// Slice `filtered` into zero-based page `page` of `page_size` items.
pub fn paginate(filtered: &[IndexEntry], page: usize, page_size: usize) -> Page<'_> {
    let size = page_size.max(1);
    let start = page.saturating_mul(size).min(filtered.len());
    let end = start.saturating_add(size).min(filtered.len());
    Page {
        items: &filtered[start..end],
        has_more: end < filtered.len(),
    }
}

/// Calendar month bucket used for archive headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonthKey {
    Known { year: i32, month: Month },
    Unknown,
}

impl MonthKey {
    pub fn for_entry(entry: &IndexEntry, tz: Tz) -> Self {
        match entry.published {
            Some(published) => {
                let (year, month) = timezone::localized_year_month(published, tz);
                match Month::try_from(month) {
                    Ok(month) => MonthKey::Known { year, month },
                    Err(_) => MonthKey::Unknown,
                }
            }
            None => MonthKey::Unknown,
        }
    }

    /// Inverse of the `Display` form (`YYYY-MM` or `unknown`).
    pub fn parse(value: &str) -> Option<Self> {
        if value == UNKNOWN_MONTH_KEY {
            return Some(MonthKey::Unknown);
        }
        let (year, month) = value.split_once('-')?;
        let year = year.parse::<i32>().ok()?;
        let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
        Some(MonthKey::Known { year, month })
    }

    pub fn label(&self) -> String {
        match self {
            MonthKey::Known { year, month } => format!("{month} {year}"),
            MonthKey::Unknown => "Unknown date".to_string(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthKey::Known { year, month } => write!(f, "{year:04}-{:02}", u8::from(*month)),
            MonthKey::Unknown => f.write_str(UNKNOWN_MONTH_KEY),
        }
    }
}

/// Consecutive run of entries sharing a month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGroup<'a> {
    pub key: MonthKey,
    /// The run continues the last heading rendered on an earlier page.
    pub continues_previous: bool,
    pub items: Vec<&'a IndexEntry>,
}

/// Group consecutive entries by month, continuing `previous` when the slice starts in it.
pub fn group_by_month<'a>(
    items: &'a [IndexEntry],
    previous: Option<MonthKey>,
    tz: Tz,
) -> Vec<MonthGroup<'a>> {
    let mut groups: Vec<MonthGroup<'a>> = Vec::new();
    for entry in items {
        let key = MonthKey::for_entry(entry, tz);
        match groups.last_mut() {
            Some(group) if group.key == key => group.items.push(entry),
            _ => {
                let continues_previous = groups.is_empty() && previous == Some(key);
                groups.push(MonthGroup {
                    key,
                    continues_previous,
                    items: vec![entry],
                });
            }
        }
    }
    groups
}

/// Distinct tags across the feed, sorted.
pub fn collect_tags(entries: &[IndexEntry]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
