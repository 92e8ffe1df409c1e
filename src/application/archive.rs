use std::sync::Arc;

use askama::Template;
use axum::response::Response;
use chrono_tz::Tz;
use datastar::prelude::ElementPatchMode;
use serde_json::json;
use thiserror::Error;
use url::form_urlencoded;

use crate::application::content::{self, ContentError, ContentSource};
use crate::application::error::HttpError;
use crate::application::pagination::ArchiveCursor;
use crate::application::stream::StreamBuilder;
use crate::config::Settings;
use crate::domain::archive::{
    self, FilterState, MonthGroup, apply_filters, collect_tags, group_by_month, paginate,
};
use crate::domain::debounce::DebouncePolicy;
use crate::domain::feed::IndexEntry;
use crate::presentation::views::{
    ArchiveAppendTemplate, ArchivePageView, ArchivePagerTemplate, ArchiveResultsTemplate,
    ArchiveResultsView, EntryCard, FilterFormView, MonthGroupView, PagerView, TagBarTemplate,
    TagBarView, TagButtonView, TemplateRenderError, build_tag_badges,
};
use crate::util::timezone;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Signal carrying the number of matching issues.
pub const TOTAL_SIGNAL: &str = "archiveTotal";

const SOURCE: &str = "application::archive::build_datastar_response";

#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub page_size: usize,
    pub timezone: Tz,
    pub debounce: DebouncePolicy,
}

impl From<&Settings> for ArchiveOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            page_size: settings.archive.page_size.get(),
            timezone: settings.site.timezone,
            debounce: DebouncePolicy::from_millis(settings.archive.debounce_ms),
        }
    }
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            timezone: chrono_tz::Asia::Tokyo,
            debounce: DebouncePolicy::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Raw filter inputs as they arrive from a form or datastar signals.
#[derive(Debug, Clone, Default)]
pub struct ArchiveQuery {
    pub query: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub tag: Option<String>,
}

impl ArchiveQuery {
    pub fn filter_state(&self) -> FilterState {
        FilterState::from_inputs(
            self.query.as_deref(),
            self.date_from.as_deref(),
            self.date_to.as_deref(),
            self.tag.as_deref(),
        )
    }

    /// Echo of the inputs for re-populating the form. Invalid dates are cleared.
    pub fn form_view(&self) -> FilterFormView {
        let state = self.filter_state();
        FilterFormView {
            query: self.query.clone().unwrap_or_default().trim().to_string(),
            date_from: state
                .date_from
                .map(archive::format_input_date)
                .unwrap_or_default(),
            date_to: state
                .date_to
                .map(archive::format_input_date)
                .unwrap_or_default(),
            tag: state.active_tag.unwrap_or_default(),
        }
    }

    /// Query string reproducing these filters, for non-datastar "load more" links.
    pub fn to_query_string(&self) -> String {
        let form = self.form_view();
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in [
            ("q", form.query.as_str()),
            ("from", form.date_from.as_str()),
            ("to", form.date_to.as_str()),
            ("tag", form.tag.as_str()),
        ] {
            if !value.is_empty() {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    /// Initial datastar signal object mirroring the form, plus the match count.
    pub fn signals_json(&self, total: usize) -> String {
        let form = self.form_view();
        json!({
            "q": form.query,
            "from": form.date_from,
            "to": form.date_to,
            "tag": form.tag,
            (TOTAL_SIGNAL): total,
        })
        .to_string()
    }
}

/// A rendered slice of the archive, either replacing the listing or extending it.
pub struct ArchiveSlice {
    pub tagbar: TagBarView,
    pub results: ArchiveResultsView,
    pub is_reset: bool,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Content(#[from] ContentError),
}

#[derive(Clone)]
pub struct ArchiveService {
    content: Arc<dyn ContentSource>,
    options: ArchiveOptions,
}

impl ArchiveService {
    pub fn new(content: Arc<dyn ContentSource>, options: ArchiveOptions) -> Self {
        Self { content, options }
    }

    fn decode_cursor(&self, cursor: Option<&str>) -> Result<Option<ArchiveCursor>, ArchiveError> {
        cursor
            .filter(|value| !value.is_empty())
            .map(ArchiveCursor::decode)
            .transpose()
            .map_err(|err| ArchiveError::InvalidCursor(err.to_string()))
    }

    /// Full archive page: form state, tag bar, and the first page of results.
    pub async fn page_context(&self, query: &ArchiveQuery) -> Result<ArchivePageView, ArchiveError> {
        let entries = content::load_feed(self.content.as_ref()).await?;
        let filter = query.filter_state();
        let results = build_results(&entries, query, ArchiveCursor::new(0, None), &self.options);

        Ok(ArchivePageView {
            filters: query.form_view(),
            tagbar: build_tag_bar(&entries, filter.active_tag.as_deref()),
            signals: query.signals_json(results.total),
            results,
            input_modifier: self.options.debounce.event_modifier(),
        })
    }

    /// Results for a filter change (no cursor) or a "load more" (cursor present).
    pub async fn slice(
        &self,
        query: &ArchiveQuery,
        cursor: Option<&str>,
    ) -> Result<ArchiveSlice, ArchiveError> {
        let decoded = self.decode_cursor(cursor)?;
        let entries = content::load_feed(self.content.as_ref()).await?;
        let filter = query.filter_state();

        Ok(ArchiveSlice {
            tagbar: build_tag_bar(&entries, filter.active_tag.as_deref()),
            results: build_results(
                &entries,
                query,
                decoded.unwrap_or_else(|| ArchiveCursor::new(0, None)),
                &self.options,
            ),
            is_reset: decoded.is_none(),
        })
    }
}

/// Tag bar with an "All" entry first; the active tag (or "All") is pressed.
pub fn build_tag_bar(entries: &[IndexEntry], active: Option<&str>) -> TagBarView {
    let tags = collect_tags(entries);
    let mut buttons = Vec::with_capacity(tags.len() + 1);
    buttons.push(TagButtonView {
        label: "All".to_string(),
        value: String::new(),
        is_active: active.is_none(),
    });
    buttons.extend(tags.into_iter().map(|tag| TagButtonView {
        is_active: active == Some(tag.as_str()),
        label: tag.clone(),
        value: tag,
    }));
    TagBarView { buttons }
}

/// Filter, page, and group `entries` for one archive response.
pub fn build_results(
    entries: &[IndexEntry],
    query: &ArchiveQuery,
    cursor: ArchiveCursor,
    options: &ArchiveOptions,
) -> ArchiveResultsView {
    let filtered = apply_filters(entries, &query.filter_state(), options.timezone);
    let page = paginate(&filtered, cursor.page(), options.page_size);
    let groups = group_by_month(page.items, cursor.last_month(), options.timezone);

    let last_month = groups
        .last()
        .map(|group| group.key)
        .or(cursor.last_month());

    let next_cursor = page
        .has_more
        .then(|| ArchiveCursor::new(cursor.page() + 1, last_month).encode());

    ArchiveResultsView {
        groups: groups
            .iter()
            .map(|group| month_group_view(group, options.timezone))
            .collect(),
        has_results: !filtered.is_empty(),
        total: filtered.len(),
        last_month: last_month.map(|key| key.to_string()),
        pager: PagerView {
            next_cursor,
            load_more_query: query.to_query_string(),
        },
    }
}

fn month_group_view(group: &MonthGroup<'_>, tz: Tz) -> MonthGroupView {
    MonthGroupView {
        key: group.key.to_string(),
        label: group.key.label(),
        show_heading: !group.continues_previous,
        entries: group
            .items
            .iter()
            .map(|entry| entry_card(entry, tz))
            .collect(),
    }
}

pub fn entry_card(entry: &IndexEntry, tz: Tz) -> EntryCard {
    let (iso_date, published) = match entry.published {
        Some(instant) => (
            Some(timezone::localized_datetime(instant, tz).to_rfc3339()),
            archive::format_human_date(timezone::localized_date(instant, tz)),
        ),
        None => (None, entry.published_at.clone()),
    };

    EntryCard {
        slug: entry.slug.clone(),
        title: entry.title.clone(),
        href: article_href(&entry.slug),
        iso_date,
        published,
        badges: build_tag_badges(entry.tags.iter().map(String::as_str)),
    }
}

/// Site-relative article link with the slug percent-encoded.
pub fn article_href(slug: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(slug.as_bytes()).collect();
    format!("/article.html?slug={encoded}")
}

/// Patch the listing in place: a reset replaces tag bar, results, and pager;
/// a "load more" appends month groups and swaps the pager.
pub fn build_datastar_response(slice: ArchiveSlice) -> Result<Response, HttpError> {
    let ArchiveSlice {
        tagbar,
        results,
        is_reset,
    } = slice;
    let total = results.total;
    let pager = results.pager.clone();

    let mut stream = StreamBuilder::new();

    if is_reset {
        let tagbar_html = render_fragment(TagBarTemplate { tagbar })?;
        stream.push_patch(tagbar_html, "#archive-tagbar", ElementPatchMode::Outer);

        let results_html = render_fragment(ArchiveResultsTemplate { results })?;
        stream.push_patch(results_html, "#archive-results", ElementPatchMode::Outer);
    } else {
        if !results.groups.is_empty() {
            let groups_html = render_fragment(ArchiveAppendTemplate {
                groups: results.groups,
            })?;
            stream.push_patch(groups_html, "#archive-list", ElementPatchMode::Append);
        }

        let pager_html = render_fragment(ArchivePagerTemplate { pager })?;
        stream.push_patch(pager_html, "#archive-pager", ElementPatchMode::Outer);
    }

    stream.push_signals(&json!({ TOTAL_SIGNAL: total }).to_string());

    Ok(stream.into_response())
}

fn render_fragment<T: Template>(template: T) -> Result<String, HttpError> {
    template.render().map_err(|err| {
        HttpError::from(TemplateRenderError::new(
            SOURCE,
            "Template rendering failed",
            err,
        ))
    })
}
