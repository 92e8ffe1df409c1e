//! Section rendering: one askama template per section kind.

use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;
use askama::Template;
use once_cell::sync::Lazy;

use crate::domain::articles::{
    HIGHLIGHT_MARKER, MarketTable, NewsItem, Section, cell_text,
};
use crate::presentation::views::{
    BadgeView, HighlightSectionTemplate, LinkListSectionTemplate, LinkView, MarketCardView,
    MarketTableSectionTemplate, NewsCardView, NewsSummarySectionTemplate, SourceLinkView,
    UnknownSectionTemplate,
};

/// Summary text for market tables without a heading.
pub const DEFAULT_MARKET_SUMMARY: &str = "市場データ";
pub const DEFAULT_PRIMARY_MARKET_HEADING: &str = "株価・為替・債券";

static INLINE_SANITIZER: Lazy<AmmoniaBuilder<'static>> = Lazy::new(build_inline_sanitizer);

fn build_inline_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();
    builder.tags(HashSet::from([
        "a", "b", "br", "code", "em", "i", "mark", "small", "span", "strong", "sub", "sup", "u",
    ]));
    builder
}

/// Strip everything but inline formatting from publisher-supplied HTML.
pub fn sanitize_inline(html: &str) -> String {
    INLINE_SANITIZER.clean(html).to_string()
}

#[derive(Debug, Clone)]
pub struct SectionRenderOptions {
    /// Market tables whose heading contains this text start expanded.
    pub primary_market_heading: String,
}

impl Default for SectionRenderOptions {
    fn default() -> Self {
        Self {
            primary_market_heading: DEFAULT_PRIMARY_MARKET_HEADING.to_string(),
        }
    }
}

pub fn render_section(
    section: &Section,
    options: &SectionRenderOptions,
) -> Result<String, askama::Error> {
    match section {
        Section::Highlight { heading, items } => HighlightSectionTemplate {
            heading: heading.clone(),
            items: items
                .iter()
                .map(|item| format!("{HIGHLIGHT_MARKER}{item}"))
                .collect(),
        }
        .render(),
        Section::MarketTable(table) => market_table_template(table, options).render(),
        Section::NewsSummary { heading, items } => NewsSummarySectionTemplate {
            heading: heading.clone(),
            items: items
                .iter()
                .enumerate()
                .map(|(index, item)| news_card(index, item))
                .collect(),
        }
        .render(),
        Section::LinkList { heading, links } => LinkListSectionTemplate {
            heading: heading.clone(),
            links: links
                .iter()
                .map(|link| LinkView {
                    label: link.label.clone(),
                    url: link.url.clone(),
                })
                .collect(),
        }
        .render(),
        Section::Unknown { kind, heading } => UnknownSectionTemplate {
            kind: kind.clone(),
            heading: heading.clone(),
        }
        .render(),
    }
}

fn market_table_template(
    table: &MarketTable,
    options: &SectionRenderOptions,
) -> MarketTableSectionTemplate {
    let heading = table.heading.clone().unwrap_or_default();
    let primary = options.primary_market_heading.as_str();

    MarketTableSectionTemplate {
        open: !primary.is_empty() && heading.contains(primary),
        summary: if heading.is_empty() {
            DEFAULT_MARKET_SUMMARY.to_string()
        } else {
            heading
        },
        heading: table.heading.clone(),
        columns: table.columns.clone(),
        rows: table
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell_text(Some(cell))).collect())
            .collect(),
        cards: table
            .cards()
            .into_iter()
            .map(|card| MarketCardView {
                name: card.name,
                change: card.change,
                latest: card.latest,
            })
            .collect(),
        notes: table.notes.clone(),
    }
}

fn news_card(index: usize, item: &NewsItem) -> NewsCardView {
    NewsCardView {
        title: format!("📰【{}】{}", index + 1, item.headline),
        badge: item.sentiment.as_ref().map(|badge| BadgeView {
            class: badge.css_class().to_string(),
            text: badge.text(),
        }),
        summary_html: item.summary.as_deref().map(sanitize_inline),
        points: item.points.clone(),
        interpretation_html: item.interpretation.as_deref().map(sanitize_inline),
        source: item.source.as_ref().map(|source| SourceLinkView {
            name: source.name.clone(),
            url: source.url.clone(),
        }),
    }
}
