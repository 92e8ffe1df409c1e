//! Article documents as the renderer sees them.

use findaily_feed_types::{ArticleDocument, NewsItemDocument, SectionDocument};
use serde_json::Value;

use super::sentiment::{self, SentimentBadge};

/// Shown in place of empty, null, or NaN market cells.
pub const CELL_PLACEHOLDER: &str = "—";
/// Prefix for each highlight bullet.
pub const HIGHLIGHT_MARKER: &str = "・";

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: Option<String>,
    pub published_at: Option<String>,
    pub description: Option<String>,
    pub og_image: Option<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Highlight {
        heading: Option<String>,
        items: Vec<String>,
    },
    MarketTable(MarketTable),
    NewsSummary {
        heading: Option<String>,
        items: Vec<NewsItem>,
    },
    LinkList {
        heading: Option<String>,
        links: Vec<Link>,
    },
    Unknown {
        kind: String,
        heading: Option<String>,
    },
}

impl Section {
    pub fn kind(&self) -> &str {
        match self {
            Section::Highlight { .. } => "highlight",
            Section::MarketTable(_) => "market_table",
            Section::NewsSummary { .. } => "news_summary",
            Section::LinkList { .. } => "link_list",
            Section::Unknown { kind, .. } => kind.as_str(),
        }
    }

    pub fn heading(&self) -> Option<&str> {
        match self {
            Section::Highlight { heading, .. }
            | Section::NewsSummary { heading, .. }
            | Section::LinkList { heading, .. }
            | Section::Unknown { heading, .. } => heading.as_deref(),
            Section::MarketTable(table) => table.heading.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketTable {
    pub heading: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub notes: Option<String>,
}

/// Compact summary of one market row: `[name, latest, pct, ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketCard {
    pub name: String,
    pub change: String,
    pub latest: String,
}

impl MarketTable {
    pub fn cards(&self) -> Vec<MarketCard> {
        self.rows
            .iter()
            .map(|row| MarketCard {
                name: cell_text(row.first()),
                latest: cell_text(row.get(1)),
                change: cell_text(row.get(2)),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub headline: String,
    pub sentiment: Option<SentimentBadge>,
    pub summary: Option<String>,
    pub points: Vec<String>,
    pub interpretation: Option<String>,
    pub source: Option<SourceLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub label: String,
    pub url: String,
}

impl From<ArticleDocument> for Article {
    fn from(document: ArticleDocument) -> Self {
        let (description, og_image) = match document.seo {
            Some(seo) => (non_empty(seo.description), non_empty(seo.og_image)),
            None => (None, None),
        };

        Self {
            title: non_empty(document.title),
            published_at: non_empty(document.published_at),
            description,
            og_image,
            sections: document.sections.into_iter().map(Section::from).collect(),
        }
    }
}

impl From<SectionDocument> for Section {
    fn from(document: SectionDocument) -> Self {
        let heading = non_empty(document.heading);
        match document.kind.as_str() {
            "highlight" => Section::Highlight {
                heading,
                items: document.items.iter().filter_map(scalar_text).collect(),
            },
            "market_table" => Section::MarketTable(MarketTable {
                heading,
                columns: document
                    .columns
                    .iter()
                    .map(|column| scalar_text(column).unwrap_or_default())
                    .collect(),
                rows: document.data,
                notes: non_empty(document.notes),
            }),
            "news_summary" => Section::NewsSummary {
                heading,
                items: document.articles.into_iter().map(NewsItem::from).collect(),
            },
            "link_list" => Section::LinkList {
                heading,
                links: document
                    .links
                    .into_iter()
                    .filter_map(|link| {
                        let url = non_empty(link.url).filter(|url| is_link_target(url))?;
                        let label = non_empty(link.label).unwrap_or_else(|| url.clone());
                        Some(Link { label, url })
                    })
                    .collect(),
            },
            _ => Section::Unknown {
                kind: document.kind,
                heading,
            },
        }
    }
}

impl From<NewsItemDocument> for NewsItem {
    fn from(document: NewsItemDocument) -> Self {
        let sentiment =
            sentiment::select(document.sentiment.as_ref(), document.sentiment_score.as_ref())
                .and_then(sentiment::normalize);

        let source = document.source.and_then(|source| {
            let url = non_empty(source.url).filter(|url| is_link_target(url))?;
            let name = non_empty(source.name).unwrap_or_else(|| "Source".to_string());
            Some(SourceLink { name, url })
        });

        Self {
            headline: document.headline.unwrap_or_default(),
            sentiment,
            summary: non_empty(document.summary),
            points: document.points.iter().filter_map(scalar_text).collect(),
            interpretation: non_empty(document.interpretation),
            source,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// Absolute http(s) URLs and site-relative paths only.
fn is_link_target(url: &str) -> bool {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    lower.starts_with("https://")
        || lower.starts_with("http://")
        || (url.starts_with('/') && !url.starts_with("//"))
}

/// Text for a list member; arrays, objects and nulls have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(format_number(number)),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Display text for a market cell, substituting [`CELL_PLACEHOLDER`] for missing values.
pub fn cell_text(cell: Option<&Value>) -> String {
    let text = match cell {
        None | Some(Value::Null) => return CELL_PLACEHOLDER.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => format_number(number),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
    };

    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        CELL_PLACEHOLDER.to_string()
    } else {
        text
    }
}

fn format_number(number: &serde_json::Number) -> String {
    if let Some(integer) = number.as_i64() {
        return integer.to_string();
    }
    if let Some(integer) = number.as_u64() {
        return integer.to_string();
    }
    match number.as_f64() {
        Some(float) if float.is_finite() => format!("{float}"),
        _ => number.to_string(),
    }
}
