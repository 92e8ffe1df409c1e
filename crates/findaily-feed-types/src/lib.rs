//! Wire types for the FinDaily data feed.
//!
//! The index document is kept loosely typed (`serde_json::Value` per entry) so a
//! single malformed record cannot reject the whole feed. Article documents are
//! typed, but each field falls back to its default when the publisher sends an
//! unexpected shape, so one odd section never rejects the article.

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Top-level shape of `data/index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedDocument {
    /// A bare array of entries.
    List(Vec<Value>),
    /// An object wrapping the entries under `items`.
    Wrapped { items: Vec<Value> },
}

impl FeedDocument {
    pub fn into_items(self) -> Vec<Value> {
        match self {
            FeedDocument::List(items) | FeedDocument::Wrapped { items } => items,
        }
    }
}

/// `data/articles/{slug}.json`.
///
/// Every field is read leniently: a value of the wrong shape is treated as
/// absent instead of rejecting the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleDocument {
    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub published_at: Option<String>,
    #[serde(deserialize_with = "lenient_object")]
    pub seo: Option<SeoDocument>,
    /// Non-object entries are skipped.
    #[serde(deserialize_with = "lenient_list")]
    pub sections: Vec<SectionDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoDocument {
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub og_image: Option<String>,
}

/// One content block. Every kind shares this flat shape; `kind` decides which
/// of the remaining fields are meaningful. List members stay untyped JSON so
/// numbers and other scalars survive until rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionDocument {
    #[serde(rename = "type", deserialize_with = "lenient_kind")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_text")]
    pub heading: Option<String>,
    #[serde(deserialize_with = "lenient_array")]
    pub items: Vec<Value>,
    #[serde(deserialize_with = "lenient_array")]
    pub columns: Vec<Value>,
    /// Rows that are not arrays are skipped.
    #[serde(deserialize_with = "lenient_rows")]
    pub data: Vec<Vec<Value>>,
    #[serde(deserialize_with = "lenient_text")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub articles: Vec<NewsItemDocument>,
    #[serde(deserialize_with = "lenient_list")]
    pub links: Vec<LinkDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsItemDocument {
    #[serde(deserialize_with = "lenient_text")]
    pub headline: Option<String>,
    pub sentiment: Option<Value>,
    pub sentiment_score: Option<Value>,
    #[serde(deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient_array")]
    pub points: Vec<Value>,
    #[serde(deserialize_with = "lenient_text")]
    pub interpretation: Option<String>,
    #[serde(deserialize_with = "lenient_object")]
    pub source: Option<SourceDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceDocument {
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkDocument {
    #[serde(deserialize_with = "lenient_text")]
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub url: Option<String>,
}

/// Scalar text: strings as-is, numbers and booleans in their JSON spelling.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn lenient_kind<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn lenient_array<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

fn lenient_rows<'de, D>(deserializer: D) -> Result<Vec<Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_array(deserializer)?
        .into_iter()
        .filter_map(|row| match row {
            Value::Array(cells) => Some(cells),
            _ => None,
        })
        .collect())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient_array(deserializer)?
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value).ok()),
        _ => Ok(None),
    }
}
