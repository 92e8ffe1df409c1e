use std::sync::Arc;

use chrono_tz::Tz;
use thiserror::Error;
use tracing::debug;
use url::form_urlencoded;

use askama::Template;

use crate::application::content::{self, ContentError, ContentSource};
use crate::application::render::{SectionRenderOptions, render_section};
use crate::config::Settings;
use crate::domain::articles::Article;
use crate::domain::feed::parse_published_at;
use crate::presentation::views::{
    ArticleTemplate, ArticleView, LayoutChrome, LayoutContext, PageMetaView, PublishedView,
};
use crate::util::timezone;

const PUBLISHED_FORMAT: &str = "%B %-d, %Y %H:%M";

#[derive(Debug, Clone)]
pub struct ArticleOptions {
    pub site_name: String,
    /// Public origin plus path prefix, without a trailing slash.
    pub base_url: String,
    pub default_description: String,
    /// Site-relative path of the fallback social card.
    pub default_og_image: String,
    pub timezone: Tz,
    pub sections: SectionRenderOptions,
}

impl From<&Settings> for ArticleOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            site_name: settings.site.name.clone(),
            base_url: settings.site.base_url.clone(),
            default_description: settings.site.description.clone(),
            default_og_image: settings.site.og_image.clone(),
            timezone: settings.site.timezone,
            sections: SectionRenderOptions {
                primary_market_heading: settings.article.primary_market_heading.clone(),
            },
        }
    }
}

impl ArticleOptions {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn canonical_url(&self, slug: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(slug.as_bytes()).collect();
        format!("{}/article.html?slug={encoded}", self.base())
    }

    /// Absolute image URL; anything not already `http…` is resolved against the base URL.
    pub fn resolve_image(&self, image: Option<&str>) -> String {
        let path = image
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(self.default_og_image.as_str());
        if path.starts_with("http") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.base())
        } else {
            format!("{}/{path}", self.base())
        }
    }
}

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("failed to render section {index} (`{kind}`): {source}")]
    Render {
        index: usize,
        kind: String,
        #[source]
        source: askama::Error,
    },
    #[error("failed to render article page: {0}")]
    Page(#[source] askama::Error),
}

/// Everything needed to lay out one article page.
pub struct RenderedArticle {
    pub meta: PageMetaView,
    pub view: ArticleView,
}

#[derive(Clone)]
pub struct ArticleService {
    content: Arc<dyn ContentSource>,
    options: ArticleOptions,
}

impl ArticleService {
    pub fn new(content: Arc<dyn ContentSource>, options: ArticleOptions) -> Self {
        Self { content, options }
    }

    pub async fn load(&self, slug: &str) -> Result<RenderedArticle, ArticleError> {
        let article = content::load_article(self.content.as_ref(), slug).await?;
        debug!(
            target: "findaily::article",
            slug,
            sections = article.sections.len(),
            "article loaded"
        );
        build_article(&article, slug, &self.options)
    }

    /// Complete HTML document for one article, outside of any request.
    pub async fn render_page(
        &self,
        chrome: LayoutChrome,
        slug: &str,
    ) -> Result<String, ArticleError> {
        let rendered = self.load(slug).await?;
        let view = LayoutContext::new(chrome.with_meta(rendered.meta), rendered.view);
        ArticleTemplate { view }.render().map_err(ArticleError::Page)
    }
}

pub fn build_article(
    article: &Article,
    slug: &str,
    options: &ArticleOptions,
) -> Result<RenderedArticle, ArticleError> {
    let meta = render_meta(article, slug, options);

    let sections = article
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| {
            render_section(section, &options.sections).map_err(|source| ArticleError::Render {
                index,
                kind: section.kind().to_string(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let published = article
        .published_at
        .as_deref()
        .map(|raw| published_view(raw, options.timezone));

    Ok(RenderedArticle {
        meta,
        view: ArticleView {
            title: article_title(article, slug),
            published,
            sections,
        },
    })
}

pub fn article_title(article: &Article, slug: &str) -> String {
    article
        .title
        .clone()
        .unwrap_or_else(|| format!("FinDaily {slug}"))
}

/// Document title, description, canonical link, and social preview tags.
pub fn render_meta(article: &Article, slug: &str, options: &ArticleOptions) -> PageMetaView {
    let title = article_title(article, slug);
    let description = article
        .description
        .clone()
        .unwrap_or_else(|| options.default_description.clone());

    PageMetaView {
        title: format!("{title} | {}", options.site_name),
        description: description.clone(),
        og_title: title,
        og_description: description,
        og_image: options.resolve_image(article.og_image.as_deref()),
        canonical: options.canonical_url(slug),
    }
}

fn published_view(raw: &str, tz: Tz) -> PublishedView {
    match parse_published_at(raw) {
        Some(instant) => {
            let localized = timezone::localized_datetime(instant, tz);
            PublishedView {
                iso_date: localized.to_rfc3339(),
                display: localized.format(PUBLISHED_FORMAT).to_string(),
            }
        }
        None => PublishedView {
            iso_date: String::new(),
            display: raw.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use findaily_feed_types::ArticleDocument;
    use serde_json::json;

    fn options() -> ArticleOptions {
        ArticleOptions {
            site_name: "FinDaily".to_string(),
            base_url: "https://fin-daily.example/Fin-Daily/".to_string(),
            default_description: "毎朝の相場ハイライトを1枚で。".to_string(),
            default_og_image: "/assets/images/XCard.png".to_string(),
            timezone: chrono_tz::Asia::Tokyo,
            sections: SectionRenderOptions::default(),
        }
    }

    fn article(value: serde_json::Value) -> Article {
        let document: ArticleDocument = serde_json::from_value(value).expect("article document");
        Article::from(document)
    }

    #[test]
    fn meta_uses_defaults_when_seo_is_absent() {
        let meta = render_meta(&article(json!({})), "2025-08-14", &options());

        assert_eq!(meta.title, "FinDaily 2025-08-14 | FinDaily");
        assert_eq!(meta.og_title, "FinDaily 2025-08-14");
        assert_eq!(meta.description, "毎朝の相場ハイライトを1枚で。");
        assert_eq!(
            meta.og_image,
            "https://fin-daily.example/Fin-Daily/assets/images/XCard.png"
        );
        assert_eq!(
            meta.canonical,
            "https://fin-daily.example/Fin-Daily/article.html?slug=2025-08-14"
        );
    }

    #[test]
    fn meta_prefers_article_seo() {
        let meta = render_meta(
            &article(json!({
                "title": "Morning Brief",
                "seo": { "description": "Stocks rally", "og_image": "https://cdn.example/og.png" }
            })),
            "x",
            &options(),
        );

        assert_eq!(meta.title, "Morning Brief | FinDaily");
        assert_eq!(meta.og_description, "Stocks rally");
        assert_eq!(meta.og_image, "https://cdn.example/og.png");
    }

    #[test]
    fn relative_images_resolve_against_base() {
        let opts = options();
        assert_eq!(
            opts.resolve_image(Some("/assets/og/1.png")),
            "https://fin-daily.example/Fin-Daily/assets/og/1.png"
        );
        assert_eq!(
            opts.resolve_image(Some("assets/og/1.png")),
            "https://fin-daily.example/Fin-Daily/assets/og/1.png"
        );
    }

    #[test]
    fn canonical_percent_encodes_slug() {
        assert_eq!(
            options().canonical_url("a&b"),
            "https://fin-daily.example/Fin-Daily/article.html?slug=a%26b"
        );
    }

    #[test]
    fn builds_sections_in_document_order() {
        let rendered = build_article(
            &article(json!({
                "title": "Brief",
                "published_at": "2025-01-09T22:30:00Z",
                "sections": [
                    { "type": "highlight", "items": ["one"] },
                    { "type": "link_list", "links": [{ "url": "https://example.com" }] },
                    { "type": "mystery" }
                ]
            })),
            "brief",
            &options(),
        )
        .expect("article builds");

        assert_eq!(rendered.view.sections.len(), 3);
        assert!(rendered.view.sections[0].contains("sec--highlight"));
        assert!(rendered.view.sections[1].contains("sec--link_list"));
        assert!(rendered.view.sections[2].contains("sec--mystery"));

        let published = rendered.view.published.expect("published");
        assert_eq!(published.display, "January 10, 2025 07:30");
        assert_eq!(published.iso_date, "2025-01-10T07:30:00+09:00");
    }
}
