use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let content = ErrorPageView::not_found();
    let chrome = chrome.with_title(content.title.clone());
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct FooterView {
    pub copy: String,
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    pub fn with_meta(self, meta: PageMetaView) -> Self {
        Self { meta, ..self }
    }

    pub fn with_canonical(self, canonical: String) -> Self {
        Self {
            meta: self.meta.with_canonical(canonical),
            ..self
        }
    }

    /// Replace the document title, keeping the site suffix.
    pub fn with_title(self, title: String) -> Self {
        let site = self.brand.title.clone();
        Self {
            meta: self.meta.with_title(format!("{title} | {site}")),
            ..self
        }
    }

    /// Mark the navigation entry whose href equals `href`.
    pub fn with_active(mut self, href: &str) -> Self {
        for entry in &mut self.navigation.entries {
            entry.is_active = entry.href == href;
        }
        self
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            meta: chrome.meta,
            content,
        }
    }
}

/// Document metadata rendered into `<head>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    pub canonical: String,
}

impl PageMetaView {
    pub fn with_canonical(self, canonical: String) -> Self {
        Self { canonical, ..self }
    }

    pub fn with_title(self, title: String) -> Self {
        Self { title, ..self }
    }
}

#[derive(Clone)]
pub struct TagBadge {
    pub value: String,
    pub label: String,
}

#[derive(Clone)]
pub struct EntryCard {
    pub slug: String,
    pub title: String,
    pub href: String,
    pub iso_date: Option<String>,
    pub published: String,
    pub badges: Vec<TagBadge>,
}

pub struct LatestView {
    pub entry: EntryCard,
    pub archive_href: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<LatestView>,
}

/// Current filter inputs, echoed back into the form.
#[derive(Clone, Default)]
pub struct FilterFormView {
    pub query: String,
    pub date_from: String,
    pub date_to: String,
    pub tag: String,
}

#[derive(Clone)]
pub struct TagButtonView {
    pub label: String,
    pub value: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct TagBarView {
    pub buttons: Vec<TagButtonView>,
}

#[derive(Clone)]
pub struct MonthGroupView {
    pub key: String,
    pub label: String,
    pub show_heading: bool,
    pub entries: Vec<EntryCard>,
}

#[derive(Clone)]
pub struct PagerView {
    pub next_cursor: Option<String>,
    pub load_more_query: String,
}

#[derive(Clone)]
pub struct ArchiveResultsView {
    pub groups: Vec<MonthGroupView>,
    pub has_results: bool,
    pub total: usize,
    pub last_month: Option<String>,
    pub pager: PagerView,
}

pub struct ArchivePageView {
    pub filters: FilterFormView,
    pub tagbar: TagBarView,
    pub results: ArchiveResultsView,
    /// Modifier for the search box input handler.
    pub input_modifier: String,
    pub signals: String,
}

#[derive(Template)]
#[template(path = "archive.html")]
pub struct ArchiveTemplate {
    pub view: LayoutContext<ArchivePageView>,
}

#[derive(Template)]
#[template(path = "partials/archive_results.html")]
pub struct ArchiveResultsTemplate {
    pub results: ArchiveResultsView,
}

#[derive(Template)]
#[template(path = "partials/archive_append.html")]
pub struct ArchiveAppendTemplate {
    pub groups: Vec<MonthGroupView>,
}

#[derive(Template)]
#[template(path = "partials/archive_pager.html")]
pub struct ArchivePagerTemplate {
    pub pager: PagerView,
}

#[derive(Template)]
#[template(path = "partials/tagbar.html")]
pub struct TagBarTemplate {
    pub tagbar: TagBarView,
}

pub struct PublishedView {
    pub iso_date: String,
    pub display: String,
}

pub struct ArticleView {
    pub title: String,
    pub published: Option<PublishedView>,
    /// Pre-rendered section fragments in document order.
    pub sections: Vec<String>,
}

#[derive(Template)]
#[template(path = "article.html")]
pub struct ArticleTemplate {
    pub view: LayoutContext<ArticleView>,
}

pub struct BadgeView {
    pub class: String,
    pub text: String,
}

pub struct SourceLinkView {
    pub name: String,
    pub url: String,
}

pub struct NewsCardView {
    pub title: String,
    pub badge: Option<BadgeView>,
    pub summary_html: Option<String>,
    pub points: Vec<String>,
    pub interpretation_html: Option<String>,
    pub source: Option<SourceLinkView>,
}

pub struct MarketCardView {
    pub name: String,
    pub change: String,
    pub latest: String,
}

pub struct LinkView {
    pub label: String,
    pub url: String,
}

#[derive(Template)]
#[template(path = "sections/highlight.html")]
pub struct HighlightSectionTemplate {
    pub heading: Option<String>,
    pub items: Vec<String>,
}

#[derive(Template)]
#[template(path = "sections/market_table.html")]
pub struct MarketTableSectionTemplate {
    pub heading: Option<String>,
    pub summary: String,
    pub open: bool,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub cards: Vec<MarketCardView>,
    pub notes: Option<String>,
}

#[derive(Template)]
#[template(path = "sections/news_summary.html")]
pub struct NewsSummarySectionTemplate {
    pub heading: Option<String>,
    pub items: Vec<NewsCardView>,
}

#[derive(Template)]
#[template(path = "sections/link_list.html")]
pub struct LinkListSectionTemplate {
    pub heading: Option<String>,
    pub links: Vec<LinkView>,
}

#[derive(Template)]
#[template(path = "sections/unknown.html")]
pub struct UnknownSectionTemplate {
    pub kind: String,
    pub heading: Option<String>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub detail: Option<String>,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try the archive to browse past issues.".to_string(),
            detail: None,
            primary_action: Some(ErrorAction::archive()),
        }
    }

    /// Upstream fetch or parse failure; `url` is the document that was attempted.
    pub fn load_failed(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: "Load failed".to_string(),
            message: message.into(),
            detail: Some(format!("URL: {}", url.into())),
            primary_action: Some(ErrorAction::archive()),
        }
    }

    pub fn missing_slug() -> Self {
        Self {
            title: "No article specified".to_string(),
            message: "Add a slug to the address, for example ?slug=2025-08-14.".to_string(),
            detail: None,
            primary_action: Some(ErrorAction::archive()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn archive() -> Self {
        Self {
            href: "/archive".to_string(),
            label: "Browse the archive".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

/// Fragment shown in place of archive results when the feed cannot be loaded.
#[derive(Template)]
#[template(path = "partials/archive_error.html")]
pub struct ArchiveErrorTemplate {
    pub message: String,
    pub detail: String,
}

pub fn build_tag_badges<'a, T>(tags: T) -> Vec<TagBadge>
where
    T: IntoIterator<Item = &'a str>,
{
    tags.into_iter()
        .map(|tag| TagBadge {
            value: tag.to_string(),
            label: format!("#{tag}"),
        })
        .collect()
}
