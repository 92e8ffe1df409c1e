use std::{error::Error as StdError, sync::Arc};

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use datastar::prelude::ElementPatchMode;
use serde::Deserialize;
use tracing::warn;

use crate::{
    application::{
        archive::{self, ArchiveError, ArchiveOptions, ArchiveQuery, ArchiveService},
        article::{ArticleError, ArticleOptions, ArticleService},
        chrome::{ChromeOptions, ChromeService},
        content::{ContentError, ContentSource},
        error::{ErrorReport, HttpError},
        latest::{LatestError, LatestService},
        stream::StreamBuilder,
    },
    config::Settings,
    presentation::views::{
        ArchiveErrorTemplate, ArchiveResultsTemplate, ArchiveTemplate, ArticleTemplate,
        ErrorPageView, ErrorTemplate, IndexTemplate, LayoutChrome, LayoutContext,
        render_not_found_response, render_template, render_template_response,
    },
};

use super::{
    DATASTAR_REQUEST_HEADER, canonical_url,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub archive: Arc<ArchiveService>,
    pub articles: Arc<ArticleService>,
    pub latest: Arc<LatestService>,
    pub chrome: Arc<ChromeService>,
}

impl HttpState {
    /// Wire every public service to one content source.
    pub fn new(settings: &Settings, content: Arc<dyn ContentSource>) -> Self {
        Self {
            archive: Arc::new(ArchiveService::new(
                content.clone(),
                ArchiveOptions::from(settings),
            )),
            articles: Arc::new(ArticleService::new(
                content.clone(),
                ArticleOptions::from(settings),
            )),
            latest: Arc::new(LatestService::new(content, settings.site.timezone)),
            chrome: Arc::new(ChromeService::new(&ChromeOptions::from(&settings.site))),
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/archive", get(archive_page))
        .route("/ui/archive", get(archive_partial))
        .route("/article.html", get(article))
        .route("/article", get(article))
        .route("/_health", get(health))
        .route("/static/{*path}", get(crate::infra::assets::serve_static))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArchiveParams {
    q: Option<String>,
    from: Option<String>,
    to: Option<String>,
    tag: Option<String>,
    cursor: Option<String>,
    /// JSON signal object sent by datastar on GET requests.
    datastar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArchiveSignals {
    q: Option<String>,
    from: Option<String>,
    to: Option<String>,
    tag: Option<String>,
}

impl ArchiveParams {
    /// Filter inputs plus the optional cursor. Datastar signals win over plain parameters.
    fn into_query(self) -> Result<(ArchiveQuery, Option<String>), HttpError> {
        let ArchiveParams {
            q,
            from,
            to,
            tag,
            cursor,
            datastar,
        } = self;

        let query = match datastar.as_deref() {
            Some(raw) => {
                let signals: ArchiveSignals = serde_json::from_str(raw).map_err(|err| {
                    HttpError::new(
                        "infra::http::public::archive_params",
                        StatusCode::BAD_REQUEST,
                        "Invalid signals",
                        format!("datastar signals could not be parsed: {err}"),
                    )
                })?;
                ArchiveQuery {
                    query: signals.q,
                    date_from: signals.from,
                    date_to: signals.to,
                    tag: signals.tag,
                }
            }
            None => ArchiveQuery {
                query: q,
                date_from: from,
                date_to: to,
                tag,
            },
        };

        Ok((query, cursor))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArticleParams {
    slug: Option<String>,
}

async fn index(State(state): State<HttpState>) -> Response {
    const SOURCE: &str = "infra::http::public::index";
    let chrome = state.chrome.load().with_active("/");

    match state.latest.latest().await {
        Ok(content) => {
            let view = LayoutContext::new(chrome, content);
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err @ LatestError::EmptyFeed) => {
            let content = ErrorPageView::load_failed(
                "The feed does not list any issues yet.",
                state.latest.feed_url(),
            );
            error_page_response(chrome, content, StatusCode::BAD_GATEWAY, SOURCE, &err)
        }
        Err(LatestError::Content(err)) => {
            content_error_response(chrome, &err, StatusCode::BAD_GATEWAY, SOURCE)
        }
    }
}

async fn archive_page(
    State(state): State<HttpState>,
    Query(params): Query<ArchiveParams>,
) -> Response {
    const SOURCE: &str = "infra::http::public::archive_page";
    let chrome = state.chrome.load().with_active("/archive");
    let canonical = canonical_url(&chrome.meta.canonical, "/archive");
    let chrome = chrome
        .with_canonical(canonical)
        .with_title("Archive".to_string());

    let query = match params.into_query() {
        Ok((query, _)) => query,
        Err(err) => return err.into_response(),
    };

    match state.archive.page_context(&query).await {
        Ok(content) => {
            let view = LayoutContext::new(chrome, content);
            render_template_response(ArchiveTemplate { view }, StatusCode::OK)
        }
        Err(ArchiveError::Content(err)) => {
            content_error_response(chrome, &err, StatusCode::BAD_GATEWAY, SOURCE)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn archive_partial(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(params): Query<ArchiveParams>,
) -> Result<Response, HttpError> {
    let (query, cursor) = params.into_query()?;
    let is_datastar = headers.contains_key(DATASTAR_REQUEST_HEADER);

    match state.archive.slice(&query, cursor.as_deref()).await {
        Ok(slice) if is_datastar => archive::build_datastar_response(slice),
        Ok(slice) => Ok(render_template_response(
            ArchiveResultsTemplate {
                results: slice.results,
            },
            StatusCode::OK,
        )),
        Err(ArchiveError::Content(err)) => archive_error_fragment(&err, is_datastar),
        Err(err) => Err(err.into()),
    }
}

/// Inline error in place of the results. Datastar requests get it as a patch.
fn archive_error_fragment(err: &ContentError, is_datastar: bool) -> Result<Response, HttpError> {
    const SOURCE: &str = "infra::http::public::archive_partial";
    let template = ArchiveErrorTemplate {
        message: err.to_string(),
        detail: format!("URL: {}", err.url()),
    };

    if is_datastar {
        warn!(
            target: "findaily::http::archive",
            url = %err.url(),
            error = %err,
            "archive refresh failed"
        );
        let Html(html) = render_template(template)?;
        let mut stream = StreamBuilder::new();
        stream.push_patch(html, "#archive-results", ElementPatchMode::Outer);
        return Ok(stream.into_response());
    }

    let mut response = render_template_response(template, StatusCode::BAD_GATEWAY);
    ErrorReport::from_error(SOURCE, StatusCode::BAD_GATEWAY, err).attach(&mut response);
    Ok(response)
}

async fn article(State(state): State<HttpState>, Query(params): Query<ArticleParams>) -> Response {
    const SOURCE: &str = "infra::http::public::article";
    let chrome = state.chrome.load();

    let Some(slug) = params
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|slug| !slug.is_empty())
    else {
        let content = ErrorPageView::missing_slug();
        let chrome = chrome.with_title(content.title.clone());
        let view = LayoutContext::new(chrome, content);
        return render_template_response(ErrorTemplate { view }, StatusCode::OK);
    };

    match state.articles.load(slug).await {
        Ok(rendered) => {
            let view = LayoutContext::new(chrome.with_meta(rendered.meta), rendered.view);
            render_template_response(ArticleTemplate { view }, StatusCode::OK)
        }
        Err(ArticleError::Content(err)) => {
            let status = match err {
                ContentError::Status { status: 404, .. } => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            };
            content_error_response(chrome, &err, status, SOURCE)
        }
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Article rendering failed",
            &err,
        )
        .into_response(),
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn fallback(State(state): State<HttpState>) -> Response {
    render_not_found_response(state.chrome.load())
}

fn content_error_response(
    chrome: LayoutChrome,
    err: &ContentError,
    status: StatusCode,
    source: &'static str,
) -> Response {
    let content = ErrorPageView::load_failed(err.to_string(), err.url());
    error_page_response(chrome, content, status, source, err)
}

fn error_page_response(
    chrome: LayoutChrome,
    content: ErrorPageView,
    status: StatusCode,
    source: &'static str,
    error: &dyn StdError,
) -> Response {
    let chrome = chrome.with_title(content.title.clone());
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, status);
    ErrorReport::from_error(source, status, error).attach(&mut response);
    response
}
