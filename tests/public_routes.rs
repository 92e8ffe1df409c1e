mod common;

use axum::http::StatusCode;
use common::{
    MemorySource, body_string, content_type, datastar_get, get, january_feed, router,
    sample_article,
};
use serde_json::json;
use tower::ServiceExt;

fn next_cursor(html: &str) -> String {
    let start = html.find("cursor=").expect("pager should carry a cursor") + "cursor=".len();
    html[start..]
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_')
        .collect()
}

#[tokio::test]
async fn archive_page_renders_first_page_with_tag_bar() {
    let app = router(MemorySource::new().with_feed(january_feed()));

    let response = app.oneshot(get("/archive")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;

    assert!(html.contains("id=\"archive-tagbar\""));
    assert!(html.contains("id=\"archive-results\""));
    assert!(html.contains("id=\"archive-pager\""));
    assert!(html.contains("25</span> issues"));
    assert!(html.contains("data-on:input__debounce.200ms="));
    assert!(html.contains("Issue 25"));
    assert!(!html.contains("Issue 05"), "second page must not be rendered");
    assert!(html.contains("January 2025"));
    assert!(html.contains("data-tag=\"macro\""));
    assert!(html.contains("<link rel=\"canonical\" href=\"https://fin-daily.test/archive\">"));
}

#[tokio::test]
async fn archive_page_echoes_filters_from_query() {
    let app = router(MemorySource::new().with_feed(january_feed()));

    let response = app
        .oneshot(get("/archive?tag=macro&from=2025-01-10"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;

    assert!(html.contains("value=\"2025-01-10\""));
    let macro_button = html.find("data-tag=\"macro\"").expect("macro tag button");
    assert!(html[..macro_button].trim_end().ends_with("aria-pressed=\"true\""));
    assert!(html.contains("8</span> issues"));
    assert!(!html.contains("Issue 11"));
}

#[tokio::test]
async fn datastar_filter_change_replaces_results() {
    let app = router(MemorySource::new().with_feed(january_feed()));
    let signals = "%7B%22q%22%3A%22issue%2003%22%2C%22tag%22%3A%22%22%7D";

    let response = app
        .oneshot(datastar_get(&format!("/ui/archive?datastar={signals}")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(content_type(&response).starts_with("text/event-stream"));
    let body = body_string(response).await;

    assert!(body.contains("datastar-patch-elements"));
    assert!(body.contains("selector #archive-tagbar"));
    assert!(body.contains("selector #archive-results"));
    assert!(body.contains("Issue 03"));
    assert!(!body.contains("Issue 13"));
    assert!(body.contains("{\"archiveTotal\":1}"));
}

#[tokio::test]
async fn plain_partial_request_returns_html_fragment() {
    let app = router(MemorySource::new().with_feed(january_feed()));

    let response = app
        .oneshot(get("/ui/archive?tag=fx"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(content_type(&response).starts_with("text/html"));
    let html = body_string(response).await;

    assert!(html.starts_with("<div id=\"archive-results\""));
    assert!(html.contains("13</span> issues"));
    assert!(!html.contains("<html"));
}

#[tokio::test]
async fn load_more_appends_next_page_without_repeating_month_heading() {
    let app = router(MemorySource::new().with_feed(january_feed()));

    let first = app
        .clone()
        .oneshot(get("/ui/archive"))
        .await
        .expect("response");
    let cursor = next_cursor(&body_string(first).await);
    assert!(!cursor.is_empty());

    let response = app
        .oneshot(datastar_get(&format!("/ui/archive?cursor={cursor}")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;

    assert!(body.contains("selector #archive-list"));
    assert!(body.contains("mode append"));
    assert!(body.contains("selector #archive-pager"));
    assert!(body.contains("Issue 05"));
    assert!(body.contains("Issue 01"));
    assert!(!body.contains("Issue 06"));
    assert!(!body.contains("month-group__heading"));
    assert!(!body.contains("Load more"));
}

#[tokio::test]
async fn invalid_cursor_is_a_bad_request() {
    let app = router(MemorySource::new().with_feed(january_feed()));

    let response = app
        .oneshot(datastar_get("/ui/archive?cursor=%21%21not-a-cursor"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_signals_are_a_bad_request() {
    let app = router(MemorySource::new().with_feed(january_feed()));

    let response = app
        .oneshot(datastar_get("/ui/archive?datastar=%7Bnot-json"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn feed_failure_renders_inline_error() {
    let app = router(MemorySource::new().with_feed_error(500));

    let page = app
        .clone()
        .oneshot(get("/archive"))
        .await
        .expect("response");
    assert_eq!(page.status(), StatusCode::BAD_GATEWAY);
    let html = body_string(page).await;
    assert!(html.contains("Load failed"));
    assert!(html.contains("URL: https://data.test/data/index.json"));

    let patch = app
        .clone()
        .oneshot(datastar_get("/ui/archive"))
        .await
        .expect("response");
    assert_eq!(patch.status(), StatusCode::OK);
    let body = body_string(patch).await;
    assert!(body.contains("selector #archive-results"));
    assert!(body.contains("archive-results--error"));

    let fragment = app.oneshot(get("/ui/archive")).await.expect("response");
    assert_eq!(fragment.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn empty_feed_shows_no_results() {
    let app = router(MemorySource::new().with_feed(json!([])));

    let response = app.oneshot(get("/archive")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("No issues match these filters."));
    assert!(!html.contains("Load more"));
}

#[tokio::test]
async fn article_page_renders_sections_and_meta() {
    let app = router(
        MemorySource::new()
            .with_feed(january_feed())
            .with_article("2025-01-10", sample_article()),
    );

    let response = app
        .oneshot(get("/article.html?slug=2025-01-10"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;

    assert!(html.contains("<h1 class=\"article__title\">FinDaily 2025-01-10</h1>"));
    assert!(html.contains("datetime=\"2025-01-10T07:30:00+09:00\""));
    assert!(html.contains("sec--highlight"));
    assert!(html.contains("<details class=\"toggle\" open"));
    assert!(html.contains("<td>—</td>"));
    assert!(html.contains("📰【1】Yen slides"));
    assert!(html.contains("Exporters <b>rally</b>"));
    assert!(html.contains("content=\"Yen slides as yields climb.\""));
    assert!(html.contains("https://fin-daily.test/article.html?slug=2025-01-10"));
}

#[tokio::test]
async fn article_with_unrecognised_section_payload_still_renders() {
    let app = router(MemorySource::new().with_article(
        "2025-01-11",
        json!({
            "title": "FinDaily 2025-01-11",
            "sections": [
                { "type": "highlight", "items": ["Nikkei", 38500] },
                { "type": "chart", "heading": "Chart", "data": { "x": [1, 2] }, "items": [{ "k": 1 }] }
            ]
        }),
    ));

    let response = app
        .oneshot(get("/article.html?slug=2025-01-11"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("・38500"));
    assert!(html.contains("sec--chart"));
    assert!(html.contains("Chart"));
}

#[tokio::test]
async fn article_without_slug_explains_usage() {
    let app = router(MemorySource::new());

    let response = app.oneshot(get("/article.html")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("No article specified"));
}

#[tokio::test]
async fn missing_article_is_not_found_and_names_the_url() {
    let app = router(MemorySource::new().with_article_error("2024-12-31", 404));

    let response = app
        .oneshot(get("/article?slug=2024-12-31"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_string(response).await;
    assert!(html.contains("Load failed | FinDaily"));
    assert!(html.contains("URL: https://data.test/data/articles/2024-12-31.json"));
}

#[tokio::test]
async fn malformed_article_is_a_bad_gateway() {
    let app = router(MemorySource::new().with_raw_article("broken", "{ not json"));

    let response = app
        .oneshot(get("/article.html?slug=broken"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn home_shows_latest_issue() {
    let app = router(MemorySource::new().with_feed(january_feed()));

    let response = app.oneshot(get("/")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Issue 25"));
    assert!(!html.contains("Issue 24"));
    assert!(html.contains("/article.html?slug=2025-01-25"));
}

#[tokio::test]
async fn home_with_empty_feed_is_a_bad_gateway() {
    let app = router(MemorySource::new().with_feed(json!({ "items": [] })));

    let response = app.oneshot(get("/")).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_string(response).await;
    assert!(html.contains("The feed does not list any issues yet."));
}

#[tokio::test]
async fn health_static_and_fallback_routes() {
    let app = router(MemorySource::new());

    let health = app
        .clone()
        .oneshot(get("/_health"))
        .await
        .expect("response");
    assert_eq!(health.status(), StatusCode::NO_CONTENT);

    let css = app
        .clone()
        .oneshot(get("/static/site.css"))
        .await
        .expect("response");
    assert_eq!(css.status(), StatusCode::OK);
    assert!(content_type(&css).starts_with("text/css"));

    let missing = app
        .oneshot(get("/nowhere"))
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let html = body_string(missing).await;
    assert!(html.contains("Page Not Found"));
}
