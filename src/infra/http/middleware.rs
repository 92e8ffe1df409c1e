use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use super::DATASTAR_REQUEST_HEADER;
use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Tag each request and its response with a fresh request id, echoed back in
/// the `x-request-id` header.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// What the response log needs from a request that has already been handed on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestSummary {
    method: Method,
    path: String,
    query: String,
    slug: Option<String>,
    fragment: bool,
    request_id: String,
}

impl RequestSummary {
    fn capture(request: &Request<Body>) -> Self {
        let uri = request.uri();
        let query = uri.query().unwrap_or("").to_string();
        let slug = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "slug")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty());

        Self {
            method: request.method().clone(),
            path: uri.path().to_string(),
            query,
            slug,
            fragment: request.headers().contains_key(DATASTAR_REQUEST_HEADER),
            request_id: request
                .extensions()
                .get::<RequestContext>()
                .map(|ctx| ctx.request_id.clone())
                .unwrap_or_default(),
        }
    }
}

/// Log 4xx at warn and 5xx at error, including any attached [`ErrorReport`] chain.
/// Article requests carry their slug; archive fragment requests are flagged.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let summary = RequestSummary::capture(&request);
    let start = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());
        let slug = summary.slug.as_deref().unwrap_or("");

        if status.is_server_error() {
            error!(
                target: "findaily::http::response",
                status = status.as_u16(),
                method = %summary.method,
                path = %summary.path,
                query = %summary.query,
                slug,
                fragment = summary.fragment,
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = %summary.request_id,
                "request failed",
            );
        } else {
            warn!(
                target: "findaily::http::response",
                status = status.as_u16(),
                method = %summary.method,
                path = %summary.path,
                query = %summary.query,
                slug,
                fragment = summary.fragment,
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = %summary.request_id,
                "client request error",
            );
        }
    }

    response
}
