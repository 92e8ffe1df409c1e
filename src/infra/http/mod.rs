mod middleware;
mod public;

pub use public::{HttpState, build_router};

const DATASTAR_REQUEST_HEADER: &str = "datastar-request";

/// Join a site-relative path onto the canonical site root.
fn canonical_url(root: &str, path: &str) -> String {
    let base = root.trim_end_matches('/');
    if path == "/" {
        format!("{base}/")
    } else {
        format!("{base}{path}")
    }
}
