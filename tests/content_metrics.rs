mod common;

use std::collections::HashSet;

use common::{MemorySource, january_feed};
use findaily::application::content::{
    METRIC_FEED_DROPPED_TOTAL, METRIC_FETCH_FAILED_TOTAL, METRIC_FETCH_MS, METRIC_FETCH_TOTAL,
    load_article, load_feed,
};
use metrics_util::debugging::DebuggingRecorder;
use serde_json::json;

#[tokio::test]
async fn content_loads_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let mut feed = january_feed();
    feed["items"]
        .as_array_mut()
        .expect("items array")
        .push(json!({ "title": "no slug" }));
    let source = MemorySource::new()
        .with_feed(feed)
        .with_article_error("2025-01-01", 503);

    let entries = load_feed(&source).await.expect("feed should load");
    assert_eq!(entries.len(), 25);
    assert!(load_article(&source, "2025-01-01").await.is_err());

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for metric in [
        METRIC_FETCH_TOTAL,
        METRIC_FETCH_FAILED_TOTAL,
        METRIC_FETCH_MS,
        METRIC_FEED_DROPPED_TOTAL,
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
