//! Paged collection fetching against a mock service.

mod common;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{alerts, api_for, SYNTHETICS};
use nrbackup::tracker::operation;
use nrbackup::BackupError;

fn monitors(range: std::ops::Range<usize>) -> Vec<Value> {
    range
        .map(|i| json!({"id": format!("m-{i}"), "name": format!("monitor {i}"), "type": "SIMPLE"}))
        .collect()
}

#[tokio::test]
async fn test_page_numbers_walk_until_empty_page() {
    let server = MockServer::start().await;
    for page in 1..=2 {
        let policies: Vec<Value> = (0..10)
            .map(|i| common::policy((page - 1) * 10 + i, &format!("P{}", (page - 1) * 10 + i)))
            .collect();
        Mock::given(method("GET"))
            .and(path(alerts("alerts_policies.json")))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "policies": policies })))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(alerts("alerts_policies.json")))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "policies": [] })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let policies = api.list_policies().await.unwrap();

    // 20 items, 10 per page: two full pages plus the empty one.
    assert_eq!(policies.len(), 20);
    let ids: Vec<i64> = policies.iter().filter_map(|p| p.id).collect();
    assert_eq!(ids, (0..20).collect::<Vec<i64>>());
    assert_eq!(api.tracker().count(operation::GET_ALERT_POLICIES), 3);
    let messages: Vec<String> = api.tracker().records().into_iter().map(|r| r.message).collect();
    assert_eq!(messages, vec!["pageCount:1", "pageCount:2", "pageCount:3"]);
}

#[tokio::test]
async fn test_offset_pages_stop_at_short_page() {
    let server = MockServer::start().await;
    let all = monitors(0..120);
    for (offset, chunk) in [(0usize, 0..50usize), (50, 50..100), (100, 100..120)] {
        Mock::given(method("GET"))
            .and(path(format!("{SYNTHETICS}/")))
            .and(query_param("offset", offset.to_string()))
            .and(query_param("limit", "50"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "monitors": all[chunk].to_vec() })),
            )
            .mount(&server)
            .await;
    }

    let api = api_for(&server);
    let fetched = api.list_monitors().await.unwrap();

    assert_eq!(fetched.len(), 120);
    assert_eq!(fetched[0].name, "monitor 0");
    assert_eq!(fetched[119].name, "monitor 119");
    // ceil((120 + 1) / 50)
    assert_eq!(api.tracker().count(operation::GET_MONITORS), 3);
}

#[tokio::test]
async fn test_offset_pages_with_exact_multiple_read_one_empty_page() {
    let server = MockServer::start().await;
    let all = monitors(0..100);
    for (offset, body) in [
        (0usize, all[0..50].to_vec()),
        (50, all[50..100].to_vec()),
        (100, Vec::new()),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("{SYNTHETICS}/")))
            .and(query_param("offset", offset.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "monitors": body })))
            .mount(&server)
            .await;
    }

    let api = api_for(&server);
    let fetched = api.list_monitors().await.unwrap();

    assert_eq!(fetched.len(), 100);
    assert_eq!(api.tracker().count(operation::GET_MONITORS), 3);
    let last = api.tracker().records().pop().unwrap();
    assert_eq!(last.message, "pageSize:50,pageOffset:100");
}

#[tokio::test]
async fn test_failed_page_fails_whole_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(alerts("alerts_channels.json")))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "channels": [{"id": 1, "name": "ops", "type": "user", "configuration": {}}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(alerts("alerts_channels.json")))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = api.list_channels().await.unwrap_err();

    match err {
        BackupError::NonSuccessStatus { code, page, .. } => {
            assert_eq!(code, 503);
            assert_eq!(page, Some(2));
        }
        other => panic!("unexpected error {other:?}"),
    }
    let records = api.tracker().records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].status_code, 503);
}

#[tokio::test]
async fn test_location_failure_conditions_read_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(alerts("alerts_location_failure_conditions/policies/7.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location_failure_conditions": [{"id": 3, "name": "two locations down"}]
        })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let conditions = api.list_location_failure_conditions(7).await.unwrap();

    assert_eq!(conditions.len(), 1);
    assert_eq!(
        common::received(&server, "GET", &alerts("alerts_location_failure_conditions/policies/7.json")).await,
        1
    );
}
