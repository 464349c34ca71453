mod common;

use serde_json::json;
use std::fs;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::api_for;
use nrbackup::insert::insert_events_file;
use nrbackup::tracker::operation;
use nrbackup::BackupError;

#[tokio::test]
async fn test_events_posted_with_insert_key() {
    let server = MockServer::start().await;
    let events = json!([
        {"eventType": "Deploy", "service": "checkout"},
        {"eventType": "Deploy", "service": "search"}
    ]);
    Mock::given(method("POST"))
        .and(path("/v1/accounts/123/events"))
        .and(header("x-insert-key", "secret"))
        .and(body_json(&events))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("events.json");
    fs::write(&file, events.to_string()).unwrap();

    let api = api_for(&server);
    let count = insert_events_file(&api, "123", "secret", &file).await.unwrap();

    assert_eq!(count, 2);
    assert_eq!(api.tracker().count(operation::INSERT_CUSTOM_EVENTS), 1);
}

#[tokio::test]
async fn test_rejected_insert_key_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts/123/events"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("event.json");
    fs::write(&file, r#"{"eventType": "Deploy"}"#).unwrap();

    let api = api_for(&server);
    let err = insert_events_file(&api, "123", "wrong", &file).await.unwrap_err();

    assert!(matches!(err, BackupError::NonSuccessStatus { code: 403, .. }));
    let records = api.tracker().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].description, "Missing or invalid insert key");
}
