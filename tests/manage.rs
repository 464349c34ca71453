//! Single-resource commands against a mock service.

mod common;

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use wiremock::matchers::{body_json, body_partial_json, body_string, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{alerts, api_for, mount_paged, policy, LABEL_SYNTHETICS, SYNTHETICS};
use nrbackup::api::UserFilter;
use nrbackup::manage::{change, get, OutputFormat};
use nrbackup::models::ConditionCategory;
use nrbackup::tracker::operation;
use nrbackup::BackupError;

fn write_file(dir: &Path, name: &str, body: &Value) -> PathBuf {
    let file = dir.join(name);
    fs::write(&file, serde_json::to_string_pretty(body).unwrap()).unwrap();
    file
}

#[tokio::test]
async fn test_get_policies_filters_by_name() {
    let server = MockServer::start().await;
    mount_paged(
        &server,
        &alerts("alerts_policies.json"),
        "policies",
        vec![policy(1, "web latency"), policy(2, "db disk"), policy(3, "web errors")],
    )
    .await;
    let api = api_for(&server);

    let table = get::get_policies(&api, Some("web"), OutputFormat::Table).await.unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("ID"));
    assert!(lines[1].contains("web latency") && lines[1].contains("PER_POLICY"));
    assert!(lines[2].contains("web errors"));

    let json: Value = serde_json::from_str(
        &get::get_policies(&api, Some("db"), OutputFormat::Json).await.unwrap(),
    )
    .unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], 2);
}

#[tokio::test]
async fn test_get_users_sends_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(alerts("users.json")))
        .and(query_param("filter[email]", "ops@example.test"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": [{
            "id": 7, "first_name": "Ana", "last_name": "Ops",
            "email": "ops@example.test", "role": "admin"
        }]})))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(alerts("users.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": []})))
        .mount(&server)
        .await;
    let api = api_for(&server);

    let filter = UserFilter {
        ids: None,
        email: Some("ops@example.test".to_string()),
    };
    let table = get::get_users(&api, &filter, OutputFormat::Table).await.unwrap();
    let row = table.lines().nth(1).unwrap();
    assert!(row.starts_with('7'));
    assert!(row.contains("ops@example.test") && row.contains("admin"));
    assert_eq!(api.tracker().count(operation::GET_USERS), 2);
}

#[tokio::test]
async fn test_create_channel_strips_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(alerts("alerts_channels.json")))
        .and(body_partial_json(json!({"channel": {
            "name": "pager", "type": "pagerduty",
            "configuration": {"service_key": "abc"}
        }})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"channels": [{
            "id": 55, "name": "pager", "type": "pagerduty",
            "configuration": {"service_key": "abc"}, "links": {"policy_ids": []}
        }]})))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(
        dir.path(),
        "channel.json",
        &json!({"channel": {
            "id": 3, "name": "pager", "type": "pagerduty",
            "configuration": {"service_key": "abc"}, "links": {"policy_ids": [9]}
        }}),
    );
    let api = api_for(&server);

    let printed = change::create_channel(&api, &file).await.unwrap();
    let created: Value = serde_json::from_str(&printed).unwrap();
    assert_eq!(created["id"], 55);
    let sent: Value = server.received_requests().await.unwrap()[0].body_json().unwrap();
    assert!(sent["channel"].get("id").is_none());
    assert!(sent["channel"].get("links").is_none());
}

#[tokio::test]
async fn test_create_nrql_condition_under_policy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(alerts("alerts_nrql_conditions/policies/12.json")))
        .and(body_partial_json(json!({"nrql_condition": {
            "name": "errors", "nrql": {"query": "SELECT count(*) FROM TransactionError"}
        }})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"nrql_condition": {
            "id": 801, "name": "errors", "enabled": true,
            "nrql": {"query": "SELECT count(*) FROM TransactionError", "since_value": "3"}
        }})))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(
        dir.path(),
        "nrql.json",
        &json!({"nrql_condition": {
            "name": "errors", "enabled": true,
            "nrql": {"query": "SELECT count(*) FROM TransactionError", "since_value": "3"}
        }}),
    );
    let api = api_for(&server);

    let printed = change::create_condition(&api, 12, ConditionCategory::Nrql, &file)
        .await
        .unwrap();
    assert_eq!(printed, "Created nrql condition 'errors' with id 801.");
}

#[tokio::test]
async fn test_patch_monitor_sends_patch_without_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{SYNTHETICS}/m-4")))
        .and(body_json(json!({"frequency": 30})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "patch.json", &json!({"id": "m-4", "frequency": 30}));
    let api = api_for(&server);

    assert_eq!(
        change::patch_monitor(&api, &file).await.unwrap(),
        "Patched monitor m-4."
    );
    assert_eq!(api.tracker().count(operation::PATCH_MONITOR), 1);
}

#[tokio::test]
async fn test_delete_channel() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(alerts("alerts_channels/55.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"channel": {"id": 55}})))
        .expect(1)
        .mount(&server)
        .await;
    let api = api_for(&server);

    change::delete_channel(&api, 55).await.unwrap();
    assert_eq!(api.tracker().count(operation::DELETE_ALERT_CHANNEL), 1);
}

#[tokio::test]
async fn test_add_label_posts_reference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{LABEL_SYNTHETICS}/m-4/labels")))
        .and(body_string("team:web"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let api = api_for(&server);

    change::add_monitor_label(&api, "m-4", "team:web").await.unwrap();
    let err = change::add_monitor_label(&api, "m-4", "web").await.unwrap_err();
    assert!(matches!(err, BackupError::InvalidInput(_)));
}

#[tokio::test]
async fn test_update_policy_needs_an_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(alerts("alerts_policies/5.json")))
        .and(body_json(json!({"policy": {"name": "renamed", "incident_preference": "PER_CONDITION"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"policy": {
            "id": 5, "name": "renamed", "incident_preference": "PER_CONDITION"
        }})))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let api = api_for(&server);

    let missing = write_file(dir.path(), "no-id.json", &json!({"policy": {"name": "renamed"}}));
    assert!(matches!(
        change::update_policy(&api, &missing).await,
        Err(BackupError::InvalidInput(_))
    ));

    let file = write_file(
        dir.path(),
        "policy.json",
        &json!({"policy": {"id": 5, "name": "renamed", "incident_preference": "PER_CONDITION"}}),
    );
    let updated: Value =
        serde_json::from_str(&change::update_policy(&api, &file).await.unwrap()).unwrap();
    assert_eq!(updated["name"], "renamed");
}

#[tokio::test]
async fn test_update_channels_replaces_policy_channels() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(alerts("alerts_policy_channels.json")))
        .and(query_param("policy_id", "5"))
        .and(query_param("channel_ids", "8,9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"policy": {"id": 5}})))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(
        dir.path(),
        "association.json",
        &json!({"policy_id": 5, "channel_ids": [8, 9]}),
    );
    let api = api_for(&server);

    assert_eq!(
        change::update_channels(&api, &file).await.unwrap(),
        "Policy 5 now notifies 2 channel(s)."
    );
}
