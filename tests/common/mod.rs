#![allow(dead_code)]

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nrbackup::api::NewRelicApi;
use nrbackup::client::Clients;
use nrbackup::config::{AppConfig, Endpoints};
use nrbackup::tracker::ResultTracker;

pub const ALERTS: &str = "/v2";
pub const SYNTHETICS: &str = "/synthetics/api/v3/monitors";
pub const LABEL_SYNTHETICS: &str = "/synthetics/api/v4/monitors";
pub const INFRA: &str = "/infra/v2/alerts";

/// Condition list paths on the alerts API with their list keys.
pub const CONDITION_LISTS: [(&str, &str); 5] = [
    ("alerts_conditions.json", "conditions"),
    ("alerts_external_service_conditions.json", "external_service_conditions"),
    ("alerts_synthetics_conditions.json", "synthetics_conditions"),
    ("alerts_nrql_conditions.json", "nrql_conditions"),
    ("alerts_plugins_conditions.json", "plugins_conditions"),
];

/// An API handle pointed at the mock server, single attempt, no backoff.
pub fn api_for(server: &MockServer) -> NewRelicApi {
    let mut config = AppConfig::for_endpoints("test-key", Endpoints::rooted_at(&server.uri()));
    config.retries = 1;
    config.retry_backoff = Duration::ZERO;
    config.request_timeout = Duration::from_secs(5);
    NewRelicApi::new(Clients::from_config(&config).unwrap(), ResultTracker::new())
}

pub fn alerts(rest: &str) -> String {
    format!("{ALERTS}/{rest}")
}

/// Serves `items` on page 1 and an empty page for every later page.
pub async fn mount_paged(server: &MockServer, full_path: &str, key: &str, items: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(full_path))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ key: items })))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(full_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ key: [] })))
        .mount(server)
        .await;
}

/// Every condition list of every policy answers empty.
pub async fn mount_empty_conditions(server: &MockServer) {
    for (list, key) in CONDITION_LISTS {
        Mock::given(method("GET"))
            .and(path(alerts(list)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ key: [] })))
            .with_priority(10)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(format!("{INFRA}/conditions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .with_priority(10)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(wiremock::matchers::path_regex(
            r"^/v2/alerts_location_failure_conditions/policies/\d+\.json$",
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "location_failure_conditions": [] })),
        )
        .with_priority(10)
        .mount(server)
        .await;
}

/// Serves the default conditions of one policy on page 1.
pub async fn mount_default_conditions(server: &MockServer, policy_id: i64, conditions: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(alerts("alerts_conditions.json")))
        .and(query_param("policy_id", policy_id.to_string()))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "conditions": conditions })))
        .with_priority(1)
        .mount(server)
        .await;
}

pub fn policy(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "incident_preference": "PER_POLICY",
        "created_at": 1520000000000i64,
        "updated_at": 1520000000000i64
    })
}

pub fn default_condition(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "type": "apm_app_metric",
        "name": name,
        "enabled": true,
        "entities": ["1234"],
        "metric": "apdex",
        "condition_scope": "application",
        "terms": [{
            "duration": "5",
            "operator": "below",
            "priority": "critical",
            "threshold": "0.7",
            "time_function": "all"
        }]
    })
}

/// Number of requests the server received for `method_name path`.
pub async fn received(server: &MockServer, method_name: &str, full_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == method_name && r.url.path() == full_path)
        .count()
}
