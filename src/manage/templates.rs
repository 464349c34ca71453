//! Starter files for the create and update commands. Values to fill in are
//! marked `${..}`; numbers carry a usable default instead.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{BackupError, Result};

const MONITOR_SIMPLE: &str = r#"{
  "name": "${MONITOR_NAME}",
  "type": "SIMPLE",
  "frequency": 15,
  "uri": "${URI}",
  "locations": ["AWS_US_WEST_1"],
  "status": "ENABLED",
  "slaThreshold": 7.0,
  "options": {
    "validationString": "",
    "verifySSL": false,
    "bypassHEADRequest": false,
    "treatRedirectAsFailure": false
  },
  "labels": ["${LABEL_CATEGORY}:${LABEL_NAME}"]
}"#;

const MONITOR_SCRIPT_INLINE: &str = r#"{
  "name": "${MONITOR_NAME}",
  "type": "SCRIPT_API",
  "frequency": 15,
  "locations": ["AWS_US_WEST_1"],
  "status": "ENABLED",
  "slaThreshold": 7.0,
  "script": {
    "scriptText": "${BASE64_SCRIPT}"
  }
}"#;

const ALERT_POLICY: &str = r#"{
  "policy": {
    "name": "${POLICY_NAME}",
    "incident_preference": "PER_POLICY"
  }
}"#;

const DASHBOARD: &str = r#"{
  "dashboard": {
    "title": "${DASHBOARD_TITLE}",
    "icon": "bar-chart",
    "visibility": "all",
    "editable": "editable_by_all",
    "metadata": { "version": 1 },
    "widgets": [
      {
        "visualization": "facet_bar_chart",
        "layout": { "width": 1, "height": 1, "row": 1, "column": 1 },
        "data": [{ "nrql": "${NRQL}" }],
        "presentation": { "title": "${WIDGET_TITLE}", "notes": "" }
      }
    ]
  }
}"#;

const CONDITION_APM: &str = r#"{
  "condition": {
    "type": "apm_app_metric",
    "name": "${CONDITION_NAME}",
    "enabled": true,
    "entities": ["${APPLICATION_ID}"],
    "metric": "apdex",
    "condition_scope": "application",
    "terms": [
      { "duration": "5", "operator": "below", "priority": "critical", "threshold": "0.7", "time_function": "all" }
    ]
  }
}"#;

const CONDITION_EXTERNAL_SERVICE: &str = r#"{
  "external_service_condition": {
    "type": "apm_external_service",
    "name": "${CONDITION_NAME}",
    "enabled": true,
    "entities": ["${APPLICATION_ID}"],
    "external_service_url": "${EXTERNAL_HOST}",
    "metric": "response_time_average",
    "terms": [
      { "duration": "5", "operator": "above", "priority": "critical", "threshold": "1", "time_function": "all" }
    ]
  }
}"#;

const CONDITION_SYNTHETICS: &str = r#"{
  "synthetics_condition": {
    "name": "${CONDITION_NAME}",
    "monitor_id": "${MONITOR_ID}",
    "enabled": true
  }
}"#;

const CONDITION_NRQL: &str = r#"{
  "nrql_condition": {
    "name": "${CONDITION_NAME}",
    "enabled": true,
    "value_function": "single_value",
    "terms": [
      { "duration": "5", "operator": "above", "priority": "critical", "threshold": "1", "time_function": "all" }
    ],
    "nrql": {
      "query": "${NRQL}",
      "since_value": "3"
    }
  }
}"#;

const CONDITION_PLUGINS: &str = r#"{
  "plugins_condition": {
    "name": "${CONDITION_NAME}",
    "enabled": true,
    "entities": ["${PLUGIN_COMPONENT_ID}"],
    "metric": "${METRIC}",
    "metric_description": "${METRIC_DESCRIPTION}",
    "value_function": "average",
    "plugin": { "id": "${PLUGIN_ID}", "guid": "${PLUGIN_GUID}" },
    "terms": [
      { "duration": "5", "operator": "above", "priority": "critical", "threshold": "1", "time_function": "all" }
    ]
  }
}"#;

const CONDITION_INFRA: &str = r#"{
  "data": {
    "type": "infra_metric",
    "name": "${CONDITION_NAME}",
    "enabled": true,
    "policy_id": 0,
    "event_type": "SystemSample",
    "select_value": "cpuPercent",
    "comparison": "above",
    "critical_threshold": { "value": 90, "duration_minutes": 5, "time_function": "all" }
  }
}"#;

const CHANNEL_CAMPFIRE: &str = r#"{
  "channel": {
    "name": "${CHANNEL_NAME}",
    "type": "campfire",
    "configuration": { "subdomain": "${SUBDOMAIN}", "token": "${TOKEN}", "room": "${ROOM}" }
  }
}"#;

const CHANNEL_EMAIL: &str = r#"{
  "channel": {
    "name": "${CHANNEL_NAME}",
    "type": "email",
    "configuration": { "recipients": "${EMAIL}", "include_json_attachment": "true" }
  }
}"#;

const CHANNEL_HIPCHAT: &str = r#"{
  "channel": {
    "name": "${CHANNEL_NAME}",
    "type": "hipchat",
    "configuration": { "auth_token": "${AUTH_TOKEN}", "room_id": "${ROOM_ID}" }
  }
}"#;

const CHANNEL_OPSGENIE: &str = r#"{
  "channel": {
    "name": "${CHANNEL_NAME}",
    "type": "opsgenie",
    "configuration": {
      "api_key": "${API_KEY}",
      "teams": "${TEAMS}",
      "tags": "${TAGS}",
      "recipients": "${RECIPIENTS}"
    }
  }
}"#;

const CHANNEL_PAGERDUTY: &str = r#"{
  "channel": {
    "name": "${CHANNEL_NAME}",
    "type": "pagerduty",
    "configuration": { "service_key": "${SERVICE_KEY}" }
  }
}"#;

const CHANNEL_VICTOROPS: &str = r#"{
  "channel": {
    "name": "${CHANNEL_NAME}",
    "type": "victorops",
    "configuration": { "key": "${KEY}", "route_key": "${ROUTE_KEY}" }
  }
}"#;

const CHANNEL_WEBHOOK_JSON: &str = r#"{
  "channel": {
    "name": "${CHANNEL_NAME}",
    "type": "webhook",
    "configuration": {
      "base_url": "${BASE_URL}",
      "auth_username": "${USERNAME}",
      "auth_password": "${PASSWORD}",
      "payload_type": "application/json",
      "payload": { "account_id": "${ACCOUNT_ID}" },
      "headers": { "${HEADER}": "${VALUE}" }
    }
  }
}"#;

const CHANNEL_WEBHOOK_FORM: &str = r#"{
  "channel": {
    "name": "${CHANNEL_NAME}",
    "type": "webhook",
    "configuration": {
      "base_url": "${BASE_URL}",
      "payload_type": "application/x-www-form-urlencoded",
      "payload": { "${FIELD}": "${VALUE}" }
    }
  }
}"#;

const TEMPLATES: &[(&str, &str)] = &[
    ("monitor_simple", MONITOR_SIMPLE),
    ("monitor_script_inline", MONITOR_SCRIPT_INLINE),
    ("alertspolicies", ALERT_POLICY),
    ("dashboard", DASHBOARD),
    ("alertsconditions_apm", CONDITION_APM),
    ("alertsconditions_ext", CONDITION_EXTERNAL_SERVICE),
    ("alertsconditions_synthetics", CONDITION_SYNTHETICS),
    ("alertsconditions_nrql", CONDITION_NRQL),
    ("alertsconditions_plugin", CONDITION_PLUGINS),
    ("alertsconditions_infra", CONDITION_INFRA),
    ("alertschannels_campfire", CHANNEL_CAMPFIRE),
    ("alertschannels_email", CHANNEL_EMAIL),
    ("alertschannels_hipchat", CHANNEL_HIPCHAT),
    ("alertschannels_opsgenie", CHANNEL_OPSGENIE),
    ("alertschannels_pagerduty", CHANNEL_PAGERDUTY),
    ("alertschannels_victorops", CHANNEL_VICTOROPS),
    ("alertschannels_webhook_json", CHANNEL_WEBHOOK_JSON),
    ("alertschannels_webhook_form", CHANNEL_WEBHOOK_FORM),
];

pub fn template_names() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|(name, _)| *name)
}

pub fn template(name: &str) -> Option<&'static str> {
    TEMPLATES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, body)| *body)
}

/// Writes template `name` to `<dir>/<name>.json` and returns the body, framed
/// the way the binary prints it.
pub fn take_template(name: &str, dir: &Path) -> Result<(PathBuf, String)> {
    let body = template(name).ok_or_else(|| {
        BackupError::InvalidInput(format!(
            "unknown template '{name}', expected one of: {}",
            template_names().collect::<Vec<_>>().join(", ")
        ))
    })?;
    let path = dir.join(format!("{name}.json"));
    fs::write(&path, body).map_err(|e| BackupError::io(&path, e))?;
    info!(template = name, path = %path.display(), "Wrote template.");
    Ok((path, format!(">>>>template>>>>\n{body}\n<<<<template<<<<")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Channel, Condition, ConditionCategory, Monitor, Policy};
    use serde_json::Value;

    fn parsed(name: &str) -> Value {
        serde_json::from_str(template(name).unwrap()).unwrap()
    }

    #[test]
    fn test_every_template_is_json() {
        for name in template_names() {
            let body: Value = serde_json::from_str(template(name).unwrap())
                .unwrap_or_else(|e| panic!("{name}: {e}"));
            assert!(body.is_object(), "{name}");
        }
    }

    #[test]
    fn test_templates_read_as_models() {
        let policy: Policy = serde_json::from_value(parsed("alertspolicies")["policy"].clone()).unwrap();
        assert_eq!(policy.name, "${POLICY_NAME}");

        let monitor: Monitor = serde_json::from_value(parsed("monitor_simple")).unwrap();
        assert_eq!(monitor.labels, vec!["${LABEL_CATEGORY}:${LABEL_NAME}"]);

        let channel: Channel = serde_json::from_value(parsed("alertschannels_pagerduty")["channel"].clone()).unwrap();
        assert_eq!(channel.config.kind(), "pagerduty");

        let nrql = Condition::from_value(
            ConditionCategory::Nrql,
            parsed("alertsconditions_nrql")["nrql_condition"].clone(),
        )
        .unwrap();
        assert_eq!(nrql.name(), "${CONDITION_NAME}");
    }

    #[test]
    fn test_take_template_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let (path, printed) = take_template("alertschannels_email", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("alertschannels_email.json"));
        assert_eq!(fs::read_to_string(&path).unwrap(), CHANNEL_EMAIL);
        assert!(printed.starts_with(">>>>template>>>>\n{"));
        assert!(printed.ends_with("}\n<<<<template<<<<"));

        assert!(matches!(
            take_template("nope", dir.path()),
            Err(BackupError::InvalidInput(_))
        ));
    }
}
