use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SCRIPT_BROWSER: &str = "SCRIPT_BROWSER";
pub const SCRIPT_API: &str = "SCRIPT_API";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_string: Option<String>,
    #[serde(rename = "verifySSL", default, skip_serializing_if = "Option::is_none")]
    pub verify_ssl: Option<bool>,
    #[serde(rename = "bypassHEADRequest", default, skip_serializing_if = "Option::is_none")]
    pub bypass_head_request: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treat_redirect_as_failure: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Base64 encoded, as the service stores it.
    #[serde(default)]
    pub script_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A synthetic check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub monitor_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<MonitorOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,
    /// `category:name` references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl Monitor {
    pub fn is_script_type(&self) -> bool {
        self.monitor_type == SCRIPT_BROWSER || self.monitor_type == SCRIPT_API
    }

    /// Script body to upload, if this monitor carries a non-empty one.
    pub fn script_text(&self) -> Option<&str> {
        if !self.is_script_type() {
            return None;
        }
        self.script
            .as_ref()
            .map(|s| s.script_text.as_str())
            .filter(|text| !text.is_empty())
    }

    /// Definition sent on create/update. Server-managed fields, script,
    /// labels and tags travel through their own endpoints.
    pub fn to_request(&self) -> Value {
        let mut body = Map::new();
        body.insert("name".into(), Value::from(self.name.clone()));
        body.insert("type".into(), Value::from(self.monitor_type.clone()));
        if let Some(frequency) = self.frequency {
            body.insert("frequency".into(), Value::from(frequency));
        }
        if let Some(uri) = &self.uri {
            body.insert("uri".into(), Value::from(uri.clone()));
        }
        body.insert("locations".into(), Value::from(self.locations.clone()));
        if let Some(status) = &self.status {
            body.insert("status".into(), Value::from(status.clone()));
        }
        if let Some(sla) = self.sla_threshold {
            body.insert("slaThreshold".into(), Value::from(sla));
        }
        if let Some(options) = &self.options {
            if let Ok(options) = serde_json::to_value(options) {
                body.insert("options".into(), options);
            }
        }
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_script_only_for_script_types() {
        let mut monitor: Monitor = serde_json::from_value(json!({
            "id": "a-1",
            "name": "checkout",
            "type": "SCRIPT_API",
            "frequency": 10,
            "locations": ["AWS_US_EAST_1"],
            "options": {"verifySSL": true},
            "script": {"scriptText": "Y29uc29sZS5sb2coMSk="}
        }))
        .unwrap();

        assert!(monitor.is_script_type());
        assert_eq!(monitor.script_text(), Some("Y29uc29sZS5sb2coMSk="));
        assert_eq!(monitor.options.as_ref().and_then(|o| o.verify_ssl), Some(true));

        monitor.monitor_type = "SIMPLE".to_string();
        assert_eq!(monitor.script_text(), None);
    }

    #[test]
    fn test_request_leaves_out_server_fields() {
        let monitor: Monitor = serde_json::from_value(json!({
            "id": "a-1",
            "name": "home",
            "type": "SIMPLE",
            "uri": "https://example.test",
            "locations": ["AWS_EU_WEST_1"],
            "status": "ENABLED",
            "createdAt": "2020-01-01T00:00:00.000+0000",
            "labels": ["env:prod"]
        }))
        .unwrap();

        let request = monitor.to_request();
        assert_eq!(request["name"], "home");
        assert_eq!(request["uri"], "https://example.test");
        assert!(request.get("id").is_none());
        assert!(request.get("createdAt").is_none());
        assert!(request.get("labels").is_none());
    }
}
