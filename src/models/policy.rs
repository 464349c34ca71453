use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentPreference {
    PerPolicy,
    PerCondition,
    PerConditionAndTarget,
}

/// A named grouping of alert conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_preference: Option<IncidentPreference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Policy {
    /// The body sent on create/update: identity and timestamps stripped.
    pub fn to_request(&self) -> serde_json::Value {
        let mut policy = serde_json::json!({ "name": self.name });
        if let Some(preference) = self.incident_preference {
            policy["incident_preference"] = serde_json::to_value(preference)
                .unwrap_or(serde_json::Value::Null);
        }
        serde_json::json!({ "policy": policy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_strips_identity() {
        let policy: Policy = serde_json::from_value(json!({
            "id": 10,
            "name": "P1",
            "incident_preference": "PER_CONDITION_AND_TARGET",
            "created_at": 1520000000000i64,
            "updated_at": 1520000000001i64
        }))
        .unwrap();

        assert_eq!(policy.incident_preference, Some(IncidentPreference::PerConditionAndTarget));
        assert_eq!(
            policy.to_request(),
            json!({"policy": {"name": "P1", "incident_preference": "PER_CONDITION_AND_TARGET"}})
        );
    }
}
