use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::Result;

/// Fields the service returns that are not modelled are carried through
/// untouched so a restore sends back what a backup read.
pub type Extra = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Term {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_function: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDefined {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_function: Option<String>,
}

/// APM/browser/mobile metric condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub condition_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gc_metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation_close_timer: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<Term>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_defined: Option<UserDefined>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalServiceCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub condition_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<Term>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Condition on a synthetic monitor. `monitor_id` is only meaningful in the
/// account it was read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyntheticsCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook_url: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NrqlQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NrqlSignal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NrqlCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub condition_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation_time_limit_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<Term>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nrql: Option<NrqlQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<NrqlSignal>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginsCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<Term>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PluginRef>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfraThreshold {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Number>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub condition_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_threshold: Option<InfraThreshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_threshold: Option<InfraThreshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_epoch_millis: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at_epoch_millis: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionCategory {
    Default,
    ExternalService,
    Synthetics,
    Nrql,
    Plugins,
    Infrastructure,
}

impl ConditionCategory {
    pub const ALL: [ConditionCategory; 6] = [
        ConditionCategory::Default,
        ConditionCategory::ExternalService,
        ConditionCategory::Synthetics,
        ConditionCategory::Nrql,
        ConditionCategory::Plugins,
        ConditionCategory::Infrastructure,
    ];

    /// Key holding the list in collection responses.
    pub fn list_key(self) -> &'static str {
        match self {
            ConditionCategory::Default => "conditions",
            ConditionCategory::ExternalService => "external_service_conditions",
            ConditionCategory::Synthetics => "synthetics_conditions",
            ConditionCategory::Nrql => "nrql_conditions",
            ConditionCategory::Plugins => "plugins_conditions",
            ConditionCategory::Infrastructure => "data",
        }
    }

    /// Key wrapping a single condition in request bodies.
    pub fn entity_key(self) -> &'static str {
        match self {
            ConditionCategory::Default => "condition",
            ConditionCategory::ExternalService => "external_service_condition",
            ConditionCategory::Synthetics => "synthetics_condition",
            ConditionCategory::Nrql => "nrql_condition",
            ConditionCategory::Plugins => "plugins_condition",
            ConditionCategory::Infrastructure => "data",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionCategory::Default => "default",
            ConditionCategory::ExternalService => "external-service",
            ConditionCategory::Synthetics => "synthetics",
            ConditionCategory::Nrql => "nrql",
            ConditionCategory::Plugins => "plugins",
            ConditionCategory::Infrastructure => "infrastructure",
        }
    }
}

impl std::fmt::Display for ConditionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConditionCategory {
    type Err = crate::error::BackupError;

    /// Accepts the display names plus the short forms `conditions`, `ext`
    /// and `infra`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "conditions" => Ok(ConditionCategory::Default),
            "external-service" | "ext" => Ok(ConditionCategory::ExternalService),
            "synthetics" => Ok(ConditionCategory::Synthetics),
            "nrql" => Ok(ConditionCategory::Nrql),
            "plugins" => Ok(ConditionCategory::Plugins),
            "infrastructure" | "infra" => Ok(ConditionCategory::Infrastructure),
            other => Err(crate::error::BackupError::InvalidInput(format!(
                "Unknown condition type '{other}'"
            ))),
        }
    }
}

/// A policy's alert condition. Exactly one category's attribute set exists.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Default(DefaultCondition),
    ExternalService(ExternalServiceCondition),
    Synthetics(SyntheticsCondition),
    Nrql(NrqlCondition),
    Plugins(PluginsCondition),
    Infrastructure(InfrastructureCondition),
}

impl Condition {
    pub fn from_value(category: ConditionCategory, value: Value) -> Result<Self> {
        Ok(match category {
            ConditionCategory::Default => Condition::Default(serde_json::from_value(value)?),
            ConditionCategory::ExternalService => {
                Condition::ExternalService(serde_json::from_value(value)?)
            }
            ConditionCategory::Synthetics => Condition::Synthetics(serde_json::from_value(value)?),
            ConditionCategory::Nrql => Condition::Nrql(serde_json::from_value(value)?),
            ConditionCategory::Plugins => Condition::Plugins(serde_json::from_value(value)?),
            ConditionCategory::Infrastructure => {
                Condition::Infrastructure(serde_json::from_value(value)?)
            }
        })
    }

    pub fn category(&self) -> ConditionCategory {
        match self {
            Condition::Default(_) => ConditionCategory::Default,
            Condition::ExternalService(_) => ConditionCategory::ExternalService,
            Condition::Synthetics(_) => ConditionCategory::Synthetics,
            Condition::Nrql(_) => ConditionCategory::Nrql,
            Condition::Plugins(_) => ConditionCategory::Plugins,
            Condition::Infrastructure(_) => ConditionCategory::Infrastructure,
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            Condition::Default(c) => c.id,
            Condition::ExternalService(c) => c.id,
            Condition::Synthetics(c) => c.id,
            Condition::Nrql(c) => c.id,
            Condition::Plugins(c) => c.id,
            Condition::Infrastructure(c) => c.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Condition::Default(c) => &c.name,
            Condition::ExternalService(c) => &c.name,
            Condition::Synthetics(c) => &c.name,
            Condition::Nrql(c) => &c.name,
            Condition::Plugins(c) => &c.name,
            Condition::Infrastructure(c) => &c.name,
        }
    }

    pub fn enabled(&self) -> Option<bool> {
        match self {
            Condition::Default(c) => c.enabled,
            Condition::ExternalService(c) => c.enabled,
            Condition::Synthetics(c) => c.enabled,
            Condition::Nrql(c) => c.enabled,
            Condition::Plugins(c) => c.enabled,
            Condition::Infrastructure(c) => c.enabled,
        }
    }

    fn attributes(&self) -> Result<Value> {
        Ok(match self {
            Condition::Default(c) => serde_json::to_value(c)?,
            Condition::ExternalService(c) => serde_json::to_value(c)?,
            Condition::Synthetics(c) => serde_json::to_value(c)?,
            Condition::Nrql(c) => serde_json::to_value(c)?,
            Condition::Plugins(c) => serde_json::to_value(c)?,
            Condition::Infrastructure(c) => serde_json::to_value(c)?,
        })
    }

    /// Request body for create/update under `policy_id`. The id is never
    /// sent; infrastructure conditions carry the policy in the body.
    pub fn to_request(&self, policy_id: i64) -> Result<Value> {
        let mut attributes = self.attributes()?;
        if let Value::Object(map) = &mut attributes {
            map.remove("id");
            if let Condition::Infrastructure(_) = self {
                map.remove("created_at_epoch_millis");
                map.remove("updated_at_epoch_millis");
                map.insert("policy_id".to_string(), Value::from(policy_id));
            }
        }
        let mut body = Map::new();
        body.insert(self.category().entity_key().to_string(), attributes);
        Ok(Value::Object(body))
    }
}

/// Conditions of one policy grouped by category, as stored in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionSet {
    #[serde(default)]
    pub conditions: Vec<DefaultCondition>,
    #[serde(default)]
    pub external_service_conditions: Vec<ExternalServiceCondition>,
    #[serde(default)]
    pub synthetics_conditions: Vec<SyntheticsCondition>,
    #[serde(default)]
    pub nrql_conditions: Vec<NrqlCondition>,
    #[serde(default)]
    pub plugins_conditions: Vec<PluginsCondition>,
    #[serde(default)]
    pub infrastructure_conditions: Vec<InfrastructureCondition>,
    /// Kept opaque; this resource is not part of the category union.
    #[serde(default)]
    pub location_failure_conditions: Vec<Value>,
}

impl ConditionSet {
    pub fn push(&mut self, condition: Condition) {
        match condition {
            Condition::Default(c) => self.conditions.push(c),
            Condition::ExternalService(c) => self.external_service_conditions.push(c),
            Condition::Synthetics(c) => self.synthetics_conditions.push(c),
            Condition::Nrql(c) => self.nrql_conditions.push(c),
            Condition::Plugins(c) => self.plugins_conditions.push(c),
            Condition::Infrastructure(c) => self.infrastructure_conditions.push(c),
        }
    }

    /// All categorised conditions in category order.
    pub fn to_conditions(&self) -> Vec<Condition> {
        let mut all = Vec::with_capacity(self.len());
        all.extend(self.conditions.iter().cloned().map(Condition::Default));
        all.extend(
            self.external_service_conditions
                .iter()
                .cloned()
                .map(Condition::ExternalService),
        );
        all.extend(self.synthetics_conditions.iter().cloned().map(Condition::Synthetics));
        all.extend(self.nrql_conditions.iter().cloned().map(Condition::Nrql));
        all.extend(self.plugins_conditions.iter().cloned().map(Condition::Plugins));
        all.extend(
            self.infrastructure_conditions
                .iter()
                .cloned()
                .map(Condition::Infrastructure),
        );
        all
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
            + self.external_service_conditions.len()
            + self.synthetics_conditions.len()
            + self.nrql_conditions.len()
            + self.plugins_conditions.len()
            + self.infrastructure_conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.location_failure_conditions.is_empty()
    }

    /// Monitor ids referenced by synthetics conditions and by the
    /// entities of location-failure conditions, first-seen order.
    pub fn referenced_monitor_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        let synthetics = self
            .synthetics_conditions
            .iter()
            .filter_map(|c| c.monitor_id.clone());
        let locations = self
            .location_failure_conditions
            .iter()
            .flat_map(location_failure_entities);
        for id in synthetics.chain(locations) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

/// Monitor ids watched by a location-failure condition, read from its
/// `entities` array. Numeric ids are read as their decimal text.
pub fn location_failure_entities(condition: &Value) -> Vec<String> {
    condition
        .get("entities")
        .and_then(Value::as_array)
        .map(|entities| {
            entities
                .iter()
                .filter_map(|entity| match entity {
                    Value::String(id) => Some(id.clone()),
                    Value::Number(id) => Some(id.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
