use reqwest::Method;
use serde_json::Value;

use super::{Call, NewRelicApi};
use crate::client::ApiClient;
use crate::error::Result;
use crate::fetch::{fetch_all, fetch_unpaged, PageQuery};
use crate::models::{Condition, ConditionCategory, ConditionSet};
use crate::tracker::{operation, ServiceKind};

/// Page size of the infrastructure conditions API.
const INFRA_PAGE_LIMIT: usize = 50;

const LOCATION_FAILURE_STEM: &str = "alerts_location_failure_conditions";
const LOCATION_FAILURE_KEY: &str = "location_failure_conditions";
const LOCATION_FAILURE_ENTITY: &str = "location_failure_condition";

/// Path stem of a category on the alerts API. Infrastructure lives elsewhere.
fn alerts_stem(category: ConditionCategory) -> &'static str {
    match category {
        ConditionCategory::Default => "alerts_conditions",
        ConditionCategory::ExternalService => "alerts_external_service_conditions",
        ConditionCategory::Synthetics => "alerts_synthetics_conditions",
        ConditionCategory::Nrql => "alerts_nrql_conditions",
        ConditionCategory::Plugins => "alerts_plugins_conditions",
        ConditionCategory::Infrastructure => "conditions",
    }
}

fn item_path(category: ConditionCategory, id: i64) -> String {
    match category {
        ConditionCategory::Infrastructure => format!("conditions/{id}"),
        other => format!("{}/{id}.json", alerts_stem(other)),
    }
}

fn create_path(category: ConditionCategory, policy_id: i64) -> String {
    match category {
        ConditionCategory::Infrastructure => "conditions".to_string(),
        other => format!("{}/policies/{policy_id}.json", alerts_stem(other)),
    }
}

/// Reads the condition back from a create/update answer, keeping what was
/// sent when the answer carries no entity.
fn condition_from_response(sent: &Condition, body: Value) -> Result<Condition> {
    match body.get(sent.category().entity_key()) {
        Some(entity) if entity.is_object() => Condition::from_value(sent.category(), entity.clone()),
        _ => Ok(sent.clone()),
    }
}

impl NewRelicApi {
    fn condition_client(&self, category: ConditionCategory) -> &ApiClient {
        match category {
            ConditionCategory::Infrastructure => &self.clients.infrastructure,
            _ => &self.clients.alerts,
        }
    }

    pub async fn list_conditions(
        &self,
        policy_id: i64,
        category: ConditionCategory,
    ) -> Result<Vec<Condition>> {
        let query = match category {
            ConditionCategory::Infrastructure => PageQuery::new(
                operation::GET_CONDITIONS_BY_POLICY_ID,
                ServiceKind::AlertConditions,
                "conditions",
                category.list_key(),
            )
            .param("policy_id", policy_id)
            .offset(INFRA_PAGE_LIMIT),
            other => PageQuery::new(
                operation::GET_CONDITIONS_BY_POLICY_ID,
                ServiceKind::AlertConditions,
                format!("{}.json", alerts_stem(other)),
                other.list_key(),
            )
            .param("policy_id", policy_id),
        };
        let raw: Vec<Value> = fetch_all(self.condition_client(category), &self.tracker, &query).await?;
        raw.into_iter()
            .map(|value| Condition::from_value(category, value))
            .collect()
    }

    /// Location-failure conditions repeat their first page past the end, so
    /// they are read with a single request.
    pub async fn list_location_failure_conditions(&self, policy_id: i64) -> Result<Vec<Value>> {
        let query = PageQuery::new(
            operation::GET_LOCATION_CONDITIONS_BY_POLICY_ID,
            ServiceKind::AlertConditions,
            format!("{LOCATION_FAILURE_STEM}/policies/{policy_id}.json"),
            LOCATION_FAILURE_KEY,
        );
        fetch_unpaged(&self.clients.alerts, &self.tracker, &query).await
    }

    /// Every condition of a policy, all categories.
    pub async fn list_policy_conditions(&self, policy_id: i64) -> Result<ConditionSet> {
        let mut set = ConditionSet::default();
        for category in ConditionCategory::ALL {
            for condition in self.list_conditions(policy_id, category).await? {
                set.push(condition);
            }
        }
        set.location_failure_conditions = self.list_location_failure_conditions(policy_id).await?;
        Ok(set)
    }

    pub async fn create_condition(&self, policy_id: i64, condition: &Condition) -> Result<Condition> {
        let category = condition.category();
        let call = Call::new(
            self.condition_client(category),
            ServiceKind::AlertConditions,
            operation::CREATE_ALERT_CONDITION,
            Method::POST,
            create_path(category, policy_id),
        )
        .json(condition.to_request(policy_id)?);
        let message = format!("policyId:{policy_id},{category}:{}", condition.name());
        let response = self.send(call, &message).await?;
        condition_from_response(condition, response.json()?)
    }

    pub async fn update_condition(
        &self,
        policy_id: i64,
        id: i64,
        condition: &Condition,
    ) -> Result<Condition> {
        let category = condition.category();
        let call = Call::new(
            self.condition_client(category),
            ServiceKind::AlertConditions,
            operation::UPDATE_ALERT_CONDITION_BY_ID,
            Method::PUT,
            item_path(category, id),
        )
        .json(condition.to_request(policy_id)?);
        let response = self.send(call, &format!("conditionId:{id},{category}")).await?;
        condition_from_response(condition, response.json()?)
    }

    pub async fn delete_condition(&self, category: ConditionCategory, id: i64) -> Result<()> {
        let call = Call::new(
            self.condition_client(category),
            ServiceKind::AlertConditions,
            operation::DELETE_ALERT_CONDITION,
            Method::DELETE,
            item_path(category, id),
        );
        self.send(call, &format!("conditionId:{id},{category}")).await?;
        Ok(())
    }

    pub async fn create_location_failure_condition(
        &self,
        policy_id: i64,
        condition: &Value,
    ) -> Result<()> {
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::AlertConditions,
            operation::CREATE_ALERT_CONDITION,
            Method::POST,
            format!("{LOCATION_FAILURE_STEM}/policies/{policy_id}.json"),
        )
        .json(location_failure_request(condition));
        let message = format!("policyId:{policy_id},location-failure:{}", value_name(condition));
        self.send(call, &message).await?;
        Ok(())
    }

    pub async fn update_location_failure_condition(&self, id: i64, condition: &Value) -> Result<()> {
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::AlertConditions,
            operation::UPDATE_ALERT_CONDITION_BY_ID,
            Method::PUT,
            format!("{LOCATION_FAILURE_STEM}/{id}.json"),
        )
        .json(location_failure_request(condition));
        self.send(call, &format!("conditionId:{id},location-failure")).await?;
        Ok(())
    }

    pub async fn delete_location_failure_condition(&self, id: i64) -> Result<()> {
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::AlertConditions,
            operation::DELETE_ALERT_CONDITION,
            Method::DELETE,
            format!("{LOCATION_FAILURE_STEM}/{id}.json"),
        );
        self.send(call, &format!("conditionId:{id},location-failure")).await?;
        Ok(())
    }
}

pub(crate) fn value_name(value: &Value) -> &str {
    value.get("name").and_then(Value::as_str).unwrap_or_default()
}

pub(crate) fn value_id(value: &Value) -> Option<i64> {
    value.get("id").and_then(Value::as_i64)
}

fn location_failure_request(condition: &Value) -> Value {
    let mut body = condition.clone();
    if let Value::Object(map) = &mut body {
        map.remove("id");
    }
    serde_json::json!({ LOCATION_FAILURE_ENTITY: body })
}
