use reqwest::Method;
use serde::Deserialize;

use super::{Call, NewRelicApi};
use crate::error::Result;
use crate::fetch::{fetch_all, PageQuery};
use crate::models::Policy;
use crate::tracker::{operation, ServiceKind};

#[derive(Deserialize)]
struct PolicyEnvelope {
    policy: Policy,
}

impl NewRelicApi {
    pub async fn list_policies(&self) -> Result<Vec<Policy>> {
        let query = PageQuery::new(
            operation::GET_ALERT_POLICIES,
            ServiceKind::AlertPolicies,
            "alerts_policies.json",
            "policies",
        );
        fetch_all(&self.clients.alerts, &self.tracker, &query).await
    }

    pub async fn create_policy(&self, policy: &Policy) -> Result<Policy> {
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::AlertPolicies,
            operation::CREATE_ALERT_POLICY,
            Method::POST,
            "alerts_policies.json",
        )
        .json(policy.to_request());
        let response = self.send(call, &format!("name:{}", policy.name)).await?;
        Ok(response.json::<PolicyEnvelope>()?.policy)
    }

    pub async fn update_policy(&self, id: i64, policy: &Policy) -> Result<Policy> {
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::AlertPolicies,
            operation::UPDATE_ALERT_POLICY_BY_ID,
            Method::PUT,
            format!("alerts_policies/{id}.json"),
        )
        .json(policy.to_request());
        let response = self.send(call, &format!("policyId:{id}")).await?;
        Ok(response.json::<PolicyEnvelope>()?.policy)
    }

    pub async fn delete_policy(&self, id: i64) -> Result<()> {
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::AlertPolicies,
            operation::DELETE_ALERT_POLICY_BY_ID,
            Method::DELETE,
            format!("alerts_policies/{id}.json"),
        );
        self.send(call, &format!("policyId:{id}")).await?;
        Ok(())
    }
}
