use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Call, NewRelicApi};
use crate::error::Result;
use crate::fetch::{fetch_all, PageQuery};
use crate::tracker::{operation, ServiceKind};

/// Listing entry; the full dashboard stays untyped JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub id: i64,
    #[serde(default)]
    pub title: String,
}

impl NewRelicApi {
    pub async fn list_dashboards(&self) -> Result<Vec<DashboardSummary>> {
        let query = PageQuery::new(
            operation::GET_DASHBOARDS,
            ServiceKind::Dashboards,
            "dashboards.json",
            "dashboards",
        );
        fetch_all(&self.clients.alerts, &self.tracker, &query).await
    }

    /// The `{"dashboard": {..}}` document of one dashboard.
    pub async fn get_dashboard(&self, id: i64) -> Result<Value> {
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::Dashboards,
            operation::GET_DASHBOARD_BY_ID,
            Method::GET,
            format!("dashboards/{id}.json"),
        );
        self.send(call, &format!("dashboardId:{id}")).await?.json()
    }

    pub async fn create_dashboard(&self, document: &Value) -> Result<Value> {
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::Dashboards,
            operation::CREATE_DASHBOARD,
            Method::POST,
            "dashboards.json",
        )
        .json(without_identity(document));
        self.send(call, &format!("title:{}", dashboard_title(document)))
            .await?
            .json()
    }

    pub async fn update_dashboard(&self, id: i64, document: &Value) -> Result<Value> {
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::Dashboards,
            operation::UPDATE_DASHBOARD_BY_ID,
            Method::PUT,
            format!("dashboards/{id}.json"),
        )
        .json(without_identity(document));
        self.send(call, &format!("dashboardId:{id}")).await?.json()
    }

    pub async fn delete_dashboard(&self, id: i64) -> Result<()> {
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::Dashboards,
            operation::DELETE_DASHBOARD_BY_ID,
            Method::DELETE,
            format!("dashboards/{id}.json"),
        );
        self.send(call, &format!("dashboardId:{id}")).await?;
        Ok(())
    }
}

/// Title of a `{"dashboard": {..}}` document, empty when absent.
pub fn dashboard_title(document: &Value) -> &str {
    document
        .pointer("/dashboard/title")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn without_identity(document: &Value) -> Value {
    let mut body = document.clone();
    if let Some(Value::Object(dashboard)) = body.get_mut("dashboard") {
        dashboard.remove("id");
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_is_stripped_and_title_read() {
        let document = json!({"dashboard": {"id": 12, "title": "Ops", "widgets": [{"a": 1}]}});
        assert_eq!(dashboard_title(&document), "Ops");
        assert_eq!(
            without_identity(&document),
            json!({"dashboard": {"title": "Ops", "widgets": [{"a": 1}]}})
        );
        assert_eq!(dashboard_title(&json!({})), "");
    }
}
