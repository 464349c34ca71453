use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use super::{Call, NewRelicApi};
use crate::error::Result;
use crate::fetch::{fetch_all, fetch_unpaged, PageQuery};
use crate::models::Label;
use crate::tracker::{operation, ServiceKind};

const LABEL_PAGE_LIMIT: usize = 20;

#[derive(Deserialize)]
struct MonitorRef {
    id: String,
}

impl NewRelicApi {
    pub async fn list_labels(&self) -> Result<Vec<Label>> {
        let query = PageQuery::new(
            operation::GET_LABELS,
            ServiceKind::Labels,
            "labels.json",
            "labels",
        );
        fetch_all(&self.clients.alerts, &self.tracker, &query).await
    }

    /// Ids of the monitors carrying `label`.
    pub async fn list_monitors_by_label(&self, label: &Label) -> Result<Vec<String>> {
        let query = PageQuery::new(
            operation::GET_MONITORS_BY_LABEL,
            ServiceKind::LabelSynthetics,
            format!("labels/{}", urlencoding::encode(&label.reference())),
            "/pagedData/monitorRefs",
        )
        .offset(LABEL_PAGE_LIMIT);
        let refs: Vec<MonitorRef> =
            fetch_all(&self.clients.label_synthetics, &self.tracker, &query).await?;
        Ok(refs.into_iter().map(|r| r.id).collect())
    }

    /// `category:name` references currently applied to one monitor.
    pub async fn list_monitor_labels(&self, monitor_id: &str) -> Result<Vec<String>> {
        let query = PageQuery::new(
            operation::GET_MONITOR_LABELS,
            ServiceKind::LabelSynthetics,
            format!("{monitor_id}/labels"),
            "labels",
        );
        let raw: Vec<Value> =
            fetch_unpaged(&self.clients.label_synthetics, &self.tracker, &query).await?;
        Ok(raw.iter().filter_map(label_reference).collect())
    }

    pub async fn add_label_to_monitor(&self, monitor_id: &str, reference: &str) -> Result<()> {
        let call = Call::new(
            &self.clients.label_synthetics,
            ServiceKind::LabelSynthetics,
            operation::ADD_LABEL_MONITOR,
            Method::POST,
            format!("{monitor_id}/labels"),
        )
        .raw(reference);
        self.send(call, &format!("monitorId:{monitor_id},label:{reference}"))
            .await?;
        Ok(())
    }

    pub async fn delete_label_from_monitor(&self, monitor_id: &str, reference: &str) -> Result<()> {
        let call = Call::new(
            &self.clients.label_synthetics,
            ServiceKind::LabelSynthetics,
            operation::DELETE_LABEL_FROM_MONITOR,
            Method::DELETE,
            format!("{monitor_id}/labels/{}", urlencoding::encode(reference)),
        );
        self.send(call, &format!("monitorId:{monitor_id},label:{reference}"))
            .await?;
        Ok(())
    }
}

/// Labels come back either as `category:name` strings or as objects.
fn label_reference(value: &Value) -> Option<String> {
    match value {
        Value::String(reference) => Some(reference.clone()),
        Value::Object(_) => serde_json::from_value::<Label>(value.clone())
            .ok()
            .map(|label| label.reference()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_reference_shapes() {
        assert_eq!(label_reference(&json!("env:prod")).as_deref(), Some("env:prod"));
        assert_eq!(
            label_reference(&json!({"category": "team", "name": "web"})).as_deref(),
            Some("team:web")
        );
        assert_eq!(label_reference(&json!(3)), None);
    }
}
