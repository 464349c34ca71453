use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

use super::{Call, NewRelicApi};
use crate::error::{BackupError, Result};
use crate::fetch::{fetch_all, PageQuery};
use crate::models::{Monitor, Script, Tag};
use crate::tracker::{operation, ServiceKind};

const MONITOR_PAGE_LIMIT: usize = 50;

const MONITOR_TAGS_QUERY: &str = r#"query($CURSOR: String) {
  actor {
    entitySearch(query: "domain = 'SYNTH' AND type = 'MONITOR'") {
      results(cursor: $CURSOR) {
        nextCursor
        entities {
          ... on SyntheticMonitorEntityOutline {
            monitorId
            tags { key values }
          }
        }
      }
    }
  }
}"#;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TaggedEntity {
    #[serde(default)]
    monitor_id: Option<String>,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SearchResults {
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    entities: Vec<TaggedEntity>,
}

fn search_results(body: &Value) -> Result<SearchResults> {
    match body.pointer("/data/actor/entitySearch/results") {
        Some(results) => Ok(serde_json::from_value(results.clone())?),
        None => Ok(SearchResults::default()),
    }
}

impl NewRelicApi {
    pub async fn list_monitors(&self) -> Result<Vec<Monitor>> {
        let query = PageQuery::new(
            operation::GET_MONITORS,
            ServiceKind::Monitors,
            "",
            "monitors",
        )
        .offset(MONITOR_PAGE_LIMIT);
        fetch_all(&self.clients.synthetics, &self.tracker, &query).await
    }

    pub async fn get_monitor(&self, id: &str) -> Result<Monitor> {
        let call = Call::new(
            &self.clients.synthetics,
            ServiceKind::Monitors,
            operation::GET_MONITOR_BY_ID,
            Method::GET,
            id,
        );
        let response = self.send(call, &format!("monitorId:{id}")).await?;
        response.json()
    }

    /// `None` when the service has no script for the monitor (404).
    pub async fn get_monitor_script(&self, id: &str) -> Result<Option<Script>> {
        let call = Call::new(
            &self.clients.synthetics,
            ServiceKind::MonitorScripts,
            operation::GET_MONITOR_SCRIPT,
            Method::GET,
            format!("{id}/script"),
        );
        let response = self.send_raw(call, &format!("monitorId:{id}")).await?;
        match response.status {
            404 => Ok(None),
            _ if response.is_success() => Ok(Some(response.json()?)),
            code => Err(BackupError::status(operation::GET_MONITOR_SCRIPT, code)),
        }
    }

    /// Creates the monitor and returns the id the service assigned.
    pub async fn create_monitor(&self, monitor: &Monitor) -> Result<String> {
        let call = Call::new(
            &self.clients.synthetics,
            ServiceKind::Monitors,
            operation::CREATE_MONITOR,
            Method::POST,
            "",
        )
        .json(monitor.to_request());
        let response = self.send(call, &format!("name:{}", monitor.name)).await?;
        response.location_id().ok_or_else(|| {
            BackupError::InvalidInput(format!(
                "Create Monitor answer for '{}' has no Location header",
                monitor.name
            ))
        })
    }

    pub async fn update_monitor(&self, id: &str, monitor: &Monitor) -> Result<()> {
        let call = Call::new(
            &self.clients.synthetics,
            ServiceKind::Monitors,
            operation::UPDATE_MONITOR,
            Method::PUT,
            id,
        )
        .json(monitor.to_request());
        self.send(call, &format!("monitorId:{id},name:{}", monitor.name))
            .await?;
        Ok(())
    }

    pub async fn update_monitor_script(&self, id: &str, script_text: &str) -> Result<()> {
        let call = Call::new(
            &self.clients.synthetics,
            ServiceKind::MonitorScripts,
            operation::UPDATE_MONITOR_SCRIPT,
            Method::PUT,
            format!("{id}/script"),
        )
        .json(json!({ "scriptText": script_text }));
        self.send(call, &format!("monitorId:{id}")).await?;
        Ok(())
    }

    /// Changes only the attributes present in `changes`.
    pub async fn patch_monitor(&self, id: &str, changes: &Value) -> Result<()> {
        let call = Call::new(
            &self.clients.synthetics,
            ServiceKind::Monitors,
            operation::PATCH_MONITOR,
            Method::PATCH,
            id,
        )
        .json(changes.clone());
        self.send(call, &format!("monitorId:{id}")).await?;
        Ok(())
    }

    pub async fn delete_monitor(&self, id: &str) -> Result<()> {
        let call = Call::new(
            &self.clients.synthetics,
            ServiceKind::Monitors,
            operation::DELETE_MONITOR,
            Method::DELETE,
            id,
        );
        self.send(call, &format!("monitorId:{id}")).await?;
        Ok(())
    }

    /// Tags of every monitor, keyed by monitor id. Follows the search cursor
    /// until the service stops returning one.
    pub async fn list_monitor_tags(&self) -> Result<HashMap<String, Vec<Tag>>> {
        let mut tags = HashMap::new();
        let mut cursor: Option<String> = None;
        let mut page: u32 = 1;

        loop {
            let call = Call::new(
                &self.clients.graphql,
                ServiceKind::MonitorTags,
                operation::GET_MONITOR_TAGS,
                Method::POST,
                "",
            )
            .json(json!({
                "query": MONITOR_TAGS_QUERY,
                "variables": { "CURSOR": cursor },
            }));
            let response = self.send(call, &format!("pageCount:{page}")).await?;
            let results = search_results(&response.json()?)?;
            debug!(page, count = results.entities.len(), "Fetched monitor tags.");

            for entity in results.entities {
                if let Some(id) = entity.monitor_id {
                    tags.insert(id, entity.tags);
                }
            }
            match results.next_cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
            page += 1;
        }

        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_results_tolerate_missing_tree() {
        let body = json!({
            "data": {"actor": {"entitySearch": {"results": {
                "nextCursor": "abc",
                "entities": [
                    {"monitorId": "m-1", "tags": [{"key": "team", "values": ["web"]}]},
                    {"tags": []}
                ]
            }}}}
        });
        let results = search_results(&body).unwrap();
        assert_eq!(results.next_cursor.as_deref(), Some("abc"));
        assert_eq!(results.entities.len(), 2);
        assert_eq!(results.entities[0].tags[0].values, vec!["web"]);

        let empty = search_results(&json!({"errors": []})).unwrap();
        assert!(empty.entities.is_empty());
        assert!(empty.next_cursor.is_none());
    }
}
