use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::client::{ApiClient, ApiResponse, RequestBody};
use crate::error::{BackupError, Result};
use crate::tracker::{ResultTracker, ServiceKind};

/// How successive pages are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStyle {
    /// `page=1,2,...`; the walk ends at the first empty page.
    PageNumber,
    /// `limit=L&offset=0,L,2L...`; the walk ends at the first empty page or
    /// at a page shorter than `limit`, which is necessarily the last one.
    Offset { limit: usize },
}

/// Describes one paged collection.
#[derive(Debug, Clone)]
pub struct PageQuery {
    pub operation: &'static str,
    pub kind: ServiceKind,
    pub path: String,
    pub params: Vec<(&'static str, String)>,
    /// Top-level key holding the items, or a JSON pointer when it starts with `/`.
    pub items_key: &'static str,
    pub style: PageStyle,
}

impl PageQuery {
    pub fn new(
        operation: &'static str,
        kind: ServiceKind,
        path: impl Into<String>,
        items_key: &'static str,
    ) -> Self {
        Self {
            operation,
            kind,
            path: path.into(),
            params: Vec::new(),
            items_key,
            style: PageStyle::PageNumber,
        }
    }

    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.params.push((key, value.to_string()));
        self
    }

    pub fn offset(mut self, limit: usize) -> Self {
        self.style = PageStyle::Offset { limit };
        self
    }

    fn page_params(&self, page_index: u32) -> (Vec<(&'static str, String)>, String) {
        let mut params = self.params.clone();
        let message = match self.style {
            PageStyle::PageNumber => {
                params.push(("page", page_index.to_string()));
                format!("pageCount:{page_index}")
            }
            PageStyle::Offset { limit } => {
                let offset = (page_index as usize - 1) * limit;
                params.push(("limit", limit.to_string()));
                params.push(("offset", offset.to_string()));
                format!("pageSize:{limit},pageOffset:{offset}")
            }
        };
        (params, message)
    }
}

pub(crate) fn extract_items(body: Value, items_key: &str) -> Vec<Value> {
    let found = if items_key.starts_with('/') {
        body.pointer(items_key).cloned()
    } else {
        match body {
            Value::Object(mut map) => map.remove(items_key),
            _ => None,
        }
    };
    match found {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// A transport failure is recorded with status 0.
async fn send_recorded(
    client: &ApiClient,
    tracker: &ResultTracker,
    query: &PageQuery,
    params: &[(&'static str, String)],
    message: String,
) -> Result<ApiResponse> {
    match client
        .send(query.operation, Method::GET, &query.path, params, RequestBody::Empty)
        .await
    {
        Ok(response) => {
            tracker.record(query.kind, query.operation, response.status, message);
            Ok(response)
        }
        Err(e) => {
            tracker.record(query.kind, query.operation, 0, format!("{message},error:{e}"));
            Err(e)
        }
    }
}

/// Walks every page of a collection and merges the items in received order.
/// Any failed page fails the whole fetch; each page call is recorded.
pub async fn fetch_all<T: DeserializeOwned>(
    client: &ApiClient,
    tracker: &ResultTracker,
    query: &PageQuery,
) -> Result<Vec<T>> {
    let mut items: Vec<T> = Vec::new();
    let mut page_index: u32 = 1;

    loop {
        let (params, message) = query.page_params(page_index);
        let response = send_recorded(client, tracker, query, &params, message).await?;

        if !response.is_success() {
            return Err(BackupError::NonSuccessStatus {
                operation: query.operation.to_string(),
                code: response.status,
                page: Some(page_index),
            });
        }

        let page_items = extract_items(response.json()?, query.items_key);
        let count = page_items.len();
        debug!(operation = query.operation, page = page_index, count, "Fetched page.");
        if count == 0 {
            break;
        }
        for item in page_items {
            items.push(serde_json::from_value(item)?);
        }
        if let PageStyle::Offset { limit } = query.style {
            if count < limit {
                break;
            }
        }
        page_index += 1;
    }

    Ok(items)
}

/// One unpaged request for resources whose paging does not terminate with an
/// empty page.
pub async fn fetch_unpaged<T: DeserializeOwned>(
    client: &ApiClient,
    tracker: &ResultTracker,
    query: &PageQuery,
) -> Result<Vec<T>> {
    let response =
        send_recorded(client, tracker, query, &query.params, query.path.clone()).await?;
    if !response.is_success() {
        return Err(BackupError::status(query.operation, response.status));
    }
    extract_items(response.json()?, query.items_key)
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(BackupError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_by_key_and_pointer() {
        let body = json!({"policies": [{"id": 1}, {"id": 2}]});
        assert_eq!(extract_items(body, "policies").len(), 2);

        let nested = json!({"pagedData": {"monitorRefs": [{"id": "a"}]}});
        assert_eq!(extract_items(nested, "/pagedData/monitorRefs").len(), 1);

        assert!(extract_items(json!({"other": []}), "policies").is_empty());
        assert!(extract_items(json!(null), "policies").is_empty());
    }

    #[test]
    fn test_page_params_per_style() {
        let query = PageQuery::new("Get Monitors", ServiceKind::Monitors, "", "monitors").offset(50);
        let (params, message) = query.page_params(3);
        assert_eq!(params, vec![("limit", "50".to_string()), ("offset", "100".to_string())]);
        assert_eq!(message, "pageSize:50,pageOffset:100");

        let query = PageQuery::new("Get Alert Policies", ServiceKind::AlertPolicies, "alerts_policies.json", "policies")
            .param("policy_id", 7);
        let (params, message) = query.page_params(2);
        assert_eq!(params, vec![("policy_id", "7".to_string()), ("page", "2".to_string())]);
        assert_eq!(message, "pageCount:2");
    }
}
