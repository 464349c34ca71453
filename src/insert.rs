//! Custom event insertion from a local JSON file.

use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::api::NewRelicApi;
use crate::error::{BackupError, Result};

/// Reads `file` and posts its events to `account_id`.
///
/// The file holds one event object or an array of them; anything else is
/// rejected before a request is made.
pub async fn insert_events_file(
    api: &NewRelicApi,
    account_id: &str,
    insert_key: &str,
    file: &Path,
) -> Result<usize> {
    if account_id.trim().is_empty() {
        return Err(BackupError::InvalidInput("account id is empty".to_string()));
    }
    if insert_key.trim().is_empty() {
        return Err(BackupError::InvalidInput("insert key is empty".to_string()));
    }

    let text = fs::read_to_string(file).map_err(|e| BackupError::io(file, e))?;
    let events: Value = serde_json::from_str(&text)?;
    let count = match &events {
        Value::Array(items) if items.iter().all(Value::is_object) => items.len(),
        Value::Object(_) => 1,
        _ => {
            return Err(BackupError::InvalidInput(format!(
                "'{}' must hold an event object or an array of event objects",
                file.display()
            )))
        }
    };

    api.insert_custom_events(account_id.trim(), insert_key.trim(), &events)
        .await?;
    info!(account_id, events = count, file = %file.display(), "Inserted custom events.");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Clients;
    use crate::config::{AppConfig, Endpoints};
    use crate::tracker::ResultTracker;

    fn offline_api() -> NewRelicApi {
        let config = AppConfig::for_endpoints("k", Endpoints::rooted_at("http://127.0.0.1:9"));
        NewRelicApi::new(Clients::from_config(&config).unwrap(), ResultTracker::new())
    }

    #[tokio::test]
    async fn test_scalar_payload_is_rejected_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("events.json");
        fs::write(&file, "[1, 2]").unwrap();

        let api = offline_api();
        let err = insert_events_file(&api, "123", "key", &file).await.unwrap_err();

        assert!(matches!(err, BackupError::InvalidInput(_)));
        assert!(api.tracker().is_empty());
    }

    #[tokio::test]
    async fn test_blank_account_is_rejected() {
        let api = offline_api();
        let err = insert_events_file(&api, " ", "key", Path::new("unused.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::InvalidInput(_)));
    }
}
