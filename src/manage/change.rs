use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use super::{entity, read_document, required_id};
use crate::api::NewRelicApi;
use crate::error::{BackupError, Result};
use crate::models::{Channel, Condition, ConditionCategory, Label, Monitor, Policy, Script};
use crate::restore::monitors::create_monitor_from_backup;

pub async fn create_policy(api: &NewRelicApi, file: &Path) -> Result<String> {
    let policy: Policy = serde_json::from_value(entity(read_document(file)?, "policy"))?;
    let created = api.create_policy(&policy).await?;
    info!(policy = %created.name, policy_id = ?created.id, "Created policy.");
    Ok(serde_json::to_string_pretty(&created)?)
}

pub async fn update_policy(api: &NewRelicApi, file: &Path) -> Result<String> {
    let document = entity(read_document(file)?, "policy");
    let id = required_id(&document, "policy")?;
    let policy: Policy = serde_json::from_value(document)?;
    let updated = api.update_policy(id, &policy).await?;
    info!(policy = %updated.name, policy_id = id, "Updated policy.");
    Ok(serde_json::to_string_pretty(&updated)?)
}

pub async fn delete_policy(api: &NewRelicApi, id: i64) -> Result<String> {
    api.delete_policy(id).await?;
    info!(policy_id = id, "Deleted policy.");
    Ok(format!("Deleted policy {id}."))
}

pub async fn create_channel(api: &NewRelicApi, file: &Path) -> Result<String> {
    let channel: Channel = serde_json::from_value(entity(read_document(file)?, "channel"))?;
    let created = api.create_channel(&channel).await?;
    info!(channel = %created.name, channel_id = ?created.id, "Created channel.");
    Ok(serde_json::to_string_pretty(&created)?)
}

/// Channel set of one policy, as read from an association file.
#[derive(Debug, Deserialize)]
struct ChannelAssociation {
    policy_id: i64,
    #[serde(default)]
    channel_ids: Vec<i64>,
}

/// Channels themselves are not editable; this replaces which channels a
/// policy notifies.
pub async fn update_channels(api: &NewRelicApi, file: &Path) -> Result<String> {
    let association: ChannelAssociation = serde_json::from_value(read_document(file)?)?;
    if association.channel_ids.is_empty() {
        return Err(BackupError::InvalidInput(format!(
            "'{}' lists no channel_ids",
            file.display()
        )));
    }
    api.set_policy_channels(association.policy_id, &association.channel_ids)
        .await?;
    info!(
        policy_id = association.policy_id,
        channels = ?association.channel_ids,
        "Updated policy channels."
    );
    Ok(format!(
        "Policy {} now notifies {} channel(s).",
        association.policy_id,
        association.channel_ids.len()
    ))
}

pub async fn delete_channel(api: &NewRelicApi, id: i64) -> Result<String> {
    api.delete_channel(id).await?;
    info!(channel_id = id, "Deleted channel.");
    Ok(format!("Deleted channel {id}."))
}

fn read_condition(file: &Path, category: ConditionCategory) -> Result<(Value, Condition)> {
    let document = entity(read_document(file)?, category.entity_key());
    let condition = Condition::from_value(category, document.clone())?;
    Ok((document, condition))
}

fn created_message(verb: &str, condition: &Condition) -> String {
    let id = condition.id().map(|id| id.to_string()).unwrap_or_default();
    format!(
        "{verb} {} condition '{}' with id {id}.",
        condition.category(),
        condition.name()
    )
}

pub async fn create_condition(
    api: &NewRelicApi,
    policy_id: i64,
    category: ConditionCategory,
    file: &Path,
) -> Result<String> {
    let (_, condition) = read_condition(file, category)?;
    let created = api.create_condition(policy_id, &condition).await?;
    info!(policy_id, condition = %created.name(), "Created condition.");
    Ok(created_message("Created", &created))
}

/// Infrastructure conditions name their policy in the file (`policy_id`);
/// the other categories do not need one.
pub async fn update_condition(
    api: &NewRelicApi,
    id: i64,
    category: ConditionCategory,
    file: &Path,
) -> Result<String> {
    let (document, condition) = read_condition(file, category)?;
    let policy_id = document.get("policy_id").and_then(Value::as_i64);
    let policy_id = match (category, policy_id) {
        (_, Some(policy_id)) => policy_id,
        (ConditionCategory::Infrastructure, None) => {
            return Err(BackupError::InvalidInput(format!(
                "'{}' has no policy_id",
                file.display()
            )))
        }
        (_, None) => 0,
    };
    let updated = api.update_condition(policy_id, id, &condition).await?;
    info!(condition_id = id, condition = %updated.name(), "Updated condition.");
    Ok(created_message("Updated", &updated))
}

pub async fn delete_condition(api: &NewRelicApi, category: ConditionCategory, id: i64) -> Result<String> {
    api.delete_condition(category, id).await?;
    info!(condition_id = id, %category, "Deleted condition.");
    Ok(format!("Deleted {category} condition {id}."))
}

/// Dashboard files may hold the `{"dashboard": {..}}` envelope or the bare
/// dashboard.
fn dashboard_document(file: &Path) -> Result<Value> {
    let document = read_document(file)?;
    if document.get("dashboard").is_some_and(Value::is_object) {
        return Ok(document);
    }
    Ok(serde_json::json!({ "dashboard": document }))
}

fn dashboard_id(document: &Value) -> Option<i64> {
    document
        .pointer("/dashboard/id")
        .and_then(|id| id.as_i64().or_else(|| id.as_str().and_then(|s| s.parse().ok())))
}

pub async fn create_dashboard(api: &NewRelicApi, file: &Path) -> Result<String> {
    let created = api.create_dashboard(&dashboard_document(file)?).await?;
    let id = dashboard_id(&created);
    info!(dashboard_id = ?id, "Created dashboard.");
    Ok(serde_json::to_string_pretty(&created)?)
}

pub async fn update_dashboard(api: &NewRelicApi, file: &Path) -> Result<String> {
    let document = dashboard_document(file)?;
    let id = dashboard_id(&document)
        .ok_or_else(|| BackupError::InvalidInput("the dashboard file has no id".to_string()))?;
    let updated = api.update_dashboard(id, &document).await?;
    info!(dashboard_id = id, "Updated dashboard.");
    Ok(serde_json::to_string_pretty(&updated)?)
}

pub async fn delete_dashboard(api: &NewRelicApi, id: i64) -> Result<String> {
    api.delete_dashboard(id).await?;
    info!(dashboard_id = id, "Deleted dashboard.");
    Ok(format!("Deleted dashboard {id}."))
}

/// Script files hold plain source; the service stores it base64 encoded.
fn encoded_script(file: &Path) -> Result<String> {
    let source = fs::read(file).map_err(|e| BackupError::io(file, e))?;
    Ok(STANDARD.encode(source))
}

fn read_monitor(file: &Path, script: Option<&Path>) -> Result<Monitor> {
    let mut monitor: Monitor = serde_json::from_value(read_document(file)?)?;
    if let Some(script) = script {
        monitor.script = Some(Script {
            script_text: encoded_script(script)?,
        });
    }
    Ok(monitor)
}

/// Creates the monitor, then uploads its script and attaches its labels.
pub async fn create_monitor(api: &NewRelicApi, file: &Path, script: Option<&Path>) -> Result<String> {
    let monitor = read_monitor(file, script)?;
    let id = create_monitor_from_backup(api, &monitor).await?;
    Ok(format!("Created monitor '{}' with id {id}.", monitor.name))
}

pub async fn update_monitor(api: &NewRelicApi, file: &Path, script: Option<&Path>) -> Result<String> {
    let monitor = read_monitor(file, script)?;
    let id = monitor
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| BackupError::InvalidInput("the monitor file has no id".to_string()))?;
    api.update_monitor(&id, &monitor).await?;
    if let Some(script) = &monitor.script {
        api.update_monitor_script(&id, &script.script_text).await?;
    }
    info!(monitor = %monitor.name, monitor_id = %id, "Updated monitor.");
    Ok(format!("Updated monitor '{}' ({id}).", monitor.name))
}

/// Sends only the attributes in the file. The file names the monitor by `id`.
pub async fn patch_monitor(api: &NewRelicApi, file: &Path) -> Result<String> {
    let mut changes = read_document(file)?;
    let id = match changes.as_object_mut().and_then(|m| m.remove("id")) {
        Some(Value::String(id)) if !id.is_empty() => id,
        _ => {
            return Err(BackupError::InvalidInput(
                "the monitor file has no id".to_string(),
            ))
        }
    };
    api.patch_monitor(&id, &changes).await?;
    info!(monitor_id = %id, "Patched monitor.");
    Ok(format!("Patched monitor {id}."))
}

pub async fn delete_monitor(api: &NewRelicApi, id: &str) -> Result<String> {
    api.delete_monitor(id).await?;
    info!(monitor_id = %id, "Deleted monitor.");
    Ok(format!("Deleted monitor {id}."))
}

fn label_reference(reference: &str) -> Result<String> {
    Label::parse(reference)
        .map(|label| label.reference())
        .ok_or_else(|| {
            BackupError::InvalidInput(format!("label '{reference}' is not in category:name form"))
        })
}

pub async fn add_monitor_label(api: &NewRelicApi, monitor_id: &str, reference: &str) -> Result<String> {
    let reference = label_reference(reference)?;
    api.add_label_to_monitor(monitor_id, &reference).await?;
    info!(monitor_id, label = %reference, "Added label.");
    Ok(format!("Added label {reference} to monitor {monitor_id}."))
}

pub async fn delete_monitor_label(
    api: &NewRelicApi,
    monitor_id: &str,
    reference: &str,
) -> Result<String> {
    let reference = label_reference(reference)?;
    api.delete_label_from_monitor(monitor_id, &reference).await?;
    info!(monitor_id, label = %reference, "Deleted label.");
    Ok(format!("Deleted label {reference} from monitor {monitor_id}."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_dashboard_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("dash.json");
        fs::write(&file, r#"{"id": "8", "title": "Ops"}"#).unwrap();
        let document = dashboard_document(&file).unwrap();
        assert_eq!(document, json!({"dashboard": {"id": "8", "title": "Ops"}}));
        assert_eq!(dashboard_id(&document), Some(8));
    }

    #[test]
    fn test_script_file_is_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = dir.path().join("monitor.json");
        let script = dir.path().join("check.js");
        fs::write(&monitor, r#"{"name": "checkout", "type": "SCRIPT_API"}"#).unwrap();
        fs::write(&script, "$http.get('x');").unwrap();

        let read = read_monitor(&monitor, Some(&script)).unwrap();
        assert_eq!(read.script_text(), Some(STANDARD.encode("$http.get('x');").as_str()));
    }

    #[test]
    fn test_label_reference_requires_category() {
        assert_eq!(label_reference("team:web").unwrap(), "team:web");
        assert!(matches!(label_reference("web"), Err(BackupError::InvalidInput(_))));
    }
}
