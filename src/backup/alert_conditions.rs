use std::collections::BTreeMap;
use tracing::{info, warn};

use super::monitors::fetch_monitor_with_script;
use super::BackupOptions;
use crate::api::NewRelicApi;
use crate::error::{BackupError, Result};
use crate::fetch::{fan_out, MAX_CONCURRENT_TASK};
use crate::models::snapshot::{bundle_path, write_pretty, ALERT_CONDITIONS_SUFFIX};
use crate::models::{Channel, Monitor, PolicySnapshot};
use crate::tracker::{ItemOutcome, ItemReport};

pub const REPORT_TITLE: &str = "Backup alert policies";

/// Builds one snapshot unit per policy and writes them out.
///
/// Listing policies or channels is a precondition: its failure fails the
/// whole run. A policy whose conditions cannot be read fails on its own and
/// is left out of the output.
pub async fn backup_alert_conditions(
    api: &NewRelicApi,
    options: &BackupOptions,
) -> Result<ItemReport> {
    let policies = api.list_policies().await?;
    let channels = api.list_channels().await?;
    info!(policies = policies.len(), channels = channels.len(), "Listed alert policies.");

    let policy_ids: Vec<Option<i64>> = policies.iter().map(|p| p.id).collect();
    let worker_api = api.clone();
    let condition_sets = fan_out(policy_ids, MAX_CONCURRENT_TASK, move |policy_id| {
        let api = worker_api.clone();
        async move {
            match policy_id {
                Some(id) => api.list_policy_conditions(id).await,
                None => Err(BackupError::InvalidInput("policy without id".to_string())),
            }
        }
    })
    .await;

    let mut report = ItemReport::new(REPORT_TITLE);
    let mut units: Vec<PolicySnapshot> = Vec::new();
    for (policy, conditions) in policies.into_iter().zip(condition_sets) {
        let mut unit = PolicySnapshot::new(policy);
        let Some(conditions) = conditions else {
            let target = unit_target(options, &unit);
            report.push(ItemOutcome::fail(
                target,
                unit.policy.name.clone(),
                "failed to fetch alert conditions",
            ));
            continue;
        };
        unit.alerts_conditions = conditions;
        unit.alerts_channels = channels_of(&channels, unit.policy.id);
        units.push(unit);
    }

    if !options.no_deps {
        attach_dependencies(api, &mut units).await;
    }

    if options.single_file {
        let path = bundle_path(&options.dir, ALERT_CONDITIONS_SUFFIX);
        let path_text = path.display().to_string();
        match write_pretty(&path, &units) {
            Ok(()) => {
                for unit in &units {
                    report.push(ItemOutcome::success(&path_text, unit.policy.name.clone()));
                }
            }
            Err(e) => {
                for unit in &units {
                    report.push(ItemOutcome::fail(
                        &path_text,
                        unit.policy.name.clone(),
                        e.to_string(),
                    ));
                }
            }
        }
    } else {
        for unit in &units {
            let path = options.dir.join(unit.file_name());
            let path_text = path.display().to_string();
            match write_pretty(&path, unit) {
                Ok(()) => report.push(ItemOutcome::success(path_text, unit.policy.name.clone())),
                Err(e) => report.push(ItemOutcome::fail(
                    path_text,
                    unit.policy.name.clone(),
                    e.to_string(),
                )),
            }
        }
    }

    Ok(report)
}

fn unit_target(options: &BackupOptions, unit: &PolicySnapshot) -> String {
    let path = if options.single_file {
        bundle_path(&options.dir, ALERT_CONDITIONS_SUFFIX)
    } else {
        options.dir.join(unit.file_name())
    };
    path.display().to_string()
}

/// Channels whose association list names the policy.
fn channels_of(channels: &[Channel], policy_id: Option<i64>) -> Vec<Channel> {
    let Some(policy_id) = policy_id else {
        return Vec::new();
    };
    channels
        .iter()
        .filter(|c| c.links.policy_ids.contains(&policy_id))
        .cloned()
        .collect()
}

/// Fills each unit's monitor side-table. Every referenced monitor is fetched
/// once; one that cannot be fetched is logged and left out.
async fn attach_dependencies(api: &NewRelicApi, units: &mut [PolicySnapshot]) {
    let mut monitor_ids: Vec<String> = Vec::new();
    for unit in units.iter() {
        for id in unit.alerts_conditions.referenced_monitor_ids() {
            if !monitor_ids.contains(&id) {
                monitor_ids.push(id);
            }
        }
    }
    if monitor_ids.is_empty() {
        return;
    }

    let worker_api = api.clone();
    let fetched = fan_out(monitor_ids.clone(), MAX_CONCURRENT_TASK, move |id| {
        let api = worker_api.clone();
        async move { fetch_monitor_with_script(&api, &id).await }
    })
    .await;

    let mut monitors: BTreeMap<String, Monitor> = BTreeMap::new();
    for (id, monitor) in monitor_ids.into_iter().zip(fetched) {
        match monitor {
            Some(monitor) => {
                monitors.insert(id, monitor);
            }
            None => warn!(monitor_id = %id, "Dependent monitor could not be fetched."),
        }
    }

    for unit in units.iter_mut() {
        for id in unit.alerts_conditions.referenced_monitor_ids() {
            if let Some(monitor) = monitors.get(&id) {
                unit.dependencies
                    .dependent_monitors
                    .insert(id, monitor.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channels_are_matched_by_policy_link() {
        let channels: Vec<Channel> = serde_json::from_value(json!([
            {"id": 1, "name": "a", "type": "email", "configuration": {"recipients": "x@y"}, "links": {"policy_ids": [10]}},
            {"id": 2, "name": "b", "type": "user", "configuration": {}, "links": {"policy_ids": [20, 10]}},
            {"id": 3, "name": "c", "type": "user", "configuration": {}, "links": {"policy_ids": []}}
        ]))
        .unwrap();

        let names: Vec<String> = channels_of(&channels, Some(10))
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(channels_of(&channels, Some(99)).is_empty());
        assert!(channels_of(&channels, None).is_empty());
    }
}
