use std::collections::HashMap;
use tracing::{info, warn};

use super::BackupOptions;
use crate::api::NewRelicApi;
use crate::error::Result;
use crate::fetch::{fan_out, MAX_CONCURRENT_TASK};
use crate::models::snapshot::{bundle_path, monitor_file_name, write_pretty, MONITOR_SUFFIX};
use crate::models::{Label, Monitor};
use crate::tracker::{ItemOutcome, ItemReport};

pub const REPORT_TITLE: &str = "Backup monitors";

/// One monitor with its script, when it has one.
pub(crate) async fn fetch_monitor_with_script(api: &NewRelicApi, id: &str) -> Result<Monitor> {
    let mut monitor = api.get_monitor(id).await?;
    if monitor.is_script_type() {
        monitor.script = api.get_monitor_script(id).await?;
    }
    Ok(monitor)
}

pub async fn backup_monitors(api: &NewRelicApi, options: &BackupOptions) -> Result<ItemReport> {
    let monitors = api.list_monitors().await?;
    info!(monitors = monitors.len(), "Listed monitors.");

    let mut report = ItemReport::new(REPORT_TITLE);
    let mut monitors = attach_scripts(api, monitors, options, &mut report).await;

    let labels_by_monitor = monitor_labels(api).await?;
    let tags_by_monitor = match api.list_monitor_tags().await {
        Ok(tags) => tags,
        Err(e) => {
            warn!(error = %e, "Monitor tags unavailable, backing up without tags.");
            HashMap::new()
        }
    };
    for monitor in monitors.iter_mut() {
        let Some(id) = monitor.id.as_deref() else {
            continue;
        };
        if let Some(labels) = labels_by_monitor.get(id) {
            monitor.labels = labels.clone();
        }
        if let Some(tags) = tags_by_monitor.get(id) {
            monitor.tags = tags.clone();
        }
    }

    if options.single_file {
        let path = bundle_path(&options.dir, MONITOR_SUFFIX);
        let path_text = path.display().to_string();
        let written = write_pretty(&path, &monitors);
        for monitor in &monitors {
            match &written {
                Ok(()) => report.push(ItemOutcome::success(&path_text, monitor.name.clone())),
                Err(e) => report.push(ItemOutcome::fail(&path_text, monitor.name.clone(), e.to_string())),
            }
        }
    } else {
        for monitor in &monitors {
            let path = options.dir.join(monitor_file_name(monitor));
            let path_text = path.display().to_string();
            match write_pretty(&path, monitor) {
                Ok(()) => report.push(ItemOutcome::success(path_text, monitor.name.clone())),
                Err(e) => report.push(ItemOutcome::fail(path_text, monitor.name.clone(), e.to_string())),
            }
        }
    }

    Ok(report)
}

/// Fetches scripts of script-typed monitors. A missing script (404) is an
/// empty one; any other failure fails that monitor and drops it from the
/// output.
async fn attach_scripts(
    api: &NewRelicApi,
    monitors: Vec<Monitor>,
    options: &BackupOptions,
    report: &mut ItemReport,
) -> Vec<Monitor> {
    let script_ids: Vec<Option<String>> = monitors
        .iter()
        .map(|m| if m.is_script_type() { m.id.clone() } else { None })
        .collect();
    let worker_api = api.clone();
    let scripts = fan_out(script_ids, MAX_CONCURRENT_TASK, move |id| {
        let api = worker_api.clone();
        async move {
            match id {
                Some(id) => api.get_monitor_script(&id).await,
                None => Ok(None),
            }
        }
    })
    .await;

    let mut kept = Vec::with_capacity(monitors.len());
    for (mut monitor, script) in monitors.into_iter().zip(scripts) {
        match script {
            Some(script) => {
                monitor.script = script;
                kept.push(monitor);
            }
            None => {
                let path = if options.single_file {
                    bundle_path(&options.dir, MONITOR_SUFFIX)
                } else {
                    options.dir.join(monitor_file_name(&monitor))
                };
                report.push(ItemOutcome::fail(
                    path.display().to_string(),
                    monitor.name.clone(),
                    "failed to fetch monitor script",
                ));
            }
        }
    }
    kept
}

/// `category:name` references per monitor id, built by walking the monitors
/// of every label.
async fn monitor_labels(api: &NewRelicApi) -> Result<HashMap<String, Vec<String>>> {
    let labels = api.list_labels().await?;
    let worker_api = api.clone();
    let members = fan_out(labels.clone(), MAX_CONCURRENT_TASK, move |label: Label| {
        let api = worker_api.clone();
        async move { api.list_monitors_by_label(&label).await }
    })
    .await;

    let mut by_monitor: HashMap<String, Vec<String>> = HashMap::new();
    for (label, monitor_ids) in labels.iter().zip(members) {
        let Some(monitor_ids) = monitor_ids else {
            warn!(label = %label.reference(), "Monitors of label could not be fetched.");
            continue;
        };
        for id in monitor_ids {
            by_monitor.entry(id).or_default().push(label.reference());
        }
    }
    Ok(by_monitor)
}
