use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::{display_path, Restorer, UpdateMode};
use crate::api::NewRelicApi;
use crate::error::Result;
use crate::models::snapshot::{read_one_or_many, MONITOR_SUFFIX};
use crate::models::Monitor;
use crate::tracker::{ItemOutcome, ItemReport};

pub const REPORT_TITLE: &str = "Restore monitors";

/// Creates a monitor with its script and labels; returns the new id.
///
/// A 400 on create means a monitor of that name is already there. The live
/// list is consulted once more and that monitor's id is returned.
pub(crate) async fn create_monitor_from_backup(api: &NewRelicApi, monitor: &Monitor) -> Result<String> {
    let id = match api.create_monitor(monitor).await {
        Ok(id) => id,
        Err(e) if e.is_monitor_already_exists() => {
            warn!(monitor = %monitor.name, "Monitor already exists, reusing it.");
            let live = api.list_monitors().await?;
            live.into_iter()
                .find(|m| m.name == monitor.name)
                .and_then(|m| m.id)
                .ok_or(e)?
        }
        Err(e) => return Err(e),
    };

    if let Some(text) = monitor.script_text() {
        api.update_monitor_script(&id, text).await?;
    }
    for reference in &monitor.labels {
        api.add_label_to_monitor(&id, reference).await?;
    }
    info!(monitor = %monitor.name, monitor_id = %id, "Created monitor.");
    Ok(id)
}

/// Brings the live monitor `id` in line with the backup: definition, script,
/// then the label set.
pub(crate) async fn update_monitor_from_backup(
    api: &NewRelicApi,
    id: &str,
    monitor: &Monitor,
) -> Result<()> {
    api.update_monitor(id, monitor).await?;
    if let Some(text) = monitor.script_text() {
        api.update_monitor_script(id, text).await?;
    }

    let live_labels = api.list_monitor_labels(id).await?;
    for stale in live_labels.iter().filter(|l| !monitor.labels.contains(l)) {
        api.delete_label_from_monitor(id, stale).await?;
    }
    for missing in monitor.labels.iter().filter(|l| !live_labels.contains(l)) {
        api.add_label_to_monitor(id, missing).await?;
    }
    info!(monitor = %monitor.name, monitor_id = %id, "Updated monitor.");
    Ok(())
}

/// Restores monitor files, single monitors or bundles.
pub struct MonitorsRestorer {
    api: NewRelicApi,
    /// Live monitor ids by name; the first listed wins.
    existing: HashMap<String, String>,
}

impl MonitorsRestorer {
    pub fn new(api: NewRelicApi) -> Self {
        Self {
            api,
            existing: HashMap::new(),
        }
    }

    async fn restore_monitor(&mut self, monitor: &Monitor, mode: UpdateMode) -> Result<&'static str> {
        match self.existing.get(&monitor.name).cloned() {
            Some(_) if mode == UpdateMode::Skip => Ok("skipped"),
            Some(id) => {
                update_monitor_from_backup(&self.api, &id, monitor).await?;
                Ok("updated")
            }
            None => {
                let id = create_monitor_from_backup(&self.api, monitor).await?;
                self.existing.insert(monitor.name.clone(), id);
                Ok("created")
            }
        }
    }
}

#[async_trait]
impl Restorer for MonitorsRestorer {
    fn title(&self) -> &'static str {
        REPORT_TITLE
    }

    fn suffix(&self) -> &'static str {
        MONITOR_SUFFIX
    }

    async fn prepare(&mut self, mode: UpdateMode) -> Result<()> {
        let live = self.api.list_monitors().await?;
        if mode == UpdateMode::Clean {
            for monitor in &live {
                if let Some(id) = &monitor.id {
                    self.api.delete_monitor(id).await?;
                }
            }
            info!(deleted = live.len(), "Deleted all monitors.");
            self.existing.clear();
            return Ok(());
        }
        for monitor in live {
            if let Some(id) = monitor.id {
                self.existing.entry(monitor.name).or_insert(id);
            }
        }
        Ok(())
    }

    async fn restore_file(&mut self, path: &Path, mode: UpdateMode, report: &mut ItemReport) {
        let file = display_path(path);
        let monitors: Vec<Monitor> = match read_one_or_many(path) {
            Ok(monitors) => monitors,
            Err(e) => {
                report.push(ItemOutcome::fail(file, "", e.to_string()));
                return;
            }
        };
        for monitor in &monitors {
            match self.restore_monitor(monitor, mode).await {
                Ok(action) => {
                    report.push(ItemOutcome::success(&file, monitor.name.clone()).with_detail(action))
                }
                Err(e) => report.push(ItemOutcome::fail(&file, monitor.name.clone(), e.to_string())),
            }
        }
    }
}
