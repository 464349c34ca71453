use std::collections::{HashMap, HashSet};
use tracing::info;

use super::monitors::{create_monitor_from_backup, update_monitor_from_backup};
use super::UpdateMode;
use crate::api::NewRelicApi;
use crate::error::{BackupError, Result};
use crate::models::Dependencies;

/// Maps monitor ids from a snapshot's side-table to live monitor ids on the
/// target, creating monitors that are not there yet.
///
/// The live monitor list is read on first use and kept for the whole run;
/// monitors created through the resolver are added to it.
pub struct MonitorResolver {
    api: NewRelicApi,
    mode: UpdateMode,
    live_by_name: Option<HashMap<String, String>>,
    /// Live ids already brought up to date in this run.
    refreshed: HashSet<String>,
}

impl MonitorResolver {
    pub fn new(api: NewRelicApi, mode: UpdateMode) -> Self {
        Self {
            api,
            mode,
            live_by_name: None,
            refreshed: HashSet::new(),
        }
    }

    async fn live_monitors(&mut self) -> Result<&mut HashMap<String, String>> {
        if self.live_by_name.is_none() {
            let mut by_name = HashMap::new();
            for monitor in self.api.list_monitors().await? {
                if let Some(id) = monitor.id {
                    by_name.entry(monitor.name).or_insert(id);
                }
            }
            self.live_by_name = Some(by_name);
        }
        Ok(self.live_by_name.get_or_insert_with(HashMap::new))
    }

    /// Live id for the monitor known as `snapshot_id` in `dependencies`.
    pub async fn resolve(&mut self, dependencies: &Dependencies, snapshot_id: &str) -> Result<String> {
        let monitor = dependencies
            .dependent_monitors
            .get(snapshot_id)
            .ok_or_else(|| {
                BackupError::DependencyUnresolved(format!(
                    "monitor {snapshot_id} is referenced but not in the backup"
                ))
            })?;

        let existing = self.live_monitors().await?.get(&monitor.name).cloned();
        match existing {
            Some(live_id) => {
                if self.mode != UpdateMode::Skip && self.refreshed.insert(live_id.clone()) {
                    update_monitor_from_backup(&self.api, &live_id, monitor).await?;
                }
                Ok(live_id)
            }
            None => {
                let live_id = create_monitor_from_backup(&self.api, monitor).await?;
                info!(monitor = %monitor.name, from = %snapshot_id, to = %live_id, "Created dependent monitor.");
                self.refreshed.insert(live_id.clone());
                self.live_monitors()
                    .await?
                    .insert(monitor.name.clone(), live_id.clone());
                Ok(live_id)
            }
        }
    }
}
