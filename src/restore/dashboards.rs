use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use super::{display_path, Restorer, UpdateMode};
use crate::api::dashboards::dashboard_title;
use crate::api::NewRelicApi;
use crate::error::{BackupError, Result};
use crate::models::snapshot::{read_one_or_many, DASHBOARD_SUFFIX};
use crate::tracker::{ItemOutcome, ItemReport};

pub const REPORT_TITLE: &str = "Restore dashboards";

/// Restores dashboard documents, matched to live dashboards by title.
pub struct DashboardsRestorer {
    api: NewRelicApi,
    existing: HashMap<String, i64>,
}

impl DashboardsRestorer {
    pub fn new(api: NewRelicApi) -> Self {
        Self {
            api,
            existing: HashMap::new(),
        }
    }

    async fn restore_dashboard(&mut self, document: &Value, mode: UpdateMode) -> Result<&'static str> {
        let title = dashboard_title(document);
        if title.is_empty() {
            return Err(BackupError::InvalidInput(
                "dashboard document has no dashboard.title".to_string(),
            ));
        }
        match self.existing.get(title).copied() {
            Some(_) if mode == UpdateMode::Skip => Ok("skipped"),
            Some(id) => {
                self.api.update_dashboard(id, document).await?;
                Ok("updated")
            }
            None => {
                let created = self.api.create_dashboard(document).await?;
                if let Some(id) = created.pointer("/dashboard/id").and_then(Value::as_i64) {
                    self.existing.insert(title.to_string(), id);
                }
                Ok("created")
            }
        }
    }
}

#[async_trait]
impl Restorer for DashboardsRestorer {
    fn title(&self) -> &'static str {
        REPORT_TITLE
    }

    fn suffix(&self) -> &'static str {
        DASHBOARD_SUFFIX
    }

    async fn prepare(&mut self, mode: UpdateMode) -> Result<()> {
        let live = self.api.list_dashboards().await?;
        if mode == UpdateMode::Clean {
            for dashboard in &live {
                self.api.delete_dashboard(dashboard.id).await?;
            }
            info!(deleted = live.len(), "Deleted all dashboards.");
            self.existing.clear();
            return Ok(());
        }
        for dashboard in live {
            self.existing.entry(dashboard.title).or_insert(dashboard.id);
        }
        Ok(())
    }

    async fn restore_file(&mut self, path: &Path, mode: UpdateMode, report: &mut ItemReport) {
        let file = display_path(path);
        let documents: Vec<Value> = match read_one_or_many(path) {
            Ok(documents) => documents,
            Err(e) => {
                report.push(ItemOutcome::fail(file, "", e.to_string()));
                return;
            }
        };
        for document in &documents {
            let title = dashboard_title(document).to_string();
            match self.restore_dashboard(document, mode).await {
                Ok(action) => report.push(ItemOutcome::success(&file, title).with_detail(action)),
                Err(e) => report.push(ItemOutcome::fail(&file, title, e.to_string())),
            }
        }
    }
}
