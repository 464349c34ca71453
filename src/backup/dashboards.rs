use tracing::info;

use super::BackupOptions;
use crate::api::NewRelicApi;
use crate::error::Result;
use crate::fetch::{fan_out, MAX_CONCURRENT_TASK};
use crate::models::snapshot::{dashboard_file_name, write_pretty};
use crate::tracker::{ItemOutcome, ItemReport};

pub const REPORT_TITLE: &str = "Backup dashboards";

/// Writes every dashboard document as returned by the service.
pub async fn backup_dashboards(api: &NewRelicApi, options: &BackupOptions) -> Result<ItemReport> {
    let dashboards = api.list_dashboards().await?;
    info!(dashboards = dashboards.len(), "Listed dashboards.");

    let ids: Vec<i64> = dashboards.iter().map(|d| d.id).collect();
    let worker_api = api.clone();
    let documents = fan_out(ids, MAX_CONCURRENT_TASK, move |id| {
        let api = worker_api.clone();
        async move { api.get_dashboard(id).await }
    })
    .await;

    let mut report = ItemReport::new(REPORT_TITLE);
    for (summary, document) in dashboards.iter().zip(documents) {
        let path = options.dir.join(dashboard_file_name(&summary.title, summary.id));
        let path_text = path.display().to_string();
        let written = match document {
            Some(document) => write_pretty(&path, &document).map_err(|e| e.to_string()),
            None => Err("failed to fetch dashboard".to_string()),
        };
        match written {
            Ok(()) => report.push(ItemOutcome::success(path_text, summary.title.clone())),
            Err(detail) => report.push(ItemOutcome::fail(path_text, summary.title.clone(), detail)),
        }
    }

    Ok(report)
}
