//! Snapshot assembly: reads live configuration and writes it to backup files.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::api::NewRelicApi;
use crate::error::{BackupError, Result};
use crate::tracker::report::write_backup_failed;
use crate::tracker::ItemReport;

pub mod alert_conditions;
pub mod dashboards;
pub mod monitors;

pub use alert_conditions::backup_alert_conditions;
pub use dashboards::backup_dashboards;
pub use monitors::backup_monitors;

pub const ALERT_CONDITIONS_RESULT_FILE: &str = "fail-backup-alert-conditions-file-list.log";
pub const MONITORS_RESULT_FILE: &str = "backup-monitors-file-list.log";
pub const DASHBOARDS_RESULT_FILE: &str = "backup-dashboards-file-list.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    AlertConditions,
    Monitors,
    Dashboards,
}

impl BackupKind {
    pub fn default_result_file(self) -> &'static str {
        match self {
            BackupKind::AlertConditions => ALERT_CONDITIONS_RESULT_FILE,
            BackupKind::Monitors => MONITORS_RESULT_FILE,
            BackupKind::Dashboards => DASHBOARDS_RESULT_FILE,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            BackupKind::AlertConditions => alert_conditions::REPORT_TITLE,
            BackupKind::Monitors => monitors::REPORT_TITLE,
            BackupKind::Dashboards => dashboards::REPORT_TITLE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackupOptions {
    pub dir: PathBuf,
    /// Write one bundle file instead of one file per item.
    pub single_file: bool,
    /// Leave referenced monitors out of alert-condition snapshots.
    pub no_deps: bool,
    pub result_file: PathBuf,
}

impl BackupOptions {
    pub fn new(dir: impl Into<PathBuf>, kind: BackupKind) -> Self {
        Self {
            dir: dir.into(),
            single_file: false,
            no_deps: false,
            result_file: PathBuf::from(kind.default_result_file()),
        }
    }
}

pub fn ensure_backup_dir(dir: &Path) -> Result<()> {
    let metadata = std::fs::metadata(dir).map_err(|e| BackupError::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(BackupError::InvalidInput(format!(
            "Backup path {} is not a directory",
            dir.display()
        )));
    }
    Ok(())
}

/// Runs one backup command and writes its result file. A run that could not
/// start leaves the "Backup failed." marker instead of a file list.
pub async fn run_backup(
    api: &NewRelicApi,
    kind: BackupKind,
    options: &BackupOptions,
) -> Result<ItemReport> {
    let outcome = match ensure_backup_dir(&options.dir) {
        Ok(()) => match kind {
            BackupKind::AlertConditions => backup_alert_conditions(api, options).await,
            BackupKind::Monitors => backup_monitors(api, options).await,
            BackupKind::Dashboards => backup_dashboards(api, options).await,
        },
        Err(e) => Err(e),
    };

    match &outcome {
        Ok(report) => {
            report.write_failure_file(&options.result_file)?;
            info!(result_file = %options.result_file.display(), "{}", report.summary_line());
        }
        Err(e) => {
            error!(error = %e, "Backup could not run.");
            write_backup_failed(&options.result_file)?;
        }
    }
    outcome
}
