//! Reconciles backup files against the live service.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{error, info};

use crate::api::NewRelicApi;
use crate::error::{BackupError, Result};
use crate::tracker::{ItemOutcome, ItemReport};

pub mod alert_conditions;
pub mod dashboards;
pub mod input;
pub mod monitors;
pub mod resolver;

pub use alert_conditions::AlertConditionsRestorer;
pub use dashboards::DashboardsRestorer;
pub use input::{collect_files, RestoreInput};
pub use monitors::MonitorsRestorer;
pub use resolver::MonitorResolver;

pub const ALERT_CONDITIONS_RESULT_FILE: &str = "fail-restore-alert-conditions-file-list.log";
pub const MONITORS_RESULT_FILE: &str = "fail-restore-monitors-file-list.log";
pub const DASHBOARDS_RESULT_FILE: &str = "fail-restore-dashboards-file-list.log";

/// How an item that already exists on the target is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum UpdateMode {
    /// Leave existing items alone, create missing ones.
    #[default]
    Skip,
    /// Update existing items in place, create missing ones.
    Override,
    /// Delete every existing item of the kind once, then create.
    Clean,
}

impl UpdateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateMode::Skip => "skip",
            UpdateMode::Override => "override",
            UpdateMode::Clean => "clean",
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateMode {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(UpdateMode::Skip),
            "override" => Ok(UpdateMode::Override),
            "clean" => Ok(UpdateMode::Clean),
            other => Err(BackupError::InvalidInput(format!(
                "Unknown update mode '{other}', expected skip, override or clean"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreKind {
    AlertConditions,
    Monitors,
    Dashboards,
}

impl RestoreKind {
    pub fn default_result_file(self) -> &'static str {
        match self {
            RestoreKind::AlertConditions => ALERT_CONDITIONS_RESULT_FILE,
            RestoreKind::Monitors => MONITORS_RESULT_FILE,
            RestoreKind::Dashboards => DASHBOARDS_RESULT_FILE,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RestoreKind::AlertConditions => alert_conditions::REPORT_TITLE,
            RestoreKind::Monitors => monitors::REPORT_TITLE,
            RestoreKind::Dashboards => dashboards::REPORT_TITLE,
        }
    }

    pub fn restorer(self, api: NewRelicApi) -> Box<dyn Restorer> {
        match self {
            RestoreKind::AlertConditions => Box::new(AlertConditionsRestorer::new(api)),
            RestoreKind::Monitors => Box::new(MonitorsRestorer::new(api)),
            RestoreKind::Dashboards => Box::new(DashboardsRestorer::new(api)),
        }
    }
}

/// Collects the input files for `kind` and restores them.
pub async fn restore(
    api: &NewRelicApi,
    kind: RestoreKind,
    input: &RestoreInput,
    mode: UpdateMode,
    result_file: &Path,
) -> Result<ItemReport> {
    let mut restorer = kind.restorer(api.clone());
    let files = collect_files(input, restorer.suffix())?;
    run_restore(restorer.as_mut(), &files, mode, result_file).await
}

/// Per-kind restore behavior driven by [`run_restore`].
#[async_trait]
pub trait Restorer: Send {
    fn title(&self) -> &'static str;

    /// Backup file suffix this kind reads.
    fn suffix(&self) -> &'static str;

    /// Runs once before any file: the clean pre-pass and whatever listing
    /// the per-item decisions need. A failure here fails every input file.
    async fn prepare(&mut self, mode: UpdateMode) -> Result<()>;

    /// Restores every unit of one file, pushing one outcome per unit.
    async fn restore_file(&mut self, path: &Path, mode: UpdateMode, report: &mut ItemReport);
}

/// Restores `files` in order and writes the failure list to `result_file`.
///
/// One failed item never stops the run; the caller decides the exit status
/// from the report.
pub async fn run_restore<R: Restorer + ?Sized>(
    restorer: &mut R,
    files: &[PathBuf],
    mode: UpdateMode,
    result_file: &Path,
) -> Result<ItemReport> {
    let mut report = ItemReport::new(restorer.title());
    info!(files = files.len(), %mode, "{}: starting.", restorer.title());

    match restorer.prepare(mode).await {
        Ok(()) => {
            for path in files {
                restorer.restore_file(path, mode, &mut report).await;
            }
        }
        Err(e) => {
            error!(error = %e, %mode, "{}: could not prepare restore.", restorer.title());
            for path in files {
                report.push(ItemOutcome::fail(
                    path.display().to_string(),
                    "",
                    format!("restore not started: {e}"),
                ));
            }
        }
    }

    report.write_failure_file(result_file)?;
    info!(result_file = %result_file.display(), "{}", report.summary_line());
    Ok(report)
}

/// File name used in outcomes, matching what the input listed.
pub(crate) fn display_path(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_mode_parsing() {
        assert_eq!("skip".parse::<UpdateMode>().unwrap(), UpdateMode::Skip);
        assert_eq!(" Override ".parse::<UpdateMode>().unwrap(), UpdateMode::Override);
        assert_eq!("CLEAN".parse::<UpdateMode>().unwrap(), UpdateMode::Clean);
        assert!("merge".parse::<UpdateMode>().is_err());
        assert_eq!(UpdateMode::default(), UpdateMode::Skip);
    }
}
