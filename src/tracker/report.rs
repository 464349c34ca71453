use std::fs;
use std::path::Path;

use crate::error::{BackupError, Result};

/// Written to the result file when a run finished without failed items.
pub const NO_FAILED_SENTINEL: &str = "No failed";

/// Written to the result file when a backup could not start at all.
pub const BACKUP_FAILED_SENTINEL: &str = "Backup failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Success,
    Fail,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Success => "success",
            ItemStatus::Fail => "fail",
        }
    }
}

/// Outcome of one backed-up or restored item, identified by its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub file_name: String,
    pub label: String,
    pub status: ItemStatus,
    pub detail: String,
}

impl ItemOutcome {
    pub fn success(file_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            label: label.into(),
            status: ItemStatus::Success,
            detail: String::new(),
        }
    }

    pub fn fail(
        file_name: impl Into<String>,
        label: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            label: label.into(),
            status: ItemStatus::Fail,
            detail: detail.into(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// Per-resource-kind list of item outcomes produced by one command.
#[derive(Debug, Clone, Default)]
pub struct ItemReport {
    pub title: String,
    pub items: Vec<ItemOutcome>,
}

impl ItemReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    /// Report of a command that stopped before its first item: one failed
    /// row naming what it was run against.
    pub fn not_started(
        title: impl Into<String>,
        target: impl Into<String>,
        error: &BackupError,
    ) -> Self {
        Self {
            title: title.into(),
            items: vec![ItemOutcome::fail(
                target,
                "",
                format!("not started: {error}"),
            )],
        }
    }

    pub fn push(&mut self, outcome: ItemOutcome) {
        match outcome.status {
            ItemStatus::Success => {
                tracing::info!(file = %outcome.file_name, item = %outcome.label, "{}: item succeeded.", self.title)
            }
            ItemStatus::Fail => {
                tracing::error!(file = %outcome.file_name, item = %outcome.label, detail = %outcome.detail, "{}: item failed.", self.title)
            }
        }
        self.items.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn success_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Success)
            .count()
    }

    pub fn fail_count(&self) -> usize {
        self.total() - self.success_count()
    }

    pub fn has_failures(&self) -> bool {
        self.fail_count() > 0
    }

    /// Distinct file names of failed items, in first-seen order. A bundle
    /// holding several failed units is listed once.
    pub fn failed_files(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for item in self.items.iter().filter(|i| i.status == ItemStatus::Fail) {
            if !files.contains(&item.file_name) {
                files.push(item.file_name.clone());
            }
        }
        files
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{}, total: {}, success: {}, fail: {}",
            self.title,
            self.total(),
            self.success_count(),
            self.fail_count()
        )
    }

    pub fn render(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .items
            .iter()
            .map(|i| {
                vec![
                    i.label.clone(),
                    i.file_name.clone(),
                    i.status.as_str().to_string(),
                    i.detail.clone(),
                ]
            })
            .collect();
        let mut out = render_table(&["ITEM", "FILE", "STATUS", "DETAIL"], &rows);
        out.push_str(&self.summary_line());
        out.push('\n');
        out
    }

    /// Writes one failed path per line, or the sentinel when nothing failed.
    /// The output is valid restore input.
    pub fn write_failure_file(&self, path: &Path) -> Result<()> {
        let failed = self.failed_files();
        let content = if failed.is_empty() {
            NO_FAILED_SENTINEL.to_string()
        } else {
            let mut body = failed.join("\n");
            body.push('\n');
            body
        };
        fs::write(path, content).map_err(|e| BackupError::io(path, e))
    }
}

pub fn write_backup_failed(path: &Path) -> Result<()> {
    fs::write(path, BACKUP_FAILED_SENTINEL).map_err(|e| BackupError::io(path, e))
}

/// Left-aligned text table with a header separator.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}\n", line.trim_end())
    };

    let mut out = format_row(headers.to_vec());
    let separators: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format_row(separators.iter().map(String::as_str).collect()));
    for row in rows {
        out.push_str(&format_row(row.iter().map(String::as_str).collect()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_summary() {
        let mut report = ItemReport::new("Restore alert policies");
        report.push(ItemOutcome::success("/tmp/x/a.alert-conditions.bak", "P1"));
        report.push(ItemOutcome::fail("/tmp/x/b.alert-conditions.bak", "P2", "status 500"));
        report.push(ItemOutcome::success("/tmp/x/c.alert-conditions.bak", "P3"));

        assert_eq!(report.total(), 3);
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.fail_count(), 1);
        assert!(report.has_failures());
        assert_eq!(
            report.summary_line(),
            "Restore alert policies, total: 3, success: 2, fail: 1"
        );
    }

    #[test]
    fn test_failure_file_sentinel_when_clean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.log");
        let mut report = ItemReport::new("Backup dashboards");
        report.push(ItemOutcome::success("a.dashboard.bak", "A"));

        report.write_failure_file(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), NO_FAILED_SENTINEL);
    }

    #[test]
    fn test_failure_file_lists_each_bundle_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.log");
        let mut report = ItemReport::new("Restore alert policies");
        report.push(ItemOutcome::fail("bundle.alert-conditions.bak", "P1", "x"));
        report.push(ItemOutcome::fail("bundle.alert-conditions.bak", "P2", "y"));
        report.push(ItemOutcome::fail("other.alert-conditions.bak", "P3", "z"));

        report.write_failure_file(&path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "bundle.alert-conditions.bak\nother.alert-conditions.bak\n"
        );
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let rows = vec![
            vec!["a".to_string(), "1".to_string()],
            vec!["long name".to_string(), "22".to_string()],
        ];
        let table = render_table(&["NAME", "N"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "NAME       N");
        assert_eq!(lines[1], "---------  --");
        assert_eq!(lines[3], "long name  22");
    }

    #[test]
    fn test_render_table_widths_count_chars_and_tolerate_short_rows() {
        let rows = vec![
            vec!["Zürich".to_string(), "ok".to_string(), "x".to_string()],
            vec!["b".to_string()],
        ];
        let table = render_table(&["CITY", "STATUS", "DETAIL"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "CITY    STATUS  DETAIL");
        assert_eq!(lines[1], "------  ------  ------");
        assert_eq!(lines[2], "Zürich  ok      x");
        assert_eq!(lines[3], "b");
    }

    #[test]
    fn test_not_started_report_renders_one_failed_row() {
        let err = BackupError::InvalidInput("no backup files found".to_string());
        let report = ItemReport::not_started("Restore monitors", "./backups", &err);

        assert_eq!(report.fail_count(), 1);
        let out = report.render();
        assert!(out.contains("./backups  fail    not started: Invalid input: no backup files found"), "{out}");
        assert!(out.ends_with("Restore monitors, total: 1, success: 0, fail: 1\n"));
    }

    #[test]
    fn test_empty_report_still_renders_header_and_summary() {
        let report = ItemReport::new("Backup monitors");
        let out = report.render();
        assert_eq!(
            out,
            "ITEM  FILE  STATUS  DETAIL\n----  ----  ------  ------\nBackup monitors, total: 0, success: 0, fail: 0\n"
        );
    }
}
