//! Call-result tracking shared by every remote operation of a command run.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};

pub mod operation;
pub mod report;
pub mod status;

pub use report::{render_table, ItemOutcome, ItemReport, ItemStatus, NO_FAILED_SENTINEL};
pub use status::{describe, ServiceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub operation_name: String,
    pub status_code: u16,
    pub description: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Append-only log of remote call outcomes. Clones share the same log, so one
/// instance is created per command and handed to every worker.
#[derive(Debug, Clone, Default)]
pub struct ResultTracker {
    records: Arc<Mutex<Vec<CallRecord>>>,
}

impl ResultTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        kind: ServiceKind,
        operation_name: &str,
        status_code: u16,
        message: impl Into<String>,
    ) {
        let record = CallRecord {
            operation_name: operation_name.to_string(),
            status_code,
            description: describe(kind, status_code).to_string(),
            message: message.into(),
            at: Utc::now(),
        };
        tracing::debug!(
            operation = %record.operation_name,
            status = record.status_code,
            message = %record.message,
            "Remote call recorded."
        );
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    pub fn records(&self) -> Vec<CallRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of recorded calls with the given operation name.
    pub fn count(&self, operation_name: &str) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.operation_name == operation_name)
            .count()
    }

    /// The full call log as a text table.
    pub fn render(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .records()
            .into_iter()
            .map(|r| {
                vec![
                    r.operation_name,
                    r.status_code.to_string(),
                    r.description,
                    r.message,
                ]
            })
            .collect();
        render_table(&["OPERATION", "STATUS", "DESCRIPTION", "MESSAGE"], &rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_resolves_description() {
        let tracker = ResultTracker::new();
        tracker.record(ServiceKind::AlertPolicies, operation::GET_ALERT_POLICIES, 200, "pageCount:1");
        tracker.record(ServiceKind::Monitors, operation::CREATE_MONITOR, 400, "name:home");

        let records = tracker.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "Success");
        assert_eq!(records[0].message, "pageCount:1");
        assert_eq!(
            records[1].description,
            "The monitor values is invalid, or the format of the request is invalid."
        );
        assert_eq!(tracker.count(operation::CREATE_MONITOR), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_not_lost() {
        let tracker = ResultTracker::new();
        let mut handles = Vec::new();
        for worker in 0..16 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                for call in 0..50 {
                    tracker.record(
                        ServiceKind::AlertConditions,
                        operation::GET_CONDITIONS_BY_POLICY_ID,
                        200,
                        format!("worker:{worker},call:{call}"),
                    );
                    tokio::task::yield_now().await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(tracker.len(), 16 * 50);
    }

    #[test]
    fn test_render_contains_every_call() {
        let tracker = ResultTracker::new();
        tracker.record(ServiceKind::Dashboards, operation::GET_DASHBOARDS, 200, "pageCount:1");
        tracker.record(ServiceKind::Dashboards, operation::GET_DASHBOARDS, 502, "pageCount:2");

        let rendered = tracker.render();
        assert!(rendered.contains("OPERATION"));
        assert!(rendered.contains("pageCount:1"));
        assert!(rendered.contains("502"));
        assert_eq!(rendered.lines().count(), 4);
    }
}
