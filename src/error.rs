use std::path::PathBuf;
use thiserror::Error;

use crate::tracker::operation;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to construct client: {0}")]
    ClientConstruction(String),

    #[error("Remote call '{operation}' failed: {source}")]
    RemoteCall {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Remote call '{operation}' returned status {code}{}", page_suffix(.page))]
    NonSuccessStatus {
        operation: String,
        code: u16,
        page: Option<u32>,
    },

    #[error("Unresolved dependency: {0}")]
    DependencyUnresolved(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BackupError {
    pub fn status(operation: &str, code: u16) -> Self {
        BackupError::NonSuccessStatus {
            operation: operation.to_string(),
            code,
            page: None,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BackupError::Io {
            path: path.into(),
            source,
        }
    }

    /// The service answers 400 when a monitor with the same name is already
    /// present, which callers treat as recoverable.
    pub fn is_monitor_already_exists(&self) -> bool {
        matches!(
            self,
            BackupError::NonSuccessStatus { operation: op, code: 400, .. }
                if op == operation::CREATE_MONITOR
        )
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            BackupError::NonSuccessStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}

fn page_suffix(page: &Option<u32>) -> String {
    match page {
        Some(p) => format!(" (page {p})"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_create_400_is_recoverable() {
        let err = BackupError::status(operation::CREATE_MONITOR, 400);
        assert!(err.is_monitor_already_exists());

        let other = BackupError::status(operation::UPDATE_MONITOR, 400);
        assert!(!other.is_monitor_already_exists());

        let server = BackupError::status(operation::CREATE_MONITOR, 500);
        assert!(!server.is_monitor_already_exists());
    }

    #[test]
    fn test_status_message_carries_page() {
        let err = BackupError::NonSuccessStatus {
            operation: "Get Alert Policies".to_string(),
            code: 503,
            page: Some(4),
        };
        assert_eq!(
            err.to_string(),
            "Remote call 'Get Alert Policies' returned status 503 (page 4)"
        );
        assert_eq!(err.status_code(), Some(503));
    }
}
