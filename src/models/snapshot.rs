//! Snapshot units and their on-disk form.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::channel::Channel;
use super::condition::ConditionSet;
use super::monitor::Monitor;
use super::policy::Policy;
use crate::error::{BackupError, Result};

pub const ALERT_CONDITIONS_SUFFIX: &str = ".alert-conditions.bak";
pub const MONITOR_SUFFIX: &str = ".monitor.bak";
pub const DASHBOARD_SUFFIX: &str = ".dashboard.bak";
pub const BUNDLE_STEM: &str = "all-in-one-bundle";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependencies {
    /// Monitors referenced by synthetics conditions, keyed by their id in the
    /// source account.
    #[serde(default)]
    pub dependent_monitors: BTreeMap<String, Monitor>,
}

/// One policy with everything needed to recreate it elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub policy: Policy,
    #[serde(default)]
    pub alerts_conditions: ConditionSet,
    #[serde(default)]
    pub alerts_channels: Vec<Channel>,
    #[serde(default)]
    pub dependencies: Dependencies,
}

impl PolicySnapshot {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            alerts_conditions: ConditionSet::default(),
            alerts_channels: Vec::new(),
            dependencies: Dependencies::default(),
        }
    }

    /// Monitor ids referenced by conditions but missing from the side-table.
    pub fn missing_dependencies(&self) -> Vec<String> {
        self.alerts_conditions
            .referenced_monitor_ids()
            .into_iter()
            .filter(|id| !self.dependencies.dependent_monitors.contains_key(id))
            .collect()
    }

    pub fn file_name(&self) -> String {
        let id = self.policy.id.map(|id| id.to_string()).unwrap_or_default();
        format!("{}-{}{}", file_safe(&self.policy.name), id, ALERT_CONDITIONS_SUFFIX)
    }
}

pub fn monitor_file_name(monitor: &Monitor) -> String {
    format!("{}{}", file_safe(&monitor.name), MONITOR_SUFFIX)
}

pub fn dashboard_file_name(title: &str, id: i64) -> String {
    format!("{}-{}{}", file_safe(title), id, DASHBOARD_SUFFIX)
}

pub fn bundle_path(dir: &Path, suffix: &str) -> PathBuf {
    dir.join(format!("{BUNDLE_STEM}{suffix}"))
}

/// Path separators cannot appear in a file name.
fn file_safe(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

pub fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).map_err(|e| BackupError::io(path, e))
}

/// Reads a file holding either one unit or an array of units.
pub fn read_one_or_many<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = fs::read_to_string(path).map_err(|e| BackupError::io(path, e))?;
    let value: Value = serde_json::from_str(&text)?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(BackupError::from))
            .collect(),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::condition::{Condition, SyntheticsCondition};
    use serde_json::json;

    fn policy(id: i64, name: &str) -> Policy {
        serde_json::from_value(json!({"id": id, "name": name})).unwrap()
    }

    #[test]
    fn test_file_names() {
        let unit = PolicySnapshot::new(policy(10, "web/api"));
        assert_eq!(unit.file_name(), "web_api-10.alert-conditions.bak");
        assert_eq!(dashboard_file_name("Ops", 7), "Ops-7.dashboard.bak");
        assert_eq!(
            bundle_path(Path::new("/tmp/x"), ALERT_CONDITIONS_SUFFIX),
            PathBuf::from("/tmp/x/all-in-one-bundle.alert-conditions.bak")
        );
    }

    #[test]
    fn test_reads_single_unit_and_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let single = dir.path().join("p1-10.alert-conditions.bak");
        let bundle = dir.path().join("bundle.alert-conditions.bak");

        let first = PolicySnapshot::new(policy(10, "P1"));
        let second = PolicySnapshot::new(policy(20, "P2"));
        write_pretty(&single, &first).unwrap();
        write_pretty(&bundle, &vec![first.clone(), second.clone()]).unwrap();

        let units: Vec<PolicySnapshot> = read_one_or_many(&single).unwrap();
        assert_eq!(units, vec![first.clone()]);
        let units: Vec<PolicySnapshot> = read_one_or_many(&bundle).unwrap();
        assert_eq!(units, vec![first, second]);
    }

    #[test]
    fn test_missing_dependencies() {
        let mut unit = PolicySnapshot::new(policy(1, "P"));
        unit.alerts_conditions.push(Condition::Synthetics(SyntheticsCondition {
            name: "ping".to_string(),
            monitor_id: Some("m-1".to_string()),
            ..Default::default()
        }));
        assert_eq!(unit.missing_dependencies(), vec!["m-1"]);

        unit.dependencies.dependent_monitors.insert(
            "m-1".to_string(),
            serde_json::from_value(json!({"id": "m-1", "name": "ping", "type": "SIMPLE"})).unwrap(),
        );
        assert!(unit.missing_dependencies().is_empty());
    }
}
