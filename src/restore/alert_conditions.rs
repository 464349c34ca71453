use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use super::resolver::MonitorResolver;
use super::{display_path, Restorer, UpdateMode};
use crate::api::conditions::{value_id, value_name};
use crate::api::NewRelicApi;
use crate::error::{BackupError, Result};
use crate::models::condition::location_failure_entities;
use crate::models::snapshot::{read_one_or_many, ALERT_CONDITIONS_SUFFIX};
use crate::models::{Channel, Condition, ConditionSet, Policy, PolicySnapshot};
use crate::tracker::{ItemOutcome, ItemReport};

pub const REPORT_TITLE: &str = "Restore alert policies";

/// What happens to one child of an existing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildAction {
    Create,
    Keep,
    Update(i64),
    Replace(i64),
}

fn child_action(mode: UpdateMode, existing_id: Option<i64>) -> ChildAction {
    match (existing_id, mode) {
        (None, _) => ChildAction::Create,
        (Some(_), UpdateMode::Skip) => ChildAction::Keep,
        (Some(id), UpdateMode::Override) => ChildAction::Update(id),
        (Some(id), UpdateMode::Clean) => ChildAction::Replace(id),
    }
}

/// Restores policy snapshot files: policy, then conditions, then the channel
/// association.
pub struct AlertConditionsRestorer {
    api: NewRelicApi,
    policies: Vec<Policy>,
    channels: Vec<Channel>,
    resolver: Option<MonitorResolver>,
}

impl AlertConditionsRestorer {
    pub fn new(api: NewRelicApi) -> Self {
        Self {
            api,
            policies: Vec::new(),
            channels: Vec::new(),
            resolver: None,
        }
    }

    fn resolver(&mut self, mode: UpdateMode) -> &mut MonitorResolver {
        let api = &self.api;
        self.resolver
            .get_or_insert_with(|| MonitorResolver::new(api.clone(), mode))
    }

    /// Returns the live policy id and whether it was created by this call.
    async fn reconcile_policy(&mut self, policy: &Policy, mode: UpdateMode) -> Result<(i64, bool)> {
        // Names are not unique on the service; the first match is used.
        let existing = self
            .policies
            .iter()
            .find(|p| p.name == policy.name)
            .and_then(|p| p.id);

        match (existing, mode) {
            (Some(id), UpdateMode::Skip) => {
                debug!(policy = %policy.name, policy_id = id, "Policy exists, leaving it.");
                Ok((id, false))
            }
            (Some(id), _) => {
                self.api.update_policy(id, policy).await?;
                info!(policy = %policy.name, policy_id = id, "Updated policy.");
                Ok((id, false))
            }
            (None, _) => {
                let created = self.api.create_policy(policy).await?;
                let id = created.id.ok_or_else(|| {
                    BackupError::InvalidInput(format!(
                        "Create Alert Policy answer for '{}' has no id",
                        policy.name
                    ))
                })?;
                info!(policy = %policy.name, policy_id = id, "Created policy.");
                self.policies.push(created);
                Ok((id, true))
            }
        }
    }

    /// Points a synthetics condition at the live monitor.
    async fn with_live_monitor(
        &mut self,
        condition: &Condition,
        unit: &PolicySnapshot,
        mode: UpdateMode,
    ) -> Result<Condition> {
        let mut condition = condition.clone();
        if let Condition::Synthetics(synthetics) = &mut condition {
            if let Some(snapshot_id) = synthetics.monitor_id.clone() {
                let live_id = self
                    .resolver(mode)
                    .resolve(&unit.dependencies, &snapshot_id)
                    .await?;
                synthetics.monitor_id = Some(live_id);
            }
        }
        Ok(condition)
    }

    /// Returns notes for conditions left out because a dependency is
    /// missing from the backup.
    async fn reconcile_conditions(
        &mut self,
        unit: &PolicySnapshot,
        policy_id: i64,
        is_created: bool,
        mode: UpdateMode,
    ) -> Result<Vec<String>> {
        let live = if is_created {
            ConditionSet::default()
        } else {
            self.api.list_policy_conditions(policy_id).await?
        };
        let live_conditions = live.to_conditions();

        for condition in unit.alerts_conditions.to_conditions() {
            let existing_id = live_conditions
                .iter()
                .find(|c| c.category() == condition.category() && c.name() == condition.name())
                .and_then(Condition::id);

            match child_action(mode, existing_id) {
                ChildAction::Keep => {
                    debug!(condition = %condition.name(), category = %condition.category(), "Condition exists, leaving it.");
                }
                ChildAction::Update(id) => {
                    let condition = self.with_live_monitor(&condition, unit, mode).await?;
                    self.api.update_condition(policy_id, id, &condition).await?;
                }
                ChildAction::Replace(id) => {
                    let condition = self.with_live_monitor(&condition, unit, mode).await?;
                    self.api.delete_condition(condition.category(), id).await?;
                    self.api.create_condition(policy_id, &condition).await?;
                }
                ChildAction::Create => {
                    let condition = self.with_live_monitor(&condition, unit, mode).await?;
                    self.api.create_condition(policy_id, &condition).await?;
                }
            }
        }

        let mut notes = Vec::new();
        for condition in &unit.alerts_conditions.location_failure_conditions {
            let existing_id = live
                .location_failure_conditions
                .iter()
                .find(|c| value_name(c) == value_name(condition))
                .and_then(value_id);
            let action = child_action(mode, existing_id);
            if action == ChildAction::Keep {
                continue;
            }
            if let Some(condition) = self.with_live_entities(condition, unit, mode, &mut notes).await? {
                self.reconcile_location_failure(policy_id, &condition, action)
                    .await?;
            }
        }
        Ok(notes)
    }

    /// Points a location-failure condition's entities at live monitors.
    /// An entity missing from the side-table adds a note and yields `None`;
    /// the condition must not be sent with source-account ids.
    async fn with_live_entities(
        &mut self,
        condition: &Value,
        unit: &PolicySnapshot,
        mode: UpdateMode,
        notes: &mut Vec<String>,
    ) -> Result<Option<Value>> {
        let entities = location_failure_entities(condition);
        if let Some(missing) = entities
            .iter()
            .find(|id| !unit.dependencies.dependent_monitors.contains_key(*id))
        {
            let unresolved = BackupError::DependencyUnresolved(format!(
                "location failure condition '{}' watches monitor {missing}, which is not in the backup; condition not restored",
                value_name(condition)
            ));
            warn!(policy = %unit.policy.name, "{unresolved}");
            notes.push(unresolved.to_string());
            return Ok(None);
        }

        let mut live_ids = Vec::with_capacity(entities.len());
        for id in &entities {
            live_ids.push(Value::String(
                self.resolver(mode).resolve(&unit.dependencies, id).await?,
            ));
        }
        let mut condition = condition.clone();
        if let Some(attributes) = condition.as_object_mut() {
            if attributes.contains_key("entities") {
                attributes.insert("entities".to_string(), Value::Array(live_ids));
            }
        }
        Ok(Some(condition))
    }

    async fn reconcile_location_failure(
        &self,
        policy_id: i64,
        condition: &Value,
        action: ChildAction,
    ) -> Result<()> {
        match action {
            ChildAction::Keep => Ok(()),
            ChildAction::Update(id) => self.api.update_location_failure_condition(id, condition).await,
            ChildAction::Replace(id) => {
                self.api.delete_location_failure_condition(id).await?;
                self.api
                    .create_location_failure_condition(policy_id, condition)
                    .await
            }
            ChildAction::Create => {
                self.api
                    .create_location_failure_condition(policy_id, condition)
                    .await
            }
        }
    }

    /// Sets the policy's channel list to the live channels named in the
    /// snapshot. Channels are never created. Returns a warning when none of
    /// the named channels exist.
    async fn reconcile_channels(&self, unit: &PolicySnapshot, policy_id: i64) -> Result<Option<String>> {
        if unit.alerts_channels.is_empty() {
            return Ok(None);
        }
        let mut channel_ids: Vec<i64> = Vec::new();
        for wanted in &unit.alerts_channels {
            match self
                .channels
                .iter()
                .find(|c| c.name == wanted.name)
                .and_then(|c| c.id)
            {
                Some(id) if !channel_ids.contains(&id) => channel_ids.push(id),
                Some(_) => {}
                None => warn!(channel = %wanted.name, policy_id, "Channel not found on target, skipping it."),
            }
        }
        if channel_ids.is_empty() {
            let unresolved = BackupError::DependencyUnresolved(format!(
                "none of the {} channels of policy '{}' exist on the target",
                unit.alerts_channels.len(),
                unit.policy.name
            ));
            warn!(policy_id, "{unresolved}");
            return Ok(Some(unresolved.to_string()));
        }
        self.api.set_policy_channels(policy_id, &channel_ids).await?;
        Ok(None)
    }

    /// Restores one snapshot unit. Returns a note for the report when the
    /// unit succeeded with a recoverable problem.
    async fn restore_unit(&mut self, unit: &PolicySnapshot, mode: UpdateMode) -> Result<Option<String>> {
        let (policy_id, is_created) = self.reconcile_policy(&unit.policy, mode).await?;
        let mut notes = self
            .reconcile_conditions(unit, policy_id, is_created, mode)
            .await?;

        if mode != UpdateMode::Skip || is_created {
            notes.extend(self.reconcile_channels(unit, policy_id).await?);
        }
        Ok((!notes.is_empty()).then(|| notes.join("; ")))
    }
}

#[async_trait]
impl Restorer for AlertConditionsRestorer {
    fn title(&self) -> &'static str {
        REPORT_TITLE
    }

    fn suffix(&self) -> &'static str {
        ALERT_CONDITIONS_SUFFIX
    }

    async fn prepare(&mut self, mode: UpdateMode) -> Result<()> {
        let live = self.api.list_policies().await?;
        if mode == UpdateMode::Clean {
            for policy in &live {
                if let Some(id) = policy.id {
                    self.api.delete_policy(id).await?;
                }
            }
            info!(deleted = live.len(), "Deleted all alert policies.");
            self.policies.clear();
        } else {
            self.policies = live;
        }
        self.channels = self.api.list_channels().await?;
        self.resolver = Some(MonitorResolver::new(self.api.clone(), mode));
        Ok(())
    }

    async fn restore_file(&mut self, path: &Path, mode: UpdateMode, report: &mut ItemReport) {
        let file = display_path(path);
        let units: Vec<PolicySnapshot> = match read_one_or_many(path) {
            Ok(units) => units,
            Err(e) => {
                report.push(ItemOutcome::fail(file, "", e.to_string()));
                return;
            }
        };
        for unit in &units {
            match self.restore_unit(unit, mode).await {
                Ok(note) => report.push(
                    ItemOutcome::success(&file, unit.policy.name.clone())
                        .with_detail(note.unwrap_or_default()),
                ),
                Err(e) => report.push(ItemOutcome::fail(&file, unit.policy.name.clone(), e.to_string())),
            }
        }
    }
}
