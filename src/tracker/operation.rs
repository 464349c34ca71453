//! Operation names recorded for every remote call.

pub const GET_ALERT_POLICIES: &str = "Get Alert Policies";
pub const CREATE_ALERT_POLICY: &str = "Create Alert Policy";
pub const UPDATE_ALERT_POLICY_BY_ID: &str = "Update Alert Policy By ID";
pub const DELETE_ALERT_POLICY_BY_ID: &str = "Delete Alert Policy By ID";

pub const GET_CONDITIONS_BY_POLICY_ID: &str = "Get Conditions By Alert Policy ID";
pub const GET_LOCATION_CONDITIONS_BY_POLICY_ID: &str = "Get Location Failure Conditions By Alert Policy ID";
pub const CREATE_ALERT_CONDITION: &str = "Create Alert Condition";
pub const UPDATE_ALERT_CONDITION_BY_ID: &str = "Update Alert Condition By ID";
pub const DELETE_ALERT_CONDITION: &str = "Delete Alert Condition";

pub const GET_ALERT_CHANNELS: &str = "Get Alert Channels";
pub const CREATE_ALERT_CHANNEL: &str = "Create Alert Channel";
pub const DELETE_ALERT_CHANNEL: &str = "Delete Alert Channel";
pub const UPDATE_ALERT_POLICY_CHANNEL: &str = "Update Alert Policy Channel";

pub const GET_MONITORS: &str = "Get Monitors";
pub const GET_MONITOR_BY_ID: &str = "Get Monitor By ID";
pub const GET_MONITOR_SCRIPT: &str = "Get Monitor Script";
pub const GET_MONITOR_TAGS: &str = "Get Monitor Tags";
pub const CREATE_MONITOR: &str = "Create Monitor";
pub const UPDATE_MONITOR: &str = "Update Monitor";
pub const UPDATE_MONITOR_SCRIPT: &str = "Update Monitor Script";
pub const PATCH_MONITOR: &str = "Patch Monitor";
pub const DELETE_MONITOR: &str = "Delete Monitor";

pub const GET_LABELS: &str = "Get Labels";
pub const GET_MONITORS_BY_LABEL: &str = "Get Monitors By Label";
pub const GET_MONITOR_LABELS: &str = "Get Monitor Labels";
pub const ADD_LABEL_MONITOR: &str = "Add Label Monitor";
pub const DELETE_LABEL_FROM_MONITOR: &str = "Delete Label From Monitor";

pub const GET_DASHBOARDS: &str = "Get Dashboards";
pub const GET_DASHBOARD_BY_ID: &str = "Get Dashboard By ID";
pub const CREATE_DASHBOARD: &str = "Create Dashboard";
pub const UPDATE_DASHBOARD_BY_ID: &str = "Update Dashboard By ID";
pub const DELETE_DASHBOARD_BY_ID: &str = "Delete Dashboard By ID";

pub const GET_USERS: &str = "Get Users";

pub const INSERT_CUSTOM_EVENTS: &str = "Insert Custom Events";
