use serde_json::Value;

use super::{render_items, OutputFormat};
use crate::api::conditions::{value_id, value_name};
use crate::api::{NewRelicApi, UserFilter};
use crate::backup::monitors::fetch_monitor_with_script;
use crate::error::{BackupError, Result};
use crate::models::{Condition, ConditionCategory, ConditionSet, Label};
use crate::tracker::render_table;

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(T::to_string).unwrap_or_default()
}

/// Policies, optionally only those whose name contains `name`.
pub async fn get_policies(api: &NewRelicApi, name: Option<&str>, format: OutputFormat) -> Result<String> {
    let mut policies = api.list_policies().await?;
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        policies.retain(|p| p.name.contains(name));
    }
    render_items(&policies, format, &["ID", "NAME", "INCIDENT PREFERENCE"], |p| {
        let preference = p
            .incident_preference
            .and_then(|i| serde_json::to_value(i).ok())
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        vec![opt(&p.id), p.name.clone(), preference]
    })
}

pub async fn get_channels(api: &NewRelicApi, format: OutputFormat) -> Result<String> {
    let channels = api.list_channels().await?;
    render_items(&channels, format, &["ID", "NAME", "TYPE", "POLICIES"], |c| {
        let policies = c
            .links
            .policy_ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        vec![opt(&c.id), c.name.clone(), c.config.kind().to_string(), policies]
    })
}

/// Conditions of one policy. With a category only that category is read
/// and location-failure conditions are left out.
pub async fn get_conditions(
    api: &NewRelicApi,
    policy_id: i64,
    category: Option<ConditionCategory>,
    format: OutputFormat,
) -> Result<String> {
    let set = match category {
        Some(category) => {
            let mut set = ConditionSet::default();
            for condition in api.list_conditions(policy_id, category).await? {
                set.push(condition);
            }
            set
        }
        None => api.list_policy_conditions(policy_id).await?,
    };
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&set)?);
    }

    let mut rows: Vec<Vec<String>> = set
        .to_conditions()
        .iter()
        .map(|c: &Condition| {
            vec![
                c.category().to_string(),
                opt(&c.id()),
                c.name().to_string(),
                opt(&c.enabled()),
            ]
        })
        .collect();
    rows.extend(set.location_failure_conditions.iter().map(|c: &Value| {
        vec![
            "location-failure".to_string(),
            opt(&value_id(c)),
            value_name(c).to_string(),
            opt(&c.get("enabled").and_then(Value::as_bool)),
        ]
    }));
    Ok(render_table(&["TYPE", "ID", "NAME", "ENABLED"], &rows))
}

pub async fn get_dashboards(api: &NewRelicApi, format: OutputFormat) -> Result<String> {
    let dashboards = api.list_dashboards().await?;
    render_items(&dashboards, format, &["ID", "TITLE"], |d| {
        vec![d.id.to_string(), d.title.clone()]
    })
}

/// The full dashboard document, always as JSON.
pub async fn get_dashboard(api: &NewRelicApi, id: i64) -> Result<String> {
    Ok(serde_json::to_string_pretty(&api.get_dashboard(id).await?)?)
}

pub async fn get_monitors(api: &NewRelicApi, format: OutputFormat) -> Result<String> {
    let monitors = api.list_monitors().await?;
    render_items(&monitors, format, &["ID", "NAME", "TYPE", "FREQUENCY", "STATUS"], |m| {
        vec![
            opt(&m.id),
            m.name.clone(),
            m.monitor_type.clone(),
            opt(&m.frequency),
            opt(&m.status),
        ]
    })
}

/// One monitor with its script, always as JSON.
pub async fn get_monitor(api: &NewRelicApi, id: &str) -> Result<String> {
    let monitor = fetch_monitor_with_script(api, id).await?;
    Ok(serde_json::to_string_pretty(&monitor)?)
}

pub async fn get_labels(api: &NewRelicApi, format: OutputFormat) -> Result<String> {
    let labels = api.list_labels().await?;
    render_items(&labels, format, &["CATEGORY", "NAME"], |l| {
        vec![l.category.clone(), l.name.clone()]
    })
}

/// Ids of the monitors carrying the `category:name` label.
pub async fn get_label_monitors(api: &NewRelicApi, reference: &str, format: OutputFormat) -> Result<String> {
    let label = Label::parse(reference).ok_or_else(|| {
        BackupError::InvalidInput(format!("label '{reference}' is not in category:name form"))
    })?;
    let ids = api.list_monitors_by_label(&label).await?;
    render_items(&ids, format, &["MONITOR ID"], |id| vec![id.clone()])
}

pub async fn get_users(api: &NewRelicApi, filter: &UserFilter, format: OutputFormat) -> Result<String> {
    let users = api.list_users(filter).await?;
    render_items(&users, format, &["ID", "EMAIL", "FIRST NAME", "LAST NAME", "ROLE"], |u| {
        vec![
            opt(&u.id),
            u.email.clone(),
            u.first_name.clone(),
            u.last_name.clone(),
            u.role.clone(),
        ]
    })
}
