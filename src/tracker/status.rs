use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Which remote service answered a call. Selects the status description table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    AlertPolicies,
    AlertConditions,
    AlertChannels,
    Monitors,
    MonitorScripts,
    MonitorTags,
    Labels,
    LabelSynthetics,
    Dashboards,
    Users,
    CustomEvents,
}

const BAD_REQUEST: &str = "Bad request";
const KEY_REQUIRED: &str = "Invalid request, API key required";
const ACCESS_DISABLED: &str = "New Relic API access has not been enabled";
const SERVER_ERROR: &str = "A server error occurred, please contact New Relic support";
const TOO_MANY_REQUESTS: &str = "Too many requests";

type Table = HashMap<u16, &'static str>;

fn v2_table(extra: &[(u16, &'static str)]) -> Table {
    let mut table: Table = [
        (400, BAD_REQUEST),
        (401, KEY_REQUIRED),
        (403, ACCESS_DISABLED),
        (429, TOO_MANY_REQUESTS),
        (500, SERVER_ERROR),
    ]
    .into_iter()
    .collect();
    table.extend(extra.iter().copied());
    table
}

static TABLES: Lazy<HashMap<ServiceKind, Table>> = Lazy::new(|| {
    let monitors: Table = [
        (201, "Success"),
        (204, "Success"),
        (400, "The monitor values is invalid, or the format of the request is invalid."),
        (401, KEY_REQUIRED),
        (404, "The specified monitor does not exist"),
        (429, TOO_MANY_REQUESTS),
        (500, SERVER_ERROR),
    ]
    .into_iter()
    .collect();

    let scripts: Table = [
        (204, "Success"),
        (400, "The script values is invalid, or the format of the request is invalid."),
        (404, "The specified monitor does not exist or has no script"),
        (500, SERVER_ERROR),
    ]
    .into_iter()
    .collect();

    let label_synthetics: Table = [
        (204, "Success"),
        (400, "Bad request, or the format of the request is invalid."),
        (404, "The specified label does not exist"),
        (500, SERVER_ERROR),
    ]
    .into_iter()
    .collect();

    let custom_events: Table = [
        (400, "Missing or invalid content length, or the payload is not valid JSON"),
        (403, "Missing or invalid insert key"),
        (408, "Request timed out"),
        (413, "Content too large"),
        (429, TOO_MANY_REQUESTS),
    ]
    .into_iter()
    .collect();

    let graphql: Table = [(400, BAD_REQUEST), (401, KEY_REQUIRED), (500, SERVER_ERROR)]
        .into_iter()
        .collect();

    HashMap::from([
        (
            ServiceKind::AlertPolicies,
            v2_table(&[(422, "Validation or internal error occurred")]),
        ),
        (
            ServiceKind::AlertConditions,
            v2_table(&[
                (404, "No Alerts policy was found for the given ID"),
                (406, "Bad entity type"),
                (422, "Validation error occurred while trying to create the alert condition"),
            ]),
        ),
        (
            ServiceKind::AlertChannels,
            v2_table(&[(422, "Validation or internal error occurred")]),
        ),
        (ServiceKind::Labels, v2_table(&[])),
        (ServiceKind::Users, v2_table(&[])),
        (
            ServiceKind::Dashboards,
            v2_table(&[(404, "No dashboard was found for the given ID"), (422, "Validation or internal error occurred")]),
        ),
        (ServiceKind::Monitors, monitors),
        (ServiceKind::MonitorScripts, scripts),
        (ServiceKind::MonitorTags, graphql),
        (ServiceKind::LabelSynthetics, label_synthetics),
        (ServiceKind::CustomEvents, custom_events),
    ])
});

/// Human explanation of a status code. 200 is always "Success"; codes the
/// service's table does not know yield an empty string.
pub fn describe(kind: ServiceKind, status_code: u16) -> &'static str {
    if status_code == 200 {
        return "Success";
    }
    TABLES
        .get(&kind)
        .and_then(|table| table.get(&status_code))
        .copied()
        .unwrap_or("")
}
