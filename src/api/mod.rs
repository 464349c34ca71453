//! Per-resource remote operations. Every call is recorded in the tracker and
//! any non-2xx answer becomes [`BackupError::NonSuccessStatus`].

use reqwest::Method;

use crate::client::{ApiClient, ApiResponse, Clients, RequestBody};
use crate::error::{BackupError, Result};
use crate::tracker::{ResultTracker, ServiceKind};

pub mod channels;
pub mod conditions;
pub mod custom_events;
pub mod dashboards;
pub mod labels;
pub mod monitors;
pub mod policies;
pub mod users;

pub use dashboards::DashboardSummary;
pub use users::UserFilter;

/// Handle on the remote service for one command run. Cloning is cheap and
/// every clone shares the same tracker.
#[derive(Debug, Clone)]
pub struct NewRelicApi {
    clients: Clients,
    tracker: ResultTracker,
}

/// One request as issued by a resource module.
pub(crate) struct Call<'a> {
    pub client: &'a ApiClient,
    pub kind: ServiceKind,
    pub operation: &'static str,
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub headers: Vec<(&'static str, String)>,
    pub body: RequestBody,
}

impl<'a> Call<'a> {
    pub fn new(
        client: &'a ApiClient,
        kind: ServiceKind,
        operation: &'static str,
        method: Method,
        path: impl Into<String>,
    ) -> Self {
        Self {
            client,
            kind,
            operation,
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn raw(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Raw(body.into());
        self
    }
}

impl NewRelicApi {
    pub fn new(clients: Clients, tracker: ResultTracker) -> Self {
        Self { clients, tracker }
    }

    pub fn tracker(&self) -> &ResultTracker {
        &self.tracker
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    /// Sends and records the call without judging its status.
    pub(crate) async fn send_raw(&self, call: Call<'_>, message: &str) -> Result<ApiResponse> {
        let Call {
            client,
            kind,
            operation,
            method,
            path,
            query,
            headers,
            body,
        } = call;
        match client
            .send_with_headers(operation, method, &path, &query, &headers, body)
            .await
        {
            Ok(response) => {
                self.tracker.record(kind, operation, response.status, message);
                Ok(response)
            }
            Err(e) => {
                self.tracker
                    .record(kind, operation, 0, format!("{message},error:{e}"));
                Err(e)
            }
        }
    }

    /// Sends and records the call; anything but 2xx is an error.
    pub(crate) async fn send(&self, call: Call<'_>, message: &str) -> Result<ApiResponse> {
        let operation = call.operation;
        let response = self.send_raw(call, message).await?;
        if !response.is_success() {
            return Err(BackupError::status(operation, response.status));
        }
        Ok(response)
    }
}
