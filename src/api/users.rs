use super::NewRelicApi;
use crate::error::Result;
use crate::fetch::{fetch_all, PageQuery};
use crate::models::User;
use crate::tracker::{operation, ServiceKind};

/// Server-side filters of the user list.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Comma separated user ids.
    pub ids: Option<String>,
    pub email: Option<String>,
}

impl NewRelicApi {
    pub async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let mut query = PageQuery::new(operation::GET_USERS, ServiceKind::Users, "users.json", "users");
        if let Some(ids) = filter.ids.as_deref().filter(|ids| !ids.is_empty()) {
            query = query.param("filter[ids]", ids);
        }
        if let Some(email) = filter.email.as_deref().filter(|email| !email.is_empty()) {
            query = query.param("filter[email]", email);
        }
        fetch_all(&self.clients.alerts, &self.tracker, &query).await
    }
}
