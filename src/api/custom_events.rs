use reqwest::Method;
use serde_json::Value;

use super::{Call, NewRelicApi};
use crate::error::Result;
use crate::tracker::{operation, ServiceKind};

const INSERT_KEY_HEADER: &str = "x-insert-key";

impl NewRelicApi {
    /// Posts one event or an array of events to an account's event
    /// collector. The collector authenticates with an insert key, not the
    /// API key.
    pub async fn insert_custom_events(
        &self,
        account_id: &str,
        insert_key: &str,
        events: &Value,
    ) -> Result<()> {
        let call = Call::new(
            &self.clients.insights,
            ServiceKind::CustomEvents,
            operation::INSERT_CUSTOM_EVENTS,
            Method::POST,
            format!("{account_id}/events"),
        )
        .header(INSERT_KEY_HEADER, insert_key)
        .json(events.clone());
        let count = events.as_array().map_or(1, Vec::len);
        self.send(call, &format!("accountId:{account_id},events:{count}"))
            .await?;
        Ok(())
    }
}
