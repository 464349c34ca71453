use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::{Call, NewRelicApi};
use crate::error::{BackupError, Result};
use crate::fetch::{fetch_all, PageQuery};
use crate::models::Channel;
use crate::tracker::{operation, ServiceKind};

#[derive(Deserialize)]
struct ChannelsEnvelope {
    #[serde(default)]
    channels: Vec<Channel>,
}

impl NewRelicApi {
    pub async fn list_channels(&self) -> Result<Vec<Channel>> {
        let query = PageQuery::new(
            operation::GET_ALERT_CHANNELS,
            ServiceKind::AlertChannels,
            "alerts_channels.json",
            "channels",
        );
        fetch_all(&self.clients.alerts, &self.tracker, &query).await
    }

    /// Replaces the whole channel list of a policy; the service has no
    /// add/remove for single associations.
    pub async fn set_policy_channels(&self, policy_id: i64, channel_ids: &[i64]) -> Result<()> {
        let ids = channel_ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::AlertChannels,
            operation::UPDATE_ALERT_POLICY_CHANNEL,
            Method::PUT,
            "alerts_policy_channels.json",
        )
        .param("policy_id", policy_id)
        .param("channel_ids", &ids);
        self.send(call, &format!("policyId:{policy_id},channelIds:{ids}"))
            .await?;
        Ok(())
    }
    /// Creates a channel; the service answers with a one-element list.
    pub async fn create_channel(&self, channel: &Channel) -> Result<Channel> {
        let mut body = serde_json::to_value(channel)?;
        if let Some(attributes) = body.as_object_mut() {
            attributes.remove("id");
            attributes.remove("links");
        }
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::AlertChannels,
            operation::CREATE_ALERT_CHANNEL,
            Method::POST,
            "alerts_channels.json",
        )
        .json(json!({ "channel": body }));
        let response = self.send(call, &format!("name:{}", channel.name)).await?;
        response
            .json::<ChannelsEnvelope>()?
            .channels
            .into_iter()
            .next()
            .ok_or_else(|| {
                BackupError::InvalidInput(format!(
                    "Create Alert Channel answer for '{}' holds no channel",
                    channel.name
                ))
            })
    }

    pub async fn delete_channel(&self, id: i64) -> Result<()> {
        let call = Call::new(
            &self.clients.alerts,
            ServiceKind::AlertChannels,
            operation::DELETE_ALERT_CHANNEL,
            Method::DELETE,
            format!("alerts_channels/{id}.json"),
        );
        self.send(call, &format!("channelId:{id}")).await?;
        Ok(())
    }
}
