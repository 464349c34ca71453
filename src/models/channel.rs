use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelLinks {
    #[serde(default)]
    pub policy_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub recipients: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_json_attachment: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagerDutyConfig {
    #[serde(default)]
    pub service_key: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampfireConfig {
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub room: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HipChatConfig {
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub room_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpsGenieConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VictorOpsConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub route_key: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XMattersConfig {
    #[serde(default)]
    pub channel: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Type-specific payload of a channel, selected by its `type` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelConfig {
    User(UserConfig),
    Email(EmailConfig),
    Slack(SlackConfig),
    PagerDuty(PagerDutyConfig),
    Webhook(WebhookConfig),
    Campfire(CampfireConfig),
    HipChat(HipChatConfig),
    OpsGenie(OpsGenieConfig),
    VictorOps(VictorOpsConfig),
    XMatters(XMattersConfig),
    /// Any type this tool does not model; kept as read.
    Other { kind: String, configuration: Value },
}

impl ChannelConfig {
    pub fn kind(&self) -> &str {
        match self {
            ChannelConfig::User(_) => "user",
            ChannelConfig::Email(_) => "email",
            ChannelConfig::Slack(_) => "slack",
            ChannelConfig::PagerDuty(_) => "pagerduty",
            ChannelConfig::Webhook(_) => "webhook",
            ChannelConfig::Campfire(_) => "campfire",
            ChannelConfig::HipChat(_) => "hipchat",
            ChannelConfig::OpsGenie(_) => "opsgenie",
            ChannelConfig::VictorOps(_) => "victorops",
            ChannelConfig::XMatters(_) => "xmatters",
            ChannelConfig::Other { kind, .. } => kind,
        }
    }
}

/// Notification destination. Decoded in two phases: the `type` tag is read
/// first, then `configuration` is parsed into the matching payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChannel", into = "RawChannel")]
pub struct Channel {
    pub id: Option<i64>,
    pub name: String,
    pub config: ChannelConfig,
    pub links: ChannelLinks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawChannel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    configuration: Value,
    #[serde(default)]
    links: ChannelLinks,
}

impl TryFrom<RawChannel> for Channel {
    type Error = serde_json::Error;

    fn try_from(raw: RawChannel) -> Result<Self, Self::Error> {
        let configuration = match raw.configuration {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        let config = match raw.kind.as_str() {
            "user" => ChannelConfig::User(serde_json::from_value(configuration)?),
            "email" => ChannelConfig::Email(serde_json::from_value(configuration)?),
            "slack" => ChannelConfig::Slack(serde_json::from_value(configuration)?),
            "pagerduty" => ChannelConfig::PagerDuty(serde_json::from_value(configuration)?),
            "webhook" => ChannelConfig::Webhook(serde_json::from_value(configuration)?),
            "campfire" => ChannelConfig::Campfire(serde_json::from_value(configuration)?),
            "hipchat" => ChannelConfig::HipChat(serde_json::from_value(configuration)?),
            "opsgenie" => ChannelConfig::OpsGenie(serde_json::from_value(configuration)?),
            "victorops" => ChannelConfig::VictorOps(serde_json::from_value(configuration)?),
            "xmatters" => ChannelConfig::XMatters(serde_json::from_value(configuration)?),
            _ => ChannelConfig::Other {
                kind: raw.kind,
                configuration,
            },
        };
        Ok(Channel {
            id: raw.id,
            name: raw.name,
            config,
            links: raw.links,
        })
    }
}

impl From<Channel> for RawChannel {
    fn from(channel: Channel) -> Self {
        let kind = channel.config.kind().to_string();
        let configuration = match channel.config {
            ChannelConfig::User(c) => serde_json::to_value(c),
            ChannelConfig::Email(c) => serde_json::to_value(c),
            ChannelConfig::Slack(c) => serde_json::to_value(c),
            ChannelConfig::PagerDuty(c) => serde_json::to_value(c),
            ChannelConfig::Webhook(c) => serde_json::to_value(c),
            ChannelConfig::Campfire(c) => serde_json::to_value(c),
            ChannelConfig::HipChat(c) => serde_json::to_value(c),
            ChannelConfig::OpsGenie(c) => serde_json::to_value(c),
            ChannelConfig::VictorOps(c) => serde_json::to_value(c),
            ChannelConfig::XMatters(c) => serde_json::to_value(c),
            ChannelConfig::Other { configuration, .. } => Ok(configuration),
        }
        .unwrap_or(Value::Null);
        RawChannel {
            id: channel.id,
            name: channel.name,
            kind,
            configuration,
            links: channel.links,
        }
    }
}
