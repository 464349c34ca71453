pub mod channel;
pub mod condition;
pub mod label;
pub mod monitor;
pub mod policy;
pub mod snapshot;
pub mod user;

pub use channel::{Channel, ChannelConfig};
pub use condition::{Condition, ConditionCategory, ConditionSet};
pub use label::Label;
pub use monitor::{Monitor, Script, Tag};
pub use policy::{IncidentPreference, Policy};
pub use snapshot::{Dependencies, PolicySnapshot};
pub use user::User;
