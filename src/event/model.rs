use serde::{Deserialize, Serialize};

use crate::message::model::MessageDto;
use crate::user::model::OnlineStatus;

/// Frame pushed to a connected client over its own channel.
///
/// Arrival order across the channel is not a contract; `message.timestamp`
/// is the sole ordering authority and clients re-sort on receipt.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A counterpart's message, pushed to the recipient.
    MessageDelivered { message: MessageDto },
    /// Confirmation of the caller's own send, echoing the client correlation
    /// token so the optimistic placeholder can be matched.
    MessageSent {
        message: MessageDto,
        #[serde(skip_serializing_if = "Option::is_none")]
        correlation: Option<String>,
    },
    OnlineStatusChange(OnlineStatus),
}
