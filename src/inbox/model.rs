use serde::{Deserialize, Serialize};

use crate::message::model::MessageDto;
use crate::user;
use crate::{message, user::Sub};

/// Per-message send state machine: `Pending -> Confirmed | Failed`, driven by
/// whichever of the HTTP response or the socket confirmation arrives first.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Confirmed,
    Failed,
}

/// One timeline row. A persisted message is identified by `id`; an entry that
/// is not yet confirmed only has its `correlation` token.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Entry {
    pub id: Option<message::Id>,
    pub correlation: Option<String>,
    pub sender: Sub,
    pub recipient: Sub,
    pub text: String,
    pub timestamp: i64,
    pub status: EntryStatus,
}

impl Entry {
    pub fn pending(correlation: String, sender: Sub, recipient: Sub, text: &str, now: i64) -> Self {
        Self {
            id: None,
            correlation: Some(correlation),
            sender,
            recipient,
            text: text.to_owned(),
            timestamp: now,
            status: EntryStatus::Pending,
        }
    }

    pub fn confirmed(dto: MessageDto, correlation: Option<String>) -> Self {
        Self {
            id: Some(dto.id),
            correlation,
            sender: dto.sender,
            recipient: dto.recipient,
            text: dto.text,
            timestamp: dto.timestamp,
            status: EntryStatus::Confirmed,
        }
    }
}

/// One row of the client-held conversation stack.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Conversation {
    pub counterpart: user::Sub,
    pub last_message: Option<String>,
    pub last_activity: i64,
    pub unread: u32,
}
