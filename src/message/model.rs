use mongodb::bson;
use serde::{Deserialize, Serialize};

use crate::user;

use super::Id;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Text,
    Image,
    File,
}

/// Stored message. Immutable after insert except the `seen` flag.
#[derive(Serialize, Deserialize, Clone)]
pub struct Message {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<bson::oid::ObjectId>,
    pub sender: user::Sub,
    pub recipient: user::Sub,
    pub text: String,
    pub kind: Kind,
    timestamp: i64,
    seen: bool,
}

impl Message {
    pub fn new(sender: user::Sub, recipient: user::Sub, text: &str, kind: Kind) -> Self {
        Self {
            id: None,
            sender,
            recipient,
            text: text.to_owned(),
            kind,
            timestamp: chrono::Utc::now().timestamp_millis(),
            seen: false,
        }
    }

    #[cfg(test)]
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn id(&self) -> Option<Id> {
        self.id.map(|oid| Id(oid.to_hex()))
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn seen(&self) -> bool {
        self.seen
    }
}

/// Outward JSON shape with the server-assigned id always present.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageDto {
    pub id: Id,
    pub sender: user::Sub,
    pub recipient: user::Sub,
    pub text: String,
    pub kind: Kind,
    pub timestamp: i64,
    pub seen: bool,
}

impl TryFrom<Message> for MessageDto {
    type Error = super::Error;

    fn try_from(message: Message) -> super::Result<Self> {
        let id = message.id().ok_or(super::Error::IdNotPresent)?;
        Ok(Self {
            id,
            sender: message.sender,
            recipient: message.recipient,
            text: message.text,
            kind: message.kind,
            timestamp: message.timestamp,
            seen: message.seen,
        })
    }
}

#[derive(Deserialize, Clone)]
pub struct CreateRequest {
    pub recipient: user::Sub,
    pub text: String,
    #[serde(default = "default_kind")]
    pub kind: Kind,
    /// Opaque client token echoed back on the "sent" confirmation so the
    /// sender can match its optimistic placeholder. Not an idempotency key;
    /// a retried request creates a distinct message.
    pub correlation: Option<String>,
}

fn default_kind() -> Kind {
    Kind::Text
}
