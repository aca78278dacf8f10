use serde::{Deserialize, Serialize};

use crate::user;
use crate::user::model::UserDto;

/// Read-time view of one conversation; recomputed on every list fetch,
/// never stored.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Summary {
    pub id: String,
    pub recipient: UserDto,
    pub last_message: LastMessage,
    pub unread: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LastMessage {
    pub text: String,
    pub timestamp: i64,
}

/// Intermediate fold result, before counterpart identities are resolved
/// through the directory.
#[derive(Debug, PartialEq, Eq)]
pub struct FoldEntry {
    pub counterpart: user::Sub,
    pub last_message: LastMessage,
    pub unread: u32,
}