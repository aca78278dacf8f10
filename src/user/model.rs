use mongodb::bson;
use serde::{Deserialize, Serialize};

use super::Sub;

#[derive(Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(skip)]
    _id: Option<bson::oid::ObjectId>,
    pub sub: Sub,
    pub name: String,
    pub email: String,
    pub picture: String,
    pub last_seen: i64,
}

impl User {
    pub fn new(
        sub: Sub,
        name: impl Into<String>,
        email: impl Into<String>,
        picture: impl Into<String>,
    ) -> Self {
        Self {
            _id: None,
            sub,
            name: name.into(),
            email: email.into(),
            picture: picture.into(),
            last_seen: 0,
        }
    }
}

/// Outward directory shape; `online` is attached from the delivery registry,
/// it is not a stored field.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserDto {
    pub sub: Sub,
    pub name: String,
    pub picture: String,
    pub last_seen: i64,
    pub online: bool,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            sub: user.sub,
            name: user.name,
            picture: user.picture,
            last_seen: user.last_seen,
            online: false,
        }
    }
}

impl UserDto {
    pub fn with_online(self, online: bool) -> Self {
        Self { online, ..self }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OnlineStatus {
    pub sub: Sub,
    pub online: bool,
}

impl OnlineStatus {
    pub fn new(sub: Sub, online: bool) -> Self {
        Self { sub, online }
    }
}
