use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::doc;

use crate::user;

use super::Sub;
use super::model::User;

const USERS_COLLECTION: &str = "users";

#[async_trait::async_trait]
pub trait UserRepository {
    async fn insert(&self, user: &User) -> super::Result<()>;

    async fn find_by_sub(&self, sub: &Sub) -> super::Result<User>;

    async fn search_excluding(
        &self,
        query: &str,
        exclude: &Sub,
        limit: i64,
    ) -> super::Result<Vec<User>>;

    async fn touch_last_seen(&self, sub: &Sub, at: i64) -> super::Result<()>;
}

pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(USERS_COLLECTION),
        }
    }
}

#[async_trait::async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: &User) -> super::Result<()> {
        self.collection.insert_one(user).await?;
        Ok(())
    }

    async fn find_by_sub(&self, sub: &Sub) -> super::Result<User> {
        self.collection
            .find_one(doc! { "sub": sub })
            .await?
            .ok_or(user::Error::NotFound(sub.to_owned()))
    }

    /// Case-insensitive substring match on name or email, never returning the
    /// caller themselves.
    async fn search_excluding(
        &self,
        query: &str,
        exclude: &Sub,
        limit: i64,
    ) -> super::Result<Vec<User>> {
        let escaped = regex_escape(query);
        let filter = doc! {
            "sub": { "$ne": exclude },
            "$or": [
                { "name": { "$regex": &escaped, "$options": "i" } },
                { "email": { "$regex": &escaped, "$options": "i" } },
            ],
        };

        let cursor = self.collection.find(filter).limit(limit).await?;

        cursor.try_collect().await.map_err(user::Error::from)
    }

    async fn touch_last_seen(&self, sub: &Sub, at: i64) -> super::Result<()> {
        self.collection
            .update_one(doc! { "sub": sub }, doc! { "$set": { "last_seen": at } })
            .await?;
        Ok(())
    }
}

fn regex_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_regex_metacharacters() {
        assert_eq!(regex_escape("a.b+c"), "a\\.b\\+c");
        assert_eq!(regex_escape("plain"), "plain");
    }
}
