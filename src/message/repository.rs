use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::doc;

use crate::user;

use super::Id;
use super::model::Message;

const MESSAGES_COLLECTION: &str = "messages";

#[derive(Clone)]
pub struct MessageRepository {
    collection: mongodb::Collection<Message>,
}

impl MessageRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(MESSAGES_COLLECTION),
        }
    }
}

impl MessageRepository {
    pub async fn insert(&self, message: &Message) -> super::Result<Id> {
        self.collection
            .insert_one(message)
            .await?
            .inserted_id
            .as_object_id()
            .map(|oid| Id(oid.to_hex()))
            .ok_or(super::Error::IdNotPresent)
    }

    /// One page of the pair's history, newest first. Callers that render a
    /// timeline must reverse to chronological ascending; the native order here
    /// exists for pagination only and is not display order.
    pub async fn find_by_pair(
        &self,
        a: &user::Sub,
        b: &user::Sub,
        page: u64,
        page_size: i64,
    ) -> super::Result<Vec<Message>> {
        let cursor = self
            .collection
            .find(pair_filter(a, b))
            .sort(doc! { "timestamp": -1, "_id": -1 })
            .skip(page.saturating_mul(page_size as u64))
            .limit(page_size)
            .await?;

        let messages = cursor.try_collect::<Vec<Message>>().await?;

        Ok(messages)
    }

    /// Every message the user participates in, newest first. Feeds the
    /// read-time conversation fold.
    pub async fn find_by_participant(&self, sub: &user::Sub) -> super::Result<Vec<Message>> {
        let cursor = self
            .collection
            .find(doc! {
                "$or": [ { "sender": sub }, { "recipient": sub } ]
            })
            .sort(doc! { "timestamp": -1, "_id": -1 })
            .await?;

        let messages = cursor.try_collect::<Vec<Message>>().await?;

        Ok(messages)
    }

    /// Flips `seen` on everything addressed to the reader within the pair.
    /// Best-effort; there is no read-receipt propagation to the sender.
    pub async fn mark_seen(&self, reader: &user::Sub, counterpart: &user::Sub) -> super::Result<()> {
        self.collection
            .update_many(
                doc! { "sender": counterpart, "recipient": reader, "seen": false },
                doc! { "$set": { "seen": true } },
            )
            .await?;
        Ok(())
    }

    pub async fn delete_by_pair(&self, a: &user::Sub, b: &user::Sub) -> super::Result<()> {
        self.collection.delete_many(pair_filter(a, b)).await?;
        Ok(())
    }
}

fn pair_filter(a: &user::Sub, b: &user::Sub) -> mongodb::bson::Document {
    doc! {
        "$or": [
            { "sender": a, "recipient": b },
            { "sender": b, "recipient": a },
        ]
    }
}
