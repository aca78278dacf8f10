use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use log::debug;
use tokio::sync::broadcast;

use crate::user;

use super::model::Notification;

const CHANNEL_CAPACITY: usize = 64;

/// In-process delivery registry: one logical channel per user, keyed by sub.
/// Multiple sessions of the same user share the channel. Delivery is
/// at-most-once and best-effort; a message for a user with no live receiver
/// is dropped here and surfaces on their next fetch instead.
#[derive(Clone)]
pub struct EventService {
    channels: Arc<DashMap<user::Sub, broadcast::Sender<Notification>>>,
}

impl Default for EventService {
    fn default() -> Self {
        Self::new()
    }
}

impl EventService {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
        }
    }
}

impl EventService {
    /// Joins the user's own channel, creating it on first connect.
    pub fn subscribe(&self, sub: &user::Sub) -> broadcast::Receiver<Notification> {
        let tx = self
            .channels
            .entry(sub.to_owned())
            .or_insert_with(|| {
                let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
                tx
            })
            .value()
            .clone();

        tx.subscribe()
    }

    pub fn publish(&self, sub: &user::Sub, notification: Notification) {
        match self.channels.get(sub) {
            Some(tx) if tx.receiver_count() > 0 => {
                let _ = tx.send(notification);
            }
            _ => debug!("no live channel for {sub}, dropping notification"),
        }
    }

    pub fn online(&self, sub: &user::Sub) -> bool {
        self.channels
            .get(sub)
            .is_some_and(|tx| tx.receiver_count() > 0)
    }

    pub fn online_users(&self) -> HashSet<user::Sub> {
        self.channels
            .iter()
            .filter(|e| e.value().receiver_count() > 0)
            .map(|e| e.key().to_owned())
            .collect()
    }

    /// Drops the user's channel if its last receiver is gone; called from the
    /// socket teardown path.
    pub fn reclaim(&self, sub: &user::Sub) {
        self.channels
            .remove_if(sub, |_, tx| tx.receiver_count() == 0);
    }
}
