use std::collections::HashSet;
use std::sync::Arc;

use log::warn;

use crate::event::service::EventService;
use crate::message::model::Message;
use crate::message::repository::MessageRepository;
use crate::user;

use super::model::{FoldEntry, LastMessage, Summary};

#[derive(Clone)]
pub struct ConversationService {
    message_repository: Arc<MessageRepository>,
    user_service: user::Service,
    event_service: EventService,
}

impl ConversationService {
    pub fn new(
        message_repository: MessageRepository,
        user_service: user::Service,
        event_service: EventService,
    ) -> Self {
        Self {
            message_repository: Arc::new(message_repository),
            user_service,
            event_service,
        }
    }
}

impl ConversationService {
    /// The caller's conversations, most recently active first. A read-time
    /// aggregation over the caller's full message set; cheap at chat-scale
    /// message volumes, deliberately not a maintained view.
    pub async fn find_all(&self, caller: &user::Sub) -> super::Result<Vec<Summary>> {
        let messages = self.message_repository.find_by_participant(caller).await?;
        let entries = fold(caller, &messages);

        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            let recipient = match self.user_service.find_by_sub(&entry.counterpart).await {
                Ok(dto) => dto,
                Err(user::Error::NotFound(sub)) => {
                    warn!("skipping conversation with unknown counterpart: {sub}");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let online = self.event_service.online(&entry.counterpart);

            summaries.push(Summary {
                id: super::id(caller, &entry.counterpart),
                recipient: recipient.with_online(online),
                last_message: entry.last_message,
                unread: entry.unread,
            });
        }

        Ok(summaries)
    }

    /// Everyone the caller shares at least one message with. Feeds the
    /// presence fan-out on connect/disconnect.
    pub async fn counterparts(&self, caller: &user::Sub) -> super::Result<HashSet<user::Sub>> {
        let messages = self.message_repository.find_by_participant(caller).await?;

        Ok(messages
            .into_iter()
            .map(|m| counterpart_of(caller, &m))
            .collect())
    }
}

fn counterpart_of(me: &user::Sub, message: &Message) -> user::Sub {
    if message.sender == *me {
        message.recipient.to_owned()
    } else {
        message.sender.to_owned()
    }
}

/// Groups a newest-first message list by counterpart. The first message seen
/// per counterpart is its most recent one, so the output inherits the input's
/// recency order; running the fold over a deterministically sorted input
/// (timestamp desc, then id desc) makes equal-timestamp order stable.
fn fold(me: &user::Sub, newest_first: &[Message]) -> Vec<FoldEntry> {
    let mut entries: Vec<FoldEntry> = Vec::new();

    for message in newest_first {
        let counterpart = counterpart_of(me, message);
        let inbound_unseen = message.recipient == *me && !message.seen();

        match entries.iter_mut().find(|e| e.counterpart == counterpart) {
            Some(entry) => {
                if inbound_unseen {
                    entry.unread += 1;
                }
            }
            None => entries.push(FoldEntry {
                counterpart,
                last_message: LastMessage {
                    text: message.text.clone(),
                    timestamp: message.timestamp(),
                },
                unread: u32::from(inbound_unseen),
            }),
        }
    }

    entries
}
