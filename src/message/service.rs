use std::sync::Arc;

use log::warn;

use crate::event::model::Notification;
use crate::event::service::EventService;
use crate::user;

use super::model::{CreateRequest, Message, MessageDto};
use super::repository::MessageRepository;
use super::MAX_TEXT_LEN;

#[derive(Clone)]
pub struct MessageService {
    repository: Arc<MessageRepository>,
    user_service: user::Service,
    event_service: EventService,
}

impl MessageService {
    pub fn new(
        repository: MessageRepository,
        user_service: user::Service,
        event_service: EventService,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            user_service,
            event_service,
        }
    }
}

impl MessageService {
    /// Persists a message and pushes it to both ends of the conversation.
    ///
    /// Validation happens before any persistence attempt. The pushes run
    /// after the insert and are best-effort: a disconnected party simply
    /// picks the message up on their next fetch, and a failed push is never
    /// retried here.
    pub async fn create(
        &self,
        sender: &user::Sub,
        request: &CreateRequest,
    ) -> super::Result<MessageDto> {
        let text = validate_text(&request.text)?;
        if sender == &request.recipient {
            return Err(super::Error::SelfMessage);
        }
        self.user_service.find_by_sub(&request.recipient).await?;

        let message = Message::new(
            sender.to_owned(),
            request.recipient.to_owned(),
            text,
            request.kind,
        );
        let id = self.repository.insert(&message).await?;

        let dto = MessageDto {
            id,
            sender: message.sender.clone(),
            recipient: message.recipient.clone(),
            text: message.text.clone(),
            kind: message.kind,
            timestamp: message.timestamp(),
            seen: message.seen(),
        };

        self.event_service.publish(
            &dto.recipient,
            Notification::MessageDelivered { message: dto.clone() },
        );
        self.event_service.publish(
            sender,
            Notification::MessageSent {
                message: dto.clone(),
                correlation: request.correlation.clone(),
            },
        );

        Ok(dto)
    }

    /// One page of the conversation with `counterpart`, reversed from the
    /// store's newest-first order to chronological ascending for display.
    pub async fn find_chat(
        &self,
        caller: &user::Sub,
        counterpart: &user::Sub,
        page: u64,
        page_size: i64,
    ) -> super::Result<Vec<MessageDto>> {
        let page_size = page_size.clamp(1, 100);

        let mut messages = self
            .repository
            .find_by_pair(caller, counterpart, page, page_size)
            .await?;
        messages.reverse();

        messages.into_iter().map(MessageDto::try_from).collect()
    }

    pub async fn mark_read(
        &self,
        caller: &user::Sub,
        counterpart: &user::Sub,
    ) -> super::Result<()> {
        if caller == counterpart {
            warn!("ignoring mark_read for self conversation: {caller}");
            return Ok(());
        }
        self.repository.mark_seen(caller, counterpart).await
    }
}

fn validate_text(text: &str) -> super::Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(super::Error::EmptyText);
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(super::Error::TextTooLong);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_whitespace_text() {
        assert!(matches!(validate_text(""), Err(crate::message::Error::EmptyText)));
        assert!(matches!(
            validate_text("   \n\t"),
            Err(crate::message::Error::EmptyText)
        ));
    }

    #[test]
    fn rejects_text_over_the_length_bound() {
        let long = "x".repeat(MAX_TEXT_LEN + 1);
        assert!(matches!(
            validate_text(&long),
            Err(crate::message::Error::TextTooLong)
        ));
    }

    #[test]
    fn accepts_and_trims_plain_text() {
        assert_eq!(validate_text("  hi there  ").unwrap(), "hi there");
        let at_bound = "y".repeat(MAX_TEXT_LEN);
        assert_eq!(validate_text(&at_bound).unwrap(), at_bound);
    }
}
