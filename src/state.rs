use axum::extract::FromRef;

use crate::conversation::service::ConversationService;
use crate::event::service::EventService;
use crate::integration;
use crate::message::repository::MessageRepository;
use crate::message::service::MessageService;
use crate::user::repository::MongoUserRepository;
use crate::user::service::UserServiceImpl;
use crate::{auth, user};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: auth::Service,
    pub user_service: user::Service,
    pub message_service: MessageService,
    pub conversation_service: ConversationService,
    pub event_service: EventService,
}

impl AppState {
    pub fn init(config: &integration::Config) -> Self {
        let database = integration::db::init(&config.mongo);

        let auth_service = auth::service::AuthService::new(&config.jwt);
        let user_service: user::Service =
            std::sync::Arc::new(UserServiceImpl::new(MongoUserRepository::new(&database)));
        let event_service = EventService::new();
        let message_repository = MessageRepository::new(&database);
        let message_service = MessageService::new(
            message_repository.clone(),
            user_service.clone(),
            event_service.clone(),
        );
        let conversation_service = ConversationService::new(
            message_repository,
            user_service.clone(),
            event_service.clone(),
        );

        Self {
            auth_service,
            user_service,
            message_service,
            conversation_service,
            event_service,
        }
    }
}
