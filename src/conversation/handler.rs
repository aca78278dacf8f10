use axum::extract::State;
use axum::{Extension, Json};

use crate::user;

use super::model::Summary;
use super::service::ConversationService;

pub async fn find_all(
    Extension(logged_sub): Extension<user::Sub>,
    conversation_service: State<ConversationService>,
) -> crate::Result<Json<Vec<Summary>>> {
    let summaries = conversation_service.find_all(&logged_sub).await?;
    Ok(Json(summaries))
}
