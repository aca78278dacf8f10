use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::Query;
use serde::Deserialize;

use crate::user;

use super::model::{CreateRequest, MessageDto};
use super::service::MessageService;

pub async fn create(
    Extension(logged_sub): Extension<user::Sub>,
    message_service: State<MessageService>,
    Json(request): Json<CreateRequest>,
) -> crate::Result<(StatusCode, Json<MessageDto>)> {
    let dto = message_service.create(&logged_sub, &request).await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

#[derive(Deserialize)]
pub struct FindChatParams {
    recipient: Option<user::Sub>,
    page: Option<u64>,
    page_size: Option<i64>,
}

pub async fn find_chat(
    Extension(logged_sub): Extension<user::Sub>,
    Query(params): Query<FindChatParams>,
    message_service: State<MessageService>,
) -> crate::Result<Json<Vec<MessageDto>>> {
    let recipient = params
        .recipient
        .ok_or(crate::Error::QueryParamRequired("recipient".to_owned()))?;

    let messages = message_service
        .find_chat(
            &logged_sub,
            &recipient,
            params.page.unwrap_or(0),
            params.page_size.unwrap_or(50),
        )
        .await?;

    Ok(Json(messages))
}

#[derive(Deserialize)]
pub struct MarkReadRequest {
    recipient: user::Sub,
}

pub async fn mark_read(
    Extension(logged_sub): Extension<user::Sub>,
    message_service: State<MessageService>,
    Json(request): Json<MarkReadRequest>,
) -> crate::Result<StatusCode> {
    message_service
        .mark_read(&logged_sub, &request.recipient)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
