use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub mod auth;
pub mod conversation;
pub mod event;
pub mod inbox;
pub mod integration;
pub mod message;
pub mod state;
pub mod user;

pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error, the sum of every domain error. Handlers return this so
/// `?` works across module boundaries while the status mapping stays with the
/// module that owns the variant.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing query param: {0}")]
    QueryParamRequired(String),

    #[error(transparent)]
    _Auth(#[from] auth::Error),
    #[error(transparent)]
    _Conversation(#[from] conversation::Error),
    #[error(transparent)]
    _Message(#[from] message::Error),
    #[error(transparent)]
    _User(#[from] user::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        match self {
            Self::QueryParamRequired(_) => {
                let body = ErrorResponse {
                    message: self.to_string(),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::_Auth(e) => e.into_response(),
            Self::_Conversation(e) => e.into_response(),
            Self::_Message(e) => e.into_response(),
            Self::_User(e) => e.into_response(),
        }
    }
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
