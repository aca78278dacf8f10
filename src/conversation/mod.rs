use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::error;

use crate::state::AppState;
use crate::user;

mod handler;
pub mod model;
pub mod service;

type Result<T> = std::result::Result<T, Error>;

/// Derived grouping key for an unordered participant pair: both subs sorted
/// lexicographically and joined, so either side computes the same id. Never a
/// foreign key, never stored.
pub fn id(a: &user::Sub, b: &user::Sub) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{first}:{second}")
}

pub fn api<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/conversations", get(handler::find_all))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _Message(#[from] crate::message::Error),

    #[error(transparent)]
    _User(#[from] user::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("{self}");

        match self {
            Self::_Message(e) => e.into_response(),
            Self::_User(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_owned(),
            )
                .into_response(),
        }
    }
}
