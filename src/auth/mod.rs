use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::user;

pub mod middleware;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Service = service::AuthService;

/// Claims this service cares about. Tokens are minted by the marketplace
/// account system; chat only validates them.
#[derive(Deserialize, Clone)]
pub(super) struct TokenClaims {
    sub: user::Sub,
    #[allow(dead_code)]
    exp: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unauthorized to access the resource")]
    Unauthorized,
    #[error("token is expired")]
    TokenExpired,
    #[error("token is malformed")]
    TokenMalformed,
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::TokenMalformed,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        debug!("{self}");

        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let body = ErrorResponse {
            message: self.to_string(),
        };

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}
