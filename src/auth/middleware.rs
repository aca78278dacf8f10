use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth;

/// Resolves the caller identity from the `Authorization: Bearer` header, or
/// from a `token` query param for WebSocket upgrades where browsers cannot
/// set headers. No resolvable identity fails the request with 401 before any
/// handler runs.
pub async fn authorize(
    auth_service: State<auth::Service>,
    mut req: Request,
    next: Next,
) -> crate::Result<Response> {
    let token = bearer_token(&req)
        .or_else(|| query_token(&req))
        .ok_or(auth::Error::Unauthorized)?;

    let sub = auth_service.validate(&token)?;
    req.extensions_mut().insert(sub);

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned)
}

fn query_token(req: &Request) -> Option<String> {
    req.uri()
        .query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "token")
        .map(|(_, value)| value.to_owned())
}
