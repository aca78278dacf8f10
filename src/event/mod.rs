use axum::Router;
use axum::routing::get;

use crate::state::AppState;

mod context;
mod handler;
pub mod model;
pub mod service;

pub fn endpoints<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/ws", get(handler::ws))
        .with_state(state)
}
