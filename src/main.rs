use axum::routing::get;
use axum::{Router, middleware};
use log::info;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use marketplace_chat::state::AppState;
use marketplace_chat::{auth, conversation, event, health, integration, message, user};

#[tokio::main]
async fn main() {
    let config = integration::Config::default();
    let state = AppState::init(&config);

    let api = Router::new()
        .merge(message::api(state.clone()))
        .merge(conversation::api(state.clone()))
        .merge(user::api(state.clone()));

    let protected = Router::new()
        .nest("/api", api)
        .merge(event::endpoints(state.clone()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::authorize,
        ));

    let app = Router::new()
        .merge(protected)
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(config.env.allow_origin())
                .allow_methods(config.env.allow_methods())
                .allow_headers(config.env.allow_headers()),
        )
        .layer(TraceLayer::new_for_http());

    let addr = config.env.addr();
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
