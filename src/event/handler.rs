use axum::Extension;
use axum::extract::ws::Message::{Binary, Close, Text};
use axum::extract::ws::{self, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, error, warn};
use tokio::sync::broadcast;
use tokio::try_join;

use crate::conversation::service::ConversationService;
use crate::user;
use crate::user::model::OnlineStatus;

use super::context;
use super::model::Notification;
use super::service::EventService;

pub async fn ws(
    Extension(logged_sub): Extension<user::Sub>,
    ws: WebSocketUpgrade,
    State(event_service): State<EventService>,
    State(user_service): State<user::Service>,
    State(conversation_service): State<ConversationService>,
) -> Response {
    ws.on_upgrade(move |socket| {
        handle_socket(
            logged_sub,
            socket,
            event_service,
            user_service,
            conversation_service,
        )
    })
}

async fn handle_socket(
    logged_sub: user::Sub,
    ws: WebSocket,
    event_service: EventService,
    user_service: user::Service,
    conversation_service: ConversationService,
) {
    let ctx = context::Ws::new(logged_sub.clone());
    let notifications = event_service.subscribe(&logged_sub);

    publish_online_status(&ctx, &event_service, &conversation_service, true).await;

    let (sender, receiver) = ws.split();

    let read_task = tokio::spawn(read(ctx.clone(), receiver));
    let write_task = tokio::spawn(write(ctx.clone(), sender, notifications));

    match try_join!(read_task, write_task) {
        Ok(_) => debug!("WS disconnected gracefully: {logged_sub}"),
        Err(e) => error!("WS disconnected with error: {e}"),
    }

    if let Err(e) = user_service.touch_last_seen(&logged_sub).await {
        error!("Failed to update last seen for {logged_sub}: {e}");
    }
    publish_online_status(&ctx, &event_service, &conversation_service, false).await;
    event_service.reclaim(&logged_sub);
}

/// Inbound frames carry no commands: the HTTP create path is the single
/// origin of delivery events, so this task only watches for the close.
async fn read(ctx: context::Ws, mut receiver: SplitStream<WebSocket>) {
    loop {
        tokio::select! {
            // close is notified => stop 'read' task
            _ = ctx.close.notified() => break,

            frame = receiver.next() => {
                match frame {
                    None => {
                        ctx.close.notify_one();
                        break;
                    }
                    Some(Err(e)) => {
                        error!("Failed to read WS frame: {e}");
                        ctx.close.notify_one();
                        break;
                    }
                    Some(Ok(Close(frame))) => {
                        debug!("WS connection closed by client: {frame:?}");
                        ctx.close.notify_one();
                        break;
                    }
                    Some(Ok(Text(content))) => {
                        warn!("Ignoring inbound text frame: {content}");
                    }
                    Some(Ok(Binary(content))) => {
                        warn!("Ignoring inbound binary frame: {} bytes", content.len());
                    }
                    Some(Ok(_)) => {} // ping/pong handled by axum
                }
            }
        }
    }
}

async fn write(
    ctx: context::Ws,
    mut sender: SplitSink<WebSocket, ws::Message>,
    mut notifications: broadcast::Receiver<Notification>,
) {
    loop {
        tokio::select! {
            // close is notified => stop 'write' task
            _ = ctx.close.notified() => break,

            item = notifications.recv() => {
                match item {
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // dropped pushes are durable in the store; the client
                        // recovers them on its next fetch
                        warn!("WS channel for {} lagged by {n} events", ctx.logged_sub);
                    }
                    Ok(noti) => {
                        let payload = match serde_json::to_string(&noti) {
                            Ok(payload) => payload,
                            Err(e) => {
                                error!("Failed to serialize notification: {e}");
                                continue;
                            }
                        };

                        if let Err(e) = sender.send(Text(payload.into())).await {
                            error!("Failed to push notification to {}: {e}", ctx.logged_sub);
                            ctx.close.notify_one();
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Presence fan-out: tells everyone the user shares a conversation with that
/// they went on- or offline. Failures are logged, never bubbled; presence is
/// advisory.
async fn publish_online_status(
    ctx: &context::Ws,
    event_service: &EventService,
    conversation_service: &ConversationService,
    online: bool,
) {
    let logged_sub = ctx.logged_sub.to_owned();

    match conversation_service.counterparts(&logged_sub).await {
        Ok(counterparts) => {
            let status = OnlineStatus::new(logged_sub.clone(), online);
            for counterpart in counterparts {
                event_service.publish(
                    &counterpart,
                    Notification::OnlineStatusChange(status.clone()),
                );
            }
        }
        Err(e) => error!("Failed to resolve counterparts of {logged_sub}: {e}"),
    }
}
