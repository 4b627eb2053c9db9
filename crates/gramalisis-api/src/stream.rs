use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    Extension,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use gramalisis_types::Entry;
use gramalisis_types::api::Claims;
use gramalisis_types::events::FeedEvent;

use crate::auth::{AppState, blocking};
use crate::convert::load_entries;

/// Server sends a Ping every 15 seconds; two missed Pongs drop the connection.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Upgrade to a live feed of the caller's entry snapshots.
pub async fn entry_stream(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let uid = claims.sub;

    // Subscribe before upgrading so a broken store fails the request, not the socket
    let app = state.clone();
    let snapshots = blocking(move || {
        app.feed
            .subscribe(uid, || load_entries(&app.db, uid))
            .map_err(|e| {
                error!(%uid, "Entry feed subscribe failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })
    })
    .await?;

    Ok(ws.on_upgrade(move |socket| run_stream(socket, uid, snapshots)))
}

async fn run_stream(
    socket: WebSocket,
    uid: Uuid,
    mut snapshots: mpsc::UnboundedReceiver<Vec<Entry>>,
) {
    let (mut sender, mut receiver) = socket.split();
    info!(%uid, "entry stream connected");

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received;

    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                snapshot = snapshots.recv() => {
                    let Some(entries) = snapshot else { break };
                    let text = match serde_json::to_string(&FeedEvent::Snapshot { entries }) {
                        Ok(text) => text,
                        Err(e) => {
                            error!("Snapshot encoding failed: {}", e);
                            break;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Default::default())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // The stream is one-way; the client only answers pings and closes
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Pong(_) => pong_flag_recv.store(true, Ordering::Release),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    // Dropping the receiver with the send task unsubscribes from the feed
    info!(%uid, "entry stream disconnected");
}
