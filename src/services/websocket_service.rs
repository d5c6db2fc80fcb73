use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ingest::IngestMessage,
    services::ingest_service,
    state::SharedState,
};

/// Error shown on the live feed when the ingest connection drops abnormally.
pub const LIVE_CONNECTION_ERROR: &str = "Live scoreboard connection error";

/// Handle the full lifecycle of one game server ingest connection.
///
/// Frames are applied strictly in arrival order.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let connection_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    info!(%connection_id, "ingest connection opened");
    ingest_service::set_live_error(&state, None).await;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match IngestMessage::from_json_str(&text) {
                Ok(message) => ingest_service::ingest_message(&state, message).await,
                Err(err) => {
                    warn!(%connection_id, error = %err, "skipping unparseable ingest frame");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(%connection_id, "ingest connection closed by peer");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {
                debug!(%connection_id, "ignoring binary ingest frame");
            }
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%connection_id, error = %err, "ingest websocket error");
                ingest_service::set_live_error(&state, Some(LIVE_CONNECTION_ERROR.into())).await;
                break;
            }
        }
    }

    info!(%connection_id, "ingest connection finished");
    finalize(writer_task, outbound_tx).await;
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
