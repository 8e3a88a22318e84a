//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{ConnectionHandleFactory, OutboundFrame},
    ui::{
        outbound::{OutboundGate, WireFrame},
        session::{InboundEvent, Session, SessionHandler, SessionState},
        state::AppState,
    },
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // アプリケーションの上限はセッションが判定する（超過したフレームは捨てるだけ）
    ws.max_message_size(state.transport_limit_bytes)
        .max_frame_size(state.transport_limit_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the connection's buffer into the WebSocket sender.
///
/// Frames pass through an [`OutboundGate`] so that replayed history always
/// precedes live broadcasts. A `Close` frame ends the task after the close
/// handshake is started.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<OutboundFrame>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut gate = OutboundGate::new();
        while let Some(frame) = rx.recv().await {
            for wire in gate.push(frame) {
                match wire {
                    WireFrame::Text(text) => {
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            return;
                        }
                    }
                    WireFrame::Close => {
                        let close = Message::Close(Some(CloseFrame {
                            code: close_code::AWAY,
                            reason: "connection closed by server".into(),
                        }));
                        let _ = sender.send(close).await;
                        return;
                    }
                }
            }
        }
    })
}

/// Spawns a task that maps inbound WebSocket messages to session events.
fn receiver_loop(
    mut receiver: SplitStream<WebSocket>,
    handler: Arc<SessionHandler>,
    mut session: Session,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            let event = match result {
                Ok(Message::Text(text)) => InboundEvent::Text(text.as_str().to_owned()),
                Ok(Message::Binary(bytes)) => InboundEvent::Binary(bytes.to_vec()),
                Ok(Message::Pong(_)) => InboundEvent::TransportPong,
                // Ping/pong is handled automatically by the WebSocket protocol
                Ok(Message::Ping(_)) => InboundEvent::Idle,
                Ok(Message::Close(_)) => InboundEvent::Fatal("client requested close".to_string()),
                Err(e) => InboundEvent::Fatal(e.to_string()),
            };

            if handler.on_event(&mut session, event).await == SessionState::Closed {
                return;
            }
        }

        handler
            .on_event(&mut session, InboundEvent::Fatal("stream ended".to_string()))
            .await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let handler = state.session_handler.clone();
    let handle = ConnectionHandleFactory::generate();
    let mut session = Session::new(handle);

    let (sender, receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut send_task = pusher_loop(rx, sender);

    if handler.open(&mut session, tx).await == SessionState::Closed {
        // The close frame is already queued
        let _ = send_task.await;
        return;
    }

    let mut recv_task = receiver_loop(receiver, handler.clone(), session);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // The heartbeat or the receiver may have released the slot already
    handler.release(&handle).await;
    tracing::debug!("Connection '{}' handler finished", handle);
}
