//! 接続ごとのセッション（状態遷移）
//!
//! ```text
//! Connecting --acquire ok--> Active --fatal / close--> Closed
//!      |
//!      +------capacity exceeded------------------------> Closed
//! ```
//!
//! `Active` の間、受信イベントはここで分類され、対応するユースケースに渡されます。
//! ユースケースの呼び出しはそれぞれ 1 つのロックだけを取って解放するため、
//! レジストリと履歴のロックを同時に保持することはありません。
//!
//! 受信フレームの失敗（上限超過・不正な JSON・不正な UTF-8）はフレームを捨てるだけで、
//! セッションは `Active` のままです。

use std::sync::Arc;

use crate::{
    domain::{ConnectionHandle, PusherChannel},
    infrastructure::dto::websocket::{FrameError, InboundMessage, classify},
    usecase::{
        ConnectSessionUseCase, DisconnectSessionUseCase, HeartbeatUseCase, SendMessageUseCase,
    },
};

/// セッションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closed,
}

/// トランスポートのライブラリに依存しない受信イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// テキストフレーム
    Text(String),
    /// バイナリフレーム（UTF-8 として正しければテキストとして扱う）
    Binary(Vec<u8>),
    /// プロトコルレベルの pong
    TransportPong,
    /// アプリケーションに渡すデータがまだ無い
    Idle,
    /// リセット・切断・クローズハンドシェイク・ストリームの終了
    Fatal(String),
}

/// 1 つの接続のセッション
#[derive(Debug)]
pub struct Session {
    handle: ConnectionHandle,
    state: SessionState,
}

impl Session {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }
}

/// [`Session`] の状態遷移を駆動する
pub struct SessionHandler {
    connect_session_usecase: Arc<ConnectSessionUseCase>,
    disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    send_message_usecase: Arc<SendMessageUseCase>,
    heartbeat_usecase: Arc<HeartbeatUseCase>,
    /// 受け付けるフレームの最大サイズ（バイト）
    max_frame_bytes: usize,
}

impl SessionHandler {
    pub fn new(
        connect_session_usecase: Arc<ConnectSessionUseCase>,
        disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        heartbeat_usecase: Arc<HeartbeatUseCase>,
        max_frame_bytes: usize,
    ) -> Self {
        Self {
            connect_session_usecase,
            disconnect_session_usecase,
            send_message_usecase,
            heartbeat_usecase,
            max_frame_bytes,
        }
    }

    /// 成功すれば `Connecting -> Active`、空きスロットが無ければ `Connecting -> Closed`
    ///
    /// 拒否した場合はトランスポートに Close が積まれており、他の接続には何も通知しません。
    pub async fn open(&self, session: &mut Session, channel: PusherChannel) -> SessionState {
        if session.state != SessionState::Connecting {
            return session.state;
        }

        match self
            .connect_session_usecase
            .execute(session.handle, channel)
            .await
        {
            Ok(connected) => {
                tracing::info!(
                    "Connection '{}' active in slot {} ({} message(s) replayed)",
                    session.handle,
                    connected.slot,
                    connected.replayed
                );
                session.state = SessionState::Active;
            }
            Err(e) => {
                tracing::warn!("Rejecting connection '{}': {}", session.handle, e);
                session.state = SessionState::Closed;
            }
        }
        session.state
    }

    /// `Active` の間に受信したイベントを 1 つ処理する
    pub async fn on_event(&self, session: &mut Session, event: InboundEvent) -> SessionState {
        if session.state != SessionState::Active {
            return session.state;
        }

        match event {
            InboundEvent::Fatal(reason) => {
                tracing::info!("Connection '{}' closed: {}", session.handle, reason);
                self.close(session).await;
            }
            InboundEvent::Idle => {}
            InboundEvent::TransportPong => {
                self.heartbeat_usecase.record_pong(&session.handle).await;
            }
            InboundEvent::Text(text) => self.on_frame(session, &text).await,
            InboundEvent::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => self.on_frame(session, &text).await,
                Err(_) => tracing::warn!(
                    "Dropping frame from '{}': {}",
                    session.handle,
                    FrameError::NotUtf8
                ),
            },
        }
        session.state
    }

    /// スロットを解放して `Closed` にする（何度呼んでもよい）
    pub async fn close(&self, session: &mut Session) {
        self.release(&session.handle).await;
        session.state = SessionState::Closed;
    }

    /// `handle` が保持しているスロットを解放
    pub async fn release(&self, handle: &ConnectionHandle) -> bool {
        self.disconnect_session_usecase.execute(handle).await
    }

    async fn on_frame(&self, session: &Session, text: &str) {
        match classify(text, self.max_frame_bytes) {
            Err(FrameError::Empty) => {
                tracing::debug!("Ignoring empty frame from '{}'", session.handle);
            }
            Err(e) => {
                tracing::warn!("Dropping frame from '{}': {}", session.handle, e);
            }
            Ok(InboundMessage::Pong) => {
                self.heartbeat_usecase.record_pong(&session.handle).await;
            }
            Ok(InboundMessage::Chat(message)) => {
                if let Err(e) = self
                    .send_message_usecase
                    .execute(&session.handle, message)
                    .await
                {
                    tracing::warn!("Dropping message from '{}': {}", session.handle, e);
                }
            }
        }
    }
}
