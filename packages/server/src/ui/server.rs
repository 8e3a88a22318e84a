//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use hiroba_shared::time::Clock;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    infrastructure::{
        dto::websocket::PING_MESSAGE,
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionRegistry, InMemoryMessageHistory},
    },
    usecase::{
        ConnectSessionUseCase, DisconnectSessionUseCase, GetServerStateUseCase, HeartbeatUseCase,
        SendMessageUseCase,
    },
};

use super::{
    handler::{debug_server_state, health_check, websocket_handler},
    session::SessionHandler,
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::from_config(ServerConfig::default(), Arc::new(SystemClock));
/// server.run("0.0.0.0".to_string(), 80).await?;
/// ```
pub struct Server {
    /// SessionHandler（接続ごとの状態遷移）
    session_handler: Arc<SessionHandler>,
    /// GetServerStateUseCase（診断用の状態取得）
    get_server_state_usecase: Arc<GetServerStateUseCase>,
    /// HeartbeatUseCase（生存確認）
    heartbeat_usecase: Arc<HeartbeatUseCase>,
    /// 時刻の取得
    clock: Arc<dyn Clock>,
    /// ハートビートの周期
    heartbeat_interval: Duration,
    /// WebSocket 層のメッセージサイズ上限
    transport_limit_bytes: usize,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        session_handler: Arc<SessionHandler>,
        get_server_state_usecase: Arc<GetServerStateUseCase>,
        heartbeat_usecase: Arc<HeartbeatUseCase>,
        clock: Arc<dyn Clock>,
        heartbeat_interval: Duration,
        transport_limit_bytes: usize,
    ) -> Self {
        Self {
            session_handler,
            get_server_state_usecase,
            heartbeat_usecase,
            clock,
            heartbeat_interval,
            transport_limit_bytes,
        }
    }

    /// Wire the in-memory registry and history into a ready-to-run server.
    pub fn from_config(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        // Initialize dependencies in order:
        // 1. Registry / History
        // 2. MessagePusher
        // 3. UseCases
        // 4. SessionHandler

        // 1. Create Registry and History (in-memory)
        let registry = Arc::new(InMemoryConnectionRegistry::new(config.max_connections));
        let history = Arc::new(InMemoryMessageHistory::new(config.history_capacity));

        // 2. Create MessagePusher (WebSocket implementation)
        let message_pusher = Arc::new(WebSocketMessagePusher::new(registry.clone()));

        // 3. Create UseCases
        let connect_session_usecase = Arc::new(ConnectSessionUseCase::new(
            registry.clone(),
            history.clone(),
        ));
        let disconnect_session_usecase =
            Arc::new(DisconnectSessionUseCase::new(registry.clone()));
        let send_message_usecase = Arc::new(SendMessageUseCase::new(
            registry.clone(),
            history.clone(),
            message_pusher,
            clock.clone(),
        ));
        let heartbeat_usecase = Arc::new(HeartbeatUseCase::new(registry.clone(), PING_MESSAGE));
        let get_server_state_usecase = Arc::new(GetServerStateUseCase::new(registry, history));

        // 4. Create SessionHandler
        let session_handler = Arc::new(SessionHandler::new(
            connect_session_usecase,
            disconnect_session_usecase,
            send_message_usecase,
            heartbeat_usecase.clone(),
            config.max_frame_bytes,
        ));

        Self::new(
            session_handler,
            get_server_state_usecase,
            heartbeat_usecase,
            clock,
            config.heartbeat_interval,
            config.transport_limit_bytes(),
        )
    }

    fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            session_handler: self.session_handler.clone(),
            get_server_state_usecase: self.get_server_state_usecase.clone(),
            clock: self.clock.clone(),
            transport_limit_bytes: self.transport_limit_bytes,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/debug/state", get(debug_server_state))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the WebSocket chat server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "0.0.0.0")
    /// * `port` - The port number to bind to (e.g., 80)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve_with_shutdown(listener, shutdown_signal()).await?;
        Ok(())
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// The heartbeat task runs for the lifetime of the server.
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();

        tracing::info!(
            "WebSocket chat server listening on {}",
            listener.local_addr()?
        );

        let heartbeat = self
            .heartbeat_usecase
            .clone()
            .spawn(self.heartbeat_interval);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await;

        heartbeat.abort();
        tracing::info!("Server shutdown complete");

        result
    }
}
