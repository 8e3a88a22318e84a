//! Integration tests that run the real server on an ephemeral port.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use hiroba_server::{config::ServerConfig, ui::Server};
use hiroba_shared::time::FixedClock;
use serde_json::{Value, json};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    time::{Instant, sleep, timeout},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, protocol::frame::coding::CloseCode},
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const NOW: i64 = 1_700_000_000;
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Server running in the background; shut down on drop
struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start(max_connections: usize, history_capacity: usize) -> Self {
        Self::start_with_heartbeat(max_connections, history_capacity, Duration::from_secs(60))
            .await
    }

    async fn start_with_heartbeat(
        max_connections: usize,
        history_capacity: usize,
        heartbeat_interval: Duration,
    ) -> Self {
        let config =
            ServerConfig::new(max_connections, history_capacity, heartbeat_interval, 4096)
                .unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, signal) = oneshot::channel::<()>();

        let server = Server::from_config(config, Arc::new(FixedClock::new(NOW)));
        tokio::spawn(server.serve_with_shutdown(listener, async move {
            let _ = signal.await;
        }));

        TestServer {
            addr,
            shutdown: Some(shutdown),
        }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn connect(&self) -> Client {
        let (client, _) = connect_async(self.ws_url()).await.unwrap();
        client
    }

    async fn state(&self) -> Value {
        reqwest::get(self.http_url("/debug/state"))
            .await
            .unwrap()
            .json::<Value>()
            .await
            .unwrap()
    }

    async fn active_connections(&self) -> usize {
        self.state().await["connections"].as_array().unwrap().len()
    }

    /// Wait until the registry holds exactly `expected` connections.
    async fn wait_for_connections(&self, expected: usize) {
        let deadline = Instant::now() + RECV_TIMEOUT;
        while self.active_connections().await != expected {
            assert!(
                Instant::now() < deadline,
                "expected {expected} active connection(s)"
            );
            sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

async fn send_text(client: &mut Client, text: &str) {
    client
        .send(Message::Text(text.to_owned().into()))
        .await
        .unwrap();
}

/// Next text frame as JSON, skipping protocol-level frames.
async fn recv_json(client: &mut Client) -> Value {
    loop {
        let message = timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
        assert!(!message.is_close(), "connection closed unexpectedly");
    }
}

/// Assert no text frame arrives within a short window.
async fn assert_silent(client: &mut Client) {
    if let Ok(Some(Ok(Message::Text(text)))) =
        timeout(Duration::from_millis(200), client.next()).await
    {
        panic!("unexpected frame: {}", text.as_str());
    }
}

/// Skip text frames until the server's close frame arrives and return its code.
async fn recv_close_code(client: &mut Client) -> Option<CloseCode> {
    loop {
        let next = timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for close");
        match next {
            Some(Ok(Message::Close(frame))) => return frame.map(|f| f.code),
            Some(Ok(_)) => continue,
            Some(Err(_)) | None => return None,
        }
    }
}

// ========================================
// テスト作業記録
// ========================================
// 【何をテストするか】
// - 実際の axum サーバーに WebSocket クライアントを接続した時の振る舞い
//
// 【なぜこのテストが必要か】
// - ユースケース単体のテストでは、ハンドシェイク後の登録・送信タスクの
//   順序制御・Close フレームの送出まではカバーできない
//
// 【どのようなシナリオをテストするか】
// 1. ヘルスチェック
// 2. 容量 2 のシナリオ（拒否・ブロードキャスト・切断・リプレイ）
// 3. タイムスタンプの保持と ID の上書き
// 4. pong・不正なフレームは保存もブロードキャストもされない
// 5. 履歴の上限と再送順序
// 6. ハートビートによる退去（Close フレームで切断される）
// 7. 上限を超えるフレームは捨てられ、送信者の接続は維持される
// ========================================

#[tokio::test]
async fn test_health_check() {
    // テスト項目: ヘルスチェックが ok を返す
    // given (前提条件):
    let server = TestServer::start(2, 10).await;

    // when (操作):
    let body = reqwest::get(server.http_url("/api/health"))
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_capacity_two_scenario() {
    // テスト項目: 容量 2 で C3 が拒否され、C2 切断後に接続した C3 は履歴 1 件を受け取る
    // given (前提条件):
    let server = TestServer::start(2, 10).await;
    let mut c1 = server.connect().await;
    let mut c2 = server.connect().await;
    server.wait_for_connections(2).await;

    // when (操作): C3 は容量超過
    let mut c3 = server.connect().await;

    // then (期待する結果): Close を受け取り、登録されない
    let closed = timeout(RECV_TIMEOUT, c3.next()).await.unwrap();
    assert!(matches!(closed, Some(Ok(Message::Close(_))) | Some(Err(_)) | None));
    assert_eq!(server.active_connections().await, 2);

    // when (操作): C1 がメッセージを送信
    send_json(&mut c1, json!({"type": "chat", "text": "hi"})).await;

    // then (期待する結果): 送信者を含む両方に届く
    let expected = json!({"type": "chat", "text": "hi", "id": 0, "timestamp": NOW});
    assert_eq!(recv_json(&mut c1).await, expected);
    assert_eq!(recv_json(&mut c2).await, expected);

    // when (操作): C2 が切断し、C3 が再接続
    c2.close(None).await.unwrap();
    server.wait_for_connections(1).await;
    let mut c3 = server.connect().await;

    // then (期待する結果): 履歴の 1 件だけが元の ID とタイムスタンプで届く
    assert_eq!(recv_json(&mut c3).await, expected);
    assert_silent(&mut c3).await;
    server.wait_for_connections(2).await;
}

#[tokio::test]
async fn test_client_timestamp_is_preserved_and_id_replaced() {
    // テスト項目: クライアントのタイムスタンプは保持され、クライアントの ID は上書きされる
    // given (前提条件):
    let server = TestServer::start(2, 10).await;
    let mut client = server.connect().await;
    server.wait_for_connections(1).await;

    // when (操作):
    send_json(
        &mut client,
        json!({"type": "text", "data": "hello", "timestamp": 12345, "id": 999}),
    )
    .await;

    // then (期待する結果):
    let received = recv_json(&mut client).await;
    assert_eq!(received["timestamp"], json!(12345));
    assert_eq!(received["id"], json!(0));
    assert_eq!(received["data"], json!("hello"));
}

#[tokio::test]
async fn test_pong_and_malformed_frames_are_not_broadcast() {
    // テスト項目: pong・不正な JSON・空フレームは保存もブロードキャストもされず、接続は維持される
    // given (前提条件):
    let server = TestServer::start(2, 10).await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;
    server.wait_for_connections(2).await;

    // when (操作):
    send_json(&mut alice, json!({"type": "pong"})).await;
    send_text(&mut alice, "{broken").await;
    send_text(&mut alice, "[1, 2, 3]").await;
    send_text(&mut alice, "").await;
    send_json(&mut alice, json!({"type": "chat", "text": "after"})).await;

    // then (期待する結果): 最初に届くのは後続のチャットで、ID は 0
    let received = recv_json(&mut bob).await;
    assert_eq!(received["id"], json!(0));
    assert_eq!(received["text"], json!("after"));
    let state = server.state().await;
    assert_eq!(state["history"]["count"], json!(1));
    assert_eq!(state["connections"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_replay_holds_latest_messages_in_order() {
    // テスト項目: 履歴は直近 M 件を保持し、新しい接続には古い順に再送された後でライブのメッセージが届く
    // given (前提条件): 容量 3 の履歴に 5 件送信
    let server = TestServer::start(2, 3).await;
    let mut sender = server.connect().await;
    server.wait_for_connections(1).await;
    for i in 0..5 {
        send_json(&mut sender, json!({"type": "chat", "seq": i})).await;
        assert_eq!(recv_json(&mut sender).await["id"], json!(i));
    }

    // when (操作):
    let mut late = server.connect().await;

    // then (期待する結果):
    let mut replayed = Vec::new();
    for _ in 0..3 {
        replayed.push(recv_json(&mut late).await["id"].clone());
    }
    assert_eq!(replayed, vec![json!(2), json!(3), json!(4)]);

    server.wait_for_connections(2).await;
    send_json(&mut sender, json!({"type": "chat", "seq": 5})).await;
    assert_eq!(recv_json(&mut late).await["id"], json!(5));
    let state = server.state().await;
    assert_eq!(state["history"], json!({"count": 3, "capacity": 3, "last_id": 5}));
}

#[tokio::test]
async fn test_display_name_is_shown_in_state() {
    // テスト項目: name フィールドを送ると診断エンドポイントの表示名が更新される
    // given (前提条件):
    let server = TestServer::start(2, 10).await;
    let mut client = server.connect().await;
    server.wait_for_connections(1).await;
    assert_eq!(server.state().await["connections"][0]["name"], json!("New User"));

    // when (操作):
    send_json(&mut client, json!({"type": "chat", "name": "Alice", "text": "hi"})).await;
    recv_json(&mut client).await;

    // then (期待する結果):
    assert_eq!(server.state().await["connections"][0]["name"], json!("Alice"));
}

#[tokio::test]
async fn test_heartbeat_evicts_silent_client_only() {
    // テスト項目: ping に応答しないクライアントだけが退去する
    // given (前提条件):
    let server = TestServer::start_with_heartbeat(2, 10, Duration::from_millis(100)).await;
    let mut silent = server.connect().await;
    let mut responsive = server.connect().await;
    server.wait_for_connections(2).await;

    // when (操作): 応答するクライアントは ping に pong を返し続ける
    let responder = tokio::spawn(async move {
        let deadline = Instant::now() + Duration::from_millis(800);
        while let Ok(Some(Ok(message))) =
            tokio::time::timeout_at(deadline, responsive.next()).await
        {
            if let Message::Text(text) = message {
                let value: Value = serde_json::from_str(text.as_str()).unwrap();
                if value["type"] == json!("ping") {
                    send_json(&mut responsive, json!({"type": "pong"})).await;
                }
            }
        }
        responsive
    });
    let _responsive = responder.await.unwrap();

    // then (期待する結果): 応答しないクライアントは going away で閉じられる
    assert_eq!(server.active_connections().await, 1);
    assert_eq!(recv_close_code(&mut silent).await, Some(CloseCode::Away));
}

#[tokio::test]
async fn test_oversized_frame_is_dropped_without_closing_sender() {
    // テスト項目: 上限（4096 バイト）を超えるチャットは捨てられ、送信者は接続したまま後続を送れる
    // given (前提条件):
    let server = TestServer::start(2, 10).await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;
    server.wait_for_connections(2).await;

    // when (操作):
    send_json(
        &mut alice,
        json!({"type": "chat", "text": "x".repeat(5000)}),
    )
    .await;
    send_json(&mut alice, json!({"type": "chat", "text": "small"})).await;

    // then (期待する結果): 後続のメッセージだけが ID 0 で届く
    let received = recv_json(&mut bob).await;
    assert_eq!(received["id"], json!(0));
    assert_eq!(received["text"], json!("small"));
    assert_eq!(recv_json(&mut alice).await["text"], json!("small"));
    let state = server.state().await;
    assert_eq!(state["history"]["count"], json!(1));
    assert_eq!(state["connections"].as_array().unwrap().len(), 2);
}
