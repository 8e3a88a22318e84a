//! WebSocket のワイヤースキーマ
//!
//! 全てのフレームは JSON オブジェクトで、`type` フィールドで種類を判別します。
//! `"ping"` はサーバーから、`"pong"` はクライアントからの応答です。
//! それ以外のオブジェクトはチャットとして扱い、クライアントが送ったフィールドを全て保持します。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{ChatMessage, FIELD_TYPE};

/// サーバーが送る生存確認メッセージ
pub const PING_MESSAGE: &str = r#"{"type":"ping"}"#;

/// 制御メッセージの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Ping,
    Pong,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Ping => "ping",
            MessageType::Pong => "pong",
        }
    }
}

/// 受信フレームを捨てる理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Frame is empty")]
    Empty,

    #[error("Frame of {len} bytes exceeds the {max}-byte limit")]
    TooLarge { len: usize, max: usize },

    #[error("Frame is not valid JSON: {0}")]
    NotJson(String),

    #[error("Frame is not a JSON object")]
    NotObject,

    #[error("Binary frame is not valid UTF-8")]
    NotUtf8,
}

/// 分類済みの受信フレーム
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// 生存確認の応答（保存もブロードキャストもしない）
    Pong,
    /// それ以外のオブジェクト
    Chat(ChatMessage),
}

/// テキストフレームをパースし、`type` で分類する
///
/// `max_bytes` を超えるフレームはパースせずに `FrameError::TooLarge` を返します。
pub fn classify(text: &str, max_bytes: usize) -> Result<InboundMessage, FrameError> {
    if text.is_empty() {
        return Err(FrameError::Empty);
    }
    if text.len() > max_bytes {
        return Err(FrameError::TooLarge {
            len: text.len(),
            max: max_bytes,
        });
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| FrameError::NotJson(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(FrameError::NotObject);
    };

    match fields.get(FIELD_TYPE).and_then(Value::as_str) {
        Some(t) if t == MessageType::Pong.as_str() => Ok(InboundMessage::Pong),
        _ => Ok(InboundMessage::Chat(ChatMessage::from_fields(fields))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MAX: usize = 4096;

    #[test]
    fn test_ping_message_has_ping_type() {
        // テスト項目: PING_MESSAGE の type は MessageType::Ping として読める
        // given (前提条件):
        let value: Value = serde_json::from_str(PING_MESSAGE).unwrap();

        // when (操作):
        let message_type: MessageType =
            serde_json::from_value(value[FIELD_TYPE].clone()).unwrap();

        // then (期待する結果):
        assert_eq!(message_type, MessageType::Ping);
    }

    #[test]
    fn test_classify_pong() {
        // テスト項目: type が pong のフレームは Pong に分類される
        // given (前提条件):
        let text = r#"{"type":"pong"}"#;

        // when (操作):
        let result = classify(text, MAX);

        // then (期待する結果):
        assert_eq!(result, Ok(InboundMessage::Pong));
    }

    #[test]
    fn test_classify_chat_keeps_fields() {
        // テスト項目: pong 以外のオブジェクトはチャットとしてフィールドを保持する
        // given (前提条件):
        let text = r#"{"type":"text","from":"u1","to":{"all":true,"users":[]},"data":"hi"}"#;

        // when (操作):
        let result = classify(text, MAX);

        // then (期待する結果):
        let message = match result {
            Ok(InboundMessage::Chat(message)) => message,
            other => panic!("expected chat, got {other:?}"),
        };
        assert_eq!(message.fields()["data"], json!("hi"));
        assert_eq!(message.fields()["to"]["all"], json!(true));
    }

    #[test]
    fn test_classify_object_without_type_is_chat() {
        // テスト項目: type が無いオブジェクトもチャットとして扱う
        // given (前提条件):
        let text = r#"{"text":"hi"}"#;

        // when (操作):
        let result = classify(text, MAX);

        // then (期待する結果):
        assert!(matches!(result, Ok(InboundMessage::Chat(_))));
    }

    #[test]
    fn test_classify_rejects_malformed_input() {
        // テスト項目: 空・不正な JSON・オブジェクト以外は FrameError になる
        // given (前提条件):
        // when (操作):
        // then (期待する結果):
        assert_eq!(classify("", MAX), Err(FrameError::Empty));
        assert!(matches!(classify("{not json", MAX), Err(FrameError::NotJson(_))));
        assert_eq!(classify("[1,2,3]", MAX), Err(FrameError::NotObject));
        assert_eq!(classify("\"pong\"", MAX), Err(FrameError::NotObject));
    }

    #[test]
    fn test_classify_rejects_oversized_frame() {
        // テスト項目: 上限を超えるフレームはパースせずに TooLarge になり、上限ちょうどは受け付ける
        // given (前提条件):
        let padding = "x".repeat(100);
        let text = format!(r#"{{"type":"chat","text":"{padding}"}}"#);

        // when (操作):
        let over = classify(&text, text.len() - 1);
        let exact = classify(&text, text.len());

        // then (期待する結果):
        assert_eq!(
            over,
            Err(FrameError::TooLarge {
                len: text.len(),
                max: text.len() - 1
            })
        );
        assert!(matches!(exact, Ok(InboundMessage::Chat(_))));
    }
}
