use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::{ControlResponse, WsCodec, WsEvent};
use crate::core::kernel::ws::WsAuth;
use crate::exchanges::bybit::signer::{ws_auth_expires, ws_auth_signature};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

/// Bybit operation request: `{"op": ..., "args": [...]}`
#[derive(Debug, Serialize)]
struct BybitOperation<'a> {
    op: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    req_id: Option<String>,
    args: Vec<Value>,
}

fn to_text(operation: &BybitOperation<'_>) -> Result<Message, ExchangeError> {
    let text = serde_json::to_string(operation).map_err(|e| {
        ExchangeError::SerializationError(format!("Failed to encode {}: {}", operation.op, e))
    })?;
    Ok(Message::Text(text))
}

fn random_req_id() -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Bybit v5 WebSocket codec, shared by public and private streams
#[derive(Debug, Clone, Copy, Default)]
pub struct BybitCodec;

impl BybitCodec {
    fn topics_operation<'a>(op: &'a str, topics: &[String]) -> BybitOperation<'a> {
        BybitOperation {
            op,
            req_id: None,
            args: topics.iter().cloned().map(Value::String).collect(),
        }
    }

    /// Auth frame for a given expiry, split out so it can be checked
    /// against a fixed timestamp
    pub fn auth_frame(auth: &WsAuth, expires: i64) -> Result<Message, ExchangeError> {
        let signature = ws_auth_signature(auth.secret(), expires);
        to_text(&BybitOperation {
            op: "auth",
            req_id: None,
            args: vec![json!(auth.api_key), json!(expires), json!(signature)],
        })
    }
}

impl WsCodec for BybitCodec {
    fn encode_subscription(&self, topics: &[String]) -> Result<Message, ExchangeError> {
        to_text(&Self::topics_operation("subscribe", topics))
    }

    fn encode_unsubscription(&self, topics: &[String]) -> Result<Message, ExchangeError> {
        to_text(&Self::topics_operation("unsubscribe", topics))
    }

    fn encode_ping(&self) -> Result<Message, ExchangeError> {
        to_text(&BybitOperation {
            op: "ping",
            req_id: Some(random_req_id()),
            args: Vec::new(),
        })
    }

    fn encode_auth(&self, auth: &WsAuth) -> Result<Option<Message>, ExchangeError> {
        Self::auth_frame(auth, ws_auth_expires()).map(Some)
    }

    fn decode_text(&self, text: &str) -> Result<WsEvent, ExchangeError> {
        let value: Value = serde_json::from_str(text)?;

        if let Some(topic) = value.get("topic").and_then(Value::as_str) {
            return Ok(WsEvent::Data {
                topic: topic.to_string(),
                payload: value,
            });
        }

        if let Some(op) = value.get("op").and_then(Value::as_str) {
            return Ok(WsEvent::Control(ControlResponse {
                op: op.to_string(),
                success: value.get("success").and_then(Value::as_bool),
                message: value
                    .get("ret_msg")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string),
                req_id: value
                    .get("req_id")
                    .and_then(Value::as_str)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string),
            }));
        }

        Ok(WsEvent::Ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::signer::hmac_sha256_hex;

    fn text(message: Message) -> Value {
        match message {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    #[test]
    fn test_subscription_frame() {
        let frame = BybitCodec
            .encode_subscription(&["kline.1.BTCUSDT".to_string(), "kline.1.ETHUSDT".to_string()])
            .unwrap();
        assert_eq!(
            text(frame),
            json!({"op": "subscribe", "args": ["kline.1.BTCUSDT", "kline.1.ETHUSDT"]})
        );

        let frame = BybitCodec
            .encode_unsubscription(&["kline.1.BTCUSDT".to_string()])
            .unwrap();
        assert_eq!(
            text(frame),
            json!({"op": "unsubscribe", "args": ["kline.1.BTCUSDT"]})
        );
    }

    #[test]
    fn test_ping_carries_req_id() {
        let ping = text(BybitCodec.encode_ping().unwrap());
        assert_eq!(ping["op"], "ping");
        assert_eq!(ping["req_id"].as_str().unwrap().len(), 16);
    }

    #[test]
    fn test_auth_frame() {
        let auth = WsAuth::new("key".to_string(), "secret".to_string());
        let frame = text(BybitCodec::auth_frame(&auth, 1_700_000_001_000).unwrap());
        assert_eq!(
            frame,
            json!({
                "op": "auth",
                "args": [
                    "key",
                    1_700_000_001_000i64,
                    hmac_sha256_hex("secret", "GET/realtime1700000001000")
                ]
            })
        );
    }

    #[test]
    fn test_decode_data_frame() {
        let raw = r#"{"topic":"kline.5.BTCUSDT","type":"snapshot","ts":1672324988882,"data":[]}"#;
        match BybitCodec.decode_text(raw).unwrap() {
            WsEvent::Data { topic, payload } => {
                assert_eq!(topic, "kline.5.BTCUSDT");
                assert_eq!(payload["ts"], 1_672_324_988_882u64);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_control_frames() {
        let raw = r#"{"success":false,"ret_msg":"error:invalid signature","op":"auth","conn_id":"abc"}"#;
        match BybitCodec.decode_text(raw).unwrap() {
            WsEvent::Control(response) => {
                assert_eq!(response.op, "auth");
                assert!(response.is_failure());
                assert_eq!(response.message.as_deref(), Some("error:invalid signature"));
            }
            other => panic!("unexpected: {:?}", other),
        }

        let pong = r#"{"success":true,"ret_msg":"pong","conn_id":"abc","req_id":"","op":"ping"}"#;
        match BybitCodec.decode_text(pong).unwrap() {
            WsEvent::Control(response) => {
                assert!(!response.is_failure());
                assert!(response.req_id.is_none());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_and_invalid() {
        assert_eq!(BybitCodec.decode_text(r#"{"hello":1}"#).unwrap(), WsEvent::Ignored);
        assert!(matches!(
            BybitCodec.decode_text("not json"),
            Err(ExchangeError::Decode(_))
        ));
    }
}
