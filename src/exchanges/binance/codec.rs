use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::{ControlResponse, WsCodec, WsEvent};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_tungstenite::tungstenite::Message;

/// Binance futures codec for combined streams (`/stream`), where every data
/// frame is wrapped as `{"stream": ..., "data": ...}`
#[derive(Debug, Default)]
pub struct BinanceCodec {
    next_id: AtomicU64,
}

impl BinanceCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn request(&self, method: &str, streams: &[String]) -> Message {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        Message::Text(
            json!({
                "method": method,
                "params": streams,
                "id": id
            })
            .to_string(),
        )
    }
}

impl WsCodec for BinanceCodec {
    fn encode_subscription(&self, topics: &[String]) -> Result<Message, ExchangeError> {
        Ok(self.request("SUBSCRIBE", topics))
    }

    fn encode_unsubscription(&self, topics: &[String]) -> Result<Message, ExchangeError> {
        Ok(self.request("UNSUBSCRIBE", topics))
    }

    fn decode_text(&self, text: &str) -> Result<WsEvent, ExchangeError> {
        let mut value: Value = serde_json::from_str(text)?;

        if let Some(topic) = value
            .get("stream")
            .and_then(Value::as_str)
            .map(str::to_string)
        {
            let payload = value.get_mut("data").map(Value::take).ok_or_else(|| {
                ExchangeError::SerializationError(
                    "Missing data field in stream message".to_string(),
                )
            })?;
            return Ok(WsEvent::Data { topic, payload });
        }

        // {"result": null, "id": 1} or {"error": {"code": 2, "msg": "..."}, "id": 1}
        if let Some(id) = value.get("id") {
            let req_id = Some(match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
            let error = value.get("error").filter(|e| !e.is_null());
            return Ok(WsEvent::Control(ControlResponse {
                op: "request".to_string(),
                success: Some(error.is_none()),
                message: error
                    .and_then(|e| e.get("msg"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                req_id,
            }));
        }

        Ok(WsEvent::Ignored)
    }
}

/// Combined-stream name for a kline feed
pub fn kline_stream(symbol: &str, interval: &str) -> String {
    format!("{}@kline_{}", symbol.to_lowercase(), interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_carry_increasing_ids() {
        let codec = BinanceCodec::new();
        let streams = vec!["btcusdt@kline_1m".to_string()];

        let Message::Text(first) = codec.encode_subscription(&streams).unwrap() else {
            panic!("expected text frame");
        };
        let Message::Text(second) = codec.encode_unsubscription(&streams).unwrap() else {
            panic!("expected text frame");
        };

        let first: Value = serde_json::from_str(&first).unwrap();
        let second: Value = serde_json::from_str(&second).unwrap();
        assert_eq!(first["method"], "SUBSCRIBE");
        assert_eq!(first["params"], json!(["btcusdt@kline_1m"]));
        assert_eq!(first["id"], 1);
        assert_eq!(second["method"], "UNSUBSCRIBE");
        assert_eq!(second["id"], 2);
    }

    #[test]
    fn test_decode_combined_stream() {
        let raw = r#"{"stream":"btcusdt@kline_1m","data":{"e":"kline","s":"BTCUSDT"}}"#;
        match BinanceCodec::new().decode_text(raw).unwrap() {
            WsEvent::Data { topic, payload } => {
                assert_eq!(topic, "btcusdt@kline_1m");
                assert_eq!(payload["s"], "BTCUSDT");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_acknowledgements() {
        let codec = BinanceCodec::new();
        match codec.decode_text(r#"{"result":null,"id":3}"#).unwrap() {
            WsEvent::Control(response) => {
                assert_eq!(response.success, Some(true));
                assert_eq!(response.req_id.as_deref(), Some("3"));
            }
            other => panic!("unexpected: {:?}", other),
        }

        match codec
            .decode_text(r#"{"error":{"code":2,"msg":"Invalid request"},"id":4}"#)
            .unwrap()
        {
            WsEvent::Control(response) => {
                assert!(response.is_failure());
                assert_eq!(response.message.as_deref(), Some("Invalid request"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_kline_stream_name() {
        assert_eq!(kline_stream("BTCUSDT", "1m"), "btcusdt@kline_1m");
    }
}
