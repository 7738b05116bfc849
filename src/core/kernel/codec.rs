use crate::core::errors::ExchangeError;
use crate::core::kernel::ws::WsAuth;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

/// Reply to a control operation (subscribe, auth, ping)
#[derive(Debug, Clone, PartialEq)]
pub struct ControlResponse {
    pub op: String,
    pub success: Option<bool>,
    pub message: Option<String>,
    pub req_id: Option<String>,
}

impl ControlResponse {
    pub fn is_failure(&self) -> bool {
        self.success == Some(false)
    }
}

/// One decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    /// Market or account data published on `topic`
    Data { topic: String, payload: Value },
    Control(ControlResponse),
    /// Frames the session has no use for
    Ignored,
}

/// Codec trait for handling exchange-specific WebSocket message encoding/decoding
///
/// The session owns transport, keep-alive and dispatch. A codec only knows how
/// an exchange spells its frames.
pub trait WsCodec: Send + Sync + 'static {
    /// Encode a subscription request into a WebSocket message
    fn encode_subscription(&self, topics: &[String]) -> Result<Message, ExchangeError>;

    /// Encode an unsubscription request into a WebSocket message
    fn encode_unsubscription(&self, topics: &[String]) -> Result<Message, ExchangeError>;

    /// Application-level keep-alive frame. The default is a protocol ping.
    fn encode_ping(&self) -> Result<Message, ExchangeError> {
        Ok(Message::Ping(Vec::new()))
    }

    /// Authentication frame for private channels, `None` when the exchange
    /// authenticates some other way
    fn encode_auth(&self, _auth: &WsAuth) -> Result<Option<Message>, ExchangeError> {
        Ok(None)
    }

    /// Decode a text payload into an event
    fn decode_text(&self, text: &str) -> Result<WsEvent, ExchangeError>;

    /// Decode a raw WebSocket message. Protocol control frames are handled by
    /// the session and come back as `Ignored` here.
    fn decode_message(&self, message: &Message) -> Result<WsEvent, ExchangeError> {
        match message {
            Message::Text(text) => self.decode_text(text),
            Message::Binary(data) => {
                let text = std::str::from_utf8(data).map_err(|e| {
                    ExchangeError::SerializationError(format!(
                        "Invalid UTF-8 in binary message: {}",
                        e
                    ))
                })?;
                self.decode_text(text)
            }
            _ => Ok(WsEvent::Ignored),
        }
    }
}
