use std::fmt;
use thiserror::Error;

/// Classification of a non-2xx HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    TooManyRequests,
    ServerError,
    Other,
}

impl HttpErrorKind {
    /// Classify a status code. Returns `None` for 2xx.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            400 => Some(Self::BadRequest),
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            // Binance answers 418 once an IP has been banned for ignoring 429s
            418 | 429 => Some(Self::TooManyRequests),
            500..=599 => Some(Self::ServerError),
            _ => Some(Self::Other),
        }
    }
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BadRequest => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::TooManyRequests => "too many requests",
            Self::ServerError => "server error",
            Self::Other => "unexpected status",
        };
        f.write_str(name)
    }
}

/// A non-2xx response, carrying the body the exchange sent back
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("HTTP {status} ({kind}): {body}")]
pub struct HttpError {
    pub status: u16,
    pub kind: HttpErrorKind,
    pub body: String,
}

impl HttpError {
    pub fn new(status: u16, body: impl Into<String>) -> Option<Self> {
        HttpErrorKind::from_status(status).map(|kind| Self {
            status,
            kind,
            body: body.into(),
        })
    }
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("API error: {code} - {message}")]
    ApiError { code: i64, message: String },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("WebSocket connection failed: {0}")]
    WsConnect(String),

    #[error("WebSocket send failed: {0}")]
    WsSend(String),

    #[error("WebSocket read failed: {0}")]
    WsRead(String),

    #[error("WebSocket is not connected")]
    NotConnected,

    #[error("WebSocket session is closed")]
    SessionClosed,

    #[error("Reconnection failed after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

impl ExchangeError {
    /// Whether retrying the same call later could plausibly succeed.
    ///
    /// The pipeline never retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_)
            | Self::Timeout(_)
            | Self::WsConnect(_)
            | Self::WsSend(_)
            | Self::WsRead(_)
            | Self::NotConnected => true,
            Self::Http(err) => matches!(
                err.kind,
                HttpErrorKind::TooManyRequests | HttpErrorKind::ServerError
            ),
            _ => false,
        }
    }

    /// The HTTP status for classified HTTP errors
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(err) => Some(err.status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
