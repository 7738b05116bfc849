use crate::core::errors::ExchangeError;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::collections::{BTreeMap, HashMap};

type HmacSha256 = Hmac<Sha256>;

/// Request parameters, iterated in key order
pub type Params = BTreeMap<String, Value>;

/// Everything a signer produced for one request.
///
/// The pipeline builds a fresh envelope per call and drops it once the request
/// is on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedEnvelope {
    /// Millisecond timestamp the signature was computed for
    pub timestamp: u64,
    /// Hex digest, empty for header-only schemes
    pub signature: String,
    /// Headers to attach to the request
    pub headers: HashMap<String, String>,
    /// Query string to send instead of the unsigned one, when the scheme
    /// carries the signature in the URL
    pub query_string: Option<String>,
}

/// Signer trait for request authentication
///
/// Implementations receive the exact query string and body bytes that the
/// pipeline will put on the wire.
pub trait Signer: Send + Sync {
    /// Sign a request
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `endpoint` - API endpoint path
    /// * `query_string` - Query string (without leading '?')
    /// * `body` - Raw request body bytes
    /// * `timestamp` - Request timestamp in milliseconds
    fn sign_request(
        &self,
        method: &str,
        endpoint: &str,
        query_string: &str,
        body: &[u8],
        timestamp: u64,
    ) -> Result<SignedEnvelope, ExchangeError>;
}

/// Lowercase hex HMAC-SHA256 of `payload` keyed by `secret`
pub fn hmac_sha256_hex(secret: &str, payload: &str) -> String {
    // HMAC is defined for keys of any length, so this cannot fail
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Render a parameter value the way it appears in a query string: strings
/// without quotes, everything else as JSON text.
pub fn param_value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `k=v&k=v` over the keys in ascending order, unescaped
pub fn sorted_param_string(params: &Params) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, param_value_string(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Decode a body for signing, rejecting non UTF-8 payloads
pub fn body_as_str(body: &[u8]) -> Result<&str, ExchangeError> {
    std::str::from_utf8(body)
        .map_err(|e| ExchangeError::AuthError(format!("Invalid body encoding: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hmac_empty_payload_golden() {
        assert_eq!(
            hmac_sha256_hex("s", ""),
            "64eca07cce67929c357d63d0a4aec207e774800403298914fc04e88ce02ac49f"
        );
    }

    #[test]
    fn test_hmac_known_vector() {
        assert_eq!(
            hmac_sha256_hex("key", "The quick brown fox jumps over the lazy dog"),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_sorted_param_string() {
        let mut params = Params::new();
        params.insert("symbol".to_string(), json!("BTCUSDT"));
        params.insert("category".to_string(), json!("spot"));
        params.insert("limit".to_string(), json!(50));
        assert_eq!(
            sorted_param_string(&params),
            "category=spot&limit=50&symbol=BTCUSDT"
        );
        assert_eq!(sorted_param_string(&Params::new()), "");
    }

    #[test]
    fn test_body_as_str_rejects_invalid_utf8() {
        assert!(matches!(
            body_as_str(&[0xff, 0xfe]),
            Err(ExchangeError::AuthError(_))
        ));
        assert_eq!(body_as_str(b"{}").unwrap(), "{}");
    }
}
