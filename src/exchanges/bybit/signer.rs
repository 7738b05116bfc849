use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{body_as_str, hmac_sha256_hex, SignedEnvelope, Signer};
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;

/// Lifetime of a WebSocket auth signature, in milliseconds
pub const WS_AUTH_EXPIRY_MS: i64 = 1000;

/// Bybit HMAC-SHA256 signer for authenticated requests using V5 API
#[derive(Debug, Clone)]
pub struct BybitSigner {
    api_key: String,
    secret_key: Secret<String>,
    recv_window_ms: u64,
}

impl BybitSigner {
    pub fn new(api_key: String, secret_key: String, recv_window_ms: u64) -> Self {
        Self {
            api_key,
            secret_key: Secret::new(secret_key),
            recv_window_ms,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// V5 canonical string: timestamp + api key + recv window + payload, where
    /// the payload is the query string for GET/DELETE and the JSON body
    /// otherwise
    pub fn canonical_string(&self, timestamp: u64, payload: &str) -> String {
        format!(
            "{}{}{}{}",
            timestamp, self.api_key, self.recv_window_ms, payload
        )
    }
}

impl Signer for BybitSigner {
    fn sign_request(
        &self,
        method: &str,
        _endpoint: &str,
        query_string: &str,
        body: &[u8],
        timestamp: u64,
    ) -> Result<SignedEnvelope, ExchangeError> {
        let payload = match method {
            "GET" | "DELETE" => query_string,
            _ => body_as_str(body)?,
        };
        let signature = hmac_sha256_hex(
            self.secret_key.expose_secret(),
            &self.canonical_string(timestamp, payload),
        );

        let mut headers = HashMap::new();
        headers.insert("X-BAPI-API-KEY".to_string(), self.api_key.clone());
        headers.insert("X-BAPI-SIGN".to_string(), signature.clone());
        headers.insert("X-BAPI-TIMESTAMP".to_string(), timestamp.to_string());
        headers.insert(
            "X-BAPI-RECV-WINDOW".to_string(),
            self.recv_window_ms.to_string(),
        );
        headers.insert("X-BAPI-SIGN-TYPE".to_string(), "2".to_string());

        Ok(SignedEnvelope {
            timestamp,
            signature,
            headers,
            query_string: None,
        })
    }
}

/// Signature for the private stream `auth` operation
pub fn ws_auth_signature(secret_key: &str, expires: i64) -> String {
    hmac_sha256_hex(secret_key, &format!("GET/realtime{}", expires))
}

/// Expiry timestamp for a WebSocket auth frame created now
pub fn ws_auth_expires() -> i64 {
    chrono::Utc::now().timestamp_millis() + WS_AUTH_EXPIRY_MS
}
