use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{hmac_sha256_hex, SignedEnvelope, Signer};
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;

/// Binance HMAC-SHA256 signer. The signature travels as the last query
/// parameter, so POST requests carry their params in the query string too.
#[derive(Debug, Clone)]
pub struct BinanceSigner {
    api_key: String,
    secret_key: Secret<String>,
    recv_window_ms: u64,
}

impl BinanceSigner {
    pub fn new(api_key: String, secret_key: String, recv_window_ms: u64) -> Self {
        Self {
            api_key,
            secret_key: Secret::new(secret_key),
            recv_window_ms,
        }
    }

    /// The exact query that gets signed: caller params, then `recvWindow`
    /// and `timestamp`
    pub fn signed_payload(&self, query_string: &str, timestamp: u64) -> String {
        let suffix = format!("recvWindow={}&timestamp={}", self.recv_window_ms, timestamp);
        if query_string.is_empty() {
            suffix
        } else {
            format!("{}&{}", query_string, suffix)
        }
    }
}

impl Signer for BinanceSigner {
    fn sign_request(
        &self,
        _method: &str,
        _endpoint: &str,
        query_string: &str,
        _body: &[u8],
        timestamp: u64,
    ) -> Result<SignedEnvelope, ExchangeError> {
        let payload = self.signed_payload(query_string, timestamp);
        let signature = hmac_sha256_hex(self.secret_key.expose_secret(), &payload);

        let mut headers = HashMap::new();
        headers.insert("X-MBX-APIKEY".to_string(), self.api_key.clone());

        Ok(SignedEnvelope {
            timestamp,
            query_string: Some(format!("{}&signature={}", payload, signature)),
            signature,
            headers,
        })
    }
}
