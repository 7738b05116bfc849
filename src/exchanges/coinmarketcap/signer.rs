use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{SignedEnvelope, Signer};
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;

/// CoinMarketCap authenticates with a static key header, no HMAC
#[derive(Debug, Clone)]
pub struct CmcKeySigner {
    api_key: Secret<String>,
}

impl CmcKeySigner {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
        }
    }
}

impl Signer for CmcKeySigner {
    fn sign_request(
        &self,
        _method: &str,
        _endpoint: &str,
        _query_string: &str,
        _body: &[u8],
        timestamp: u64,
    ) -> Result<SignedEnvelope, ExchangeError> {
        let mut headers = HashMap::new();
        headers.insert(
            "X-CMC_PRO_API_KEY".to_string(),
            self.api_key.expose_secret().clone(),
        );
        headers.insert("Accept".to_string(), "application/json".to_string());
        Ok(SignedEnvelope {
            timestamp,
            headers,
            ..SignedEnvelope::default()
        })
    }
}
