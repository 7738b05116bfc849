use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::exchanges::coinmarketcap::signer::CmcKeySigner;
use crate::exchanges::coinmarketcap::{EXCHANGE_NAME, REST_URL, SANDBOX_REST_URL};
use std::sync::Arc;

/// Every CoinMarketCap call needs the key, so a config without one is
/// rejected up front
pub fn build_rest_client(config: &ExchangeConfig) -> Result<ReqwestRest, ExchangeError> {
    if config.api_key().is_empty() {
        return Err(ExchangeError::AuthError(
            "CoinMarketCap requires an API key".to_string(),
        ));
    }

    let base_url = config.resolve_base_url(REST_URL, SANDBOX_REST_URL);
    let rest_config = RestClientConfig::new(base_url, EXCHANGE_NAME.to_string())
        .with_timeout(config.timeout_seconds);
    RestClientBuilder::new(rest_config)
        .with_signer(Arc::new(CmcKeySigner::new(config.api_key().to_string())))
        .build()
}
