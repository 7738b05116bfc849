use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{EndpointRateLimiter, ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::exchanges::bybit::rate_limits::shared_rate_limiter;
use crate::exchanges::bybit::signer::BybitSigner;
use crate::exchanges::bybit::types::Category;
use crate::exchanges::bybit::{
    EXCHANGE_NAME, REST_URL, TESTNET_REST_URL, TESTNET_WS_URL, WS_URL,
};
use std::sync::Arc;

/// REST client throttled by the process-wide Bybit limiter
pub fn build_rest_client(config: &ExchangeConfig) -> Result<ReqwestRest, ExchangeError> {
    build_rest_client_with(config, shared_rate_limiter())
}

/// REST client with an explicit limiter
pub fn build_rest_client_with(
    config: &ExchangeConfig,
    rate_limiter: Arc<EndpointRateLimiter>,
) -> Result<ReqwestRest, ExchangeError> {
    let base_url = config.resolve_base_url(REST_URL, TESTNET_REST_URL);
    let rest_config = RestClientConfig::new(base_url, EXCHANGE_NAME.to_string())
        .with_timeout(config.timeout_seconds);

    let mut builder = RestClientBuilder::new(rest_config).with_rate_limiter(rate_limiter);
    if config.has_credentials() {
        builder = builder.with_signer(Arc::new(BybitSigner::new(
            config.api_key().to_string(),
            config.secret_key().to_string(),
            config.recv_window_ms,
        )));
    }
    builder.build()
}

fn ws_host(config: &ExchangeConfig) -> String {
    config.ws_url.clone().unwrap_or_else(|| {
        if config.testnet {
            TESTNET_WS_URL.to_string()
        } else {
            WS_URL.to_string()
        }
    })
}

/// Public stream URL for a product category
pub fn public_ws_url(config: &ExchangeConfig, category: Category) -> String {
    format!("{}/v5/public/{}", ws_host(config), category)
}

/// Private (account) stream URL
pub fn private_ws_url(config: &ExchangeConfig) -> String {
    format!("{}/v5/private", ws_host(config))
}
