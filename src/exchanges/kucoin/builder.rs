use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
use crate::exchanges::kucoin::signer::KucoinSigner;
use crate::exchanges::kucoin::types::MarketType;
use crate::exchanges::kucoin::{
    EXCHANGE_NAME, FUTURES_REST_URL, SANDBOX_FUTURES_REST_URL, SANDBOX_SPOT_REST_URL,
    SPOT_REST_URL,
};
use std::sync::Arc;

/// One pipeline per KuCoin host. The market type is chosen per call, so
/// concurrent spot and futures requests never affect each other.
#[derive(Debug, Clone)]
pub struct KucoinClient<R: RestClient> {
    spot: R,
    futures: R,
}

impl<R: RestClient> KucoinClient<R> {
    pub fn new(spot: R, futures: R) -> Self {
        Self { spot, futures }
    }

    pub fn rest(&self, market: MarketType) -> &R {
        match market {
            MarketType::SpotMargin => &self.spot,
            MarketType::Futures => &self.futures,
        }
    }
}

fn build_one(config: &ExchangeConfig, base_url: String) -> Result<ReqwestRest, ExchangeError> {
    let rest_config = RestClientConfig::new(base_url, EXCHANGE_NAME.to_string())
        .with_timeout(config.timeout_seconds);
    let mut builder = RestClientBuilder::new(rest_config);
    if config.has_credentials() {
        builder = builder.with_signer(Arc::new(KucoinSigner::new(
            config.api_key().to_string(),
            config.secret_key().to_string(),
            config.recv_window_ms,
        )));
    }
    builder.build()
}

/// Spot and futures pipelines. A `base_url` override points both at the
/// same host.
pub fn build_client(config: &ExchangeConfig) -> Result<KucoinClient<ReqwestRest>, ExchangeError> {
    let spot = build_one(
        config,
        config.resolve_base_url(SPOT_REST_URL, SANDBOX_SPOT_REST_URL),
    )?;
    let futures = build_one(
        config,
        config.resolve_base_url(FUTURES_REST_URL, SANDBOX_FUTURES_REST_URL),
    )?;
    Ok(KucoinClient::new(spot, futures))
}
