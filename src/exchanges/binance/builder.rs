use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{PostEncoding, ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::exchanges::binance::signer::BinanceSigner;
use crate::exchanges::binance::{
    EXCHANGE_NAME, REST_URL, TESTNET_REST_URL, TESTNET_WS_URL, WS_URL,
};
use std::sync::Arc;

/// USD-M futures REST client. Parameters of every method go in the query
/// string so the signature can follow them.
pub fn build_rest_client(config: &ExchangeConfig) -> Result<ReqwestRest, ExchangeError> {
    let base_url = config.resolve_base_url(REST_URL, TESTNET_REST_URL);
    let rest_config = RestClientConfig::new(base_url, EXCHANGE_NAME.to_string())
        .with_timeout(config.timeout_seconds)
        .with_post_encoding(PostEncoding::Query);

    let mut builder = RestClientBuilder::new(rest_config);
    if config.has_credentials() {
        builder = builder.with_signer(Arc::new(BinanceSigner::new(
            config.api_key().to_string(),
            config.secret_key().to_string(),
            config.recv_window_ms,
        )));
    }
    builder.build()
}

/// Combined-stream endpoint
pub fn stream_url(config: &ExchangeConfig) -> String {
    let host = config.ws_url.clone().unwrap_or_else(|| {
        if config.testnet {
            TESTNET_WS_URL.to_string()
        } else {
            WS_URL.to_string()
        }
    });
    format!("{}/stream", host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let rest = build_rest_client(&ExchangeConfig::read_only()).unwrap();
        assert_eq!(rest.base_url(), "https://fapi.binance.com");
        assert_eq!(rest.config().post_encoding, PostEncoding::Query);

        let testnet = ExchangeConfig::read_only().testnet(true);
        let rest = build_rest_client(&testnet).unwrap();
        assert_eq!(rest.base_url(), "https://testnet.binancefuture.com");
        assert_eq!(
            stream_url(&testnet),
            "wss://stream.binancefuture.com/stream"
        );
    }
}
