use cryptokit::core::config::ExchangeConfig;
use cryptokit::exchanges::{binance, bybit, kucoin};
use cryptokit::init_logging;
use tracing::{info, warn};

fn config_for(prefix: &str) -> ExchangeConfig {
    #[cfg(feature = "env-file")]
    let loaded = ExchangeConfig::from_env_file(prefix);
    #[cfg(not(feature = "env-file"))]
    let loaded = ExchangeConfig::from_env(prefix);

    loaded.unwrap_or_else(|e| {
        warn!(prefix, error = %e, "no credentials configured, using public access");
        ExchangeConfig::read_only()
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let json = std::env::args().any(|arg| arg == "--json");
    init_logging(json);

    let bybit_market = bybit::BybitMarket::new(bybit::build_rest_client(&config_for("BYBIT"))?);
    match bybit_market.server_time().await {
        Ok(ms) => info!(exchange = "bybit", server_time = ms, "server time"),
        Err(e) => warn!(exchange = "bybit", error = %e, "server time failed"),
    }

    let binance_futures =
        binance::BinanceFutures::new(binance::build_rest_client(&config_for("BINANCE"))?);
    match binance_futures.server_time().await {
        Ok(ms) => info!(exchange = "binance", server_time = ms, "server time"),
        Err(e) => warn!(exchange = "binance", error = %e, "server time failed"),
    }

    let kucoin_market = kucoin::KucoinMarket::new(kucoin::build_client(&config_for("KUCOIN"))?);
    for market in [kucoin::MarketType::SpotMargin, kucoin::MarketType::Futures] {
        match kucoin_market.server_time(market).await {
            Ok(ms) => info!(exchange = "kucoin", ?market, server_time = ms, "server time"),
            Err(e) => warn!(exchange = "kucoin", ?market, error = %e, "server time failed"),
        }
    }

    Ok(())
}
