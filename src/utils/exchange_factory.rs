use crate::core::config::{ConfigError, ExchangeConfig};
use crate::core::errors::ExchangeError;
use crate::core::kernel::ReqwestRest;
use crate::exchanges::kucoin::MarketType;
use crate::exchanges::{binance, bybit, coinmarketcap, kucoin};
use std::fmt;
use std::str::FromStr;

/// Supported venues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
    Binance,
    Bybit,
    KucoinSpot,
    KucoinFutures,
    CoinMarketCap,
}

impl ExchangeKind {
    pub const ALL: [Self; 5] = [
        Self::Binance,
        Self::Bybit,
        Self::KucoinSpot,
        Self::KucoinFutures,
        Self::CoinMarketCap,
    ];

    /// Prefix of the environment variables holding this venue's settings
    pub const fn env_prefix(self) -> &'static str {
        match self {
            Self::Binance => "BINANCE",
            Self::Bybit => "BYBIT",
            Self::KucoinSpot | Self::KucoinFutures => "KUCOIN",
            Self::CoinMarketCap => "CMC",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binance => write!(f, "Binance"),
            Self::Bybit => write!(f, "Bybit"),
            Self::KucoinSpot => write!(f, "KuCoin Spot"),
            Self::KucoinFutures => write!(f, "KuCoin Futures"),
            Self::CoinMarketCap => write!(f, "CoinMarketCap"),
        }
    }
}

impl FromStr for ExchangeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binance" => Ok(Self::Binance),
            "bybit" => Ok(Self::Bybit),
            "kucoin" | "kucoin-spot" => Ok(Self::KucoinSpot),
            "kucoin-futures" => Ok(Self::KucoinFutures),
            "coinmarketcap" | "cmc" => Ok(Self::CoinMarketCap),
            other => Err(ConfigError::InvalidConfiguration(format!(
                "Unknown exchange: {}",
                other
            ))),
        }
    }
}

/// Build the request pipeline for `kind`
pub fn rest_client_for(
    kind: ExchangeKind,
    config: &ExchangeConfig,
) -> Result<ReqwestRest, ExchangeError> {
    match kind {
        ExchangeKind::Binance => binance::build_rest_client(config),
        ExchangeKind::Bybit => bybit::build_rest_client(config),
        ExchangeKind::KucoinSpot => {
            Ok(kucoin::build_client(config)?.rest(MarketType::SpotMargin).clone())
        }
        ExchangeKind::KucoinFutures => {
            Ok(kucoin::build_client(config)?.rest(MarketType::Futures).clone())
        }
        ExchangeKind::CoinMarketCap => coinmarketcap::build_rest_client(config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("Bybit".parse::<ExchangeKind>().unwrap(), ExchangeKind::Bybit);
        assert_eq!("cmc".parse::<ExchangeKind>().unwrap(), ExchangeKind::CoinMarketCap);
        assert!("okx".parse::<ExchangeKind>().is_err());
    }

    #[test]
    fn test_builds_each_public_venue() {
        let config = ExchangeConfig::read_only();
        let expected = [
            (ExchangeKind::Binance, "binance"),
            (ExchangeKind::Bybit, "bybit"),
            (ExchangeKind::KucoinSpot, "kucoin"),
            (ExchangeKind::KucoinFutures, "kucoin"),
        ];
        for (kind, name) in expected {
            let rest = rest_client_for(kind, &config).unwrap();
            assert_eq!(rest.exchange_name(), name);
        }
        assert!(rest_client_for(ExchangeKind::CoinMarketCap, &config).is_err());
    }
}
