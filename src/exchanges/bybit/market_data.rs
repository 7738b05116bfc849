use crate::core::errors::ExchangeError;
use crate::core::kernel::{Params, RestClient};
use crate::exchanges::bybit::types::{
    BybitKlineResult, BybitResponse, BybitRestKline, BybitServerTime, BybitTicker,
    BybitTickersResult, Category,
};
use serde_json::json;
use tracing::instrument;

/// Public market data endpoints
#[derive(Debug, Clone)]
pub struct BybitMarket<R: RestClient> {
    rest: R,
}

impl<R: RestClient> BybitMarket<R> {
    pub fn new(rest: R) -> Self {
        Self { rest }
    }

    /// Server time in milliseconds
    #[instrument(skip(self), fields(exchange = "bybit"))]
    pub async fn server_time(&self) -> Result<u64, ExchangeError> {
        let response: BybitResponse = self
            .rest
            .get_json("/v5/market/time", &Params::new(), false)
            .await?;
        let envelope_time = response.time;
        let time: BybitServerTime = response.into_result()?;
        match envelope_time {
            Some(ms) if ms > 0 => Ok(ms),
            _ => time.millis(),
        }
    }

    /// Candles, newest first
    #[instrument(skip(self), fields(exchange = "bybit"))]
    pub async fn kline(
        &self,
        category: Category,
        symbol: &str,
        interval: &str,
        limit: Option<u32>,
    ) -> Result<Vec<BybitRestKline>, ExchangeError> {
        let mut params = Params::new();
        params.insert("category".to_string(), json!(category.as_str()));
        params.insert("symbol".to_string(), json!(symbol));
        params.insert("interval".to_string(), json!(interval));
        if let Some(limit) = limit {
            params.insert("limit".to_string(), json!(limit));
        }

        let response: BybitResponse = self
            .rest
            .get_json("/v5/market/kline", &params, false)
            .await?;
        let result: BybitKlineResult = response.into_result()?;
        Ok(result.list)
    }

    /// Tickers for a category, optionally narrowed to one symbol
    #[instrument(skip(self), fields(exchange = "bybit"))]
    pub async fn tickers(
        &self,
        category: Category,
        symbol: Option<&str>,
    ) -> Result<Vec<BybitTicker>, ExchangeError> {
        let mut params = Params::new();
        params.insert("category".to_string(), json!(category.as_str()));
        if let Some(symbol) = symbol {
            params.insert("symbol".to_string(), json!(symbol));
        }

        let response: BybitResponse = self
            .rest
            .get_json("/v5/market/tickers", &params, false)
            .await?;
        let result: BybitTickersResult = response.into_result()?;
        Ok(result.list)
    }
}
