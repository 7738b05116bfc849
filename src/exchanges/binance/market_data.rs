use crate::core::errors::ExchangeError;
use crate::core::kernel::{Params, RestClient};
use crate::exchanges::binance::types::{
    BinanceAccountInfo, BinanceAck, BinanceAggTrade, BinanceExchangeInfo, BinanceOrderBook,
    BinanceRestKline, BinanceServerTime, BinanceTrade,
};
use serde_json::{json, Value};
use tracing::instrument;

fn symbol_params(symbol: &str, limit: Option<u32>) -> Params {
    let mut params = Params::new();
    params.insert("symbol".to_string(), json!(symbol));
    if let Some(limit) = limit {
        params.insert("limit".to_string(), json!(limit));
    }
    params
}

/// USD-M futures market data and account endpoints
#[derive(Debug, Clone)]
pub struct BinanceFutures<R: RestClient> {
    rest: R,
}

impl<R: RestClient> BinanceFutures<R> {
    pub fn new(rest: R) -> Self {
        Self { rest }
    }

    /// Connectivity check. Success is an empty object.
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn ping(&self) -> Result<(), ExchangeError> {
        let _: Value = self
            .rest
            .get_json("/fapi/v1/ping", &Params::new(), false)
            .await?;
        Ok(())
    }

    /// Server time in milliseconds
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn server_time(&self) -> Result<u64, ExchangeError> {
        let time: BinanceServerTime = self
            .rest
            .get_json("/fapi/v1/time", &Params::new(), false)
            .await?;
        Ok(time.server_time)
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn exchange_info(&self) -> Result<BinanceExchangeInfo, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/exchangeInfo", &Params::new(), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn order_book(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<BinanceOrderBook, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/depth", &symbol_params(symbol, limit), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn recent_trades(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<Vec<BinanceTrade>, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/trades", &symbol_params(symbol, limit), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn agg_trades(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<Vec<BinanceAggTrade>, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/aggTrades", &symbol_params(symbol, limit), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: Option<u32>,
    ) -> Result<Vec<BinanceRestKline>, ExchangeError> {
        let mut params = symbol_params(symbol, limit);
        params.insert("interval".to_string(), json!(interval));
        self.rest.get_json("/fapi/v1/klines", &params, false).await
    }

    /// Signed account snapshot
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn account(&self) -> Result<BinanceAccountInfo, ExchangeError> {
        self.rest
            .get_json("/fapi/v2/account", &Params::new(), true)
            .await
    }

    /// Switch between hedge (`true`) and one-way position mode
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn change_position_mode(&self, dual_side: bool) -> Result<BinanceAck, ExchangeError> {
        let mut params = Params::new();
        params.insert("dualSidePosition".to_string(), json!(dual_side));
        self.rest
            .post_json("/fapi/v1/positionSide/dual", &params, true)
            .await
    }
}
