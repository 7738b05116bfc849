use crate::core::errors::ExchangeError;
use crate::core::kernel::{Params, RestClient};
use crate::exchanges::kucoin::builder::KucoinClient;
use crate::exchanges::kucoin::types::{
    KucoinAccountBalance, KucoinAccountOverview, KucoinResponse, KucoinSymbol, MarketType,
};
use serde_json::json;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct KucoinMarket<R: RestClient> {
    client: KucoinClient<R>,
}

impl<R: RestClient> KucoinMarket<R> {
    pub fn new(client: KucoinClient<R>) -> Self {
        Self { client }
    }

    /// Server time in milliseconds
    #[instrument(skip(self), fields(exchange = "kucoin"))]
    pub async fn server_time(&self, market: MarketType) -> Result<u64, ExchangeError> {
        let response: KucoinResponse = self
            .client
            .rest(market)
            .get_json("/api/v1/timestamp", &Params::new(), false)
            .await?;
        response.into_result()
    }

    /// Tradable spot symbols or active futures contracts
    #[instrument(skip(self), fields(exchange = "kucoin"))]
    pub async fn symbols(&self, market: MarketType) -> Result<Vec<KucoinSymbol>, ExchangeError> {
        let endpoint = match market {
            MarketType::SpotMargin => "/api/v2/symbols",
            MarketType::Futures => "/api/v1/contracts/active",
        };
        let response: KucoinResponse = self
            .client
            .rest(market)
            .get_json(endpoint, &Params::new(), false)
            .await?;
        response.into_result()
    }
}

/// Signed account endpoints
#[derive(Debug, Clone)]
pub struct KucoinAccount<R: RestClient> {
    client: KucoinClient<R>,
}

impl<R: RestClient> KucoinAccount<R> {
    pub fn new(client: KucoinClient<R>) -> Self {
        Self { client }
    }

    /// Spot accounts, optionally filtered by currency and account type
    #[instrument(skip(self), fields(exchange = "kucoin"))]
    pub async fn accounts(
        &self,
        currency: Option<&str>,
        account_type: Option<&str>,
    ) -> Result<Vec<KucoinAccountBalance>, ExchangeError> {
        let mut params = Params::new();
        if let Some(currency) = currency {
            params.insert("currency".to_string(), json!(currency));
        }
        if let Some(account_type) = account_type {
            params.insert("type".to_string(), json!(account_type));
        }
        let response: KucoinResponse = self
            .client
            .rest(MarketType::SpotMargin)
            .get_json("/api/v1/accounts", &params, true)
            .await?;
        response.into_result()
    }

    /// Futures account overview for a settlement currency
    #[instrument(skip(self), fields(exchange = "kucoin"))]
    pub async fn futures_overview(
        &self,
        currency: &str,
    ) -> Result<KucoinAccountOverview, ExchangeError> {
        let mut params = Params::new();
        params.insert("currency".to_string(), json!(currency));
        let response: KucoinResponse = self
            .client
            .rest(MarketType::Futures)
            .get_json("/api/v1/account-overview", &params, true)
            .await?;
        response.into_result()
    }
}
