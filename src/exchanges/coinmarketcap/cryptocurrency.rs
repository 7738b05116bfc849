use crate::core::errors::ExchangeError;
use crate::core::kernel::{to_params, Params, RestClient};
use crate::exchanges::coinmarketcap::types::{
    CmcIdMapEntry, CmcKeyInfo, CmcListing, CmcResponse, GainersLosersParams, InfoParams,
    ListingsParams, MapParams,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::instrument;

/// Auxiliary fields requested from `/v2/cryptocurrency/info` by default
pub const DEFAULT_INFO_AUX: &str = "urls,logo,description,tags,platform,date_added,notice";

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl InfoParams {
    fn to_query(&self) -> Result<Params, ExchangeError> {
        if self.id.is_empty() && self.slug.is_empty() && self.symbol.is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "One of id, slug or symbol is required".to_string(),
            ));
        }

        let mut params = Params::new();
        if !self.id.is_empty() {
            params.insert("id".to_string(), json!(join(&self.id)));
        }
        if !self.slug.is_empty() {
            params.insert("slug".to_string(), json!(join(&self.slug)));
        }
        if !self.symbol.is_empty() {
            params.insert("symbol".to_string(), json!(join(&self.symbol)));
        }
        if let Some(address) = &self.address {
            params.insert("address".to_string(), json!(address));
        }
        if let Some(skip_invalid) = self.skip_invalid {
            params.insert("skip_invalid".to_string(), json!(skip_invalid));
        }
        let aux = if self.aux.is_empty() {
            DEFAULT_INFO_AUX.to_string()
        } else {
            join(&self.aux)
        };
        params.insert("aux".to_string(), json!(aux));
        Ok(params)
    }
}

/// CoinMarketCap cryptocurrency and key endpoints
#[derive(Debug, Clone)]
pub struct CoinMarketCap<R: RestClient> {
    rest: R,
}

impl<R: RestClient> CoinMarketCap<R> {
    pub fn new(rest: R) -> Self {
        Self { rest }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &Params,
    ) -> Result<T, ExchangeError> {
        let response: CmcResponse = self.rest.get_json(endpoint, params, true).await?;
        response.into_result()
    }

    /// Plan and credit usage of the configured key
    #[instrument(skip(self), fields(exchange = "coinmarketcap"))]
    pub async fn key_info(&self) -> Result<CmcKeyInfo, ExchangeError> {
        self.fetch("/v1/key/info", &Params::new()).await
    }

    /// CoinMarketCap ids for active (or filtered) cryptocurrencies
    #[instrument(skip(self), fields(exchange = "coinmarketcap"))]
    pub async fn map(&self, params: &MapParams) -> Result<Vec<CmcIdMapEntry>, ExchangeError> {
        self.fetch("/v1/cryptocurrency/map", &to_params(params)?)
            .await
    }

    /// Static metadata keyed by the id, slug or symbol that was asked for
    #[instrument(skip(self), fields(exchange = "coinmarketcap"))]
    pub async fn info(&self, params: &InfoParams) -> Result<HashMap<String, Value>, ExchangeError> {
        self.fetch("/v2/cryptocurrency/info", &params.to_query()?)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinmarketcap"))]
    pub async fn listings_latest(
        &self,
        params: &ListingsParams,
    ) -> Result<Vec<CmcListing>, ExchangeError> {
        self.fetch("/v1/cryptocurrency/listings/latest", &to_params(params)?)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinmarketcap"))]
    pub async fn gainers_losers(
        &self,
        params: &GainersLosersParams,
    ) -> Result<Vec<CmcListing>, ExchangeError> {
        self.fetch(
            "/v1/cryptocurrency/trending/gainers-losers",
            &to_params(params)?,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_requires_selector() {
        assert!(matches!(
            InfoParams::default().to_query(),
            Err(ExchangeError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_info_query_joins_lists() {
        let params = InfoParams {
            symbol: vec!["BTC".to_string(), "ETH".to_string()],
            id: vec![1, 1027],
            ..InfoParams::default()
        };
        let query = params.to_query().unwrap();
        assert_eq!(query["symbol"], json!("BTC,ETH"));
        assert_eq!(query["id"], json!("1,1027"));
        assert_eq!(query["aux"], json!(DEFAULT_INFO_AUX));
        assert!(!query.contains_key("slug"));
    }
}
