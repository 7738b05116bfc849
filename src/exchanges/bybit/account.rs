use crate::core::errors::ExchangeError;
use crate::core::kernel::{Params, RestClient};
use crate::exchanges::bybit::types::{BybitResponse, BybitWalletBalance};
use serde_json::json;
use tracing::instrument;

/// Signed account endpoints
#[derive(Debug, Clone)]
pub struct BybitAccount<R: RestClient> {
    rest: R,
}

impl<R: RestClient> BybitAccount<R> {
    pub fn new(rest: R) -> Self {
        Self { rest }
    }

    /// Wallet balance for an account type such as `UNIFIED`
    #[instrument(skip(self), fields(exchange = "bybit"))]
    pub async fn wallet_balance(
        &self,
        account_type: &str,
        coin: Option<&str>,
    ) -> Result<BybitWalletBalance, ExchangeError> {
        let mut params = Params::new();
        params.insert("accountType".to_string(), json!(account_type));
        if let Some(coin) = coin {
            params.insert("coin".to_string(), json!(coin));
        }

        let response: BybitResponse = self
            .rest
            .get_json("/v5/account/wallet-balance", &params, true)
            .await?;
        response.into_result()
    }
}
