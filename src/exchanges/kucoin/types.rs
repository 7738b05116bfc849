use crate::core::errors::ExchangeError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// KuCoin code for a successful call
pub const SUCCESS_CODE: &str = "200000";

/// Spot/margin or futures; selects the host for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketType {
    SpotMargin,
    Futures,
}

/// `{code, data, msg}` envelope
#[derive(Debug, Clone, Deserialize)]
pub struct KucoinResponse {
    pub code: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub msg: Option<String>,
}

impl KucoinResponse {
    pub fn is_ok(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ExchangeError> {
        if !self.is_ok() {
            return Err(ExchangeError::ApiError {
                code: self.code.parse().unwrap_or(-1),
                message: self.msg.unwrap_or_default(),
            });
        }
        Ok(serde_json::from_value(self.data)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KucoinSymbol {
    pub symbol: String,
    #[serde(default)]
    pub base_currency: String,
    #[serde(default)]
    pub quote_currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KucoinAccountBalance {
    pub id: String,
    pub currency: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub balance: String,
    pub available: String,
    pub holds: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KucoinAccountOverview {
    pub currency: String,
    pub account_equity: f64,
    pub available_balance: f64,
    #[serde(default)]
    pub unrealised_pnl: f64,
}
