use crate::core::errors::ExchangeError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Product line a market or stream belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Spot,
    Linear,
    Inverse,
    Option,
}

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::Linear => "linear",
            Self::Inverse => "inverse",
            Self::Option => "option",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// V5 response envelope. `result` stays raw until the return code is checked,
/// because failed calls return `{}` there.
#[derive(Debug, Clone, Deserialize)]
pub struct BybitResponse {
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    #[serde(rename = "retMsg")]
    pub ret_msg: String,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub time: Option<u64>,
}

impl BybitResponse {
    pub fn is_ok(&self) -> bool {
        self.ret_code == 0
    }

    /// Decode `result`, or turn a non-zero return code into an API error
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ExchangeError> {
        if !self.is_ok() {
            return Err(ExchangeError::ApiError {
                code: self.ret_code,
                message: self.ret_msg,
            });
        }
        Ok(serde_json::from_value(self.result)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BybitServerTime {
    #[serde(rename = "timeSecond")]
    pub time_second: String,
    #[serde(rename = "timeNano")]
    pub time_nano: String,
}

impl BybitServerTime {
    /// Server time in milliseconds
    pub fn millis(&self) -> Result<u64, ExchangeError> {
        let nanos: u128 = self.time_nano.parse().map_err(|_| {
            ExchangeError::SerializationError(format!("Invalid timeNano: {}", self.time_nano))
        })?;
        Ok((nanos / 1_000_000) as u64)
    }
}

/// Candle as returned by `/v5/market/kline`:
/// `[startTime, open, high, low, close, volume, turnover]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BybitRestKline(
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
);

impl BybitRestKline {
    pub fn start_time(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    pub fn open(&self) -> &str {
        &self.1
    }

    pub fn high(&self) -> &str {
        &self.2
    }

    pub fn low(&self) -> &str {
        &self.3
    }

    pub fn close(&self) -> &str {
        &self.4
    }

    pub fn volume(&self) -> &str {
        &self.5
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BybitKlineResult {
    pub category: String,
    pub symbol: String,
    pub list: Vec<BybitRestKline>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitTicker {
    pub symbol: String,
    pub last_price: String,
    #[serde(default)]
    pub bid1_price: String,
    #[serde(default)]
    pub ask1_price: String,
    #[serde(default)]
    pub volume24h: String,
    #[serde(default)]
    pub turnover24h: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BybitTickersResult {
    pub category: String,
    pub list: Vec<BybitTicker>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitCoinBalance {
    pub coin: String,
    #[serde(default)]
    pub equity: String,
    pub wallet_balance: String,
    #[serde(default)]
    pub locked: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitWalletAccount {
    pub account_type: String,
    #[serde(default)]
    pub total_equity: String,
    #[serde(default)]
    pub coin: Vec<BybitCoinBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BybitWalletBalance {
    pub list: Vec<BybitWalletAccount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitOrderRequest {
    pub category: Category,
    pub symbol: String,
    /// `Buy` or `Sell`
    pub side: String,
    /// `Market` or `Limit`
    pub order_type: String,
    pub qty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_link_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitOrderResponse {
    pub order_id: String,
    #[serde(default)]
    pub order_link_id: String,
}

/// One candle from a `kline.{interval}.{symbol}` stream
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BybitWsKline {
    pub start: u64,
    pub end: u64,
    pub interval: String,
    pub open: String,
    pub close: String,
    pub high: String,
    pub low: String,
    pub volume: String,
    pub turnover: String,
    pub confirm: bool,
    pub timestamp: u64,
}

/// Payload of a `tickers.{symbol}` stream.
///
/// Derivatives publish deltas carrying only the fields that changed, so
/// everything but the symbol may be empty.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitWsTicker {
    pub symbol: String,
    #[serde(default)]
    pub last_price: String,
    #[serde(default)]
    pub high_price24h: String,
    #[serde(default)]
    pub low_price24h: String,
    #[serde(default)]
    pub prev_price24h: String,
    #[serde(default)]
    pub price24h_pcnt: String,
    #[serde(default)]
    pub volume24h: String,
    #[serde(default)]
    pub turnover24h: String,
    #[serde(default)]
    pub mark_price: String,
    #[serde(default)]
    pub index_price: String,
    #[serde(default)]
    pub funding_rate: String,
    #[serde(default)]
    pub bid1_price: String,
    #[serde(default)]
    pub ask1_price: String,
}

/// Payload of an `orderbook.{depth}.{symbol}` stream. Levels are
/// `[price, size]`; a size of `"0"` in a delta removes the level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BybitWsOrderBook {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "b", default)]
    pub bids: Vec<[String; 2]>,
    #[serde(rename = "a", default)]
    pub asks: Vec<[String; 2]>,
    #[serde(rename = "u")]
    pub update_id: u64,
    #[serde(default)]
    pub seq: u64,
}

/// Data frame published on a public or private topic
#[derive(Debug, Clone, Deserialize)]
pub struct BybitStreamFrame<T> {
    pub topic: String,
    #[serde(rename = "type", default)]
    pub frame_type: Option<String>,
    pub data: T,
    #[serde(default)]
    pub ts: Option<u64>,
}

impl<T> BybitStreamFrame<T> {
    pub fn is_snapshot(&self) -> bool {
        self.frame_type.as_deref() == Some("snapshot")
    }
}
