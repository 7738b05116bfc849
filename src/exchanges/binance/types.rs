use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceServerTime {
    pub server_time: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceRateLimit {
    pub rate_limit_type: String,
    pub interval: String,
    pub interval_num: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceAsset {
    pub asset: String,
    pub margin_available: bool,
    #[serde(default)]
    pub auto_asset_exchange: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceSymbol {
    pub symbol: String,
    #[serde(default)]
    pub pair: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub base_asset: String,
    #[serde(default)]
    pub quote_asset: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceExchangeInfo {
    pub timezone: String,
    pub server_time: u64,
    #[serde(default)]
    pub rate_limits: Vec<BinanceRateLimit>,
    #[serde(default)]
    pub exchange_filters: Vec<Value>,
    #[serde(default)]
    pub assets: Vec<BinanceAsset>,
    #[serde(default)]
    pub symbols: Vec<BinanceSymbol>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceOrderBook {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: u64,
    #[serde(rename = "E", default)]
    pub event_time: u64,
    #[serde(rename = "T", default)]
    pub transaction_time: u64,
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceTrade {
    pub id: u64,
    pub price: String,
    pub qty: String,
    pub quote_qty: String,
    pub time: u64,
    pub is_buyer_maker: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceAggTrade {
    #[serde(rename = "a")]
    pub agg_trade_id: u64,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub quantity: String,
    #[serde(rename = "f")]
    pub first_trade_id: u64,
    #[serde(rename = "l")]
    pub last_trade_id: u64,
    #[serde(rename = "T")]
    pub timestamp: u64,
    #[serde(rename = "m")]
    pub was_buyer_maker: bool,
}

/// REST candle: `[openTime, open, high, low, close, volume, closeTime,
/// quoteVolume, trades, takerBuyBase, takerBuyQuote, ignore]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BinanceRestKline(
    pub u64,
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
    pub u64,
    pub String,
    pub u64,
    pub String,
    pub String,
    pub String,
);

impl BinanceRestKline {
    pub fn open_time(&self) -> u64 {
        self.0
    }

    pub fn close(&self) -> &str {
        &self.4
    }

    pub fn close_time(&self) -> u64 {
        self.6
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceAccountAsset {
    pub asset: String,
    pub wallet_balance: String,
    #[serde(default)]
    pub available_balance: String,
    #[serde(default)]
    pub unrealized_profit: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceAccountInfo {
    #[serde(default)]
    pub can_trade: bool,
    pub total_wallet_balance: String,
    #[serde(default)]
    pub available_balance: String,
    #[serde(default)]
    pub assets: Vec<BinanceAccountAsset>,
    #[serde(default)]
    pub positions: Vec<Value>,
}

/// Generic `{code, msg}` acknowledgement, also the error body shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceAck {
    pub code: i64,
    pub msg: String,
}

/// Candle payload of a `<symbol>@kline_<interval>` stream
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BinanceWsKline {
    #[serde(rename = "t")]
    pub start_time: u64,
    #[serde(rename = "T")]
    pub close_time: u64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "i")]
    pub interval: String,
    #[serde(rename = "o")]
    pub open: String,
    #[serde(rename = "c")]
    pub close: String,
    #[serde(rename = "h")]
    pub high: String,
    #[serde(rename = "l")]
    pub low: String,
    #[serde(rename = "v")]
    pub volume: String,
    #[serde(rename = "x")]
    pub closed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceWsKlineEvent {
    #[serde(rename = "E")]
    pub event_time: u64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "k")]
    pub kline: BinanceWsKline,
}
