pub mod account;
pub mod builder;
pub mod codec;
pub mod market_data;
pub mod rate_limits;
pub mod signer;
pub mod stream;
pub mod trading;
pub mod types;

pub const EXCHANGE_NAME: &str = "bybit";
pub const REST_URL: &str = "https://api.bybit.com";
pub const TESTNET_REST_URL: &str = "https://api-testnet.bybit.com";
pub const WS_URL: &str = "wss://stream.bybit.com";
pub const TESTNET_WS_URL: &str = "wss://stream-testnet.bybit.com";

// Re-export main types for easier importing
pub use account::BybitAccount;
pub use builder::{build_rest_client, build_rest_client_with, private_ws_url, public_ws_url};
pub use codec::BybitCodec;
pub use market_data::BybitMarket;
pub use rate_limits::shared_rate_limiter;
pub use signer::BybitSigner;
pub use stream::{kline_topic, orderbook_topic, ticker_topic, BybitStream};
pub use trading::BybitTrade;
pub use types::{
    BybitOrderRequest, BybitOrderResponse, BybitResponse, BybitRestKline, BybitStreamFrame,
    BybitTicker, BybitWalletBalance, BybitWsKline, BybitWsOrderBook, BybitWsTicker, Category,
};
