pub mod builder;
pub mod codec;
pub mod market_data;
pub mod signer;
pub mod stream;
pub mod types;

pub const EXCHANGE_NAME: &str = "binance";
pub const REST_URL: &str = "https://fapi.binance.com";
pub const TESTNET_REST_URL: &str = "https://testnet.binancefuture.com";
pub const WS_URL: &str = "wss://fstream.binance.com";
pub const TESTNET_WS_URL: &str = "wss://stream.binancefuture.com";

pub use builder::{build_rest_client, stream_url};
pub use codec::{kline_stream, BinanceCodec};
pub use market_data::BinanceFutures;
pub use signer::BinanceSigner;
pub use stream::BinanceStream;
pub use types::{
    BinanceAccountInfo, BinanceExchangeInfo, BinanceOrderBook, BinanceRestKline, BinanceTrade,
    BinanceWsKline,
};
