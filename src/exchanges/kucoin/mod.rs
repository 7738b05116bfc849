pub mod builder;
pub mod market_data;
pub mod signer;
pub mod types;

pub const EXCHANGE_NAME: &str = "kucoin";
pub const SPOT_REST_URL: &str = "https://api.kucoin.com";
pub const FUTURES_REST_URL: &str = "https://api-futures.kucoin.com";
pub const SANDBOX_SPOT_REST_URL: &str = "https://openapi-sandbox.kucoin.com";
pub const SANDBOX_FUTURES_REST_URL: &str = "https://api-sandbox-futures.kucoin.com";

pub use builder::{build_client, KucoinClient};
pub use market_data::{KucoinAccount, KucoinMarket};
pub use signer::KucoinSigner;
pub use types::{KucoinResponse, KucoinSymbol, MarketType};
