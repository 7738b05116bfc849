pub mod builder;
pub mod cryptocurrency;
pub mod signer;
pub mod types;

pub const EXCHANGE_NAME: &str = "coinmarketcap";
pub const REST_URL: &str = "https://pro-api.coinmarketcap.com";
pub const SANDBOX_REST_URL: &str = "https://sandbox-api.coinmarketcap.com";

pub use builder::build_rest_client;
pub use cryptocurrency::CoinMarketCap;
pub use signer::CmcKeySigner;
pub use types::{
    CmcIdMapEntry, CmcListing, CmcResponse, GainersLosersParams, InfoParams, ListingsParams,
    MapParams,
};
