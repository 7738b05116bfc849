pub mod binance;
pub mod bybit;
pub mod coinmarketcap;
pub mod kucoin;
