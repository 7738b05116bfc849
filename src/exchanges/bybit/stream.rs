use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::ws::{SessionEvent, WsAuth, WsSession, WsSessionConfig};
use crate::exchanges::bybit::builder::{private_ws_url, public_ws_url};
use crate::exchanges::bybit::codec::BybitCodec;
use crate::exchanges::bybit::types::{
    BybitStreamFrame, BybitWsKline, BybitWsOrderBook, BybitWsTicker, Category,
};
use crate::exchanges::bybit::EXCHANGE_NAME;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

/// Topic name for a kline stream
pub fn kline_topic(interval: &str, symbol: &str) -> String {
    format!("kline.{}.{}", interval, symbol)
}

pub fn ticker_topic(symbol: &str) -> String {
    format!("tickers.{}", symbol)
}

/// Topic name for an order book stream of `depth` levels per side
pub fn orderbook_topic(depth: u32, symbol: &str) -> String {
    format!("orderbook.{}.{}", depth, symbol)
}

/// Bybit v5 stream on top of a [`WsSession`]
#[derive(Debug, Clone)]
pub struct BybitStream {
    session: WsSession<BybitCodec>,
}

impl BybitStream {
    /// Public market stream for one product category
    pub fn public(config: &ExchangeConfig, category: Category) -> Self {
        let url = public_ws_url(config, category);
        Self::with_config(WsSessionConfig::new(url, EXCHANGE_NAME.to_string()))
    }

    /// Private account stream, authenticated on every connect
    pub fn private(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        if !config.has_credentials() {
            return Err(ExchangeError::AuthError(
                "Private stream requires API credentials".to_string(),
            ));
        }
        let auth = WsAuth::new(
            config.api_key().to_string(),
            config.secret_key().to_string(),
        );
        let session_config =
            WsSessionConfig::new(private_ws_url(config), EXCHANGE_NAME.to_string())
                .with_auth(auth);
        Ok(Self::with_config(session_config))
    }

    /// Stream with a fully custom session configuration
    pub fn with_config(config: WsSessionConfig) -> Self {
        Self {
            session: WsSession::new(config, BybitCodec),
        }
    }

    pub fn session(&self) -> &WsSession<BybitCodec> {
        &self.session
    }

    pub async fn connect(&self) -> Result<(), ExchangeError> {
        self.session.connect().await
    }

    /// Raw frames for arbitrary topics such as `orderbook.50.BTCUSDT` or
    /// the private `order` and `wallet` channels
    pub async fn subscribe<T, F>(&self, topics: &[T], callback: F) -> Result<(), ExchangeError>
    where
        T: AsRef<str> + Sync,
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.session.subscribe(topics, callback).await
    }

    /// Candles for every symbol at one interval. The callback sees each
    /// candle of a frame in order.
    pub async fn subscribe_klines<S, F>(
        &self,
        symbols: &[S],
        interval: &str,
        callback: F,
    ) -> Result<Vec<String>, ExchangeError>
    where
        S: AsRef<str>,
        F: Fn(BybitWsKline) + Send + Sync + 'static,
    {
        let topics: Vec<String> = symbols
            .iter()
            .map(|symbol| kline_topic(interval, symbol.as_ref()))
            .collect();

        self.subscribe_frames(topics, move |frame: BybitStreamFrame<Vec<BybitWsKline>>| {
            frame.data.into_iter().for_each(&callback)
        })
        .await
    }

    /// 24h ticker updates, snapshots and deltas alike
    pub async fn subscribe_tickers<S, F>(
        &self,
        symbols: &[S],
        callback: F,
    ) -> Result<Vec<String>, ExchangeError>
    where
        S: AsRef<str>,
        F: Fn(BybitWsTicker) + Send + Sync + 'static,
    {
        let topics: Vec<String> = symbols
            .iter()
            .map(|symbol| ticker_topic(symbol.as_ref()))
            .collect();

        self.subscribe_frames(topics, move |frame: BybitStreamFrame<BybitWsTicker>| {
            callback(frame.data)
        })
        .await
    }

    /// Order book frames at `depth`. The whole frame is passed on so the
    /// callback can tell a snapshot from a delta.
    pub async fn subscribe_orderbook<S, F>(
        &self,
        symbols: &[S],
        depth: u32,
        callback: F,
    ) -> Result<Vec<String>, ExchangeError>
    where
        S: AsRef<str>,
        F: Fn(BybitStreamFrame<BybitWsOrderBook>) + Send + Sync + 'static,
    {
        let topics: Vec<String> = symbols
            .iter()
            .map(|symbol| orderbook_topic(depth, symbol.as_ref()))
            .collect();

        self.subscribe_frames(topics, callback).await
    }

    async fn subscribe_frames<T, F>(
        &self,
        topics: Vec<String>,
        callback: F,
    ) -> Result<Vec<String>, ExchangeError>
    where
        T: DeserializeOwned + 'static,
        F: Fn(BybitStreamFrame<T>) + Send + Sync + 'static,
    {
        self.session
            .subscribe(&topics, move |payload: Value| {
                match serde_json::from_value::<BybitStreamFrame<T>>(payload) {
                    Ok(frame) => callback(frame),
                    Err(e) => warn!(error = %e, "undecodable stream frame"),
                }
            })
            .await?;
        Ok(topics)
    }

    pub async fn unsubscribe<T>(&self, topics: &[T]) -> Result<(), ExchangeError>
    where
        T: AsRef<str> + Sync,
    {
        self.session.unsubscribe(topics).await
    }

    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.session.take_events()
    }

    pub async fn close(&self) -> Result<(), ExchangeError> {
        self.session.close().await
    }
}
