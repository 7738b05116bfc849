use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::ws::{SessionEvent, WsSession, WsSessionConfig};
use crate::exchanges::binance::builder::stream_url;
use crate::exchanges::binance::codec::{kline_stream, BinanceCodec};
use crate::exchanges::binance::types::{BinanceWsKline, BinanceWsKlineEvent};
use crate::exchanges::binance::EXCHANGE_NAME;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

/// Combined market stream. Binance answers pings itself, so the session
/// keeps its default protocol-level ping.
#[derive(Debug, Clone)]
pub struct BinanceStream {
    session: WsSession<BinanceCodec>,
}

impl BinanceStream {
    pub fn new(config: &ExchangeConfig) -> Self {
        Self::with_config(WsSessionConfig::new(
            stream_url(config),
            EXCHANGE_NAME.to_string(),
        ))
    }

    pub fn with_config(config: WsSessionConfig) -> Self {
        Self {
            session: WsSession::new(config, BinanceCodec::new()),
        }
    }

    pub fn session(&self) -> &WsSession<BinanceCodec> {
        &self.session
    }

    pub async fn connect(&self) -> Result<(), ExchangeError> {
        self.session.connect().await
    }

    pub async fn subscribe<T, F>(&self, streams: &[T], callback: F) -> Result<(), ExchangeError>
    where
        T: AsRef<str> + Sync,
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.session.subscribe(streams, callback).await
    }

    /// Kline feeds for `symbols`; returns the stream names subscribed
    pub async fn subscribe_klines<S, F>(
        &self,
        symbols: &[S],
        interval: &str,
        callback: F,
    ) -> Result<Vec<String>, ExchangeError>
    where
        S: AsRef<str>,
        F: Fn(BinanceWsKline) + Send + Sync + 'static,
    {
        let streams: Vec<String> = symbols
            .iter()
            .map(|symbol| kline_stream(symbol.as_ref(), interval))
            .collect();

        self.session
            .subscribe(&streams, move |payload: Value| {
                match serde_json::from_value::<BinanceWsKlineEvent>(payload) {
                    Ok(event) => callback(event.kline),
                    Err(e) => warn!(error = %e, "undecodable kline event"),
                }
            })
            .await?;
        Ok(streams)
    }

    pub async fn unsubscribe<T>(&self, streams: &[T]) -> Result<(), ExchangeError>
    where
        T: AsRef<str> + Sync,
    {
        self.session.unsubscribe(streams).await
    }

    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.session.take_events()
    }

    pub async fn close(&self) -> Result<(), ExchangeError> {
        self.session.close().await
    }
}
