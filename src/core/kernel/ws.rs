//! Long-lived WebSocket session with keep-alive, bounded reconnection and
//! topic based dispatch.
//!
//! A [`WsSession`] owns one socket at a time. Writes (subscribe, unsubscribe,
//! ping, auth, raw text) go through the writer mutex; a single read task owns
//! the reader mutex for the lifetime of a connection. When the read task sees
//! an error or end of stream, or the keep-alive task fails to ping, a recovery
//! task tears the connection down and redials with a fixed delay. A successful
//! redial re-authenticates and re-subscribes every registered topic.

use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::{WsCodec, WsEvent};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, trace, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Handler invoked with the payload of every frame published on its topic
pub type TopicCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// Credentials for private channels
#[derive(Debug, Clone)]
pub struct WsAuth {
    pub api_key: String,
    secret: Secret<String>,
}

impl WsAuth {
    pub fn new(api_key: String, secret: String) -> Self {
        Self {
            api_key,
            secret: Secret::new(secret),
        }
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

/// How topic callbacks are run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// Each callback runs on its own task so a slow handler cannot stall reads
    #[default]
    Spawned,
    /// Callbacks run on the read task, in frame order
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
    Closed,
}

/// Notifications for the session owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Reconnected,
    ReconnectFailed { attempts: u32 },
    ReadFailed(String),
    AuthRejected(String),
    Closed,
}

#[derive(Debug, Clone)]
pub struct WsSessionConfig {
    pub url: String,
    pub exchange_name: String,
    pub ping_interval: Duration,
    /// Total dial attempts per recovery
    pub reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    pub dispatch: DispatchMode,
    pub auth: Option<WsAuth>,
}

impl WsSessionConfig {
    pub fn new(url: String, exchange_name: String) -> Self {
        Self {
            url,
            exchange_name,
            ping_interval: Duration::from_secs(20),
            reconnect_attempts: 3,
            reconnect_delay: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(10),
            dispatch: DispatchMode::Spawned,
            auth: None,
        }
    }

    pub fn with_ping_interval(mut self, ping_interval: Duration) -> Self {
        self.ping_interval = ping_interval;
        self
    }

    pub fn with_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect_attempts = attempts;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Authenticate right after every (re)connect
    pub fn with_auth(mut self, auth: WsAuth) -> Self {
        self.auth = Some(auth);
        self
    }
}

#[derive(Default)]
struct SessionTasks {
    keep_alive: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

struct Inner<C: WsCodec> {
    config: WsSessionConfig,
    codec: C,
    writer: Mutex<Option<WsSink>>,
    reader: Mutex<Option<WsSource>>,
    callbacks: RwLock<HashMap<String, TopicCallback>>,
    state: watch::Sender<SessionState>,
    events: mpsc::UnboundedSender<SessionEvent>,
    events_rx: StdMutex<Option<mpsc::UnboundedReceiver<SessionEvent>>>,
    tasks: StdMutex<SessionTasks>,
    // held by whoever is redialing
    reconnect_lock: Mutex<()>,
    // bumped on every teardown; recovery requests from older connections are dropped
    generation: AtomicU64,
    closed: AtomicBool,
}

/// WebSocket session bound to one exchange codec
///
/// Cloning is cheap and every clone drives the same connection.
pub struct WsSession<C: WsCodec> {
    inner: Arc<Inner<C>>,
}

impl<C: WsCodec> Clone for WsSession<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: WsCodec> std::fmt::Debug for WsSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsSession")
            .field("url", &self.inner.config.url)
            .field("exchange", &self.inner.config.exchange_name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<C: WsCodec> WsSession<C> {
    pub fn new(config: WsSessionConfig, codec: C) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        let (events, events_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                config,
                codec,
                writer: Mutex::new(None),
                reader: Mutex::new(None),
                callbacks: RwLock::new(HashMap::new()),
                state,
                events,
                events_rx: StdMutex::new(Some(events_rx)),
                tasks: StdMutex::new(SessionTasks::default()),
                reconnect_lock: Mutex::new(()),
                generation: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &WsSessionConfig {
        &self.inner.config
    }

    pub fn codec(&self) -> &C {
        &self.inner.codec
    }

    /// Dial, authenticate if configured, and start the keep-alive and read
    /// tasks. Connecting an already connected session is a no-op.
    #[instrument(skip(self), fields(exchange = %self.inner.config.exchange_name, url = %self.inner.config.url))]
    pub async fn connect(&self) -> Result<(), ExchangeError> {
        self.inner.ensure_open()?;
        let _guard = self.inner.reconnect_lock.lock().await;
        if self.is_connected() {
            return Ok(());
        }

        establish(Arc::clone(&self.inner)).await?;
        info!("websocket connected");
        self.inner.emit(SessionEvent::Connected);
        Ok(())
    }

    /// Register `callback` for each topic and send one subscribe frame.
    ///
    /// Subscribing a topic again replaces its callback. If the frame cannot be
    /// sent the previous registrations are restored.
    #[instrument(skip(self, topics, callback), fields(exchange = %self.inner.config.exchange_name, topic_count = topics.len()))]
    pub async fn subscribe<T, F>(&self, topics: &[T], callback: F) -> Result<(), ExchangeError>
    where
        T: AsRef<str> + Sync,
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.inner.ensure_open()?;
        if topics.is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "At least one topic is required".to_string(),
            ));
        }

        let topics: Vec<String> = topics.iter().map(|t| t.as_ref().to_string()).collect();
        let callback: TopicCallback = Arc::new(callback);

        let previous: Vec<(String, Option<TopicCallback>)> = {
            let mut callbacks = self.inner.callbacks_mut();
            topics
                .iter()
                .map(|topic| {
                    let prev = callbacks.insert(topic.clone(), Arc::clone(&callback));
                    (topic.clone(), prev)
                })
                .collect()
        };

        let sent = match self.inner.codec.encode_subscription(&topics) {
            Ok(frame) => self.inner.send_message(frame).await,
            Err(e) => Err(e),
        };

        if let Err(e) = sent {
            let mut callbacks = self.inner.callbacks_mut();
            for (topic, prev) in previous {
                match prev {
                    Some(cb) => {
                        callbacks.insert(topic, cb);
                    }
                    None => {
                        callbacks.remove(&topic);
                    }
                }
            }
            warn!(error = %e, "subscribe failed, registration rolled back");
            return Err(e);
        }

        debug!(topics = ?topics, "subscribed");
        Ok(())
    }

    /// Drop the callbacks for `topics` and send one unsubscribe frame.
    /// Frames that arrive for those topics afterwards are discarded.
    #[instrument(skip(self, topics), fields(exchange = %self.inner.config.exchange_name, topic_count = topics.len()))]
    pub async fn unsubscribe<T>(&self, topics: &[T]) -> Result<(), ExchangeError>
    where
        T: AsRef<str> + Sync,
    {
        self.inner.ensure_open()?;
        if topics.is_empty() {
            return Ok(());
        }

        let topics: Vec<String> = topics.iter().map(|t| t.as_ref().to_string()).collect();
        {
            let mut callbacks = self.inner.callbacks_mut();
            for topic in &topics {
                callbacks.remove(topic);
            }
        }

        let frame = self.inner.codec.encode_unsubscription(&topics)?;
        self.inner.send_message(frame).await?;
        debug!(topics = ?topics, "unsubscribed");
        Ok(())
    }

    /// Send a raw text frame
    pub async fn send_text(&self, text: impl Into<String> + Send) -> Result<(), ExchangeError> {
        self.inner.send_message(Message::Text(text.into())).await
    }

    /// Tear down the current socket and redial with the configured retry
    /// policy. This is also how a session that exhausted its automatic
    /// recovery is brought back.
    #[instrument(skip(self), fields(exchange = %self.inner.config.exchange_name))]
    pub async fn reconnect(&self) -> Result<(), ExchangeError> {
        self.inner.ensure_open()?;
        let _guard = self.inner.reconnect_lock.lock().await;
        reconnect_with_retry(&self.inner).await?;
        self.inner.emit(SessionEvent::Reconnected);
        Ok(())
    }

    /// Close the session for good. Calling it again does nothing.
    #[instrument(skip(self), fields(exchange = %self.inner.config.exchange_name))]
    pub async fn close(&self) -> Result<(), ExchangeError> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.inner.set_state(SessionState::Closing);
        self.inner.teardown(SessionState::Closed).await;
        info!("websocket closed");
        self.inner.emit(SessionEvent::Closed);
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// The owner event stream. Only the first call gets it.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.inner
            .events_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Registered topics in sorted order
    pub fn subscribed_topics(&self) -> Vec<String> {
        self.inner.subscribed_topics()
    }
}

impl<C: WsCodec> Inner<C> {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), ExchangeError> {
        if self.is_closed() {
            Err(ExchangeError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    // Closed is terminal
    fn set_state(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next || *current == SessionState::Closed {
                return false;
            }
            trace!(exchange = %self.config.exchange_name, from = ?*current, to = ?next, "state change");
            *current = next;
            true
        });
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn callbacks_mut(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, TopicCallback>> {
        self.callbacks.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribed_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        topics.sort();
        topics
    }

    fn callback_for(&self, topic: &str) -> Option<TopicCallback> {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .cloned()
    }

    /// Write a frame on an established connection. A failed write hands the
    /// connection to recovery.
    async fn send_message(self: &Arc<Self>, message: Message) -> Result<(), ExchangeError> {
        self.ensure_open()?;
        if self.state() != SessionState::Connected {
            return Err(ExchangeError::NotConnected);
        }
        let result = self.write_frame(message).await;
        if let Err(e) = &result {
            warn!(exchange = %self.config.exchange_name, error = %e, "write failed");
            self.set_state(SessionState::Disconnected);
            spawn_recovery(self);
        }
        result
    }

    async fn write_frame(&self, message: Message) -> Result<(), ExchangeError> {
        let mut writer = self.writer.lock().await;
        let sink = writer.as_mut().ok_or(ExchangeError::NotConnected)?;
        sink.send(message)
            .await
            .map_err(|e| ExchangeError::WsSend(e.to_string()))
    }

    /// Authenticate and replay registered subscriptions on a fresh socket
    async fn handshake(&self) -> Result<(), ExchangeError> {
        if let Some(auth) = &self.config.auth {
            if let Some(frame) = self.codec.encode_auth(auth)? {
                self.write_frame(frame).await?;
                debug!(exchange = %self.config.exchange_name, "auth frame sent");
            }
        }

        let topics = self.subscribed_topics();
        if !topics.is_empty() {
            let frame = self.codec.encode_subscription(&topics)?;
            self.write_frame(frame).await?;
            debug!(exchange = %self.config.exchange_name, count = topics.len(), "resubscribed");
        }
        Ok(())
    }

    /// Stop both tasks, close the socket and move to `next`
    async fn teardown(&self, next: SessionState) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let (keep_alive, reader) = {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            (tasks.keep_alive.take(), tasks.reader.take())
        };
        for handle in [keep_alive, reader].into_iter().flatten() {
            handle.abort();
            let _ = handle.await;
        }

        if let Some(mut sink) = self.writer.lock().await.take() {
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        }
        *self.reader.lock().await = None;
        self.set_state(next);
    }

    fn handle_frame(&self, message: &Message) {
        match self.codec.decode_message(message) {
            Ok(WsEvent::Data { topic, payload }) => match self.callback_for(&topic) {
                Some(callback) => match self.config.dispatch {
                    DispatchMode::Spawned => {
                        tokio::spawn(async move { callback(payload) });
                    }
                    DispatchMode::Inline => {
                        // a panicking handler must not take the read task down with it
                        if panic::catch_unwind(AssertUnwindSafe(|| callback(payload))).is_err() {
                            warn!(exchange = %self.config.exchange_name, topic = %topic, "topic callback panicked");
                        }
                    }
                },
                None => trace!(exchange = %self.config.exchange_name, topic = %topic, "no handler for topic"),
            },
            Ok(WsEvent::Control(response)) => {
                if response.is_failure() {
                    let reason = response
                        .message
                        .clone()
                        .unwrap_or_else(|| "request rejected".to_string());
                    warn!(exchange = %self.config.exchange_name, op = %response.op, reason = %reason, "control request failed");
                    if response.op == "auth" {
                        self.emit(SessionEvent::AuthRejected(reason));
                    }
                } else {
                    trace!(exchange = %self.config.exchange_name, op = %response.op, "control response");
                }
            }
            Ok(WsEvent::Ignored) => {}
            Err(e) => warn!(exchange = %self.config.exchange_name, error = %e, "failed to decode frame"),
        }
    }
}

async fn dial(config: &WsSessionConfig) -> Result<WsStream, ExchangeError> {
    let (stream, _) = tokio::time::timeout(config.connect_timeout, connect_async(config.url.as_str()))
        .await
        .map_err(|_| {
            ExchangeError::Timeout(format!(
                "WebSocket connection to {} timed out",
                config.url
            ))
        })?
        .map_err(|e| ExchangeError::WsConnect(e.to_string()))?;
    Ok(stream)
}

/// Open a socket and bring the session to Connected
async fn establish<C: WsCodec>(inner: Arc<Inner<C>>) -> Result<(), ExchangeError> {
    inner.ensure_open()?;
    inner.set_state(SessionState::Connecting);

    let stream = match dial(&inner.config).await {
        Ok(stream) => stream,
        Err(e) => {
            inner.set_state(SessionState::Disconnected);
            return Err(e);
        }
    };
    let (sink, source) = stream.split();
    *inner.writer.lock().await = Some(sink);
    *inner.reader.lock().await = Some(source);

    if let Err(e) = inner.handshake().await {
        inner.teardown(SessionState::Disconnected).await;
        return Err(e);
    }

    inner.set_state(SessionState::Connected);
    let keep_alive = tokio::spawn(keep_alive(Arc::clone(&inner)));
    let reader = tokio::spawn(read_loop(Arc::clone(&inner)));
    {
        let mut tasks = inner.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.keep_alive = Some(keep_alive);
        tasks.reader = Some(reader);
    }

    // close() may have run while we were dialing
    if inner.is_closed() {
        inner.teardown(SessionState::Closed).await;
        return Err(ExchangeError::SessionClosed);
    }
    Ok(())
}

/// Tear down and redial up to `reconnect_attempts` times
async fn reconnect_with_retry<C: WsCodec>(inner: &Arc<Inner<C>>) -> Result<(), ExchangeError> {
    inner.teardown(SessionState::Disconnected).await;

    let attempts = inner.config.reconnect_attempts.max(1);
    let strategy = FixedInterval::new(inner.config.reconnect_delay).take(attempts as usize - 1);
    let result = RetryIf::spawn(
        strategy,
        || {
            let inner = Arc::clone(inner);
            async move {
                let result = establish(inner).await;
                if let Err(e) = &result {
                    warn!(error = %e, "reconnect attempt failed");
                }
                result
            }
        },
        |e: &ExchangeError| !matches!(e, ExchangeError::SessionClosed),
    )
    .await;

    match result {
        Ok(()) => {
            info!(exchange = %inner.config.exchange_name, "websocket reconnected");
            Ok(())
        }
        Err(ExchangeError::SessionClosed) => Err(ExchangeError::SessionClosed),
        Err(_) => {
            warn!(exchange = %inner.config.exchange_name, attempts, "giving up on reconnect");
            inner.set_state(SessionState::Disconnected);
            inner.emit(SessionEvent::ReconnectFailed { attempts });
            Err(ExchangeError::ReconnectExhausted { attempts })
        }
    }
}

// Boxed so the task graph read_loop -> recover -> establish -> read_loop has a
// nameable type.
fn recover<C: WsCodec>(inner: Arc<Inner<C>>, generation: u64) -> BoxFuture<'static, ()> {
    async move {
        let _guard = inner.reconnect_lock.lock().await;
        if inner.is_closed() {
            return;
        }
        if inner.generation.load(Ordering::SeqCst) != generation {
            debug!(exchange = %inner.config.exchange_name, "connection already replaced, skipping recovery");
            return;
        }

        info!(exchange = %inner.config.exchange_name, "connection lost, reconnecting");
        if reconnect_with_retry(&inner).await.is_ok() {
            inner.emit(SessionEvent::Reconnected);
        }
    }
    .boxed()
}

fn spawn_recovery<C: WsCodec>(inner: &Arc<Inner<C>>) {
    let generation = inner.generation.load(Ordering::SeqCst);
    tokio::spawn(recover(Arc::clone(inner), generation));
}

async fn keep_alive<C: WsCodec>(inner: Arc<Inner<C>>) {
    let mut ticker = tokio::time::interval(inner.config.ping_interval);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if inner.state() != SessionState::Connected {
            continue;
        }

        let sent = match inner.codec.encode_ping() {
            Ok(frame) => inner.write_frame(frame).await,
            Err(e) => Err(e),
        };
        match sent {
            Ok(()) => trace!(exchange = %inner.config.exchange_name, "ping sent"),
            Err(e) => {
                warn!(exchange = %inner.config.exchange_name, error = %e, "ping failed");
                if !inner.is_closed() {
                    spawn_recovery(&inner);
                }
                return;
            }
        }
    }
}

async fn read_loop<C: WsCodec>(inner: Arc<Inner<C>>) {
    let mut reader = inner.reader.lock().await;
    let failure = loop {
        let Some(source) = reader.as_mut() else {
            break ExchangeError::WsRead("no reader available".to_string());
        };
        match source.next().await {
            Some(Ok(Message::Close(frame))) => {
                break ExchangeError::WsRead(format!("closed by peer: {:?}", frame));
            }
            // protocol pings are answered by tungstenite itself
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Ok(message)) => inner.handle_frame(&message),
            Some(Err(e)) => break ExchangeError::WsRead(e.to_string()),
            None => break ExchangeError::WsRead("stream ended".to_string()),
        }
    };
    *reader = None;
    drop(reader);

    if inner.is_closed() {
        return;
    }
    warn!(exchange = %inner.config.exchange_name, error = %failure, "websocket read failed");
    inner.set_state(SessionState::Disconnected);
    inner.emit(SessionEvent::ReadFailed(failure.to_string()));
    spawn_recovery(&inner);
}
