#![allow(dead_code)]

use cryptokit::core::config::ExchangeConfig;
use cryptokit::core::kernel::EndpointRateLimiter;
use futures::{SinkExt, StreamExt};
use governor::Quota;
use nonzero_ext::nonzero;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const TEST_API_KEY: &str = "test_api_key";
pub const TEST_SECRET: &str = "test_secret_key";

/// How long a test waits for something that should happen
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Credentials pointed at a mock server
pub fn mock_config(base_url: &str) -> ExchangeConfig {
    ExchangeConfig::new(TEST_API_KEY.to_string(), TEST_SECRET.to_string())
        .base_url(base_url.to_string())
}

/// A limiter that never makes a test wait
pub fn unthrottled() -> Arc<EndpointRateLimiter> {
    Arc::new(EndpointRateLimiter::new(Quota::per_second(nonzero!(1000u32))))
}

pub fn header(request: &wiremock::Request, name: &str) -> String {
    request
        .headers
        .get(name)
        .unwrap_or_else(|| panic!("missing header {}", name))
        .to_str()
        .unwrap()
        .to_string()
}

/// Server side of one accepted WebSocket connection
pub struct ServerConnection {
    // None drops the connection without a close frame
    outbound: mpsc::UnboundedSender<Option<Message>>,
    inbound: mpsc::UnboundedReceiver<Message>,
}

impl ServerConnection {
    pub fn send_json(&self, value: &Value) {
        let _ = self.outbound.send(Some(Message::Text(value.to_string())));
    }

    /// Drop the TCP connection abruptly
    pub fn kill(&self) {
        let _ = self.outbound.send(None);
    }

    /// Next JSON text frame the client sent, panicking after `EVENT_TIMEOUT`
    pub async fn next_json(&mut self) -> Value {
        tokio::time::timeout(EVENT_TIMEOUT, async {
            loop {
                match self.inbound.recv().await {
                    Some(Message::Text(text)) => return serde_json::from_str(&text).unwrap(),
                    Some(_) => continue,
                    None => panic!("client connection ended"),
                }
            }
        })
        .await
        .expect("timed out waiting for a client frame")
    }

    /// Next frame whose `op` is `op`, skipping everything else
    pub async fn next_op(&mut self, op: &str) -> Value {
        loop {
            let frame = self.next_json().await;
            if frame["op"] == op {
                return frame;
            }
        }
    }
}

/// Loopback WebSocket server handing every accepted connection to the test
pub struct LoopbackServer {
    pub url: String,
    connections: mpsc::UnboundedReceiver<ServerConnection>,
    acceptor: JoinHandle<()>,
}

impl LoopbackServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let (tx, connections) = mpsc::unbounded_channel();

        let acceptor = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, tx.clone()));
            }
        });

        Self {
            url,
            connections,
            acceptor,
        }
    }

    pub async fn next_connection(&mut self) -> ServerConnection {
        tokio::time::timeout(EVENT_TIMEOUT, self.connections.recv())
            .await
            .expect("timed out waiting for a client to connect")
            .expect("acceptor stopped")
    }

    /// Stop accepting; further dials are refused
    pub async fn stop_accepting(&self) {
        self.acceptor.abort();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

impl Drop for LoopbackServer {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

async fn serve(stream: TcpStream, connections: mpsc::UnboundedSender<ServerConnection>) {
    let Ok(ws) = accept_async(stream).await else {
        return;
    };
    let (mut sink, mut source) = ws.split();
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound) = mpsc::unbounded_channel();
    if connections.send(ServerConnection { outbound, inbound }).is_err() {
        return;
    }

    loop {
        tokio::select! {
            command = outbound_rx.recv() => match command {
                Some(Some(message)) => {
                    if sink.send(message).await.is_err() {
                        break;
                    }
                }
                _ => break,
            },
            frame = source.next() => match frame {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(message)) => {
                    let _ = inbound_tx.send(message);
                }
            },
        }
    }
}
