/// Kernel - exchange-agnostic transport layer
///
/// Everything an exchange binding needs to talk to its venue lives here; the
/// bindings under `exchanges` only contribute URLs, a signer and a codec.
///
/// # Components
///
/// ## Request pipeline
/// - `RestClient` / `ReqwestRest`: encode params, throttle, sign, execute
/// - `EndpointRateLimiter`: per-endpoint token buckets
/// - `RestResponse`: raw body, status and classified HTTP error
///
/// ## Authentication
/// - `Signer`: pluggable request signing producing a `SignedEnvelope`
/// - `hmac_sha256_hex`, `sorted_param_string`: shared building blocks
///
/// ## Streaming
/// - `WsSession`: keep-alive, reconnection, subscribe/unsubscribe, dispatch
/// - `WsCodec`: exchange-specific frame encoding/decoding
///
/// # Example
/// ```rust,no_run
/// use cryptokit::core::kernel::*;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), cryptokit::ExchangeError> {
/// let config = RestClientConfig::new("https://api.bybit.com".to_string(), "bybit".to_string());
/// let rest = RestClientBuilder::new(config)
///     .with_rate_limiter(Arc::new(EndpointRateLimiter::default()))
///     .build()?;
///
/// let response = rest.get("/v5/market/time", &Params::new(), false).await?;
/// let body: serde_json::Value = response.json()?;
/// println!("{}", body);
/// # Ok(())
/// # }
/// ```
pub mod codec;
pub mod rate_limit;
pub mod response;
pub mod rest;
pub mod signer;
pub mod ws;

// Re-export key types for convenience
pub use codec::{ControlResponse, WsCodec, WsEvent};
pub use rate_limit::{default_quota, endpoint_key, EndpointRateLimiter};
pub use response::RestResponse;
pub use rest::{
    encode_query, to_params, PostEncoding, ReqwestRest, RestClient, RestClientBuilder,
    RestClientConfig,
};
pub use signer::{hmac_sha256_hex, sorted_param_string, Params, SignedEnvelope, Signer};
pub use ws::{
    DispatchMode, SessionEvent, SessionState, TopicCallback, WsAuth, WsSession, WsSessionConfig,
};
