use crate::core::errors::ExchangeError;
use crate::core::kernel::rate_limit::{endpoint_key, EndpointRateLimiter};
use crate::core::kernel::response::RestResponse;
use crate::core::kernel::signer::{param_value_string, Params, Signer};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, trace, warn};

/// REST client trait for making HTTP requests
///
/// A single `request` entry point does the work; the typed helpers are thin
/// wrappers over it.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Execute a request and read the whole response
    ///
    /// # Arguments
    /// * `method` - GET, POST, PUT or DELETE
    /// * `endpoint` - The API endpoint path
    /// * `params` - Request parameters, encoded per method
    /// * `authenticated` - Whether to sign the request
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
        authenticated: bool,
    ) -> Result<RestResponse, ExchangeError>;

    async fn get(
        &self,
        endpoint: &str,
        params: &Params,
        authenticated: bool,
    ) -> Result<RestResponse, ExchangeError> {
        self.request(Method::GET, endpoint, params, authenticated)
            .await
    }

    async fn post(
        &self,
        endpoint: &str,
        params: &Params,
        authenticated: bool,
    ) -> Result<RestResponse, ExchangeError> {
        self.request(Method::POST, endpoint, params, authenticated)
            .await
    }

    /// GET and decode the body into `T`
    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        params: &Params,
        authenticated: bool,
    ) -> Result<T, ExchangeError> {
        self.get(endpoint, params, authenticated).await?.json()
    }

    /// POST and decode the body into `T`
    async fn post_json<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        params: &Params,
        authenticated: bool,
    ) -> Result<T, ExchangeError> {
        self.post(endpoint, params, authenticated).await?.json()
    }
}

/// Where POST/PUT parameters travel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PostEncoding {
    /// JSON object body
    #[default]
    Json,
    /// URL query string, empty body
    Query,
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API, fixed for the client's lifetime
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
    pub post_encoding: PostEncoding,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: 30,
            user_agent: format!("cryptokit/{}", env!("CARGO_PKG_VERSION")),
            post_encoding: PostEncoding::Json,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_post_encoding(mut self, post_encoding: PostEncoding) -> Self {
        self.post_encoding = post_encoding;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    rate_limiter: Option<Arc<EndpointRateLimiter>>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            rate_limiter: None,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Throttle requests through `rate_limiter`. Clients built with the same
    /// limiter share its buckets.
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<EndpointRateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()?;

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
            rate_limiter: self.rate_limiter,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    rate_limiter: Option<Arc<EndpointRateLimiter>>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Percent-encoded `k=v&k=v` in key order
pub fn encode_query(params: &Params) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, &param_value_string(value));
    }
    serializer.finish()
}

/// Flatten a serializable request struct into `Params`
pub fn to_params<T: serde::Serialize>(request: &T) -> Result<Params, ExchangeError> {
    let value = serde_json::to_value(request).map_err(|e| {
        ExchangeError::SerializationError(format!("Failed to serialize request: {}", e))
    })?;
    match value {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(ExchangeError::InvalidParameters(format!(
            "Request must serialize to an object, got {}",
            other
        ))),
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn exchange_name(&self) -> &str {
        &self.config.exchange_name
    }

    fn timestamp() -> u64 {
        chrono::Utc::now().timestamp_millis() as u64
    }

    fn build_url(&self, endpoint: &str, query_string: &str) -> String {
        if query_string.is_empty() {
            format!("{}{}", self.config.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.config.base_url, endpoint, query_string)
        }
    }

    /// Split params into (query string, body) for the given method
    fn encode_params(
        &self,
        method: &Method,
        params: &Params,
    ) -> Result<(String, Vec<u8>), ExchangeError> {
        match *method {
            Method::GET | Method::DELETE => Ok((encode_query(params), Vec::new())),
            Method::POST | Method::PUT => match self.config.post_encoding {
                PostEncoding::Json => {
                    let body = serde_json::to_vec(params).map_err(|e| {
                        ExchangeError::SerializationError(format!(
                            "Failed to serialize request body: {}",
                            e
                        ))
                    })?;
                    Ok((String::new(), body))
                }
                PostEncoding::Query => Ok((encode_query(params), Vec::new())),
            },
            _ => Err(ExchangeError::InvalidParameters(format!(
                "Unsupported HTTP method: {}",
                method
            ))),
        }
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, params), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint, param_count = params.len()))]
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
        authenticated: bool,
    ) -> Result<RestResponse, ExchangeError> {
        let (mut query_string, body) = self.encode_params(&method, params)?;

        let signer = if authenticated {
            Some(self.signer.as_ref().ok_or_else(|| {
                ExchangeError::AuthError(
                    "Authentication required but no signer provided".to_string(),
                )
            })?)
        } else {
            None
        };

        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire(&endpoint_key(&method, endpoint)).await;
        }

        let mut headers = Vec::new();
        if let Some(signer) = signer {
            let envelope = signer.sign_request(
                method.as_str(),
                endpoint,
                &query_string,
                &body,
                Self::timestamp(),
            )?;
            if let Some(signed_query) = envelope.query_string {
                query_string = signed_query;
            }
            headers.extend(envelope.headers);
        }

        // The query string goes on the wire verbatim so it matches what was signed
        let url = self.build_url(endpoint, &query_string);
        let mut request = self.client.request(method, &url);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        if !body.is_empty() {
            request = request
                .header("Content-Type", "application/json")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        trace!(status = %status, body = %String::from_utf8_lossy(&bytes), "response received");

        let response = RestResponse::from_parts(status, bytes.to_vec());
        if let Some(err) = response.error() {
            warn!(status = err.status, kind = %err.kind, "request failed");
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(post_encoding: PostEncoding) -> ReqwestRest {
        let config = RestClientConfig::new("https://example.test".to_string(), "test".to_string())
            .with_post_encoding(post_encoding);
        RestClientBuilder::new(config).build().unwrap()
    }

    fn params() -> Params {
        let mut params = Params::new();
        params.insert("symbol".to_string(), json!("BTCUSDT"));
        params.insert("limit".to_string(), json!(10));
        params
    }

    #[test]
    fn test_get_encodes_sorted_query() {
        let (query, body) = client(PostEncoding::Json)
            .encode_params(&Method::GET, &params())
            .unwrap();
        assert_eq!(query, "limit=10&symbol=BTCUSDT");
        assert!(body.is_empty());
    }

    #[test]
    fn test_post_json_body() {
        let (query, body) = client(PostEncoding::Json)
            .encode_params(&Method::POST, &params())
            .unwrap();
        assert!(query.is_empty());
        assert_eq!(body, br#"{"limit":10,"symbol":"BTCUSDT"}"#.to_vec());
    }

    #[test]
    fn test_post_query_encoding() {
        let (query, body) = client(PostEncoding::Query)
            .encode_params(&Method::POST, &params())
            .unwrap();
        assert_eq!(query, "limit=10&symbol=BTCUSDT");
        assert!(body.is_empty());
    }

    #[test]
    fn test_unsupported_method() {
        let result = client(PostEncoding::Json).encode_params(&Method::PATCH, &params());
        assert!(matches!(result, Err(ExchangeError::InvalidParameters(_))));
    }

    #[test]
    fn test_query_values_are_percent_encoded() {
        let mut params = Params::new();
        params.insert("note".to_string(), json!("a b&c"));
        assert_eq!(encode_query(&params), "note=a+b%26c");
    }

    #[test]
    fn test_to_params_flattens_struct() {
        #[derive(serde::Serialize)]
        struct Request {
            symbol: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            price: Option<String>,
        }
        let params = to_params(&Request {
            symbol: "BTCUSDT",
            price: None,
        })
        .unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params["symbol"], json!("BTCUSDT"));
        assert!(matches!(
            to_params(&vec![1, 2]),
            Err(ExchangeError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_to_params_reports_serialization_failure() {
        // JSON object keys must be strings
        let request = std::collections::BTreeMap::from([(vec![1u8], 1u8)]);
        assert!(matches!(
            to_params(&request),
            Err(ExchangeError::SerializationError(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticated_without_signer() {
        let result = client(PostEncoding::Json)
            .get("/private", &Params::new(), true)
            .await;
        assert!(matches!(result, Err(ExchangeError::AuthError(_))));
    }
}
