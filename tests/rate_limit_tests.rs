mod common;

use common::mock_config;
use cryptokit::core::kernel::{EndpointRateLimiter, Params, RestClient};
use cryptokit::exchanges::bybit::{self, shared_rate_limiter};
use governor::Quota;
use nonzero_ext::nonzero;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn one_per(period: Duration) -> Quota {
    Quota::with_period(period)
        .unwrap()
        .allow_burst(nonzero!(1u32))
}

#[tokio::test]
async fn test_pipeline_waits_for_endpoint_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let limiter = Arc::new(EndpointRateLimiter::new(one_per(Duration::from_millis(300))));
    let rest = bybit::build_rest_client_with(&mock_config(&server.uri()), Arc::clone(&limiter))
        .unwrap();

    let started = Instant::now();
    rest.get("/v5/market/time", &Params::new(), false).await.unwrap();
    rest.get("/v5/market/time", &Params::new(), false).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(250));

    // other endpoints have their own bucket
    assert!(limiter.check("GET /v5/market/tickers"));
    assert!(!limiter.check("GET /v5/market/time"));
}

#[tokio::test]
async fn test_override_applies_to_one_endpoint() {
    let limiter = EndpointRateLimiter::new(one_per(Duration::from_secs(60)))
        .with_override("GET /fast", Quota::per_second(nonzero!(100u32)));

    for _ in 0..10 {
        assert!(limiter.check("GET /fast"));
    }
    assert!(limiter.check("GET /slow"));
    assert!(!limiter.check("GET /slow"));
}

#[test]
fn test_bybit_published_limits() {
    let limiter = shared_rate_limiter();
    assert_eq!(
        limiter.quota_for("POST /v5/order/create"),
        Quota::per_second(nonzero!(10u32))
    );
    assert_eq!(
        limiter.quota_for("GET /v5/account/wallet-balance"),
        Quota::per_second(nonzero!(20u32))
    );
    assert_eq!(
        limiter.quota_for("GET /v5/unknown"),
        cryptokit::core::kernel::default_quota()
    );
    assert!(Arc::ptr_eq(&limiter, &shared_rate_limiter()));
}
