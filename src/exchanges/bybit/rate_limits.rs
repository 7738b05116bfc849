//! Published Bybit v5 per-endpoint request limits.

use crate::core::kernel::rate_limit::{default_quota, EndpointRateLimiter};
use governor::Quota;
use nonzero_ext::nonzero;
use std::sync::{Arc, OnceLock};

/// Endpoint keys and their quotas
pub fn endpoint_quotas() -> Vec<(&'static str, Quota)> {
    vec![
        // Orders
        ("POST /v5/order/create", Quota::per_second(nonzero!(10u32))),
        ("POST /v5/order/amend", Quota::per_second(nonzero!(10u32))),
        ("POST /v5/order/cancel", Quota::per_second(nonzero!(10u32))),
        ("POST /v5/order/cancel-all", Quota::per_second(nonzero!(10u32))),
        ("GET /v5/order/realtime", Quota::per_second(nonzero!(10u32))),
        ("GET /v5/order/history", Quota::per_second(nonzero!(10u32))),
        ("GET /v5/execution/list", Quota::per_second(nonzero!(10u32))),
        // Position
        ("GET /v5/position/list", Quota::per_second(nonzero!(10u32))),
        ("GET /v5/position/closed-pnl", Quota::per_second(nonzero!(10u32))),
        ("POST /v5/position/set-leverage", Quota::per_second(nonzero!(10u32))),
        // Account
        ("GET /v5/account/wallet-balance", Quota::per_second(nonzero!(20u32))),
        ("GET /v5/account/fee-rate", Quota::per_second(nonzero!(10u32))),
        // Asset
        ("GET /v5/asset/transfer/query-asset-info", Quota::per_minute(nonzero!(60u32))),
        ("GET /v5/asset/transfer/query-transfer-coin-list", Quota::per_minute(nonzero!(60u32))),
        ("GET /v5/asset/transfer/query-inter-transfer-list", Quota::per_minute(nonzero!(60u32))),
        ("GET /v5/asset/transfer/query-sub-member-list", Quota::per_minute(nonzero!(60u32))),
        ("GET /v5/asset/transfer/query-universal-transfer-list", Quota::per_second(nonzero!(5u32))),
        ("GET /v5/asset/transfer/query-account-coins-balance", Quota::per_second(nonzero!(5u32))),
        ("GET /v5/asset/deposit/query-record", Quota::per_second(nonzero!(100u32))),
        ("GET /v5/asset/deposit/query-sub-member-record", Quota::per_second(nonzero!(300u32))),
        ("GET /v5/asset/deposit/query-address", Quota::per_second(nonzero!(300u32))),
        ("GET /v5/asset/deposit/query-sub-member-address", Quota::per_second(nonzero!(300u32))),
        ("GET /v5/asset/withdraw/query-record", Quota::per_second(nonzero!(300u32))),
        ("GET /v5/asset/coin/query-info", Quota::per_second(nonzero!(2u32))),
        ("GET /v5/asset/exchange/order-record", Quota::per_second(nonzero!(600u32))),
        ("POST /v5/asset/transfer/inter-transfer", Quota::per_minute(nonzero!(20u32))),
        ("POST /v5/asset/transfer/save-transfer-sub-member", Quota::per_second(nonzero!(20u32))),
        ("POST /v5/asset/transfer/universal-transfer", Quota::per_second(nonzero!(5u32))),
        ("POST /v5/asset/withdraw/create", Quota::per_second(nonzero!(1u32))),
        ("POST /v5/asset/withdraw/cancel", Quota::per_minute(nonzero!(60u32))),
        // User
        ("POST /v5/user/create-sub-member", Quota::per_second(nonzero!(5u32))),
        ("POST /v5/user/create-sub-api", Quota::per_second(nonzero!(5u32))),
        ("POST /v5/user/frozen-sub-member", Quota::per_second(nonzero!(5u32))),
        ("POST /v5/user/update-api", Quota::per_second(nonzero!(5u32))),
        ("POST /v5/user/update-sub-api", Quota::per_second(nonzero!(5u32))),
        ("POST /v5/user/delete-api", Quota::per_second(nonzero!(5u32))),
        ("POST /v5/user/delete-sub-api", Quota::per_second(nonzero!(5u32))),
        ("GET /v5/user/query-sub-members", Quota::per_second(nonzero!(10u32))),
        ("GET /v5/user/query-api", Quota::per_second(nonzero!(10u32))),
        // Spot leverage token
        ("GET /v5/spot-lever-token/order-record", Quota::per_second(nonzero!(50u32))),
        ("POST /v5/spot-lever-token/purchase", Quota::per_second(nonzero!(20u32))),
        ("POST /v5/spot-lever-token/redeem", Quota::per_second(nonzero!(20u32))),
        // Spot margin trade (classic)
        ("GET /v5/spot-cross-margin-trade/loan-info", Quota::per_second(nonzero!(50u32))),
        ("GET /v5/spot-cross-margin-trade/account", Quota::per_second(nonzero!(50u32))),
        ("GET /v5/spot-cross-margin-trade/orders", Quota::per_second(nonzero!(50u32))),
        ("GET /v5/spot-cross-margin-trade/repay-history", Quota::per_second(nonzero!(50u32))),
        ("POST /v5/spot-cross-margin-trade/loan", Quota::per_second(nonzero!(20u32))),
        ("POST /v5/spot-cross-margin-trade/repay", Quota::per_second(nonzero!(20u32))),
        ("POST /v5/spot-cross-margin-trade/switch", Quota::per_second(nonzero!(20u32))),
    ]
}

/// A fresh limiter loaded with the Bybit table
pub fn new_rate_limiter() -> EndpointRateLimiter {
    EndpointRateLimiter::new(default_quota()).with_overrides(endpoint_quotas())
}

static SHARED: OnceLock<Arc<EndpointRateLimiter>> = OnceLock::new();

/// Process-wide limiter shared by every Bybit client
pub fn shared_rate_limiter() -> Arc<EndpointRateLimiter> {
    Arc::clone(SHARED.get_or_init(|| Arc::new(new_rate_limiter())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_instance_is_reused() {
        assert!(Arc::ptr_eq(&shared_rate_limiter(), &shared_rate_limiter()));
    }

    #[test]
    fn test_order_create_allows_burst_of_ten() {
        let limiter = new_rate_limiter();
        for _ in 0..10 {
            assert!(limiter.check("POST /v5/order/create"));
        }
        assert!(!limiter.check("POST /v5/order/create"));
    }

    #[test]
    fn test_unlisted_endpoint_uses_default() {
        let limiter = new_rate_limiter();
        assert_eq!(limiter.quota_for("GET /v5/market/time"), default_quota());
        assert!(limiter.check("GET /v5/market/time"));
        assert!(!limiter.check("GET /v5/market/time"));
    }
}
