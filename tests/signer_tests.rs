use cryptokit::core::kernel::{hmac_sha256_hex, sorted_param_string, Params, Signer};
use cryptokit::exchanges::binance::BinanceSigner;
use cryptokit::exchanges::bybit::BybitSigner;
use cryptokit::exchanges::coinmarketcap::CmcKeySigner;
use cryptokit::exchanges::kucoin::KucoinSigner;
use serde_json::json;

const TIMESTAMP: u64 = 1_700_000_000_000;

#[test]
fn test_hmac_known_vectors() {
    assert_eq!(
        hmac_sha256_hex("s", ""),
        "64eca07cce67929c357d63d0a4aec207e774800403298914fc04e88ce02ac49f"
    );
    // RFC 4231 test case 2
    assert_eq!(
        hmac_sha256_hex("Jefe", "what do ya want for nothing?"),
        "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
    );
}

#[test]
fn test_signatures_depend_on_every_input() {
    let signer = BybitSigner::new("key".to_string(), "secret".to_string(), 5000);
    let base = signer
        .sign_request("GET", "/v5/market/time", "a=1", &[], TIMESTAMP)
        .unwrap();
    let again = signer
        .sign_request("GET", "/v5/market/time", "a=1", &[], TIMESTAMP)
        .unwrap();
    assert_eq!(base, again);

    let other_query = signer
        .sign_request("GET", "/v5/market/time", "a=2", &[], TIMESTAMP)
        .unwrap();
    let other_time = signer
        .sign_request("GET", "/v5/market/time", "a=1", &[], TIMESTAMP + 1)
        .unwrap();
    let other_secret = BybitSigner::new("key".to_string(), "other".to_string(), 5000)
        .sign_request("GET", "/v5/market/time", "a=1", &[], TIMESTAMP)
        .unwrap();
    assert_ne!(base.signature, other_query.signature);
    assert_ne!(base.signature, other_time.signature);
    assert_ne!(base.signature, other_secret.signature);
}

#[test]
fn test_binance_signature_covers_recv_window_and_timestamp() {
    let signer = BinanceSigner::new("key".to_string(), "secret".to_string(), 5000);
    let envelope = signer
        .sign_request("GET", "/fapi/v2/account", "", &[], TIMESTAMP)
        .unwrap();

    let payload = "recvWindow=5000&timestamp=1700000000000";
    assert_eq!(envelope.signature, hmac_sha256_hex("secret", payload));
    assert_eq!(
        envelope.query_string.as_deref(),
        Some(format!("{}&signature={}", payload, envelope.signature).as_str())
    );
    assert_eq!(envelope.headers["X-MBX-APIKEY"], "key");
}

#[test]
fn test_sorted_params_ignore_insertion_order() {
    let mut params = Params::new();
    params.insert("symbol".to_string(), json!("BTCUSDT"));
    params.insert("limit".to_string(), json!(50));
    params.insert("active".to_string(), json!(true));
    assert_eq!(
        sorted_param_string(&params),
        "active=true&limit=50&symbol=BTCUSDT"
    );

    let signer = KucoinSigner::new("key".to_string(), "secret".to_string(), 5000);
    let from_query = signer
        .sign_request("GET", "/api/v1/accounts", "symbol=BTCUSDT&limit=50&active=true", &[], 1)
        .unwrap();
    assert_eq!(
        from_query.signature,
        hmac_sha256_hex("secret", "active=true&limit=50&symbol=BTCUSDT")
    );
}

#[test]
fn test_api_key_only_scheme() {
    let envelope = CmcKeySigner::new("cmc-key".to_string())
        .sign_request("GET", "/v1/key/info", "", &[], TIMESTAMP)
        .unwrap();
    assert!(envelope.signature.is_empty());
    assert_eq!(envelope.headers["X-CMC_PRO_API_KEY"], "cmc-key");
    assert!(envelope.query_string.is_none());
}
