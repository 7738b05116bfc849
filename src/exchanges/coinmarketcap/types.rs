use crate::core::errors::ExchangeError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct CmcStatus {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub error_code: i64,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub elapsed: Option<u64>,
    #[serde(default)]
    pub credit_count: Option<u64>,
}

/// `{status, data}` envelope
#[derive(Debug, Clone, Deserialize)]
pub struct CmcResponse {
    pub status: CmcStatus,
    #[serde(default)]
    pub data: Value,
}

impl CmcResponse {
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ExchangeError> {
        if self.status.error_code != 0 {
            return Err(ExchangeError::ApiError {
                code: self.status.error_code,
                message: self.status.error_message.unwrap_or_default(),
            });
        }
        Ok(serde_json::from_value(self.data)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmcKeyInfo {
    pub plan: Value,
    pub usage: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmcIdMapEntry {
    pub id: u64,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub is_active: Option<u8>,
    #[serde(default)]
    pub first_historical_data: Option<String>,
    #[serde(default)]
    pub last_historical_data: Option<String>,
    #[serde(default)]
    pub platform: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmcQuote {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
    #[serde(default)]
    pub percent_change_1h: Option<f64>,
    #[serde(default)]
    pub percent_change_24h: Option<f64>,
    #[serde(default)]
    pub percent_change_7d: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmcListing {
    pub id: u64,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub cmc_rank: Option<u32>,
    #[serde(default)]
    pub quote: HashMap<String, CmcQuote>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimePeriod {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    TwentyFourHours,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GainersLosersSort {
    #[serde(rename = "percent_change_1h")]
    PercentChange1h,
    #[serde(rename = "percent_change_24h")]
    PercentChange24h,
    #[serde(rename = "percent_change_7d")]
    PercentChange7d,
    #[serde(rename = "percent_change_30d")]
    PercentChange30d,
}

/// Query for `/v1/cryptocurrency/map`
#[derive(Debug, Clone, Default, Serialize)]
pub struct MapParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux: Option<String>,
}

/// Query for `/v2/cryptocurrency/info`. At least one of `id`, `slug` or
/// `symbol` must be set; list values are comma separated on the wire.
#[derive(Debug, Clone, Default)]
pub struct InfoParams {
    pub id: Vec<u64>,
    pub slug: Vec<String>,
    pub symbol: Vec<String>,
    pub address: Option<String>,
    pub skip_invalid: Option<bool>,
    pub aux: Vec<String>,
}

/// Query for `/v1/cryptocurrency/listings/latest`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListingsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_dir: Option<SortDir>,
}

/// Query for `/v1/cryptocurrency/trending/gainers-losers`
#[derive(Debug, Clone, Default, Serialize)]
pub struct GainersLosersParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_period: Option<TimePeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<GainersLosersSort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_dir: Option<SortDir>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_error() {
        let response: CmcResponse = serde_json::from_value(json!({
            "status": {
                "timestamp": "2024-01-01T00:00:00.000Z",
                "error_code": 1002,
                "error_message": "API key missing.",
                "elapsed": 0,
                "credit_count": 0
            }
        }))
        .unwrap();
        match response.into_result::<Value>() {
            Err(ExchangeError::ApiError { code, message }) => {
                assert_eq!(code, 1002);
                assert_eq!(message, "API key missing.");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_listing_decodes_quotes() {
        let listing: CmcListing = serde_json::from_value(json!({
            "id": 1,
            "name": "Bitcoin",
            "symbol": "BTC",
            "slug": "bitcoin",
            "cmc_rank": 1,
            "quote": {"USD": {"price": 43000.5, "percent_change_24h": 1.2}}
        }))
        .unwrap();
        assert_eq!(listing.quote["USD"].price, Some(43000.5));
        assert!(listing.quote["USD"].market_cap.is_none());
    }

    #[test]
    fn test_enum_wire_names() {
        let params = GainersLosersParams {
            time_period: Some(TimePeriod::SevenDays),
            sort: Some(GainersLosersSort::PercentChange24h),
            sort_dir: Some(SortDir::Desc),
            ..GainersLosersParams::default()
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"time_period": "7d", "sort": "percent_change_24h", "sort_dir": "desc"})
        );
    }
}
