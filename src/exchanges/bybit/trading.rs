use crate::core::errors::ExchangeError;
use crate::core::kernel::{to_params, RestClient};
use crate::exchanges::bybit::types::{BybitOrderRequest, BybitOrderResponse, BybitResponse};
use tracing::{error, instrument};

/// Signed order endpoints
#[derive(Debug, Clone)]
pub struct BybitTrade<R: RestClient> {
    rest: R,
}

impl<R: RestClient> BybitTrade<R> {
    pub fn new(rest: R) -> Self {
        Self { rest }
    }

    #[instrument(skip(self, order), fields(exchange = "bybit", symbol = %order.symbol, side = %order.side, order_type = %order.order_type))]
    pub async fn create_order(
        &self,
        order: &BybitOrderRequest,
    ) -> Result<BybitOrderResponse, ExchangeError> {
        let params = to_params(order)?;
        let response: BybitResponse = self
            .rest
            .post_json("/v5/order/create", &params, true)
            .await?;
        if !response.is_ok() {
            error!(code = response.ret_code, message = %response.ret_msg, "order rejected");
        }
        response.into_result()
    }
}
