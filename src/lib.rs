pub mod core;
pub mod exchanges;
pub mod utils;

pub use crate::core::config::{ConfigError, ExchangeConfig};
pub use crate::core::errors::{ExchangeError, HttpError, HttpErrorKind};
pub use crate::core::kernel::{
    Params, RestClient, RestResponse, SessionEvent, SessionState, WsSession, WsSessionConfig,
};
pub use utils::{init_logging, rest_client_for, ExchangeKind};
