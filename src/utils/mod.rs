pub mod exchange_factory;
pub mod logging;

pub use exchange_factory::{rest_client_for, ExchangeKind};
pub use logging::init_logging;
