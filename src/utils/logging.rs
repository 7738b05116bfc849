use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. `RUST_LOG` controls filtering; `json`
/// switches to one JSON object per line.
///
/// Returns `false` when a subscriber was already installed, which lets
/// tests and binaries call this unconditionally.
pub fn init_logging(json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_refused() {
        init_logging(false);
        assert!(!init_logging(true));
    }
}
