//! Tracing subscriber setup
//!
//! Every binary calls [`init_tracing`] once before doing anything else. The filter
//! comes from `RUST_LOG` when set, otherwise from the caller's default.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// Safe to call more than once; later calls are ignored (tests call it freely).
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        //! A second installation attempt must not panic
        init_tracing("debug");
        init_tracing("info");
        tracing::info!("[TEST] subscriber installed");
    }
}
