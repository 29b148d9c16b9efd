//! Logging and tracing setup.
//!
//! Publication emits structured `tracing` events; this module installs a
//! global subscriber for binaries and tests that want to see them.

use std::sync::Once;
use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static INIT: Once = Once::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// This should be called once at program startup.
/// Subsequent calls are ignored.
pub fn init_tracing() {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        if let Err(e) = tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt_layer)
            .try_init()
        {
            debug!(error = %e, "global subscriber already installed");
        }

        info!("snippet-publish tracing initialized");
    });
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json() {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_current_span(true);

        if let Err(e) = tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt_layer)
            .try_init()
        {
            debug!(error = %e, "global subscriber already installed");
        }

        info!("snippet-publish tracing initialized (JSON mode)");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::trace;

    #[test]
    fn test_init_tracing_once() {
        // Should be callable multiple times without panic
        init_tracing();
        init_tracing();
        init_tracing_json();
    }

    #[test]
    fn test_init_with_existing_subscriber() {
        // A subscriber installed elsewhere must not make init panic.
        let _ = tracing_subscriber::registry().try_init();
        init_tracing();
    }

    #[test]
    fn test_structured_logging() {
        init_tracing();
        let address = 0x1_2345_6789u64;
        debug!(address = format_args!("{:#x}", address), "publishing snippet");
        trace!(slot = 7, "toc write");
    }
}
