//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the stackgauge tracing/logging system.
///
/// Reads the `STACKGAUGE_LOG` environment variable for per-subsystem log
/// levels, e.g. `STACKGAUGE_LOG=stack_usage=debug,call_graph=info`.
///
/// Falls back to `stackgauge=info` if `STACKGAUGE_LOG` is not set or is
/// invalid.
///
/// This function is idempotent — calling it multiple times is safe.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("STACKGAUGE_LOG")
            .unwrap_or_else(|_| EnvFilter::new("stackgauge=info"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();
    });
}
