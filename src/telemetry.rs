use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global JSON subscriber
///
/// `RUST_LOG` wins over `default_filter`. `log` records from actix and the
/// request logger are bridged in by `init()`. Calling this twice is an
/// error, so tests use `try_init_telemetry`.
pub fn init_telemetry(default_filter: &str) {
    subscriber(default_filter).init();
}

/// Like `init_telemetry`, but a subscriber already being installed is fine
pub fn try_init_telemetry(default_filter: &str) {
    let _ = subscriber(default_filter).try_init();
}

fn subscriber(default_filter: &str) -> impl SubscriberInitExt {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
}
