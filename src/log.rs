use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::env::EnvConfig;

/// Installs the global subscriber. Filtering follows `RUST_LOG`, defaulting to `info`.
pub fn init(config: &EnvConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    // Span close events carry busy/idle timings for every instrumented fetch.
    let builder = if config.log_perf {
        builder.with_span_events(FmtSpan::CLOSE)
    } else {
        builder
    };

    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    };
}
