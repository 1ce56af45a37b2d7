use tracing_subscriber::{EnvFilter, fmt, prelude::*};

type InitResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Initialize a tracing subscriber with default configuration.
///
/// Uses the `RUST_LOG` environment variable to determine the log level,
/// defaulting to "info" if not set.
pub fn init() -> InitResult {
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    install(filter_layer)
}

/// Initialize a tracing subscriber with an explicit filter directive,
/// typically `ProviderConfig::log_level`. `RUST_LOG` still wins when set.
pub fn init_with_level(level: &str) -> InitResult {
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    install(filter_layer)
}

fn install(filter_layer: EnvFilter) -> InitResult {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
