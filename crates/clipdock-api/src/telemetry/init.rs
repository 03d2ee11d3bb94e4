use clipdock_core::Config;
use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Install the global tracing subscriber. With `log_format = json` the
/// console output is one JSON object per event.
pub fn init_telemetry(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_new(config.log_filter())?;
    let json = config.log_json();

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?;
    } else {
        let console_fmt = tracing_subscriber::fmt::layer()
            .event_format(Format::default().compact().with_target(false));
        tracing_subscriber::registry()
            .with(filter)
            .with(console_fmt)
            .try_init()?;
    }

    tracing::debug!(json, "Tracing initialized");
    Ok(())
}
