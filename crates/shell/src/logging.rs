use hostbridge::TRACE_TARGET_BRIDGE;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. `RUST_LOG` overrides the `INFO` default.
pub fn init_tracing() -> anyhow::Result<()> {
    let envfilter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env()?
        .add_directive(format!("{TRACE_TARGET_BRIDGE}=warn").parse()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(envfilter))
        .try_init()?;
    Ok(())
}
