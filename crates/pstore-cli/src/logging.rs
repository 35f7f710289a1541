use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;

/// Fixed verbosity; the tool takes no flags and reads no environment.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the global stderr subscriber consumed by the init log collector.
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(DEFAULT_DIRECTIVE).context("invalid log directive")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}
