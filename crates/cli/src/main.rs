mod commands;
mod config;
mod error;
mod render;

use hub_sync::HttpRemote;

use crate::error::{AppError, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "hub={level},hub_sync={level},engine={level}",
            level = config.level
        ))
        .with_writer(std::io::stderr)
        .init();

    if config.base_url.trim().is_empty() {
        return Err(AppError::Usage(
            "base_url is not set (config/hub.toml, HUB_BASE_URL or --base-url)".to_string(),
        ));
    }
    tracing::debug!(timezone = %config.timezone, offline = config.offline, "config loaded");

    let remote = HttpRemote::new(&config.base_url)?;
    let mut hub = commands::Hub::new(config, remote)?;
    let output = hub.run(command).await?;
    println!("{output}");
    Ok(())
}
