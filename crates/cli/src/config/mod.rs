use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser};
use serde::Deserialize;

use crate::{commands::Command, error::Result};

const DEFAULT_CONFIG_PATH: &str = "config/hub.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment URL of the sheet script.
    pub base_url: String,
    pub timezone: String,
    pub cache_path: String,
    pub settings_path: String,
    /// Minimum gap between two writes.
    pub write_spacing_ms: u64,
    pub chart_months: usize,
    pub level: String,
    /// Serve cached rows only and refuse writes.
    pub offline: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timezone: "Asia/Bangkok".to_string(),
            cache_path: "config/hub_cache.json".to_string(),
            settings_path: "config/hub_settings.json".to_string(),
            write_spacing_ms: 100,
            chart_months: 6,
            level: "info".to_string(),
            offline: false,
        }
    }
}

impl AppConfig {
    pub fn write_spacing(&self) -> Duration {
        Duration::from_millis(self.write_spacing_ms)
    }

    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(&self.cache_path)
    }

    pub fn settings_path(&self) -> PathBuf {
        PathBuf::from(&self.settings_path)
    }
}

#[derive(Debug, Parser)]
#[command(name = "hub", about = "Household obligations hub", disable_version_flag = true)]
pub struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Default, Args)]
struct Overrides {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    config: Option<String>,
    /// Override the sheet script URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long, global = true)]
    timezone: Option<String>,
    /// Override log level.
    #[arg(long, global = true)]
    level: Option<String>,
    /// Use cached data only.
    #[arg(long, global = true)]
    offline: bool,
}

pub fn load() -> Result<(AppConfig, Command)> {
    let cli = Cli::parse();
    let config = resolve(cli.overrides)?;
    Ok((config, cli.command))
}

fn resolve(args: Overrides) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("HUB"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(level) = args.level {
        settings.level = level;
    }
    if args.offline {
        settings.offline = true;
    }

    Ok(settings)
}
