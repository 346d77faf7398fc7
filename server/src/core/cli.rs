use clap::{Parser, Subcommand};

use super::config::ProviderBackend;
use super::constants::{
    ENV_AGGREGATION_INTERVAL_MINUTES, ENV_DAILY_BUDGET_USD, ENV_HOST, ENV_MIRROR_API_KEY,
    ENV_MIRROR_ENABLED, ENV_MIRROR_URL, ENV_PORT, ENV_PROVIDER_API_KEY, ENV_PROVIDER_BACKEND,
    ENV_PROVIDER_BASE_URL,
};

#[derive(Parser)]
#[command(name = "tracedeck")]
#[command(version, about = "AI interaction tracing and analytics server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Provider backend (openai or simulated)
    #[arg(long, global = true, env = ENV_PROVIDER_BACKEND, value_parser = parse_provider_backend)]
    pub provider: Option<ProviderBackend>,

    /// OpenAI-compatible provider base URL
    #[arg(long, global = true, env = ENV_PROVIDER_BASE_URL)]
    pub provider_base_url: Option<String>,

    /// Provider API key
    #[arg(long, global = true, env = ENV_PROVIDER_API_KEY, hide_env_values = true)]
    pub provider_api_key: Option<String>,

    /// Enable the third-party observability mirror
    #[arg(long, global = true, env = ENV_MIRROR_ENABLED)]
    pub mirror: Option<bool>,

    /// Observability mirror ingestion URL
    #[arg(long, global = true, env = ENV_MIRROR_URL)]
    pub mirror_url: Option<String>,

    /// Observability mirror API key
    #[arg(long, global = true, env = ENV_MIRROR_API_KEY, hide_env_values = true)]
    pub mirror_api_key: Option<String>,

    /// Aggregation interval in minutes (0 = disabled)
    #[arg(long, global = true, env = ENV_AGGREGATION_INTERVAL_MINUTES)]
    pub aggregation_interval_minutes: Option<u64>,

    /// Daily cost budget in USD (drives budget alerts)
    #[arg(long, global = true, env = ENV_DAILY_BUDGET_USD)]
    pub daily_budget_usd: Option<f64>,
}

/// Parse provider backend from CLI/env string
fn parse_provider_backend(s: &str) -> Result<ProviderBackend, String> {
    match s.to_lowercase().as_str() {
        "openai" => Ok(ProviderBackend::OpenAi),
        "simulated" => Ok(ProviderBackend::Simulated),
        _ => Err(format!(
            "Invalid provider backend '{}'. Valid options: openai, simulated",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// System maintenance commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemCommands {
    /// Delete the local data directory (database). Requires confirmation.
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub provider: Option<ProviderBackend>,
    pub provider_base_url: Option<String>,
    pub provider_api_key: Option<String>,
    pub mirror: Option<bool>,
    pub mirror_url: Option<String>,
    pub mirror_api_key: Option<String>,
    pub aggregation_interval_minutes: Option<u64>,
    pub daily_budget_usd: Option<f64>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        provider: cli.provider,
        provider_base_url: cli.provider_base_url,
        provider_api_key: cli.provider_api_key,
        mirror: cli.mirror,
        mirror_url: cli.mirror_url,
        mirror_api_key: cli.mirror_api_key,
        aggregation_interval_minutes: cli.aggregation_interval_minutes,
        daily_budget_usd: cli.daily_budget_usd,
    };
    (config, cli.command)
}
