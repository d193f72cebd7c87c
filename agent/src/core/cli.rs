use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_CONFIG, ENV_DRIVERS, ENV_SERVER_NAME};
use crate::domain::drivers::DriverKind;

#[derive(Parser)]
#[command(name = "unimetrics")]
#[command(version, about = "Metrics export agent", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server name reported as the `server` dimension
    #[arg(long, short = 'n', global = true, env = ENV_SERVER_NAME)]
    pub server_name: Option<String>,

    /// Drivers to run (comma separated: cloudwatch, console)
    #[arg(
        long = "driver",
        short = 'd',
        global = true,
        env = ENV_DRIVERS,
        value_delimiter = ',',
        value_parser = parse_driver_kind
    )]
    pub drivers: Option<Vec<DriverKind>>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,
}

/// Parse driver name from CLI/env string
fn parse_driver_kind(s: &str) -> Result<DriverKind, String> {
    s.parse::<DriverKind>().map_err(|e| e.to_string())
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run the configured drivers until interrupted (default command)
    Start,
    /// Print the effective configuration as JSON and exit
    Config,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub server_name: Option<String>,
    pub drivers: Option<Vec<DriverKind>>,
    pub config: Option<PathBuf>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        server_name: cli.server_name,
        drivers: cli.drivers,
        config: cli.config,
    };
    (config, cli.command)
}
