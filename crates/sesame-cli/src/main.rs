//! `sesame`: decode status reports, estimate battery charge and run a
//! simulated set of devices through the status and command engine.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use config::CliConfig;
use sesame_core::DeviceVariant;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sesame", version, about = "Sesame lock and bot tooling")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a hex status report and print it as JSON
    Decode {
        #[arg(short, long, value_enum, default_value = "lock")]
        variant: Variant,

        /// Report bytes as hex, e.g. ff03000020000002
        hex: String,
    },

    /// Estimate battery percentage from a voltage
    Estimate {
        #[arg(short, long, value_enum, default_value = "lock")]
        variant: Variant,

        voltage: f64,
    },

    /// Attach devices to an in-memory transport and issue one command each
    Simulate {
        /// TOML config file; defaults apply when it does not exist
        #[arg(short, long, default_value = "sesame.toml")]
        config: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Variant {
    Lock,
    Bot,
}

impl From<Variant> for DeviceVariant {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Lock => DeviceVariant::Lock,
            Variant::Bot => DeviceVariant::Bot,
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Decode { variant, hex } => {
            println!("{}", commands::decode(variant.into(), &hex)?);
        }
        Commands::Estimate { variant, voltage } => {
            println!("{}", commands::estimate(variant.into(), voltage));
        }
        Commands::Simulate { config } => {
            let config = CliConfig::load(&config)?;
            let results = commands::simulate(&config).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_decode_with_variant() {
        let cli = Cli::parse_from(["sesame", "decode", "--variant", "bot", "ff03000000000002"]);
        match cli.command {
            Commands::Decode { variant, hex } => {
                assert_eq!(DeviceVariant::from(variant), DeviceVariant::Bot);
                assert_eq!(hex, "ff03000000000002");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
