//! IronLicensing CLI entrypoint.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;

use commands::{Commands, ConfigCommands};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "ironlicense")]
#[command(author, version, about = "IronLicensing command-line interface", long_about = None)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = CliConfig::load().unwrap_or_default();

    let default_level = if config.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(path = ?CliConfig::config_path().ok(), "Loaded configuration");

    let out = handlers::Output { json: cli.json };

    // Rejected keys and failed remote calls exit 1; an unlicensed feature exits 2.
    let exit_code = match cli.command {
        Commands::Validate { key } => failure_code(handlers::validate(&config, out, &key).await?),
        Commands::Activate { key, machine_name } => failure_code(
            handlers::activate(&config, out, &key, machine_name.as_deref()).await?,
        ),
        Commands::Deactivate { key } => failure_code(handlers::deactivate(&config, out, key).await?),
        Commands::Trial { email } => failure_code(handlers::trial(&config, out, email).await?),
        Commands::Status { key } => {
            handlers::status(&config, out, key).await?;
            None
        }
        Commands::Require { feature, key } => {
            if handlers::require(&config, out, &feature, key).await? {
                None
            } else {
                Some(2)
            }
        }
        Commands::Tiers => {
            handlers::tiers(&config, out).await?;
            None
        }
        Commands::Checkout { tier_id, email } => {
            failure_code(handlers::checkout(&config, out, &tier_id, email).await?)
        }
        Commands::MachineId => {
            handlers::machine_id(out)?;
            None
        }
        Commands::Config { command } => {
            match command {
                ConfigCommands::Show => handlers::show_config(&config, out)?,
                ConfigCommands::Set { key, value } => handlers::set_config(&key, &value)?,
            }
            None
        }
    };

    if let Some(code) = exit_code {
        std::process::exit(code);
    }
    Ok(())
}

fn failure_code(ok: bool) -> Option<i32> {
    if ok { None } else { Some(1) }
}
