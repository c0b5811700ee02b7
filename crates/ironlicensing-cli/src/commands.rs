//! CLI command definitions.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a license key
    Validate {
        /// License key
        key: String,
    },

    /// Activate a license key on this machine
    Activate {
        /// License key
        key: String,

        /// Name to register this machine under (defaults to the hostname)
        #[arg(short, long)]
        machine_name: Option<String>,
    },

    /// Release this machine's activation
    Deactivate {
        /// License key (defaults to the remembered key)
        key: Option<String>,
    },

    /// Start a trial
    Trial {
        /// Email to register the trial under
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Show license status and features
    Status {
        /// License key (defaults to the remembered key)
        key: Option<String>,
    },

    /// Exit non-zero unless a feature is licensed
    Require {
        /// Feature key
        feature: String,

        /// License key (defaults to the remembered key)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// List purchasable tiers
    Tiers,

    /// Start a checkout session for a tier
    Checkout {
        /// Tier ID
        tier_id: String,

        /// Buyer email
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Print this machine's identifier
    MachineId,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },
}
