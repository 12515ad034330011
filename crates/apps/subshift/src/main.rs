//! Subshift - move YouTube channel subscriptions between accounts
//!
//! `subshift export` snapshots the source account into a plain-text list;
//! `subshift import` replays that list against the destination account a
//! bounded number of subscriptions per day. Run `import` once a day until it
//! reports nothing remaining.

use clap::{Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use subscriptions::MigrationConfig;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "subshift", version, about = "Migrate YouTube subscriptions between accounts")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Custom config directory (overrides default ~/.config/subshift/).
    #[arg(long, global = true, env = "SUBSHIFT_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Settings file (defaults to subshift.json in the config directory).
    #[arg(long, global = true, env = "SUBSHIFT_SETTINGS")]
    settings: Option<PathBuf>,

    /// Google OAuth client secrets file.
    #[arg(long, global = true, env = "SUBSHIFT_CLIENT_SECRETS")]
    client_secrets: Option<PathBuf>,

    /// Maximum subscriptions to create per calendar day.
    #[arg(long, global = true, env = "SUBSHIFT_DAILY_LIMIT")]
    daily_limit: Option<u32>,

    /// Seconds to wait between subscription calls.
    #[arg(long, global = true, env = "SUBSHIFT_PACING_SECS")]
    pacing_secs: Option<u64>,

    /// Exported channel list.
    #[arg(long, global = true, env = "SUBSHIFT_SOURCE_LIST")]
    source_list: Option<PathBuf>,

    /// Progress record file.
    #[arg(long, global = true, env = "SUBSHIFT_PROGRESS_FILE")]
    progress_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Export the source account's subscriptions to the source list.
    Export,
    /// Subscribe the destination account to pending channels, up to the daily limit.
    Import,
    /// Show migration progress without contacting YouTube.
    Status,
    /// Forget cached tokens for one or both accounts.
    Logout {
        #[arg(value_enum, default_value_t = LogoutTarget::Both)]
        account: LogoutTarget,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogoutTarget {
    Source,
    Destination,
    Both,
}

impl Cli {
    /// Layer command-line and environment values over the settings file
    fn resolve(&self, mut settings: MigrationConfig) -> MigrationConfig {
        if let Some(path) = &self.client_secrets {
            settings.client_secrets_file = Some(path.clone());
        }
        if let Some(limit) = self.daily_limit {
            settings.daily_limit = limit;
        }
        if let Some(secs) = self.pacing_secs {
            settings.pacing_secs = secs;
        }
        if let Some(path) = &self.source_list {
            settings.source_list = path.clone();
        }
        if let Some(path) = &self.progress_file {
            settings.progress_file = path.clone();
        }
        settings
    }

    fn load_settings(&self) -> anyhow::Result<MigrationConfig> {
        let base = match &self.settings {
            Some(path) => MigrationConfig::from_file(path)?,
            None => MigrationConfig::load()?,
        };
        let settings = self.resolve(base);
        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .format_timestamp_millis()
        .init();

    if let Some(dir) = &cli.config_dir {
        config::set_config_dir(dir);
    }

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let settings = cli.load_settings()?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Command::Export => commands::export(&settings, today),
        Command::Import => commands::import(&settings, today),
        Command::Status => commands::status(&settings, today),
        Command::Logout { account } => commands::logout(&settings, account),
    }
}
