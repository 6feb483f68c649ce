//! Command line definition and dispatch

use crate::cmd::cli_config::CliCommands;
use crate::cmd::connection::ConnectionCommands;
use crate::cmd::spo::SpoCommands;
use crate::cmd::teams::TeamsCommands;
use crate::cmd::tenant::TenantCommands;
use crate::cmd::{self, CommandContext};
use crate::config::{Config, ConfigManager};
use crate::error::Result;
use crate::output::OutputMode;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "m365ctl",
    about = "Manage Microsoft 365 from the command line",
    version,
    long_about = "Command line client for Microsoft 365 REST APIs\n\n\
                  SharePoint Online, Microsoft Teams and tenant administration\n\
                  through SharePoint REST and Microsoft Graph."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (defaults to the `output` setting, else json)
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputMode>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging (requests, retries, telemetry)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Connection to use instead of the active one
    #[arg(long, global = true)]
    pub connection: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate a connection
    Login(cmd::login::LoginArgs),

    /// Clear cached tokens
    Logout(cmd::login::LogoutArgs),

    /// Show the active connection and its tokens
    Status,

    /// Manage connections (tenant + app registration)
    #[command(subcommand)]
    Connection(ConnectionCommands),

    /// SharePoint Online
    #[command(subcommand)]
    Spo(SpoCommands),

    /// Microsoft Teams
    #[command(subcommand)]
    Teams(TeamsCommands),

    /// Tenant administration
    #[command(subcommand)]
    Tenant(TenantCommands),

    /// CLI settings
    #[command(subcommand)]
    Cli(CliCommands),
}

/// Tracing filter: `RUST_LOG` wins, then the flags, then the `log-level` setting
pub fn log_filter(cli: &Cli, config: &Config) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let directive = if cli.debug {
        "m365ctl=debug".to_string()
    } else if cli.verbose {
        "m365ctl=info".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "warn".to_string())
    };

    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn init_tracing(filter: EnvFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = ConfigManager::new()
        .and_then(|manager| manager.load_config())
        .unwrap_or_default();

    init_tracing(log_filter(&cli, &config));

    let ctx = CommandContext {
        output: cli.output.or(config.output).unwrap_or_default(),
        connection: cli.connection,
        verbose: cli.verbose || cli.debug,
    };

    match cli.command {
        Commands::Login(args) => cmd::login::login(args, &ctx).await,
        Commands::Logout(args) => cmd::login::logout(args, &ctx).await,
        Commands::Status => cmd::login::status(&ctx).await,
        Commands::Connection(command) => cmd::connection::run(command, &ctx).await,
        Commands::Spo(command) => cmd::spo::run(command, &ctx).await,
        Commands::Teams(command) => cmd::teams::run(command, &ctx).await,
        Commands::Tenant(command) => cmd::tenant::run(command, &ctx).await,
        Commands::Cli(command) => cmd::cli_config::run(command, &ctx).await,
    }
}
