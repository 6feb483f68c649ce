//! Persisted CLI settings (`m365ctl cli config ...`)

use crate::cmd::CommandContext;
use crate::config::Config;
use crate::error::{M365Error, Result};
use crate::output::OutputMode;
use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

/// Setting names accepted by `get`, `set` and `reset`
pub const SETTING_KEYS: &[&str] = &["output", "log-level"];

#[derive(Subcommand, Debug)]
pub enum CliCommands {
    /// Manage persisted CLI settings
    #[command(subcommand)]
    Config(CliConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum CliConfigCommands {
    /// Show the value of one setting
    Get(ConfigKeyArgs),

    /// Change a setting
    Set(ConfigSetArgs),

    /// Show all settings
    List,

    /// Reset one setting, or all of them
    Reset(ConfigResetArgs),
}

#[derive(Args, Debug)]
pub struct ConfigKeyArgs {
    /// Setting name (output|log-level)
    #[arg(short, long)]
    pub key: String,
}

#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Setting name (output|log-level)
    #[arg(short, long)]
    pub key: String,

    /// New value
    #[arg(long)]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct ConfigResetArgs {
    /// Setting to reset; all settings when omitted
    #[arg(short, long)]
    pub key: Option<String>,
}

fn check_key(key: &str) -> Result<()> {
    if SETTING_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(M365Error::ValidationError(format!(
            "{} is not a valid setting. Allowed values are {}",
            key,
            SETTING_KEYS.join("|")
        )))
    }
}

fn setting_value(config: &Config, key: &str) -> Value {
    match key {
        "output" => json!(config.output),
        "log-level" => json!(config.log_level),
        _ => Value::Null,
    }
}

/// Apply `value` to `key`, rejecting values the CLI could not use later
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    check_key(key)?;
    match key {
        "output" => {
            let mode = value.parse::<OutputMode>().map_err(M365Error::ValidationError)?;
            config.output = Some(mode);
        }
        _ => {
            EnvFilter::try_new(value).map_err(|e| {
                M365Error::ValidationError(format!("{} is not a valid log level: {}", value, e))
            })?;
            config.log_level = Some(value.to_string());
        }
    }
    Ok(())
}

fn reset_setting(config: &mut Config, key: Option<&str>) -> Result<()> {
    match key {
        Some(key) => {
            check_key(key)?;
            match key {
                "output" => config.output = None,
                _ => config.log_level = None,
            }
        }
        None => {
            config.output = None;
            config.log_level = None;
        }
    }
    Ok(())
}

pub async fn run(command: CliCommands, ctx: &CommandContext) -> Result<()> {
    let CliCommands::Config(command) = command;
    let config_manager = ctx.config()?;
    let mut config = config_manager.load_config()?;

    match command {
        CliConfigCommands::Get(args) => {
            check_key(&args.key)?;
            let value = setting_value(&config, &args.key);
            if !value.is_null() {
                println!(
                    "{}",
                    value
                        .as_str()
                        .map(String::from)
                        .unwrap_or_else(|| value.to_string())
                );
            }
        }
        CliConfigCommands::List => {
            let mut settings = serde_json::Map::new();
            for key in SETTING_KEYS {
                let value = setting_value(&config, key);
                if !value.is_null() {
                    settings.insert(key.to_string(), value);
                }
            }
            let rendered =
                crate::output::render(&Value::Object(settings), ctx.output, &[])?;
            if !rendered.is_empty() {
                println!("{}", rendered);
            }
        }
        CliConfigCommands::Set(args) => {
            apply_setting(&mut config, &args.key, &args.value)?;
            config_manager.save_config(&config)?;
            println!("{} {} set to {}", "✓".green(), args.key, args.value.bold());
        }
        CliConfigCommands::Reset(args) => {
            reset_setting(&mut config, args.key.as_deref())?;
            config_manager.save_config(&config)?;
            println!("{} Settings reset", "✓".green());
        }
    }
    Ok(())
}
