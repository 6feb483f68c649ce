//! Command framework and per-service command modules
//!
//! Every command is a clap `Args` struct implementing [`CommandSpec`]. A
//! handler calls [`prepare`] (validators, then the telemetry event), performs
//! its requests and hands the JSON result to [`CommandContext::emit`].

pub mod cli_config;
pub mod connection;
pub mod login;
pub mod progress;
pub mod spo;
pub mod teams;
pub mod tenant;

use crate::config::ConfigManager;
use crate::error::Result;
use crate::graph::{RestClient, GRAPH_RESOURCE};
use crate::output::{self, OutputMode};
use crate::util::url::tenant_root;
use colored::Colorize;
use indicatif::ProgressBar;
use serde_json::{Map, Value};

/// Static description of a command: name, validation, telemetry, display
pub trait CommandSpec {
    /// Full command name, e.g. `spo file rename`
    fn name(&self) -> &'static str;

    /// Validators run in order; the first failure aborts the command
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Properties recorded with the telemetry event
    fn telemetry(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Columns shown for lists in text and CSV output
    fn default_properties(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Validate a command and record its telemetry event
pub fn prepare(command: &impl CommandSpec) -> Result<()> {
    command.validate()?;

    let properties = Value::Object(command.telemetry());
    tracing::debug!(
        target: "m365ctl::telemetry",
        command = command.name(),
        properties = %properties,
        "command invoked"
    );
    Ok(())
}

/// Print a deprecation notice for a renamed option
pub fn warn_deprecated(option: &str, replacement: &str) {
    eprintln!(
        "{}",
        format!(
            "Option '{}' is deprecated. Please use '{}' instead.",
            option, replacement
        )
        .yellow()
    );
}

/// Per-invocation settings resolved from global flags and config
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub output: OutputMode,
    pub connection: Option<String>,
    pub verbose: bool,
}

impl CommandContext {
    pub fn config(&self) -> Result<ConfigManager> {
        ConfigManager::new()
    }

    async fn client_for(&self, resource: &str) -> Result<RestClient> {
        let config = self.config()?;
        let connection = config.resolve_connection(self.connection.as_deref())?;
        tracing::debug!(connection = %connection.name, resource, "acquiring access token");
        RestClient::for_resource(&config, &connection, resource).await
    }

    pub async fn graph_client(&self) -> Result<RestClient> {
        self.client_for(GRAPH_RESOURCE).await
    }

    /// Client authorized for the SharePoint tenant hosting `web_url`
    pub async fn spo_client(&self, web_url: &str) -> Result<RestClient> {
        self.client_for(&tenant_root(web_url)?).await
    }

    /// Spinner on stderr, hidden in verbose mode so it does not interleave with logs
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.verbose {
            ProgressBar::hidden()
        } else {
            progress::create_spinner(message)
        }
    }

    /// Render a command result to stdout
    pub fn emit(&self, command: &impl CommandSpec, value: &Value) -> Result<()> {
        let rendered = output::render(value, self.output, command.default_properties())?;
        if !rendered.is_empty() {
            println!("{}", rendered);
        }
        Ok(())
    }
}
