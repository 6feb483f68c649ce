use crate::cmd::CommandContext;
use crate::config::{AuthType, ConnectionConfig};
use crate::error::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Subcommand, Debug)]
pub enum ConnectionCommands {
    /// Add a connection (tenant + app registration)
    Add(ConnectionAddArgs),

    /// List configured connections
    List(ConnectionListArgs),

    /// Make a connection the active one
    Use(ConnectionUseArgs),

    /// Remove a connection and its cached tokens
    Remove(ConnectionRemoveArgs),
}

#[derive(Args, Debug)]
pub struct ConnectionAddArgs {
    /// Connection name
    pub name: String,

    /// Tenant ID (Entra ID directory ID)
    #[arg(long)]
    pub tenant_id: String,

    /// Client ID (Application ID)
    #[arg(long)]
    pub client_id: String,

    /// Client secret (for client credentials flow)
    #[arg(long)]
    pub client_secret: Option<String>,

    /// Use client credentials flow
    #[arg(long)]
    pub client_credentials: bool,

    /// Connection description
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConnectionListArgs {
    /// Show detailed information
    #[arg(short, long)]
    pub details: bool,
}

#[derive(Args, Debug)]
pub struct ConnectionUseArgs {
    /// Connection name to switch to
    pub name: String,
}

#[derive(Args, Debug)]
pub struct ConnectionRemoveArgs {
    /// Connection name to remove
    pub name: String,
}

pub async fn run(command: ConnectionCommands, ctx: &CommandContext) -> Result<()> {
    match command {
        ConnectionCommands::Add(args) => add(args, ctx),
        ConnectionCommands::List(args) => list(args, ctx),
        ConnectionCommands::Use(args) => switch(args, ctx),
        ConnectionCommands::Remove(args) => remove(args, ctx),
    }
}

pub fn add(args: ConnectionAddArgs, ctx: &CommandContext) -> Result<()> {
    let config_manager = ctx.config()?;

    let auth_type = if args.client_credentials {
        AuthType::ClientCredentials
    } else {
        AuthType::DeviceCode
    };

    let connection = ConnectionConfig {
        name: args.name.clone(),
        tenant_id: args.tenant_id,
        client_id: args.client_id,
        client_secret: args.client_secret,
        auth_type,
        description: args.description,
    };

    config_manager.add_connection(connection)?;

    println!("{} Connection '{}' added", "✓".green(), args.name);
    println!(
        "\n{} Run {} to authenticate",
        "→".cyan(),
        format!("m365ctl login {}", args.name).bold()
    );

    Ok(())
}

pub fn list(args: ConnectionListArgs, ctx: &CommandContext) -> Result<()> {
    let config_manager = ctx.config()?;
    let connections = config_manager.load_connections()?;
    let config = config_manager.load_config()?;

    if connections.is_empty() {
        println!("{} No connections configured", "!".yellow());
        println!(
            "\n{} Run {} to add one",
            "→".cyan(),
            "m365ctl connection add".bold()
        );
        return Ok(());
    }

    println!("\n{}", "Configured Connections:".bold());
    println!("{}", "─".repeat(60));

    for connection in &connections {
        let is_current = config.current_connection.as_ref() == Some(&connection.name);
        let marker = if is_current {
            "●".green()
        } else {
            "○".dimmed()
        };

        println!("\n{} {}", marker, connection.name.bold());

        if args.details {
            println!("  Tenant ID:    {}", connection.tenant_id);
            println!("  Client ID:    {}", connection.client_id);
            println!("  Auth Type:    {:?}", connection.auth_type);

            if let Some(desc) = &connection.description {
                println!("  Description:  {}", desc);
            }

            let tokens = config_manager.load_tokens(&connection.name)?;
            if tokens.iter().any(|t| !t.is_expired()) {
                println!("  Status:       {}", "Authenticated".green());
            } else {
                println!("  Status:       {}", "Not authenticated".yellow());
            }
        }
    }

    println!("\n{}", "─".repeat(60));
    println!("{} {} connection(s) total", "→".cyan(), connections.len());

    if let Some(current) = &config.current_connection {
        println!("{} Active: {}", "→".cyan(), current.bold());
    }

    Ok(())
}

pub fn switch(args: ConnectionUseArgs, ctx: &CommandContext) -> Result<()> {
    ctx.config()?.set_active_connection(&args.name)?;
    println!("{} Switched to connection '{}'", "✓".green(), args.name);
    Ok(())
}

pub fn remove(args: ConnectionRemoveArgs, ctx: &CommandContext) -> Result<()> {
    ctx.config()?.remove_connection(&args.name)?;
    println!("{} Connection '{}' removed", "✓".green(), args.name);
    Ok(())
}
