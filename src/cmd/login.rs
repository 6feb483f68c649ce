use crate::cmd::CommandContext;
use crate::config::{AuthType, ConfigManager, ConnectionConfig};
use crate::error::{M365Error, Result};
use crate::graph::auth::GraphAuth;
use crate::graph::GRAPH_RESOURCE;
use clap::Args;
use colored::Colorize;

/// Safely truncate a string to n characters (not bytes) to prevent panics on non-ASCII
fn truncate_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[derive(Args, Debug, Default)]
pub struct LoginArgs {
    /// Connection name; created when --tenant-id and --client-id are given
    #[arg(index = 1)]
    pub name: Option<String>,

    /// Tenant ID (Entra ID directory ID)
    #[arg(long)]
    pub tenant_id: Option<String>,

    /// Client ID (Application ID)
    #[arg(long)]
    pub client_id: Option<String>,

    /// Client secret (for client credentials flow)
    #[arg(long)]
    pub client_secret: Option<String>,

    /// Use client credentials flow instead of device code
    #[arg(long)]
    pub client_credentials: bool,

    /// Connection description
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct LogoutArgs {
    /// Logout from all connections
    #[arg(long)]
    pub all: bool,
}

/// Connection the login applies to, creating it for quick setup
fn resolve_login_connection(
    config_manager: &ConfigManager,
    args: LoginArgs,
    fallback: Option<&str>,
) -> Result<ConnectionConfig> {
    if let (Some(tenant_id), Some(client_id)) = (&args.tenant_id, &args.client_id) {
        println!(
            "\n{} Quick setup mode: creating connection...",
            "→".cyan()
        );

        let name = args.name.clone().unwrap_or_else(|| {
            let auto_name = tenant_id
                .split('-')
                .next()
                .unwrap_or("my-tenant")
                .to_string();
            println!(
                "{} Auto-generated connection name: {}",
                "→".cyan(),
                auto_name.bold()
            );
            auto_name
        });

        let auth_type = if args.client_credentials || args.client_secret.is_some() {
            AuthType::ClientCredentials
        } else {
            AuthType::DeviceCode
        };

        let connection = ConnectionConfig {
            name: name.clone(),
            tenant_id: tenant_id.clone(),
            client_id: client_id.clone(),
            client_secret: args.client_secret,
            auth_type,
            description: args.description,
        };
        config_manager.add_connection(connection.clone())?;
        println!("{} Connection '{}' saved", "✓".green(), name);
        return Ok(connection);
    }

    match args.name.as_deref().or(fallback) {
        Some(name) => {
            let connection = config_manager.get_connection(name)?;
            println!(
                "{} Loaded connection: {} ({})",
                "✓".green(),
                connection.name.bold(),
                connection.description.as_deref().unwrap_or("")
            );
            println!("  Tenant ID: {}...", truncate_chars(&connection.tenant_id, 8));
            println!("  Client ID: {}...", truncate_chars(&connection.client_id, 8));
            Ok(connection)
        }
        None => Err(M365Error::InvalidConfig(
            "Usage:\n  \
            m365ctl login NAME                              # Use an existing connection\n  \
            m365ctl login [NAME] --tenant-id ID --client-id ID  # Quick setup"
                .into(),
        )),
    }
}

pub async fn login(args: LoginArgs, ctx: &CommandContext) -> Result<()> {
    let config_manager = ctx.config()?;
    let auth = GraphAuth::new(config_manager.clone());

    let connection = resolve_login_connection(&config_manager, args, ctx.connection.as_deref())?;

    match connection.auth_type {
        AuthType::DeviceCode => {
            auth.login_device_code(&connection).await?;
        }
        AuthType::ClientCredentials => {
            println!("{} Using client credentials flow", "→".cyan());
            auth.login_client_credentials(&connection, GRAPH_RESOURCE)
                .await?;
            println!("{} Authentication successful", "✓".green());
        }
    }

    config_manager.set_active_connection(&connection.name)?;
    println!(
        "\n{} Active connection: {}",
        "→".cyan(),
        connection.name.bold()
    );
    Ok(())
}

pub async fn logout(args: LogoutArgs, ctx: &CommandContext) -> Result<()> {
    let config_manager = ctx.config()?;
    let auth = GraphAuth::new(config_manager.clone());

    if args.all {
        for connection in config_manager.load_connections()? {
            auth.logout(&connection.name)?;
        }
        println!("{} Logged out from all connections", "✓".green());
    } else if let Some(name) = &ctx.connection {
        auth.logout(&config_manager.get_connection(name)?.name)?;
    } else if let Some(current) = config_manager.load_config()?.current_connection {
        auth.logout(&current)?;
    } else {
        println!("{} No active connection", "!".yellow());
    }

    Ok(())
}

/// Show the active connection and the state of its cached tokens
pub async fn status(ctx: &CommandContext) -> Result<()> {
    let config_manager = ctx.config()?;

    let connection = match &ctx.connection {
        Some(name) => Some(config_manager.get_connection(name)?),
        None => config_manager.get_active_connection()?,
    };

    let Some(connection) = connection else {
        println!("{} Logged out", "!".yellow());
        println!(
            "\n{} Run {} to authenticate",
            "→".cyan(),
            "m365ctl login".bold()
        );
        return Ok(());
    };

    println!("\n{} {}", "●".green(), connection.name.bold());
    println!("  Tenant ID:    {}", connection.tenant_id);
    println!("  Client ID:    {}", connection.client_id);
    println!("  Auth Type:    {:?}", connection.auth_type);

    let tokens = config_manager.load_tokens(&connection.name)?;
    if tokens.is_empty() {
        println!("  Status:       {}", "Not authenticated".yellow());
    }
    for token in tokens {
        let state = if token.is_expired() {
            "expired".yellow()
        } else {
            "valid".green()
        };
        println!(
            "  {}: {} (expires: {})",
            token.resource,
            state,
            token.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    Ok(())
}
