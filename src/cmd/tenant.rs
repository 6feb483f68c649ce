//! Tenant administration commands: service communications

use crate::cmd::{prepare, CommandContext, CommandSpec};
use crate::error::{M365Error, Result};
use crate::graph::service_announcement::ServiceAnnouncementClient;
use crate::util::validation::{non_empty, validate_message_id};
use clap::{Args, Subcommand};
use serde_json::{json, Map, Value};

#[derive(Subcommand, Debug)]
pub enum TenantCommands {
    /// Service health and message center
    #[command(subcommand)]
    Serviceannouncement(ServiceAnnouncementCommands),
}

#[derive(Subcommand, Debug)]
pub enum ServiceAnnouncementCommands {
    /// Service update messages (message center)
    #[command(subcommand)]
    Message(MessageCommands),

    /// Health status of subscribed services
    #[command(subcommand)]
    Health(HealthCommands),

    /// Service health issues
    #[command(subcommand)]
    Healthissue(HealthIssueCommands),
}

#[derive(Subcommand, Debug)]
pub enum MessageCommands {
    /// List service update messages
    List(MessageListArgs),

    /// Retrieve a service update message
    Get(MessageGetArgs),
}

#[derive(Subcommand, Debug)]
pub enum HealthCommands {
    /// List health overviews of all services
    List(HealthListArgs),

    /// Retrieve the health overview of one service
    Get(HealthGetArgs),
}

#[derive(Subcommand, Debug)]
pub enum HealthIssueCommands {
    /// List service health issues
    List(HealthIssueListArgs),

    /// Retrieve a service health issue
    Get(HealthIssueGetArgs),
}

pub async fn run(command: TenantCommands, ctx: &CommandContext) -> Result<()> {
    let TenantCommands::Serviceannouncement(command) = command;
    match command {
        ServiceAnnouncementCommands::Message(MessageCommands::List(args)) => {
            message_list(args, ctx).await
        }
        ServiceAnnouncementCommands::Message(MessageCommands::Get(args)) => {
            message_get(args, ctx).await
        }
        ServiceAnnouncementCommands::Health(HealthCommands::List(args)) => {
            health_list(args, ctx).await
        }
        ServiceAnnouncementCommands::Health(HealthCommands::Get(args)) => {
            health_get(args, ctx).await
        }
        ServiceAnnouncementCommands::Healthissue(HealthIssueCommands::List(args)) => {
            health_issue_list(args, ctx).await
        }
        ServiceAnnouncementCommands::Healthissue(HealthIssueCommands::Get(args)) => {
            health_issue_get(args, ctx).await
        }
    }
}

#[derive(Args, Debug)]
pub struct MessageListArgs {
    /// Only messages tagged with this service, e.g. "Microsoft Teams"
    #[arg(short, long)]
    pub service: Option<String>,
}

impl CommandSpec for MessageListArgs {
    fn name(&self) -> &'static str {
        "tenant serviceannouncement message list"
    }

    fn telemetry(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("service".into(), json!(non_empty(&self.service).is_some()));
        props
    }

    fn default_properties(&self) -> &'static [&'static str] {
        &["id", "title"]
    }
}

pub async fn message_list(args: MessageListArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;

    let client = ctx.graph_client().await?;
    let spinner = ctx.spinner("Retrieving service update messages...");
    let result = ServiceAnnouncementClient::new(&client)
        .list_messages(args.service.as_deref())
        .await;
    spinner.finish_and_clear();

    let messages = result?;
    tracing::debug!(count = messages.len(), "retrieved service update messages");
    ctx.emit(&args, &Value::Array(messages))
}

#[derive(Args, Debug)]
pub struct MessageGetArgs {
    /// ID of the message, e.g. MC123456
    #[arg(short, long)]
    pub id: String,
}

impl CommandSpec for MessageGetArgs {
    fn name(&self) -> &'static str {
        "tenant serviceannouncement message get"
    }

    fn validate(&self) -> Result<()> {
        validate_message_id(&self.id)
    }
}

pub async fn message_get(args: MessageGetArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;

    let client = ctx.graph_client().await?;
    let spinner = ctx.spinner("Retrieving service update message...");
    let result = ServiceAnnouncementClient::new(&client)
        .get_message(&args.id)
        .await;
    spinner.finish_and_clear();

    ctx.emit(&args, &result?)
}

#[derive(Args, Debug)]
pub struct HealthListArgs {
    /// Include the issues of each service
    #[arg(short, long)]
    pub issues: bool,
}

impl CommandSpec for HealthListArgs {
    fn name(&self) -> &'static str {
        "tenant serviceannouncement health list"
    }

    fn telemetry(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("issues".into(), json!(self.issues));
        props
    }

    fn default_properties(&self) -> &'static [&'static str] {
        &["id", "status", "service"]
    }
}

pub async fn health_list(args: HealthListArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;

    let client = ctx.graph_client().await?;
    let spinner = ctx.spinner("Retrieving service health...");
    let result = ServiceAnnouncementClient::new(&client)
        .list_health_overviews(args.issues)
        .await;
    spinner.finish_and_clear();

    ctx.emit(&args, &Value::Array(result?))
}

#[derive(Args, Debug)]
pub struct HealthGetArgs {
    /// Service name, e.g. "Exchange Online"
    #[arg(short = 's', long)]
    pub service_name: String,

    /// Include the issues of the service
    #[arg(short, long)]
    pub issues: bool,
}

impl CommandSpec for HealthGetArgs {
    fn name(&self) -> &'static str {
        "tenant serviceannouncement health get"
    }

    fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(M365Error::ValidationError(
                "Specify a service name".into(),
            ));
        }
        Ok(())
    }

    fn telemetry(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("issues".into(), json!(self.issues));
        props
    }
}

pub async fn health_get(args: HealthGetArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;

    let client = ctx.graph_client().await?;
    let spinner = ctx.spinner("Retrieving service health...");
    let result = ServiceAnnouncementClient::new(&client)
        .get_health_overview(&args.service_name, args.issues)
        .await;
    spinner.finish_and_clear();

    ctx.emit(&args, &result?)
}

#[derive(Args, Debug)]
pub struct HealthIssueListArgs {
    /// Only issues of this service
    #[arg(short, long)]
    pub service: Option<String>,
}

impl CommandSpec for HealthIssueListArgs {
    fn name(&self) -> &'static str {
        "tenant serviceannouncement healthissue list"
    }

    fn telemetry(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("service".into(), json!(non_empty(&self.service).is_some()));
        props
    }

    fn default_properties(&self) -> &'static [&'static str] {
        &["id", "title"]
    }
}

pub async fn health_issue_list(args: HealthIssueListArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;

    let client = ctx.graph_client().await?;
    let spinner = ctx.spinner("Retrieving service health issues...");
    let result = ServiceAnnouncementClient::new(&client)
        .list_issues(args.service.as_deref())
        .await;
    spinner.finish_and_clear();

    ctx.emit(&args, &Value::Array(result?))
}

#[derive(Args, Debug)]
pub struct HealthIssueGetArgs {
    /// ID of the issue, e.g. EX123456
    #[arg(short, long)]
    pub id: String,
}

impl CommandSpec for HealthIssueGetArgs {
    fn name(&self) -> &'static str {
        "tenant serviceannouncement healthissue get"
    }
}

pub async fn health_issue_get(args: HealthIssueGetArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;

    let client = ctx.graph_client().await?;
    let spinner = ctx.spinner("Retrieving service health issue...");
    let result = ServiceAnnouncementClient::new(&client)
        .get_issue(&args.id)
        .await;
    spinner.finish_and_clear();

    ctx.emit(&args, &result?)
}
