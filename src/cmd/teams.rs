//! Microsoft Teams commands

use crate::cmd::progress::{finish_spinner_error, finish_spinner_success};
use crate::cmd::{prepare, warn_deprecated, CommandContext, CommandSpec};
use crate::error::{M365Error, Result};
use crate::graph::teams::{MemberSettings, TeamUpdate, TeamsClient};
use crate::util::validation::{parse_bool_literal, require_exactly_one, validate_guid};
use clap::{Args, Subcommand};
use serde_json::{json, Map, Value};

#[derive(Subcommand, Debug)]
pub enum TeamsCommands {
    /// Member permissions of a team
    #[command(subcommand)]
    Membersettings(MemberSettingsCommands),

    /// Team properties
    #[command(subcommand)]
    Team(TeamCommands),
}

#[derive(Subcommand, Debug)]
pub enum MemberSettingsCommands {
    /// Update member settings of a team
    Set(MemberSettingsSetArgs),

    /// List member settings of a team
    List(MemberSettingsListArgs),
}

#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    /// Update properties of a team
    Set(TeamSetArgs),
}

pub async fn run(command: TeamsCommands, ctx: &CommandContext) -> Result<()> {
    match command {
        TeamsCommands::Membersettings(MemberSettingsCommands::Set(args)) => {
            member_settings_set(args, ctx).await
        }
        TeamsCommands::Membersettings(MemberSettingsCommands::List(args)) => {
            member_settings_list(args, ctx).await
        }
        TeamsCommands::Team(TeamCommands::Set(args)) => team_set(args, ctx).await,
    }
}

#[derive(Args, Debug, Default)]
pub struct MemberSettingsSetArgs {
    /// ID of the team to update
    #[arg(short = 'i', long)]
    pub team_id: String,

    /// Allow members to add and remove apps (true|false)
    #[arg(long)]
    pub allow_add_remove_apps: Option<String>,

    /// Allow members to create and update channels (true|false)
    #[arg(long)]
    pub allow_create_update_channels: Option<String>,

    /// Allow members to create, update and remove connectors (true|false)
    #[arg(long)]
    pub allow_create_update_remove_connectors: Option<String>,

    /// Allow members to create, update and remove tabs (true|false)
    #[arg(long)]
    pub allow_create_update_remove_tabs: Option<String>,

    /// Allow members to delete channels (true|false)
    #[arg(long)]
    pub allow_delete_channels: Option<String>,
}

impl MemberSettingsSetArgs {
    /// Settings in the order they are validated, keyed by their Graph name
    fn properties(&self) -> [(&'static str, Option<&str>); 5] {
        [
            ("allowAddRemoveApps", self.allow_add_remove_apps.as_deref()),
            (
                "allowCreateUpdateChannels",
                self.allow_create_update_channels.as_deref(),
            ),
            (
                "allowCreateUpdateRemoveConnectors",
                self.allow_create_update_remove_connectors.as_deref(),
            ),
            (
                "allowCreateUpdateRemoveTabs",
                self.allow_create_update_remove_tabs.as_deref(),
            ),
            ("allowDeleteChannels", self.allow_delete_channels.as_deref()),
        ]
    }

    fn settings(&self) -> MemberSettings {
        let parse = |v: &Option<String>| v.as_deref().and_then(parse_bool_literal);
        MemberSettings {
            allow_add_remove_apps: parse(&self.allow_add_remove_apps),
            allow_create_update_channels: parse(&self.allow_create_update_channels),
            allow_create_update_remove_connectors: parse(
                &self.allow_create_update_remove_connectors,
            ),
            allow_create_update_remove_tabs: parse(&self.allow_create_update_remove_tabs),
            allow_delete_channels: parse(&self.allow_delete_channels),
        }
    }
}

impl CommandSpec for MemberSettingsSetArgs {
    fn name(&self) -> &'static str {
        "teams membersettings set"
    }

    fn validate(&self) -> Result<()> {
        validate_guid(&self.team_id)?;

        for (property, value) in self.properties() {
            if let Some(value) = value {
                if parse_bool_literal(value).is_none() {
                    return Err(M365Error::ValidationError(format!(
                        "Value {} for option {} is not a valid boolean",
                        value, property
                    )));
                }
            }
        }
        Ok(())
    }

    fn telemetry(&self) -> Map<String, Value> {
        self.properties()
            .into_iter()
            .map(|(property, value)| (property.to_string(), json!(value)))
            .collect()
    }
}

pub async fn member_settings_set(args: MemberSettingsSetArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;

    let client = ctx.graph_client().await?;
    let spinner = ctx.spinner("Updating member settings...");
    let result = TeamsClient::new(&client)
        .update_member_settings(&args.team_id, &args.settings())
        .await;
    match &result {
        Ok(()) => finish_spinner_success(&spinner, "Member settings updated"),
        Err(_) => finish_spinner_error(&spinner, "Failed to update member settings"),
    }
    result?;

    tracing::info!(team = %args.team_id, "member settings updated");
    Ok(())
}

#[derive(Args, Debug)]
pub struct MemberSettingsListArgs {
    /// ID of the team
    #[arg(short = 'i', long)]
    pub team_id: String,
}

impl CommandSpec for MemberSettingsListArgs {
    fn name(&self) -> &'static str {
        "teams membersettings list"
    }

    fn validate(&self) -> Result<()> {
        validate_guid(&self.team_id)
    }
}

pub async fn member_settings_list(
    args: MemberSettingsListArgs,
    ctx: &CommandContext,
) -> Result<()> {
    prepare(&args)?;

    let client = ctx.graph_client().await?;
    let spinner = ctx.spinner("Retrieving member settings...");
    let result = TeamsClient::new(&client)
        .get_member_settings(&args.team_id)
        .await;
    spinner.finish_and_clear();

    ctx.emit(&args, &result?)
}

#[derive(Args, Debug, Default)]
pub struct TeamSetArgs {
    /// ID of the team
    #[arg(short, long)]
    pub id: Option<String>,

    /// (deprecated, use --id) ID of the team
    #[arg(long)]
    pub team_id: Option<String>,

    /// Display name of the team
    #[arg(short, long)]
    pub name: Option<String>,

    /// (deprecated, use --name) Display name of the team
    #[arg(long)]
    pub display_name: Option<String>,

    /// Description of the team
    #[arg(long)]
    pub description: Option<String>,

    /// Mail alias of the team
    #[arg(long)]
    pub mail_nick_name: Option<String>,

    /// Classification of the team
    #[arg(long)]
    pub classification: Option<String>,

    /// Visibility of the team (Private|Public)
    #[arg(long)]
    pub visibility: Option<String>,
}

impl TeamSetArgs {
    fn team_id(&self) -> &str {
        self.id.as_deref().or(self.team_id.as_deref()).unwrap_or_default()
    }

    fn update(&self) -> TeamUpdate {
        TeamUpdate {
            display_name: self.name.clone().or_else(|| self.display_name.clone()),
            description: self.description.clone(),
            mail_nick_name: self.mail_nick_name.clone(),
            classification: self.classification.clone(),
            visibility: self.visibility.clone(),
        }
    }
}

impl CommandSpec for TeamSetArgs {
    fn name(&self) -> &'static str {
        "teams team set"
    }

    fn validate(&self) -> Result<()> {
        require_exactly_one(&[
            ("id", self.id.is_some()),
            ("teamId", self.team_id.is_some()),
        ])?;
        validate_guid(self.team_id())?;

        if let Some(visibility) = &self.visibility {
            let lowered = visibility.to_lowercase();
            if lowered != "private" && lowered != "public" {
                return Err(M365Error::ValidationError(format!(
                    "{} is not a valid visibility type. Allowed values are Private|Public",
                    visibility
                )));
            }
        }
        Ok(())
    }

    fn telemetry(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("name".into(), json!(self.name.is_some()));
        props.insert("displayName".into(), json!(self.display_name.is_some()));
        props.insert("description".into(), json!(self.description.is_some()));
        props.insert("mailNickName".into(), json!(self.mail_nick_name.is_some()));
        props.insert("classification".into(), json!(self.classification.is_some()));
        props.insert("visibility".into(), json!(self.visibility.is_some()));
        props
    }
}

pub async fn team_set(args: TeamSetArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;

    if args.team_id.is_some() {
        warn_deprecated("teamId", "id");
    }
    if args.display_name.is_some() {
        warn_deprecated("displayName", "name");
    }

    let client = ctx.graph_client().await?;
    let spinner = ctx.spinner("Updating team...");
    let result = TeamsClient::new(&client)
        .update_team(args.team_id(), &args.update())
        .await;
    match &result {
        Ok(()) => finish_spinner_success(&spinner, "Team updated"),
        Err(_) => finish_spinner_error(&spinner, "Failed to update team"),
    }
    result?;

    tracing::info!(team = %args.team_id(), "team updated");
    Ok(())
}
