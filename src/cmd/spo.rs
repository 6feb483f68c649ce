//! SharePoint Online commands: content types, pages and files

use crate::cmd::progress::{finish_spinner_error, finish_spinner_success};
use crate::cmd::{prepare, CommandContext, CommandSpec};
use crate::error::{M365Error, Result};
use crate::graph::sharepoint::{ContentTypeLookup, FileTarget, SpoClient};
use crate::util::validation::{
    non_empty, require_exactly_one, validate_guid, validate_sharepoint_url,
};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::{json, Map, Value};

#[derive(Subcommand, Debug)]
pub enum SpoCommands {
    /// Site and list content types
    #[command(subcommand)]
    Contenttype(ContentTypeCommands),

    /// Modern (client-side) pages
    #[command(subcommand)]
    Page(PageCommands),

    /// Files in document libraries
    #[command(subcommand)]
    File(FileCommands),
}

#[derive(Subcommand, Debug)]
pub enum ContentTypeCommands {
    /// Retrieve a site or list content type
    Get(ContentTypeGetArgs),

    /// List site or list content types
    List(ContentTypeListArgs),
}

#[derive(Subcommand, Debug)]
pub enum PageCommands {
    /// List all modern pages in a site
    List(PageListArgs),
}

#[derive(Subcommand, Debug)]
pub enum FileCommands {
    /// Rename a file
    Rename(FileRenameArgs),

    /// Delete a file or move it to the recycle bin
    Remove(FileRemoveArgs),
}

pub async fn run(command: SpoCommands, ctx: &CommandContext) -> Result<()> {
    match command {
        SpoCommands::Contenttype(ContentTypeCommands::Get(args)) => {
            content_type_get(args, ctx).await
        }
        SpoCommands::Contenttype(ContentTypeCommands::List(args)) => {
            content_type_list(args, ctx).await
        }
        SpoCommands::Page(PageCommands::List(args)) => page_list(args, ctx).await,
        SpoCommands::File(FileCommands::Rename(args)) => file_rename(args, ctx).await,
        SpoCommands::File(FileCommands::Remove(args)) => file_remove(args, ctx).await,
    }
}

#[derive(Args, Debug)]
pub struct ContentTypeGetArgs {
    /// URL of the site where the content type is located
    #[arg(short = 'u', long)]
    pub web_url: String,

    /// Title of the list where the content type is located (omit for a site content type)
    #[arg(short = 'l', long)]
    pub list_title: Option<String>,

    /// ID of the content type to retrieve
    #[arg(short, long)]
    pub id: Option<String>,

    /// Name of the content type to retrieve
    #[arg(short, long)]
    pub name: Option<String>,
}

impl ContentTypeGetArgs {
    fn lookup(&self) -> Result<ContentTypeLookup<'_>> {
        match (non_empty(&self.id), non_empty(&self.name)) {
            (Some(id), None) => Ok(ContentTypeLookup::Id(id)),
            (None, Some(name)) => Ok(ContentTypeLookup::Name(name)),
            _ => Err(self.validate().err().unwrap_or_else(|| {
                M365Error::ValidationError("Specify either id or name".into())
            })),
        }
    }
}

impl CommandSpec for ContentTypeGetArgs {
    fn name(&self) -> &'static str {
        "spo contenttype get"
    }

    fn validate(&self) -> Result<()> {
        validate_sharepoint_url(&self.web_url)?;
        require_exactly_one(&[
            ("id", non_empty(&self.id).is_some()),
            ("name", non_empty(&self.name).is_some()),
        ])
    }

    fn telemetry(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("listTitle".into(), json!(non_empty(&self.list_title).is_some()));
        props.insert("id".into(), json!(non_empty(&self.id).is_some()));
        props.insert("name".into(), json!(non_empty(&self.name).is_some()));
        props
    }
}

pub async fn content_type_get(args: ContentTypeGetArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;
    let lookup = args.lookup()?;

    let client = ctx.spo_client(&args.web_url).await?;
    let spo = SpoClient::new(&client, &args.web_url);

    let spinner = ctx.spinner("Retrieving content type...");
    let result = spo.get_content_type(non_empty(&args.list_title), lookup).await;
    spinner.finish_and_clear();

    ctx.emit(&args, &result?)
}

#[derive(Args, Debug)]
pub struct ContentTypeListArgs {
    /// URL of the site for which to list content types
    #[arg(short = 'u', long)]
    pub web_url: String,

    /// Title of the list for which to list content types
    #[arg(short = 'l', long)]
    pub list_title: Option<String>,

    /// Only return content types of this group
    #[arg(short, long)]
    pub category: Option<String>,
}

impl CommandSpec for ContentTypeListArgs {
    fn name(&self) -> &'static str {
        "spo contenttype list"
    }

    fn validate(&self) -> Result<()> {
        validate_sharepoint_url(&self.web_url)
    }

    fn telemetry(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("listTitle".into(), json!(non_empty(&self.list_title).is_some()));
        props.insert("category".into(), json!(non_empty(&self.category).is_some()));
        props
    }

    fn default_properties(&self) -> &'static [&'static str] {
        &["StringId", "Name", "Hidden", "ReadOnly", "Sealed"]
    }
}

pub async fn content_type_list(args: ContentTypeListArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;

    let client = ctx.spo_client(&args.web_url).await?;
    let spo = SpoClient::new(&client, &args.web_url);

    let spinner = ctx.spinner("Retrieving content types...");
    let result = spo
        .list_content_types(non_empty(&args.list_title), non_empty(&args.category))
        .await;
    spinner.finish_and_clear();

    ctx.emit(&args, &Value::Array(result?))
}

#[derive(Args, Debug)]
pub struct PageListArgs {
    /// URL of the site from which to retrieve available pages
    #[arg(short = 'u', long)]
    pub web_url: String,
}

impl CommandSpec for PageListArgs {
    fn name(&self) -> &'static str {
        "spo page list"
    }

    fn validate(&self) -> Result<()> {
        validate_sharepoint_url(&self.web_url)
    }

    fn default_properties(&self) -> &'static [&'static str] {
        &["Name", "Title"]
    }
}

pub async fn page_list(args: PageListArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;
    tracing::info!("Retrieving client-side pages...");

    let client = ctx.spo_client(&args.web_url).await?;
    let spo = SpoClient::new(&client, &args.web_url);

    let spinner = ctx.spinner("Retrieving client-side pages...");
    let result = spo.list_pages().await;
    spinner.finish_and_clear();

    ctx.emit(&args, &Value::Array(result?))
}

#[derive(Args, Debug)]
pub struct FileRenameArgs {
    /// URL of the site where the file is located
    #[arg(short = 'u', long)]
    pub web_url: String,

    /// Site-relative or server-relative URL of the file to rename
    #[arg(short, long)]
    pub source_url: String,

    /// New file name, including the extension
    #[arg(short, long)]
    pub target_file_name: String,

    /// Recycle a file that already has the target name
    #[arg(long)]
    pub force: bool,
}

impl CommandSpec for FileRenameArgs {
    fn name(&self) -> &'static str {
        "spo file rename"
    }

    fn validate(&self) -> Result<()> {
        validate_sharepoint_url(&self.web_url)
    }

    fn telemetry(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("force".into(), json!(self.force));
        props
    }

    fn default_properties(&self) -> &'static [&'static str] {
        &["FieldName", "FieldValue", "ErrorMessage"]
    }
}

pub async fn file_rename(args: FileRenameArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;

    let client = ctx.spo_client(&args.web_url).await?;
    let spo = SpoClient::new(&client, &args.web_url);

    let spinner = ctx.spinner(&format!("Renaming {}...", args.source_url));
    let result = spo
        .rename_file(&args.source_url, &args.target_file_name, args.force)
        .await;
    spinner.finish_and_clear();

    let results = result?;
    for failed in results.iter().filter(|r| r.has_exception) {
        tracing::warn!(
            field = %failed.field_name,
            code = failed.error_code,
            error = failed.error_message.as_deref().unwrap_or_default(),
            "rename reported a field error"
        );
    }

    ctx.emit(&args, &serde_json::to_value(&results)?)
}

#[derive(Args, Debug)]
pub struct FileRemoveArgs {
    /// URL of the site where the file is located
    #[arg(short = 'u', long)]
    pub web_url: String,

    /// Unique ID (GUID) of the file to remove
    #[arg(short, long)]
    pub id: Option<String>,

    /// Site-relative or server-relative URL of the file to remove
    #[arg(long)]
    pub url: Option<String>,

    /// Move the file to the recycle bin instead of deleting it
    #[arg(long)]
    pub recycle: bool,

    /// Don't prompt for confirmation
    #[arg(long)]
    pub confirm: bool,
}

impl FileRemoveArgs {
    fn target(&self) -> Result<FileTarget> {
        match (non_empty(&self.id), non_empty(&self.url)) {
            (Some(id), None) => Ok(FileTarget::Id(id.to_string())),
            (None, Some(url)) => Ok(FileTarget::Url(url.to_string())),
            _ => Err(self.validate().err().unwrap_or_else(|| {
                M365Error::ValidationError("Specify either id or url".into())
            })),
        }
    }
}

impl CommandSpec for FileRemoveArgs {
    fn name(&self) -> &'static str {
        "spo file remove"
    }

    fn validate(&self) -> Result<()> {
        validate_sharepoint_url(&self.web_url)?;
        require_exactly_one(&[
            ("id", non_empty(&self.id).is_some()),
            ("url", non_empty(&self.url).is_some()),
        ])?;
        if let Some(id) = non_empty(&self.id) {
            validate_guid(id)?;
        }
        Ok(())
    }

    fn telemetry(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("id".into(), json!(non_empty(&self.id).is_some()));
        props.insert("url".into(), json!(non_empty(&self.url).is_some()));
        props.insert("recycle".into(), json!(self.recycle));
        props.insert("confirm".into(), json!(self.confirm));
        props
    }
}

pub async fn file_remove(args: FileRemoveArgs, ctx: &CommandContext) -> Result<()> {
    prepare(&args)?;
    let target = args.target()?;

    if !args.confirm {
        let label = non_empty(&args.id)
            .or(non_empty(&args.url))
            .unwrap_or_default();
        let proceed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to {} the file {}?",
                if args.recycle { "recycle" } else { "remove" },
                label
            ))
            .default(false)
            .interact()?;
        if !proceed {
            println!("{} Aborted", "✗".yellow());
            return Ok(());
        }
    }

    let client = ctx.spo_client(&args.web_url).await?;
    let spo = SpoClient::new(&client, &args.web_url);

    let spinner = ctx.spinner("Removing file...");
    let result = spo.remove_file(&target, args.recycle).await;
    match &result {
        Ok(()) if args.recycle => finish_spinner_success(&spinner, "File moved to the recycle bin"),
        Ok(()) => finish_spinner_success(&spinner, "File removed"),
        Err(_) => finish_spinner_error(&spinner, "Failed to remove file"),
    }
    result?;

    tracing::info!(recycle = args.recycle, "file removed");
    Ok(())
}
