//! SharePoint Online REST integration
//!
//! Content types, modern pages and file operations against `{webUrl}/_api`.

use crate::error::{M365Error, Result};
use crate::graph::{ApiRequest, RestClient, ODATA_NOMETADATA};
use crate::util::formatting::{encode_query_parameter, encode_uri_component};
use crate::util::url::{parent_folder, server_relative_path};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `ClientSideApplicationId` of list items that are modern (client-side) pages
pub const CLIENT_SIDE_APPLICATION_ID: &str = "b6917cb1-93a0-4b97-a84d-7cf49975d4ec";

/// How a content type is looked up
#[derive(Debug, Clone, Copy)]
pub enum ContentTypeLookup<'a> {
    Id(&'a str),
    Name(&'a str),
}

/// How a file is addressed
#[derive(Debug, Clone)]
pub enum FileTarget {
    Id(String),
    /// Site-relative, server-relative or absolute URL
    Url(String),
}

/// One entry of a `ValidateUpdateListItem()` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RenameResult {
    pub error_code: i64,
    #[serde(default)]
    pub error_message: Option<String>,
    pub field_name: String,
    #[serde(default)]
    pub field_value: Option<String>,
    pub has_exception: bool,
    pub item_id: i64,
}

#[derive(Debug, Deserialize)]
struct RenameResponse {
    #[serde(default)]
    value: Vec<RenameResult>,
}

/// Overlay every page with its client-side page file, page properties winning.
/// Pages without a matching file are returned unchanged.
pub fn merge_client_side_pages(pages: Vec<Value>, files: &[Value]) -> Vec<Value> {
    let client_side_files: Vec<&Value> = files
        .iter()
        .filter(|f| {
            f.pointer("/ListItemAllFields/ClientSideApplicationId")
                .and_then(|id| id.as_str())
                == Some(CLIENT_SIDE_APPLICATION_ID)
        })
        .collect();

    pages
        .into_iter()
        .map(|page| {
            let file = client_side_files.iter().find(|f| {
                match (f.pointer("/ListItemAllFields/Id"), page.get("Id")) {
                    (Some(file_id), Some(page_id)) => file_id == page_id,
                    _ => false,
                }
            });

            match (file, page) {
                (Some(Value::Object(file)), Value::Object(page_props)) => {
                    let mut merged = file.clone();
                    merged.extend(page_props);
                    Value::Object(merged)
                }
                (_, page) => page,
            }
        })
        .collect()
}

/// SharePoint REST operations scoped to one site
pub struct SpoClient<'a> {
    client: &'a RestClient,
    web_url: String,
}

impl<'a> SpoClient<'a> {
    pub fn new(client: &'a RestClient, web_url: &str) -> Self {
        Self {
            client,
            web_url: web_url.trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/_api/{}", self.web_url, path)
    }

    /// `web/` or `web/lists/getByTitle('...')/`
    fn web_or_list(list_title: Option<&str>) -> String {
        match list_title {
            Some(title) => format!(
                "web/lists/getByTitle('{}')/",
                encode_query_parameter(title)
            ),
            None => "web/".to_string(),
        }
    }

    fn file_url(&self, server_relative_url: &str) -> String {
        self.api_url(&format!(
            "web/GetFileByServerRelativeUrl('{}')",
            encode_query_parameter(server_relative_url)
        ))
    }

    /// Retrieve a site or list content type by ID or name
    pub async fn get_content_type(
        &self,
        list_title: Option<&str>,
        lookup: ContentTypeLookup<'_>,
    ) -> Result<Value> {
        let mut url = self.api_url(&format!("{}contenttypes", Self::web_or_list(list_title)));
        match lookup {
            ContentTypeLookup::Id(id) => {
                url.push_str(&format!("('{}')", encode_uri_component(id)));
            }
            ContentTypeLookup::Name(name) => {
                url.push_str(&format!(
                    "?$filter=Name eq '{}'",
                    encode_uri_component(name)
                ));
            }
        }

        let res: Value = self
            .client
            .execute(&ApiRequest::get(url).accept(ODATA_NOMETADATA))
            .await?;

        match lookup {
            ContentTypeLookup::Name(name) => res
                .get("value")
                .and_then(|v| v.as_array())
                .and_then(|v| v.first())
                .cloned()
                .ok_or_else(|| {
                    M365Error::CommandError(format!("Content type with name {} not found", name))
                }),
            ContentTypeLookup::Id(id) => {
                if res.get("odata.null").and_then(|v| v.as_bool()) == Some(true) {
                    return Err(M365Error::CommandError(format!(
                        "Content type with ID {} not found",
                        id
                    )));
                }
                Ok(res)
            }
        }
    }

    /// List content types of a site or list, optionally only one group
    pub async fn list_content_types(
        &self,
        list_title: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<Value>> {
        let mut url = self.api_url(&format!("{}ContentTypes", Self::web_or_list(list_title)));
        if let Some(category) = category {
            url.push_str(&format!(
                "?$filter=Group eq '{}'",
                encode_query_parameter(category)
            ));
        }

        self.client.get_all_items(&url, ODATA_NOMETADATA).await
    }

    /// All modern pages of the site, merged with their page library files.
    /// Returns nothing when the page library has no files.
    pub async fn list_pages(&self) -> Result<Vec<Value>> {
        let pages: Vec<Value> = self
            .client
            .get_all_items(
                &self.api_url("sitepages/pages?$orderby=Title"),
                ODATA_NOMETADATA,
            )
            .await?;

        let files: Vec<Value> = self
            .client
            .get_all_items(
                &self.api_url(
                    "web/lists/SitePages/rootfolder/files?$expand=ListItemAllFields/ClientSideApplicationId&$orderby=Name",
                ),
                ODATA_NOMETADATA,
            )
            .await?;
        if files.is_empty() {
            tracing::debug!("site pages library has no files");
            return Ok(Vec::new());
        }

        Ok(merge_client_side_pages(pages, &files))
    }

    /// Look up a file by server-relative URL; fails when it does not exist
    pub async fn get_file_unique_id(&self, server_relative_url: &str) -> Result<Value> {
        let url = format!("{}?$select=UniqueId", self.file_url(server_relative_url));
        self.client
            .execute(&ApiRequest::get(url).accept(ODATA_NOMETADATA))
            .await
    }

    /// Delete a file, or move it to the recycle bin
    pub async fn remove_file(&self, target: &FileTarget, recycle: bool) -> Result<()> {
        let mut url = match target {
            FileTarget::Id(id) => {
                self.api_url(&format!("web/GetFileById('{}')", encode_uri_component(id)))
            }
            FileTarget::Url(path) => self.file_url(&server_relative_path(&self.web_url, path)?),
        };
        if recycle {
            url.push_str("/recycle()");
        }

        let request = ApiRequest::post(url)
            .accept(ODATA_NOMETADATA)
            .header("X-HTTP-Method", "DELETE")
            .header("If-Match", "*");
        self.client.execute_no_content(&request).await
    }

    /// Rename a file in place by updating its `FileLeafRef` field.
    ///
    /// With `force`, a file already named `target_file_name` in the same
    /// folder is moved to the recycle bin first.
    pub async fn rename_file(
        &self,
        source_url: &str,
        target_file_name: &str,
        force: bool,
    ) -> Result<Vec<RenameResult>> {
        let source = server_relative_path(&self.web_url, source_url)?;

        self.get_file_unique_id(&source).await?;

        if force {
            let target = format!(
                "{}/{}",
                server_relative_path(&self.web_url, parent_folder(source_url))?,
                target_file_name
            );
            match self.remove_file(&FileTarget::Url(target.clone()), true).await {
                Ok(()) => tracing::info!(path = %target, "recycled existing target file"),
                Err(e) if e.to_string().contains("does not exist") => {
                    tracing::debug!(path = %target, "no existing target file to remove")
                }
                Err(e) => return Err(e),
            }
        }

        let request = ApiRequest::post(format!(
            "{}/ListItemAllFields/ValidateUpdateListItem()",
            self.file_url(&source)
        ))
        .accept(ODATA_NOMETADATA)
        .json(json!({
            "formValues": [{
                "FieldName": "FileLeafRef",
                "FieldValue": target_file_name
            }]
        }));

        let response: RenameResponse = self.client.execute(&request).await?;
        Ok(response.value)
    }
}
