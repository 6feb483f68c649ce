//! Microsoft Teams settings through Graph

use crate::error::Result;
use crate::graph::{ApiRequest, RestClient, ODATA_METADATA_NONE};
use crate::util::formatting::encode_uri_component;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Member permissions of a team. Unset fields are left untouched by PATCH.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_add_remove_apps: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_create_update_channels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_create_update_remove_connectors: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_create_update_remove_tabs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_delete_channels: Option<bool>,
}

/// Group properties of a team; only set fields are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_nick_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

pub struct TeamsClient<'a> {
    client: &'a RestClient,
}

impl<'a> TeamsClient<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    pub async fn get_member_settings(&self, team_id: &str) -> Result<Value> {
        let url = self.client.graph_url(&format!(
            "/v1.0/teams/{}?$select=memberSettings",
            encode_uri_component(team_id)
        ));
        let team: Value = self
            .client
            .execute(&ApiRequest::get(url).accept(ODATA_METADATA_NONE))
            .await?;
        Ok(team.get("memberSettings").cloned().unwrap_or(Value::Null))
    }

    /// PATCH /v1.0/teams/{id} with `{"memberSettings": {...}}`
    pub async fn update_member_settings(
        &self,
        team_id: &str,
        settings: &MemberSettings,
    ) -> Result<()> {
        let url = self
            .client
            .graph_url(&format!("/v1.0/teams/{}", encode_uri_component(team_id)));
        let request = ApiRequest::patch(url)
            .accept(ODATA_METADATA_NONE)
            .json(json!({ "memberSettings": settings }));
        self.client.execute_no_content(&request).await
    }

    /// PATCH /v1.0/groups/{id}; a team shares its id with its group
    pub async fn update_team(&self, team_id: &str, update: &TeamUpdate) -> Result<()> {
        let url = self
            .client
            .graph_url(&format!("/v1.0/groups/{}", encode_uri_component(team_id)));
        let request = ApiRequest::patch(url)
            .accept(ODATA_METADATA_NONE)
            .json(serde_json::to_value(update)?);
        self.client.execute_no_content(&request).await
    }
}
