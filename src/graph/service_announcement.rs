//! Service communications API: message center posts and service health

use crate::error::Result;
use crate::graph::{ApiRequest, RestClient, ODATA_METADATA_NONE};
use crate::util::formatting::{encode_query_parameter, encode_uri_component};
use serde_json::Value;

const BASE_PATH: &str = "/v1.0/admin/serviceAnnouncement";

pub struct ServiceAnnouncementClient<'a> {
    client: &'a RestClient,
}

impl<'a> ServiceAnnouncementClient<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    fn url(&self, path: &str) -> String {
        self.client.graph_url(&format!("{}/{}", BASE_PATH, path))
    }

    async fn get_one(&self, path: &str) -> Result<Value> {
        self.client
            .execute(&ApiRequest::get(self.url(path)).accept(ODATA_METADATA_NONE))
            .await
    }

    /// All service update messages, optionally only those tagged with a service
    pub async fn list_messages(&self, service: Option<&str>) -> Result<Vec<Value>> {
        let mut url = self.url("messages");
        if let Some(service) = service.filter(|s| !s.is_empty()) {
            url.push_str(&format!(
                "?$filter=services/any(c:c+eq+'{}')",
                encode_uri_component(service)
            ));
        }
        self.client.get_all_items(&url, ODATA_METADATA_NONE).await
    }

    pub async fn get_message(&self, id: &str) -> Result<Value> {
        self.get_one(&format!("messages/{}", encode_uri_component(id))).await
    }

    pub async fn list_health_overviews(&self, include_issues: bool) -> Result<Vec<Value>> {
        let mut url = self.url("healthOverviews");
        if include_issues {
            url.push_str("?$expand=issues");
        }
        self.client.get_all_items(&url, ODATA_METADATA_NONE).await
    }

    pub async fn get_health_overview(
        &self,
        service_name: &str,
        include_issues: bool,
    ) -> Result<Value> {
        let mut path = format!("healthOverviews/{}", encode_uri_component(service_name));
        if include_issues {
            path.push_str("?$expand=issues");
        }
        self.get_one(&path).await
    }

    pub async fn list_issues(&self, service: Option<&str>) -> Result<Vec<Value>> {
        let mut url = self.url("issues");
        if let Some(service) = service.filter(|s| !s.is_empty()) {
            url.push_str(&format!(
                "?$filter=service eq '{}'",
                encode_query_parameter(service)
            ));
        }
        self.client.get_all_items(&url, ODATA_METADATA_NONE).await
    }

    pub async fn get_issue(&self, id: &str) -> Result<Value> {
        self.get_one(&format!("issues/{}", encode_uri_component(id))).await
    }
}
