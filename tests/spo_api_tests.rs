//! SharePoint REST contract tests: content types, pages and files

use m365ctl::graph::sharepoint::{
    ContentTypeLookup, FileTarget, SpoClient, CLIENT_SIDE_APPLICATION_ID,
};
use m365ctl::graph::{RestClient, RetryPolicy};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOMETADATA: &str = "application/json;odata=nometadata";
const SOURCE_PATH: &str =
    "/sites/team/_api/web/GetFileByServerRelativeUrl('%2Fsites%2Fteam%2FShared%20Documents%2Fa.docx')";
const TARGET_PATH: &str =
    "/sites/team/_api/web/GetFileByServerRelativeUrl('%2Fsites%2Fteam%2FShared%20Documents%2Fb.docx')";

fn rest_client(server: &MockServer) -> RestClient {
    RestClient::new("token")
        .with_graph_base(server.uri())
        .with_retry_policy(RetryPolicy::none())
}

fn web_url(server: &MockServer) -> String {
    format!("{}/sites/team", server.uri())
}

fn sp_error(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "odata.error": {
            "code": "-2130575338, Microsoft.SharePoint.SPException",
            "message": {"lang": "en-US", "value": message}
        }
    }))
}

#[tokio::test]
async fn test_content_type_get_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/team/_api/web/contenttypes('0x0101')"))
        .and(header("accept", NOMETADATA))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Name": "Document",
            "StringId": "0x0101"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let ct = spo
        .get_content_type(None, ContentTypeLookup::Id("0x0101"))
        .await
        .unwrap();

    assert_eq!(ct["Name"], "Document");
}

#[tokio::test]
async fn test_content_type_get_by_id_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/team/_api/web/contenttypes('0x0100FF')"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"odata.null": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let err = spo
        .get_content_type(None, ContentTypeLookup::Id("0x0100FF"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Content type with ID 0x0100FF not found");
}

#[tokio::test]
async fn test_content_type_get_by_name_from_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/team/_api/web/lists/getByTitle('Documents')/contenttypes"))
        .and(query_param("$filter", "Name eq 'Document'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"Name": "Document", "StringId": "0x010100ABC"},
                {"Name": "Document", "StringId": "0x010100DEF"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let ct = spo
        .get_content_type(Some("Documents"), ContentTypeLookup::Name("Document"))
        .await
        .unwrap();

    assert_eq!(ct["StringId"], "0x010100ABC");
}

#[tokio::test]
async fn test_content_type_get_by_name_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/team/_api/web/contenttypes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let err = spo
        .get_content_type(None, ContentTypeLookup::Name("Invoice"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Content type with name Invoice not found");
}

#[tokio::test]
async fn test_content_type_get_surfaces_service_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/team/_api/web/lists/getByTitle('Missing')/contenttypes('0x0101')"))
        .respond_with(sp_error(
            404,
            "List 'Missing' does not exist at site with URL 'https://contoso.sharepoint.com/sites/team'.",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let err = spo
        .get_content_type(Some("Missing"), ContentTypeLookup::Id("0x0101"))
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("List 'Missing' does not exist"));
}

#[tokio::test]
async fn test_content_type_list_filters_on_group() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/team/_api/web/lists/getByTitle('Team%27%27s%20Docs')/ContentTypes"))
        .and(query_param("$filter", "Group eq 'List Content Types'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"Name": "Folder"}, {"Name": "Document"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let cts = spo
        .list_content_types(Some("Team's Docs"), Some("List Content Types"))
        .await
        .unwrap();

    assert_eq!(cts.len(), 2);
}

#[tokio::test]
async fn test_content_type_list_doubles_quotes_in_list_title() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/team/_api/web/lists/getByTitle('Team%27%27s%20Docs')/ContentTypes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"Name": "Document", "StringId": "0x0101"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let types = spo
        .list_content_types(Some("Team's Docs"), None)
        .await
        .unwrap();

    assert_eq!(types[0]["StringId"], "0x0101");
}

#[tokio::test]
async fn test_page_list_merges_page_files() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/team/_api/sitepages/pages"))
        .and(query_param("$orderby", "Title"))
        .and(header("accept", NOMETADATA))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"Id": 1, "Title": "Home", "PageLayoutType": "Home"},
                {"Id": 2, "Title": "Legacy"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sites/team/_api/web/lists/SitePages/rootfolder/files"))
        .and(query_param("$expand", "ListItemAllFields/ClientSideApplicationId"))
        .and(query_param("$orderby", "Name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {
                    "Name": "Home.aspx",
                    "TimeLastModified": "2024-01-01T00:00:00Z",
                    "ListItemAllFields": {"Id": 1, "ClientSideApplicationId": CLIENT_SIDE_APPLICATION_ID}
                },
                {
                    "Name": "Legacy.aspx",
                    "ListItemAllFields": {"Id": 2, "ClientSideApplicationId": null}
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let pages = spo.list_pages().await.unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["Name"], "Home.aspx");
    assert_eq!(pages[0]["Title"], "Home");
    assert_eq!(pages[0]["TimeLastModified"], "2024-01-01T00:00:00Z");
    assert!(pages[1].get("Name").is_none());
}

#[tokio::test]
async fn test_page_list_without_page_files_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/team/_api/sitepages/pages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"Id": 1, "Title": "Home"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sites/team/_api/web/lists/SitePages/rootfolder/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let pages = spo.list_pages().await.unwrap();

    assert!(pages.is_empty());
}

#[tokio::test]
async fn test_file_rename_updates_file_leaf_ref() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SOURCE_PATH))
        .and(query_param("$select", "UniqueId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "UniqueId": "b2307a39-e878-458b-bc90-03bc578531d6"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{}/ListItemAllFields/ValidateUpdateListItem()", SOURCE_PATH)))
        .and(body_json(json!({
            "formValues": [{"FieldName": "FileLeafRef", "FieldValue": "b.docx"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "ErrorCode": 0,
                "ErrorMessage": null,
                "FieldName": "FileLeafRef",
                "FieldValue": "b.docx",
                "HasException": false,
                "ItemId": 7
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let results = spo
        .rename_file("Shared Documents/a.docx", "b.docx", false)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].field_value.as_deref(), Some("b.docx"));
    assert_eq!(results[0].item_id, 7);
    assert!(!results[0].has_exception);
}

#[tokio::test]
async fn test_file_rename_doubles_quotes_in_source_url() {
    let server = MockServer::start().await;
    let source = concat!(
        "/sites/team/_api/web/GetFileByServerRelativeUrl(",
        "'%2Fsites%2Fteam%2FShared%20Documents%2FO%27%27Brien.docx')"
    );

    Mock::given(method("GET"))
        .and(path(source))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"UniqueId": "1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{}/ListItemAllFields/ValidateUpdateListItem()", source)))
        .and(body_json(json!({
            "formValues": [{"FieldName": "FileLeafRef", "FieldValue": "Brien.docx"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "ErrorCode": 0,
                "FieldName": "FileLeafRef",
                "FieldValue": "Brien.docx",
                "HasException": false,
                "ItemId": 3
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let results = spo
        .rename_file("Shared Documents/O'Brien.docx", "Brien.docx", false)
        .await
        .unwrap();

    assert_eq!(results[0].item_id, 3);
}

#[tokio::test]
async fn test_file_rename_missing_source_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SOURCE_PATH))
        .respond_with(sp_error(404, "File Not Found."))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let err = spo
        .rename_file("/sites/team/Shared Documents/a.docx", "b.docx", true)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "File Not Found.");
}

#[tokio::test]
async fn test_file_rename_force_ignores_missing_target() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SOURCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"UniqueId": "1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{}/recycle()", TARGET_PATH)))
        .and(header("X-HTTP-Method", "DELETE"))
        .and(header("If-Match", "*"))
        .respond_with(sp_error(
            404,
            "The file /sites/team/Shared Documents/b.docx does not exist.",
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{}/ListItemAllFields/ValidateUpdateListItem()", SOURCE_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "ErrorCode": 0,
                "FieldName": "FileLeafRef",
                "FieldValue": "b.docx",
                "HasException": false,
                "ItemId": 7
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let results = spo
        .rename_file(
            &format!("{}/Shared Documents/a.docx", web_url(&server)),
            "b.docx",
            true,
        )
        .await
        .unwrap();

    assert_eq!(results[0].field_name, "FileLeafRef");
}

#[tokio::test]
async fn test_file_rename_force_aborts_on_other_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SOURCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"UniqueId": "1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{}/recycle()", TARGET_PATH)))
        .respond_with(sp_error(403, "Access denied."))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{}/ListItemAllFields/ValidateUpdateListItem()", SOURCE_PATH)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    let err = spo
        .rename_file("Shared Documents/a.docx", "b.docx", true)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Access denied.");
}

#[tokio::test]
async fn test_file_remove_by_id_to_recycle_bin() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/sites/team/_api/web/GetFileById('b2307a39-e878-458b-bc90-03bc578531d6')/recycle()",
        ))
        .and(header("X-HTTP-Method", "DELETE"))
        .and(header("If-Match", "*"))
        .and(header("accept", NOMETADATA))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": "guid"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    spo.remove_file(
        &FileTarget::Id("b2307a39-e878-458b-bc90-03bc578531d6".into()),
        true,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_file_remove_by_url_deletes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TARGET_PATH))
        .and(header("X-HTTP-Method", "DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spo = SpoClient::new(&client, &web_url(&server));
    spo.remove_file(&FileTarget::Url("Shared Documents/b.docx".into()), false)
        .await
        .unwrap();
}
