use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum M365Error {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Option validation failed before any request was sent
    #[error("{0}")]
    ValidationError(String),

    /// Command-level failure with a user-facing message
    #[error("{0}")]
    CommandError(String),

    /// Non-success response from Graph or SharePoint REST
    #[error("{message}")]
    ApiError {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Interactive prompt error: {0}")]
    DialoguerError(#[from] dialoguer::Error),

    #[error("Not logged in. Please run 'm365ctl login' first")]
    TokenNotFound,

    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, M365Error>;

pub use M365Error as Error;

impl M365Error {
    /// Builds an `ApiError` from a failed response body
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let (code, message) = parse_odata_error(body);
        M365Error::ApiError {
            status,
            code,
            message,
        }
    }

    /// Extra guidance for well-known service error codes
    pub fn hint(&self) -> Option<&'static str> {
        let M365Error::ApiError {
            status,
            code,
            message,
        } = self
        else {
            return None;
        };

        match code.as_deref() {
            Some("Unauthorized" | "InvalidAuthenticationToken") => {
                Some("Your access token may have expired. Try running 'm365ctl login' again.")
            }
            Some("Forbidden" | "Authorization_RequestDenied" | "InsufficientPrivileges") => {
                Some("Check that the app registration has the required permissions and admin consent is granted.")
            }
            Some("TooManyRequests") => Some("API rate limit exceeded. Wait a moment and try again."),
            Some("BadRequest") if message.contains("Resource not found for the segment") => {
                Some("This endpoint may only be available on the beta API.")
            }
            _ if *status == StatusCode::UNAUTHORIZED => {
                Some("The service rejected the access token. Try running 'm365ctl login' again.")
            }
            _ => None,
        }
    }
}

/// Extract `(code, message)` from an OData error payload.
///
/// SharePoint REST nests the message as `odata.error.message.value`, Graph uses
/// `error.message`, Entra ID token endpoints use `error_description`. Anything
/// unparseable is returned verbatim.
pub fn parse_odata_error(body: &str) -> (Option<String>, String) {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return (None, body.trim().to_string());
    };

    if let Some(sp_error) = json.get("odata.error") {
        let code = sp_error
            .get("code")
            .and_then(|c| c.as_str())
            .map(String::from);
        if let Some(value) = sp_error
            .get("message")
            .and_then(|m| m.get("value"))
            .and_then(|v| v.as_str())
        {
            return (code, value.to_string());
        }
    }

    match json.get("error") {
        Some(serde_json::Value::Object(error)) => {
            let code = error.get("code").and_then(|c| c.as_str()).map(String::from);
            if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
                return (code, message.to_string());
            }
        }
        Some(serde_json::Value::String(code)) => {
            if let Some(description) = json.get("error_description").and_then(|d| d.as_str()) {
                return (Some(code.clone()), description.to_string());
            }
        }
        _ => {}
    }

    if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
        return (None, message.to_string());
    }

    (None, body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_graph_error() {
        let body = r#"{"error":{"code":"ItemNotFound","message":"No team found with Group Id 8231f9f2-701f-4c6e-93ce-ecb563e3c1ee","innerError":{"request-id":"27b49647"}}}"#;
        let (code, message) = parse_odata_error(body);
        assert_eq!(code.as_deref(), Some("ItemNotFound"));
        assert_eq!(
            message,
            "No team found with Group Id 8231f9f2-701f-4c6e-93ce-ecb563e3c1ee"
        );
    }

    #[test]
    fn test_parse_sharepoint_error() {
        let body = r#"{"odata.error":{"code":"-2147024894, System.IO.FileNotFoundException","message":{"lang":"en-US","value":"File Not Found."}}}"#;
        let (code, message) = parse_odata_error(body);
        assert_eq!(
            code.as_deref(),
            Some("-2147024894, System.IO.FileNotFoundException")
        );
        assert_eq!(message, "File Not Found.");
    }

    #[test]
    fn test_parse_token_endpoint_error() {
        let body = r#"{"error":"invalid_grant","error_description":"AADSTS70000: The grant is expired."}"#;
        let (code, message) = parse_odata_error(body);
        assert_eq!(code.as_deref(), Some("invalid_grant"));
        assert_eq!(message, "AADSTS70000: The grant is expired.");
    }

    #[test]
    fn test_parse_plain_text_error() {
        let (code, message) = parse_odata_error("Service Unavailable\n");
        assert!(code.is_none());
        assert_eq!(message, "Service Unavailable");
    }

    #[test]
    fn test_api_error_displays_message_only() {
        let err = M365Error::from_response(
            StatusCode::FORBIDDEN,
            r#"{"error":{"code":"Forbidden","message":"Access denied"}}"#,
        );
        assert_eq!(err.to_string(), "Access denied");
        assert!(err.hint().is_some());
    }
}
