//! Option validators used by `CommandSpec::validate` implementations

use crate::error::{M365Error, Result};
use regex::Regex;

lazy_static::lazy_static! {
    static ref GUID_RE: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    )
    .expect("valid GUID regex");
    static ref MESSAGE_ID_RE: Regex = Regex::new(r"^MC\d+$").expect("valid message id regex");
    static ref CONNECTION_NAME_RE: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid connection name regex");
}

pub fn is_valid_guid(value: &str) -> bool {
    GUID_RE.is_match(value)
}

pub fn validate_guid(value: &str) -> Result<()> {
    if is_valid_guid(value) {
        Ok(())
    } else {
        Err(M365Error::ValidationError(format!(
            "{} is not a valid GUID",
            value
        )))
    }
}

/// SharePoint Online URLs are always absolute https URLs
pub fn validate_sharepoint_url(url: &str) -> Result<()> {
    if url.starts_with("https://") {
        Ok(())
    } else {
        Err(M365Error::ValidationError(format!(
            "{} is not a valid SharePoint Online site URL",
            url
        )))
    }
}

/// Service update message ids look like `MC123456`
pub fn validate_message_id(id: &str) -> Result<()> {
    if MESSAGE_ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(M365Error::ValidationError(format!(
            "{} is not a valid message ID",
            id
        )))
    }
}

/// Connection names double as token cache directory names
pub fn validate_connection_name(name: &str) -> Result<()> {
    if CONNECTION_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(M365Error::ValidationError(format!(
            "{} is not a valid connection name. Use letters, digits, '.', '-' and '_'",
            name
        )))
    }
}

/// Parse an option that only accepts the literal strings `true` and `false`
pub fn parse_bool_literal(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// An option value, treating an empty string as not passed
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Require exactly one option out of a set, naming them in the message
pub fn require_exactly_one(options: &[(&str, bool)]) -> Result<()> {
    let names: Vec<&str> = options.iter().map(|(name, _)| *name).collect();
    match options.iter().filter(|(_, present)| *present).count() {
        1 => Ok(()),
        0 => Err(M365Error::ValidationError(format!(
            "Specify either {}",
            names.join(" or ")
        ))),
        _ => Err(M365Error::ValidationError(format!(
            "Specify either {}, but not multiple",
            names.join(" or ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_treats_empty_as_absent() {
        assert_eq!(non_empty(&Some("Teams".into())), Some("Teams"));
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&None), None);
    }

    #[test]
    fn test_connection_name_rejects_paths() {
        assert!(validate_connection_name("contoso").is_ok());
        assert!(validate_connection_name("contoso.onmicrosoft.com").is_ok());
        assert!(validate_connection_name("dev_tenant-2").is_ok());
        assert!(validate_connection_name("../../x").is_err());
        assert!(validate_connection_name("..").is_err());
        assert!(validate_connection_name("a/b").is_err());
        assert!(validate_connection_name("a\\b").is_err());
        assert!(validate_connection_name("").is_err());
    }

    #[test]
    fn test_guid_validation() {
        assert!(is_valid_guid("8231f9f2-701f-4c6e-93ce-ecb563e3c1ee"));
        assert!(is_valid_guid("8231F9F2-701F-4C6E-93CE-ECB563E3C1EE"));
        assert!(!is_valid_guid("invalid"));
        assert!(!is_valid_guid("{8231f9f2-701f-4c6e-93ce-ecb563e3c1ee}"));
        assert_eq!(
            validate_guid("invalid").unwrap_err().to_string(),
            "invalid is not a valid GUID"
        );
    }

    #[test]
    fn test_sharepoint_url_validation() {
        assert!(validate_sharepoint_url("https://contoso.sharepoint.com/sites/team").is_ok());
        assert_eq!(
            validate_sharepoint_url("foo").unwrap_err().to_string(),
            "foo is not a valid SharePoint Online site URL"
        );
    }

    #[test]
    fn test_bool_literal() {
        assert_eq!(parse_bool_literal("true"), Some(true));
        assert_eq!(parse_bool_literal("false"), Some(false));
        assert_eq!(parse_bool_literal("True"), None);
        assert_eq!(parse_bool_literal("yes"), None);
    }

    #[test]
    fn test_message_id() {
        assert!(validate_message_id("MC123456").is_ok());
        assert!(validate_message_id("123456").is_err());
    }

    #[test]
    fn test_require_exactly_one() {
        assert!(require_exactly_one(&[("id", true), ("name", false)]).is_ok());
        assert_eq!(
            require_exactly_one(&[("id", false), ("name", false)])
                .unwrap_err()
                .to_string(),
            "Specify either id or name"
        );
        assert_eq!(
            require_exactly_one(&[("id", true), ("name", true)])
                .unwrap_err()
                .to_string(),
            "Specify either id or name, but not multiple"
        );
    }
}
