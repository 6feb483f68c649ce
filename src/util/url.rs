//! SharePoint URL arithmetic
//!
//! SharePoint REST addresses files by their server-relative URL
//! (`/sites/team/Shared Documents/report.docx`) while users pass absolute,
//! server-relative or web-relative paths interchangeably.

use crate::error::Result;
use url::Url;

fn decoded_path(url: &Url) -> String {
    urlencoding::decode(url.path())
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| url.path().to_string())
}

/// Scheme, host and port of a web URL, e.g. `https://contoso.sharepoint.com`.
/// This is also the token resource for SharePoint REST calls.
pub fn tenant_root(web_url: &str) -> Result<String> {
    let url = Url::parse(web_url)?;
    Ok(url.origin().ascii_serialization())
}

/// Server-relative URL of the site itself, without trailing slash.
/// The root site yields an empty string.
pub fn server_relative_site_url(web_url: &str) -> Result<String> {
    let url = Url::parse(web_url)?;
    Ok(decoded_path(&url).trim_end_matches('/').to_string())
}

/// Path of `path` relative to the site, always with a leading slash.
pub fn web_relative_path(web_url: &str, path: &str) -> Result<String> {
    let site = server_relative_site_url(web_url)?;

    let mut relative = if path.starts_with("https://") || path.starts_with("http://") {
        decoded_path(&Url::parse(path)?)
    } else {
        path.to_string()
    };
    if !relative.starts_with('/') {
        relative.insert(0, '/');
    }

    if !site.is_empty() {
        let starts_with_site = relative
            .get(..site.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(&site));
        let at_boundary = relative.len() == site.len()
            || relative.as_bytes().get(site.len()) == Some(&b'/');
        if starts_with_site && at_boundary {
            relative = relative[site.len()..].to_string();
        }
    }

    let trimmed = relative.trim_end_matches('/');
    if trimmed.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

/// Server-relative URL of `path` inside the site at `web_url`
pub fn server_relative_path(web_url: &str, path: &str) -> Result<String> {
    let site = server_relative_site_url(web_url)?;
    let relative = web_relative_path(web_url, path)?;

    if relative == "/" {
        return Ok(if site.is_empty() { "/".to_string() } else { site });
    }
    Ok(format!("{}{}", site, relative))
}

/// Parent folder of a path as the user typed it (everything before the last `/`)
pub fn parent_folder(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}
