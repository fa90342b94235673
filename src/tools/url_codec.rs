//! URL encoder / decoder and parser

use serde::Serialize;

use super::{ToolError, ToolResult};

/// Percent-encode everything except unreserved characters
pub fn encode(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

/// Percent-decode; `+` is left as is
pub fn decode(text: &str) -> ToolResult<String> {
    urlencoding::decode(text)
        .map(|s| s.into_owned())
        .map_err(|_| ToolError::InvalidUtf8)
}

/// Decode a form-encoded query component, where `+` means space
fn decode_query_component(text: &str) -> String {
    let spaced = text.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlParts {
    pub scheme: String,
    pub username: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub fragment: Option<String>,
}

/// Split an absolute URL into its components
pub fn parse(url: &str) -> ToolResult<UrlParts> {
    let url = url.trim();
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| ToolError::invalid_input("URL must start with a scheme, e.g. https://"))?;
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return Err(ToolError::invalid_input(format!("invalid scheme '{}'", scheme)));
    }

    let (rest, fragment) = match rest.split_once('#') {
        Some((before, fragment)) => (before, Some(fragment.to_string())),
        None => (rest, None),
    };
    let (rest, query) = match rest.split_once('?') {
        Some((before, query)) => (before, query),
        None => (rest, ""),
    };
    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    let (username, host_port) = match authority.rsplit_once('@') {
        Some((userinfo, host)) => {
            let user = userinfo.split(':').next().unwrap_or_default();
            (Some(decode_query_component(user)), host)
        }
        None => (None, authority),
    };

    let (host, port) = split_host_port(host_port)?;
    if host.is_empty() {
        return Err(ToolError::invalid_input("URL has no host"));
    }

    let query = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_query_component(key), decode_query_component(value))
        })
        .collect();

    Ok(UrlParts {
        scheme: scheme.to_ascii_lowercase(),
        username,
        host: host.to_ascii_lowercase(),
        port,
        path: if path.is_empty() { "/".to_string() } else { path.to_string() },
        query,
        fragment,
    })
}

fn split_host_port(host_port: &str) -> ToolResult<(&str, Option<u16>)> {
    // Bracketed IPv6 literal
    if let Some(rest) = host_port.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| ToolError::invalid_input("unterminated IPv6 address"))?;
        let port = match after.strip_prefix(':') {
            Some(port) => Some(parse_port(port)?),
            None if after.is_empty() => None,
            None => return Err(ToolError::invalid_input("garbage after IPv6 address")),
        };
        return Ok((host, port));
    }

    match host_port.rsplit_once(':') {
        Some((host, port)) => Ok((host, Some(parse_port(port)?))),
        None => Ok((host_port, None)),
    }
}

fn parse_port(port: &str) -> ToolResult<u16> {
    port.parse::<u16>()
        .map_err(|_| ToolError::out_of_range(format!("invalid port '{}'", port)))
}
