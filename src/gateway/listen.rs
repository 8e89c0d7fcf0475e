//! Usage: Listen address parsing for the HTTP server (`host`, `host:port`, `[ipv6]:port`).

use crate::shared::error::AppResult;

pub(crate) const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedListenAddress {
    pub(crate) host: String,
    pub(crate) port: Option<u16>,
}

impl ParsedListenAddress {
    pub(crate) fn bind_target(&self) -> String {
        format_host_port(&self.host, self.port.unwrap_or(DEFAULT_PORT))
    }
}

pub(crate) fn is_wildcard_host(host: &str) -> bool {
    matches!(host.trim(), "0.0.0.0" | "::")
}

pub(crate) fn format_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

fn parse_port(raw: &str) -> AppResult<u16> {
    let port: u16 = raw
        .trim()
        .parse()
        .map_err(|_| "SEC_INVALID_INPUT: invalid listen port".to_string())?;
    if port == 0 {
        return Err("SEC_INVALID_INPUT: listen port must be > 0".into());
    }
    Ok(port)
}

pub(crate) fn parse_listen_address(input: &str) -> AppResult<ParsedListenAddress> {
    let raw = input.trim();
    if raw.is_empty() {
        return Ok(ParsedListenAddress {
            host: "127.0.0.1".to_string(),
            port: None,
        });
    }
    if raw.contains("://") || raw.contains('/') {
        return Err("SEC_INVALID_INPUT: listen address must be host or host:port".into());
    }

    if let Some(rest) = raw.strip_prefix('[') {
        let idx = rest.find(']').ok_or_else(|| {
            "SEC_INVALID_INPUT: invalid IPv6 address: missing closing ']'".to_string()
        })?;
        let host = rest[..idx].trim();
        if host.is_empty() {
            return Err("SEC_INVALID_INPUT: listen address missing host".into());
        }
        let tail = rest[idx + 1..].trim();
        if tail.is_empty() {
            return Ok(ParsedListenAddress {
                host: host.to_string(),
                port: None,
            });
        }
        let port_raw = tail
            .strip_prefix(':')
            .ok_or_else(|| "SEC_INVALID_INPUT: listen address must be [ipv6]:port".to_string())?;
        return Ok(ParsedListenAddress {
            host: host.to_string(),
            port: Some(parse_port(port_raw)?),
        });
    }

    match raw.split(':').collect::<Vec<_>>().as_slice() {
        [host] => Ok(ParsedListenAddress {
            host: host.trim().to_string(),
            port: None,
        }),
        [host, port] => {
            let host = host.trim();
            if host.is_empty() {
                return Err("SEC_INVALID_INPUT: listen address missing host".into());
            }
            Ok(ParsedListenAddress {
                host: host.to_string(),
                port: Some(parse_port(port)?),
            })
        }
        _ => Err("SEC_INVALID_INPUT: IPv6 must use [addr]:port".into()),
    }
}
