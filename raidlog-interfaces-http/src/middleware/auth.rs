use std::io::Read;

use anyhow::{anyhow, Result};
use axum::http::HeaderMap;
use flate2::read::GzDecoder;

use raidlog_domain::{HostSignal, RuntimeConfig, SignalEnvelope};

use crate::error::HttpError;

pub const SIGNAL_SCHEMA_VERSION: &str = "v1";

/// Read access: open when no api token is configured.
pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

/// Destructive access: closed when no admin token is configured.
pub fn authorize_admin(config: &RuntimeConfig, headers: &HeaderMap) -> Result<(), HttpError> {
    let Some(admin_token) = &config.admin_token else {
        return Err(HttpError::Forbidden);
    };
    match extract_bearer(headers) {
        Some(token) if token == *admin_token => Ok(()),
        _ => Err(HttpError::Unauthorized),
    }
}

pub fn parse_signals(headers: &HeaderMap, body: &[u8]) -> Result<(Option<String>, Vec<HostSignal>)> {
    let content = maybe_gunzip(headers, body)?;
    let envelope: SignalEnvelope = serde_json::from_str(&content)?;
    if envelope.schema_version.trim() != SIGNAL_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported schema_version '{}', expected '{}'",
            envelope.schema_version,
            SIGNAL_SCHEMA_VERSION
        ));
    }
    Ok((envelope.server_id, envelope.signals))
}

fn maybe_gunzip(headers: &HeaderMap, body: &[u8]) -> Result<String> {
    if let Some(encoding) = headers.get("Content-Encoding") {
        if encoding.to_str().unwrap_or("") == "gzip" {
            let mut decoder = GzDecoder::new(body);
            let mut out = String::new();
            decoder.read_to_string(&mut out)?;
            return Ok(out);
        }
    }
    Ok(String::from_utf8(body.to_vec())?)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
