//! HTTP utilities for ledger API calls

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Error reported by the ledger, either as an HTTP status or inside a batch response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: Option<u16>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiError {
    fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(status) = self.status {
            parts.push(status.to_string());
        }
        if let Some(code) = &self.code {
            parts.push(code.clone());
        }
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        if parts.is_empty() {
            "unknown error".to_string()
        } else {
            parts.join(" ")
        }
    }

    /// Parse an error object out of a response body or batch element
    pub fn from_value(value: &Value, status: Option<u16>) -> Option<Self> {
        value.get("code")?;
        let mut error: ApiError = serde_json::from_value(value.clone()).ok()?;
        error.status = status;
        Some(error)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API request failed: {}", self.summary())
    }
}

impl std::error::Error for ApiError {}

/// HTTP client wrapper for ledger API calls
#[derive(Clone)]
pub struct LedgerHttpClient {
    client: Client,
}

impl LedgerHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ledger-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// POST a JSON body and parse the JSON response
    pub async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            let error = serde_json::from_str::<Value>(&response_body)
                .ok()
                .and_then(|v| ApiError::from_value(&v, Some(status.as_u16())))
                .unwrap_or(ApiError {
                    status: Some(status.as_u16()),
                    code: None,
                    message: None,
                });
            return Err(error.into());
        }

        if response_body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response_body).context("Failed to parse response JSON")
    }
}

/// Format a remote error for display
pub fn format_remote_error(error: &anyhow::Error) -> String {
    if let Some(api) = error.downcast_ref::<ApiError>() {
        return match api.status {
            Some(401) => "Authentication failed. Check the console's access token.".to_string(),
            Some(403) => "Permission denied.".to_string(),
            Some(404) => "Resource not found.".to_string(),
            Some(429) => "Rate limit exceeded. Please try again later.".to_string(),
            Some(500..=599) => "Ledger temporarily unavailable. Please try again.".to_string(),
            _ => match (&api.code, &api.message) {
                (Some(code), Some(message)) => format!("{}: {}", code, message),
                (None, Some(message)) => message.clone(),
                _ => "Invalid request. Check your parameters.".to_string(),
            },
        };
    }

    if error.chain().any(|cause| cause.is::<reqwest::Error>()) {
        return "Request failed. Check your network connection and try again.".to_string();
    }

    let error_str = format!("{:#}", error);
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
