//! Shared blocking HTTP helpers.

use deck_core::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

/// Some image hosts reject requests without a browser-like agent.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0";

/// Build a client with the given total request timeout (`None` waits forever).
pub(crate) fn client(timeout: Option<Duration>) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::RemoteFetch(format!("failed to build HTTP client: {}", e)))
}

/// Send `request` and decode a JSON body, failing on any non-success status.
pub(crate) fn send_json(request: RequestBuilder, service: &str) -> Result<Value> {
    let response = request
        .send()
        .map_err(|e| Error::RemoteFetch(format!("{} request failed: {}", service, e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(Error::RemoteFetch(format!(
            "{} returned {}: {}",
            service,
            status,
            body.trim()
        )));
    }

    response
        .json::<Value>()
        .map_err(|e| Error::RemoteFetch(format!("{} sent malformed JSON: {}", service, e)))
}
