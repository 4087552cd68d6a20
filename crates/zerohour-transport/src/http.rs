//! Shared HTTP plumbing for the boundary clients.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use zerohour_core::error::DomainError;

/// Builds the HTTP client shared by both boundaries.
///
/// # Errors
///
/// Returns `DomainError::Transport` if the TLS backend cannot be
/// initialised.
pub fn build_client(timeout: Duration) -> Result<Client, DomainError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DomainError::Transport(format!("http client setup failed: {e}")))
}

/// Posts `body` as JSON and returns the response body of a 2xx answer.
pub(crate) async fn post_json<B>(client: &Client, url: &str, body: &B) -> Result<String, DomainError>
where
    B: Serialize + ?Sized,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| DomainError::Transport(format!("request to {url} failed: {e}")))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| DomainError::Transport(format!("reading response from {url} failed: {e}")))?;
    if !status.is_success() {
        return Err(DomainError::Transport(format!(
            "{url} answered http={}",
            status.as_u16()
        )));
    }
    Ok(text)
}

/// Decodes a response body. Anything that does not match the expected shape
/// is a protocol failure.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, DomainError> {
    serde_json::from_str(body).map_err(|e| DomainError::Protocol(format!("malformed response: {e}")))
}
