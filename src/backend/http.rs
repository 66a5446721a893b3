//! JSON-over-HTTP plumbing shared by the adapters

use super::error::{truncate_body, BackendError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Build the shared client. Timeouts are applied per request by each adapter.
pub fn build_client() -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .user_agent(concat!("codewalker/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(BackendError::Client)
}

/// `base` + `path` with exactly one slash between them
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// POST `body` as JSON and decode the response.
///
/// Status >= 400 is an error carrying the truncated response body.
pub async fn post_json<B, R>(
    client: &reqwest::Client,
    backend: &str,
    url: &str,
    body: &B,
    timeout: Duration,
    api_key: Option<&str>,
) -> Result<R, BackendError>
where
    B: Serialize + ?Sized + Sync,
    R: DeserializeOwned,
{
    log::debug!("POST {} ({}, timeout {}s)", url, backend, timeout.as_secs());

    let mut request = client.post(url).timeout(timeout).json(body);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request
        .send()
        .await
        .map_err(|source| BackendError::Transport {
            backend: backend.to_string(),
            source,
        })?;

    let status = response.status();
    if status.as_u16() >= 400 {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::Status {
            backend: backend.to_string(),
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    response
        .json::<R>()
        .await
        .map_err(|e| BackendError::InvalidResponse {
            backend: backend.to_string(),
            reason: e.to_string(),
        })
}
