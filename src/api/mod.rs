//! HTTP plumbing shared by the backend clients.

pub mod account;
pub mod search;
pub mod traits;
pub mod types;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;

pub use account::AccountClient;
pub use search::SearchClient;
pub use traits::ListingSource;
pub use types::{RawSearchPage, SearchEnvelope};

/// Base HTTP client: one `reqwest::Client`, the API root, and the
/// optional bearer token for account endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client rooted at `base_url`.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("listing-scout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Trailing slash so joins append to the API root instead of
        // replacing its last segment
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Attach (or drop) the bearer token sent on account requests
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an API path such as `listings/search`
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    /// URL of one item under a collection, e.g. `favorites/{id}`.
    ///
    /// The id is pushed as a single percent-encoded path segment, so `/`,
    /// `?` or `#` inside it cannot leave the collection.
    pub(crate) fn item_endpoint(&self, collection: &str, id: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(collection)?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "base URL cannot hold a path".to_string(),
            })?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.client.get(url)
    }

    /// Request carrying the bearer token; fails before sending without one.
    pub(crate) fn authorized(
        &self,
        method: reqwest::Method,
        url: Url,
    ) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::Unauthorized)?;
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    /// Send a request and return the body of a 2xx response.
    ///
    /// Non-2xx responses become [`ApiError::Status`] with the message the
    /// backend put in the body, or a generic one for the status class.
    pub(crate) async fn execute(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!("{} -> {} ({} bytes)", context, status, body.len());

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!("{} failed with {}: {}", context, status, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    /// [`execute`](Self::execute) then decode the body as JSON
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, ApiError> {
        let body = self.execute(request, context).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            context: context.to_string(),
            source: e,
        })
    }
}

/// Human-readable message for an error response.
///
/// Looks at `detail` (a string, or a list of `{ "msg": ... }` validation
/// errors), then `message`, then `error`.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(message) = body_message(&json) {
            return message;
        }
    }
    generic_message(status)
}

fn body_message(json: &Value) -> Option<String> {
    match json.get("detail") {
        Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
        Some(Value::Array(errors)) => {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("msg").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
        _ => {}
    }

    ["message", "error"]
        .iter()
        .filter_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn generic_message(status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "Please sign in to continue",
        StatusCode::NOT_FOUND => "Not found",
        StatusCode::TOO_MANY_REQUESTS => "Too many requests, please slow down",
        s if s.is_server_error() => "Server error, please try again later",
        _ => "The request could not be processed",
    }
    .to_string()
}
