use thiserror::Error;

/// Failures surfaced by the backend API clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network, DNS, TLS or timeout failure before a response arrived
    #[error("{message}: {source}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response; `message` comes from the body when it has one
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("unexpected response for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("not signed in")]
    Unauthorized,

    #[error("invalid API base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ApiError {
    /// Message suitable for showing to the user in place of results
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { message, .. } | Self::Status { message, .. } => message.clone(),
            Self::Decode { .. } => "Unexpected response from server".to_string(),
            Self::Unauthorized => "Please sign in to continue".to_string(),
            Self::InvalidBaseUrl { .. } => "Search service is misconfigured".to_string(),
        }
    }

    /// HTTP status, when the failure was an error response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "The request timed out"
        } else if err.is_connect() {
            "Could not reach the server"
        } else {
            "Network error"
        };
        Self::Transport {
            message: message.to_string(),
            source: err,
        }
    }
}
