use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Timeline SDK error type
///
/// Represents all possible errors that can occur when interacting with
/// the timeline API or performing related operations.
#[derive(Debug)]
pub enum TimelineError {
    /// The one-shot token refresh failed; the account needs re-consent
    TokenRefresh(String),
    /// API request failed (network, HTTP, or response parsing error)
    Api(ApiError),
    /// Response body was not valid JSON or lacked expected fields
    MalformedResponse(String),
    /// Unknown logical action name (programmer error, non-recoverable)
    InvalidAction(String),
    /// Configuration error
    Config(String),
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineError::TokenRefresh(msg) => write!(f, "Token refresh failed: {}", msg),
            TimelineError::Api(err) => write!(f, "API error: {}", err),
            TimelineError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            TimelineError::InvalidAction(name) => write!(f, "Invalid action name: {}", name),
            TimelineError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for TimelineError {}

impl From<ApiError> for TimelineError {
    fn from(err: ApiError) -> Self {
        TimelineError::Api(err)
    }
}

/// API-specific errors
#[derive(Debug)]
pub enum ApiError {
    /// Network error (connection failure, DNS, etc.)
    Network(String),
    /// HTTP error with status code
    Http { status: u16, message: String },
    /// The transport-level request timed out
    Timeout(String),
    /// Failed to parse response
    Parse(String),
    /// Request building failed
    Request(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            ApiError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Request(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_connect() {
            ApiError::Network(format!("Connection failed: {}", err))
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Application-level OAuth2 client keys
///
/// These identify the application itself, not any individual account, and are
/// installed into the transport's authorization state at client construction.
#[derive(Debug, Clone)]
pub struct ApiKeys {
    pub client_id: String,
    pub client_secret: String,
}

impl ApiKeys {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Load keys from the `TIMELINE_CLIENT_ID` / `TIMELINE_CLIENT_SECRET`
    /// environment variables.
    pub fn from_env() -> Result<Self, TimelineError> {
        let client_id = std::env::var("TIMELINE_CLIENT_ID")
            .map_err(|_| TimelineError::Config("TIMELINE_CLIENT_ID is not set".to_string()))?;
        let client_secret = std::env::var("TIMELINE_CLIENT_SECRET")
            .map_err(|_| TimelineError::Config("TIMELINE_CLIENT_SECRET is not set".to_string()))?;
        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

/// Ephemeral credentials produced by a token refresh
///
/// Immediately translated into a [`TokenUpdate`] for persistence and then
/// discarded; `expires_in` is the remaining lifetime in seconds as returned
/// by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// The persisted shape of refreshed credentials
///
/// `expires_at` is an absolute epoch-seconds deadline computed from the
/// refresh response's relative `expires_in`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUpdate {
    pub token: String,
    pub expires_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

/// A timeline item, caller-supplied or server-returned
///
/// The SDK treats the content as opaque: known fields are typed, everything
/// else rides along in `extra` and round-trips untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl TimelineItem {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// A timeline contact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        rename = "displayName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
    #[serde(rename = "imageUrls", default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}
