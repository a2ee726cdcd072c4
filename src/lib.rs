//! Timeline SDK
//!
//! A Rust client library for a timeline-style REST API behind an
//! OAuth2-protected account.
//!
//! This SDK provides:
//! - Token lifecycle management: staleness detection, one-shot refresh, and
//!   translation of refreshed credentials into the account's persisted shape
//! - Request building with wire-shape normalization (lower camelCase keys,
//!   `displayTime` timestamp formatting)
//! - Cursor-paginated list aggregation with an instance-scoped cache
//! - Timeline item and contact CRUD through a narrow transport seam
//!
//! The account store and the transport are traits, so hosts bring their own
//! persistence and tests swap in in-memory fakes; [`HttpTransport`] is the
//! bundled reqwest implementation.
//!
//! # Example
//!
//! ```no_run
//! use timeline_sdk::{
//!     AccountStore, ApiKeys, ContentOptions, HttpTransport, TimelineClient,
//!     TimelineError, TokenUpdate,
//! };
//!
//! struct Account;
//!
//! impl AccountStore for Account {
//!     fn token(&self) -> Option<String> {
//!         Some("stored-access-token".to_string())
//!     }
//!     fn refresh_token(&self) -> Option<String> {
//!         Some("stored-refresh-token".to_string())
//!     }
//!     fn has_expired_token(&self) -> bool {
//!         true
//!     }
//!     fn update_tokens(&self, update: TokenUpdate) -> Result<(), TimelineError> {
//!         println!("new token expires at {}", update.expires_at);
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), TimelineError> {
//! let keys = ApiKeys::from_env()?;
//! let transport = HttpTransport::new("https://timeline.example.com/v1");
//!
//! // Construction refreshes the stale token exactly once.
//! let mut client = TimelineClient::new(transport, Account, &keys).await?;
//!
//! client.insert(ContentOptions::text("hello from the SDK")).await?;
//! let items = client.cached_list().await?;
//! println!("{} timeline items", items.len());
//! # Ok(())
//! # }
//! ```

pub mod timeline_api;

// Re-export commonly used types and functions
pub use timeline_api::{
    auth::{TokenManager, TokenSetup},
    client::{ContactInput, TimelineClient},
    fields::Fields,
    http::HttpTransport,
    request::{Action, ApiCall, Content, ContentOptions, RequestBuilder},
    transport::{AccountStore, ApiResponse, Transport},
    types::{ApiError, ApiKeys, Contact, Credentials, TimelineError, TimelineItem, TokenUpdate},
};
