/// Timeline API client module
///
/// Composed top-down:
///
/// 1. Construction installs the application keys and account tokens into the
///    transport; a stale access token is refreshed once and persisted back.
/// 2. Operations on the client build a call descriptor, hand it to the
///    transport, and parse the response into an indifferent-access map.
/// 3. Listing drives the page loop, aggregating items into a per-instance
///    cache.
pub mod auth;
pub mod client;
pub mod fields;
pub mod http;
pub mod pagination;
pub mod request;
pub mod transport;
pub mod types;

pub use auth::{TokenManager, TokenSetup};
pub use client::{ContactInput, TimelineClient};
pub use fields::Fields;
pub use http::HttpTransport;
pub use pagination::Page;
pub use request::{Action, ApiCall, Content, ContentOptions, RequestBuilder};
pub use transport::{AccountStore, ApiResponse, Transport};
pub use types::{
    ApiError, ApiKeys, Contact, Credentials, TimelineError, TimelineItem, TokenUpdate,
};
