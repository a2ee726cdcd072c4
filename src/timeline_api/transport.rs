use crate::timeline_api::request::ApiCall;
use crate::timeline_api::types::{Credentials, TimelineError, TokenUpdate};
use async_trait::async_trait;

/// Raw outcome of one executed API call
///
/// `success` mirrors the HTTP status class so callers (notably pagination)
/// can distinguish a failed call from a transport error without parsing.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub success: bool,
    pub status: u16,
    pub body: String,
}

/// The transport and authorization seam consumed by the client
///
/// Implementations hold both the application-level client credentials and the
/// per-account user tokens. `refresh_access_token` must install the newly
/// minted access token into the transport's own authorization state before
/// returning, so subsequent `execute` calls use it without further setup.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Install the application's OAuth2 client id and secret.
    fn set_client_credentials(&mut self, client_id: &str, client_secret: &str);

    /// Install the account's access and refresh tokens.
    fn set_user_tokens(&mut self, access_token: Option<&str>, refresh_token: Option<&str>);

    /// Mint a fresh access token from the stored refresh token.
    ///
    /// One-shot: no retry is attempted at this layer.
    async fn refresh_access_token(&mut self) -> Result<Credentials, TimelineError>;

    /// Execute a single API call described by `call`.
    ///
    /// Returns `Ok` with `success = false` for a non-success HTTP status;
    /// `Err` is reserved for transport-level failures (network, timeout).
    async fn execute(&self, call: &ApiCall) -> Result<ApiResponse, TimelineError>;
}

/// Read/write access to the account record owning the tokens
///
/// The account outlives the client; the client only reads the stored tokens at
/// construction and writes back the translated refresh outcome.
pub trait AccountStore: Send + Sync {
    /// The stored access token, if any.
    fn token(&self) -> Option<String>;

    /// The stored refresh token, if any.
    fn refresh_token(&self) -> Option<String>;

    /// Whether the stored access token is considered stale.
    fn has_expired_token(&self) -> bool;

    /// Persist the translated outcome of a token refresh.
    fn update_tokens(&self, update: TokenUpdate) -> Result<(), TimelineError>;
}

// The account outlives the client, so a shared reference is a store too.
impl<S: AccountStore + ?Sized> AccountStore for &S {
    fn token(&self) -> Option<String> {
        (**self).token()
    }

    fn refresh_token(&self) -> Option<String> {
        (**self).refresh_token()
    }

    fn has_expired_token(&self) -> bool {
        (**self).has_expired_token()
    }

    fn update_tokens(&self, update: TokenUpdate) -> Result<(), TimelineError> {
        (**self).update_tokens(update)
    }
}
