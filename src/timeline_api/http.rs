use crate::timeline_api::request::{Action, ApiCall};
use crate::timeline_api::transport::{ApiResponse, Transport};
use crate::timeline_api::types::{ApiError, Credentials, TimelineError};
use async_trait::async_trait;
use reqwest::Method;
use std::time::Duration;

/// HTTP transport for the timeline REST API
///
/// Speaks the `/timeline`, `/locations`, and `/contacts` resources under a
/// base URL and mints access tokens from an OAuth2 token endpoint. Holds the
/// authorization state the client installs at construction: application keys
/// plus the account's access and refresh tokens.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    token_url: String,
    client: reqwest::Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl HttpTransport {
    /// Create a transport for the API at `base_url`.
    ///
    /// The token endpoint defaults to `{base_url}/oauth2/token`; override it
    /// with [`with_token_url`](Self::with_token_url) when the authorization
    /// server lives elsewhere.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!("Creating HttpTransport with base URL: {}", base_url);

        Self {
            token_url: format!("{}/oauth2/token", base_url),
            base_url,
            client: reqwest::Client::new(),
            client_id: None,
            client_secret: None,
            access_token: None,
            refresh_token: None,
        }
    }

    /// Use a dedicated OAuth2 token endpoint.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Apply a request timeout to every call made by this transport.
    ///
    /// Requests that exceed it surface as [`ApiError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, TimelineError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TimelineError::Api(ApiError::Request(e.to_string())))?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve an action to its HTTP method and URL, consuming the `id`
    /// parameter into the path where the action addresses one resource.
    fn route(&self, call: &ApiCall) -> Result<(Method, String), TimelineError> {
        let id = |call: &ApiCall| -> Result<String, TimelineError> {
            call.parameters
                .get("id")
                .cloned()
                .ok_or_else(|| {
                    TimelineError::Api(ApiError::Request(format!(
                        "action {} requires an id parameter",
                        call.action.name()
                    )))
                })
        };

        let (method, url) = match call.action {
            Action::Get => (Method::GET, format!("{}/timeline/{}", self.base_url, id(call)?)),
            Action::Insert => (Method::POST, format!("{}/timeline", self.base_url)),
            Action::Patch => (
                Method::PATCH,
                format!("{}/timeline/{}", self.base_url, id(call)?),
            ),
            Action::Update => (
                Method::PUT,
                format!("{}/timeline/{}", self.base_url, id(call)?),
            ),
            Action::Delete => (
                Method::DELETE,
                format!("{}/timeline/{}", self.base_url, id(call)?),
            ),
            Action::List => (Method::GET, format!("{}/timeline", self.base_url)),
            Action::GetLocation => (
                Method::GET,
                format!("{}/locations/{}", self.base_url, id(call)?),
            ),
            Action::GetContact => (
                Method::GET,
                format!("{}/contacts/{}", self.base_url, id(call)?),
            ),
            Action::InsertContact => (Method::POST, format!("{}/contacts", self.base_url)),
        };
        Ok((method, url))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn set_client_credentials(&mut self, client_id: &str, client_secret: &str) {
        self.client_id = Some(client_id.to_string());
        self.client_secret = Some(client_secret.to_string());
    }

    fn set_user_tokens(&mut self, access_token: Option<&str>, refresh_token: Option<&str>) {
        self.access_token = access_token.map(str::to_string);
        self.refresh_token = refresh_token.map(str::to_string);
    }

    async fn refresh_access_token(&mut self) -> Result<Credentials, TimelineError> {
        let refresh_token = self.refresh_token.clone().ok_or_else(|| {
            TimelineError::TokenRefresh("no refresh token configured".to_string())
        })?;
        let client_id = self
            .client_id
            .clone()
            .ok_or_else(|| TimelineError::TokenRefresh("no client id configured".to_string()))?;
        let client_secret = self.client_secret.clone().ok_or_else(|| {
            TimelineError::TokenRefresh("no client secret configured".to_string())
        })?;

        tracing::info!("Refreshing access token via {}", self.token_url);

        let form = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Token refresh request failed: {}", e);
                TimelineError::TokenRefresh(ApiError::from(e).to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                "Token refresh rejected: HTTP {} - {}",
                status.as_u16(),
                error_body
            );
            return Err(TimelineError::TokenRefresh(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_body
            )));
        }

        let credentials: Credentials = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse token refresh response: {}", e);
            TimelineError::TokenRefresh(format!("unparseable token response: {}", e))
        })?;

        // Subsequent calls must use the fresh token without further setup.
        self.access_token = Some(credentials.access_token.clone());
        if let Some(refresh) = &credentials.refresh_token {
            self.refresh_token = Some(refresh.clone());
        }

        tracing::debug!(
            "Access token refreshed, expires_in={}s",
            credentials.expires_in
        );
        Ok(credentials)
    }

    async fn execute(&self, call: &ApiCall) -> Result<ApiResponse, TimelineError> {
        let (method, url) = self.route(call)?;
        tracing::debug!("Executing {} {} {}", call.action.name(), method, url);

        let mut request = self.client.request(method, &url);

        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        // Everything except the path-consumed id travels as a query parameter.
        let query: Vec<(&str, &str)> = call
            .parameters
            .iter()
            .filter(|(k, _)| k.as_str() != "id")
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if !query.is_empty() {
            request = request.query(&query);
        }

        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Request failed: {}", e);
            TimelineError::Api(ApiError::from(e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TimelineError::Api(ApiError::from(e)))?;

        if !status.is_success() {
            tracing::warn!("{} returned HTTP {}: {}", url, status.as_u16(), body);
        }

        Ok(ApiResponse {
            success: status.is_success(),
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline_api::request::{Action, ApiCall};

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new("https://timeline.example.com/v1/");
        assert_eq!(transport.base_url(), "https://timeline.example.com/v1");
    }

    #[test]
    fn test_route_consumes_id_into_path() {
        let transport = HttpTransport::new("https://api.test");
        let call = ApiCall::new(Action::Patch).with_parameter("id", "item-1");
        let (method, url) = transport.route(&call).unwrap();
        assert_eq!(method, Method::PATCH);
        assert_eq!(url, "https://api.test/timeline/item-1");
    }

    #[test]
    fn test_route_requires_id_for_item_actions() {
        let transport = HttpTransport::new("https://api.test");
        let call = ApiCall::new(Action::Get);
        assert!(matches!(
            transport.route(&call),
            Err(TimelineError::Api(ApiError::Request(_)))
        ));
    }

    #[test]
    fn test_route_collection_actions() {
        let transport = HttpTransport::new("https://api.test");

        let (method, url) = transport.route(&ApiCall::new(Action::List)).unwrap();
        assert_eq!(method, Method::GET);
        assert_eq!(url, "https://api.test/timeline");

        let (method, url) = transport
            .route(&ApiCall::new(Action::InsertContact))
            .unwrap();
        assert_eq!(method, Method::POST);
        assert_eq!(url, "https://api.test/contacts");
    }
}
