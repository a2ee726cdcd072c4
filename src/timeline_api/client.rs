use crate::timeline_api::auth::{TokenManager, TokenSetup};
use crate::timeline_api::fields::Fields;
use crate::timeline_api::pagination;
use crate::timeline_api::request::{Action, ApiCall, ContentOptions, RequestBuilder};
use crate::timeline_api::transport::{AccountStore, ApiResponse, Transport};
use crate::timeline_api::types::{ApiError, ApiKeys, Contact, TimelineError, TimelineItem};

/// A contact passed to [`TimelineClient::insert_contact`], either as an
/// already-typed value or a plain mapping wrapped into the contact shape.
#[derive(Debug, Clone)]
pub enum ContactInput {
    Typed(Contact),
    Fields(Fields),
}

impl From<Contact> for ContactInput {
    fn from(contact: Contact) -> Self {
        ContactInput::Typed(contact)
    }
}

impl From<Fields> for ContactInput {
    fn from(fields: Fields) -> Self {
        ContactInput::Fields(fields)
    }
}

/// Client for one account's timeline
///
/// Construction wires the token lifecycle: application keys and the account's
/// tokens are installed into the transport, and a stale access token is
/// refreshed exactly once with the outcome persisted back to the account.
///
/// The aggregated list cache is scoped to this instance; two clients for the
/// same account neither share nor invalidate each other's cache.
///
/// # Example
///
/// ```no_run
/// use timeline_sdk::{
///     AccountStore, ApiKeys, HttpTransport, TimelineClient, TimelineError, TokenUpdate,
/// };
///
/// struct Account;
///
/// impl AccountStore for Account {
///     fn token(&self) -> Option<String> {
///         Some("stored-access-token".to_string())
///     }
///     fn refresh_token(&self) -> Option<String> {
///         Some("stored-refresh-token".to_string())
///     }
///     fn has_expired_token(&self) -> bool {
///         false
///     }
///     fn update_tokens(&self, _update: TokenUpdate) -> Result<(), TimelineError> {
///         Ok(())
///     }
/// }
///
/// # async fn example() -> Result<(), TimelineError> {
/// let keys = ApiKeys::new("client-id", "client-secret");
/// let transport = HttpTransport::new("https://timeline.example.com/v1");
/// let mut client = TimelineClient::new(transport, Account, &keys).await?;
///
/// let items = client.cached_list().await?;
/// println!("{} timeline items", items.len());
/// # Ok(())
/// # }
/// ```
pub struct TimelineClient<T, S> {
    transport: T,
    account: S,
    timeline_item: Option<TimelineItem>,
    callback_url: Option<String>,
    cached_list: Option<Vec<TimelineItem>>,
}

impl<T, S> TimelineClient<T, S>
where
    T: Transport,
    S: AccountStore,
{
    /// Create a client for `account`, reading tokens from the store.
    pub async fn new(transport: T, account: S, keys: &ApiKeys) -> Result<Self, TimelineError> {
        Self::with_tokens(transport, account, keys, TokenSetup::default()).await
    }

    /// Create a client with explicit token overrides.
    ///
    /// Fields left unset in `setup` fall back to the account store.
    pub async fn with_tokens(
        mut transport: T,
        account: S,
        keys: &ApiKeys,
        setup: TokenSetup,
    ) -> Result<Self, TimelineError> {
        TokenManager::install(&mut transport, &account, keys, setup).await?;
        tracing::debug!("Timeline client ready");
        Ok(Self {
            transport,
            account,
            timeline_item: None,
            callback_url: None,
            cached_list: None,
        })
    }

    /// The account record this client was built for.
    pub fn account(&self) -> &S {
        &self.account
    }

    /// Attach a timeline item used as the payload fallback for write calls
    /// that carry no explicit content.
    pub fn set_timeline_item(&mut self, item: TimelineItem) -> &mut Self {
        self.timeline_item = Some(item);
        self
    }

    pub fn timeline_item(&self) -> Option<&TimelineItem> {
        self.timeline_item.as_ref()
    }

    /// Install the host-resolved notification callback URL.
    ///
    /// The client treats this as an opaque string; it is never computed here.
    pub fn set_callback_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn callback_url(&self) -> Option<&str> {
        self.callback_url.as_deref()
    }

    /// Fetch one timeline item by id.
    pub async fn get(&self, id: &str) -> Result<Fields, TimelineError> {
        tracing::debug!("Fetching timeline item {}", id);
        let call = ApiCall::new(Action::Get).with_parameter("id", id);
        response_fields(self.transport.execute(&call).await?)
    }

    /// Fetch a location by id; `"latest"` returns the most recent one.
    pub async fn get_location(&self, id: &str) -> Result<Fields, TimelineError> {
        tracing::debug!("Fetching location {}", id);
        let call = ApiCall::new(Action::GetLocation).with_parameter("id", id);
        response_fields(self.transport.execute(&call).await?)
    }

    /// Insert a timeline item built from `options` (or the attached item).
    pub async fn insert(&self, options: ContentOptions) -> Result<Fields, TimelineError> {
        let call = self.builder().call(Action::Insert, &options)?;
        tracing::debug!("Inserting timeline item");
        response_fields(self.transport.execute(&call).await?)
    }

    /// Patch the item identified by `id`.
    ///
    /// The identifier travels as a request parameter only; it never appears in
    /// the serialized body.
    pub async fn patch(&self, id: &str, options: ContentOptions) -> Result<Fields, TimelineError> {
        let call = self.builder().call_with_id(Action::Patch, id, &options)?;
        tracing::debug!("Patching timeline item {}", id);
        response_fields(self.transport.execute(&call).await?)
    }

    /// Replace the item identified by `id` with `item`.
    pub async fn update(&self, id: &str, item: &TimelineItem) -> Result<Fields, TimelineError> {
        let call =
            RequestBuilder::new(Some(item)).call_with_id(Action::Update, id, &ContentOptions::default())?;
        tracing::debug!("Updating timeline item {}", id);
        response_fields(self.transport.execute(&call).await?)
    }

    /// Delete the item identified by `id`.
    pub async fn delete(&self, id: &str) -> Result<(), TimelineError> {
        let call = ApiCall::new(Action::Delete).with_parameter("id", id);
        tracing::debug!("Deleting timeline item {}", id);
        let response = self.transport.execute(&call).await?;
        ensure_success(&response)
    }

    /// Fetch the complete timeline, replacing the cached list.
    ///
    /// A failed page terminates the fetch early and keeps the partial result.
    pub async fn list(&mut self) -> Result<&[TimelineItem], TimelineError> {
        let items = pagination::fetch_all(&self.transport).await?;
        self.cached_list = Some(items);
        Ok(self.cached_list.as_deref().unwrap_or(&[]))
    }

    /// Return the cached aggregated list, fetching it first if absent.
    pub async fn cached_list(&mut self) -> Result<&[TimelineItem], TimelineError> {
        if self.cached_list.is_none() {
            self.list().await?;
        }
        Ok(self.cached_list.as_deref().unwrap_or(&[]))
    }

    /// Like [`cached_list`](Self::cached_list), with each item converted to an
    /// indifferent-access field map.
    pub async fn cached_list_as_fields(&mut self) -> Result<Vec<Fields>, TimelineError> {
        self.cached_list()
            .await?
            .iter()
            .map(|item| {
                let value = serde_json::to_value(item).map_err(|e| {
                    TimelineError::Api(ApiError::Request(format!(
                        "failed to serialize timeline item: {}",
                        e
                    )))
                })?;
                Fields::from_value(value)
            })
            .collect()
    }

    /// Drop the cached aggregated list; the next list access refetches.
    pub fn invalidate_cache(&mut self) {
        self.cached_list = None;
    }

    /// Fetch one contact by id.
    pub async fn get_contact(&self, id: &str) -> Result<Contact, TimelineError> {
        tracing::debug!("Fetching contact {}", id);
        let call = ApiCall::new(Action::GetContact).with_parameter("id", id);
        let response = self.transport.execute(&call).await?;
        ensure_success(&response)?;
        serde_json::from_str(&response.body)
            .map_err(|e| TimelineError::MalformedResponse(format!("invalid contact: {}", e)))
    }

    /// Insert a contact, accepting either a typed [`Contact`] or a plain
    /// mapping wrapped into the contact shape.
    pub async fn insert_contact(
        &self,
        contact: impl Into<ContactInput>,
    ) -> Result<Contact, TimelineError> {
        let contact = match contact.into() {
            ContactInput::Typed(contact) => contact,
            ContactInput::Fields(fields) => serde_json::from_value(fields.into_value())
                .map_err(|e| {
                    TimelineError::Api(ApiError::Request(format!(
                        "mapping does not fit the contact shape: {}",
                        e
                    )))
                })?,
        };

        let body = Fields::from_value(serde_json::to_value(&contact).map_err(|e| {
            TimelineError::Api(ApiError::Request(format!(
                "failed to serialize contact: {}",
                e
            )))
        })?)?;

        tracing::debug!("Inserting contact");
        let call = ApiCall::new(Action::InsertContact).with_body(body);
        let response = self.transport.execute(&call).await?;
        ensure_success(&response)?;
        serde_json::from_str(&response.body)
            .map_err(|e| TimelineError::MalformedResponse(format!("invalid contact: {}", e)))
    }

    fn builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(self.timeline_item.as_ref())
    }
}

fn ensure_success(response: &ApiResponse) -> Result<(), TimelineError> {
    if response.success {
        Ok(())
    } else {
        Err(TimelineError::Api(ApiError::Http {
            status: response.status,
            message: response.body.clone(),
        }))
    }
}

fn response_fields(response: ApiResponse) -> Result<Fields, TimelineError> {
    ensure_success(&response)?;
    Fields::from_json_str(&response.body)
}
