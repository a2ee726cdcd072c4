use crate::timeline_api::transport::{AccountStore, Transport};
use crate::timeline_api::types::{ApiKeys, Credentials, TimelineError, TokenUpdate};
use chrono::Utc;

/// Explicit overrides for the tokens read from the account store
///
/// Any field left `None` falls back to the corresponding store accessor.
#[derive(Debug, Clone, Default)]
pub struct TokenSetup {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expired: Option<bool>,
}

/// Drives the token lifecycle at client construction
///
/// Installs credentials into the transport, decides staleness, performs the
/// one-shot refresh, and persists the translated outcome back to the account.
pub struct TokenManager;

impl TokenManager {
    /// Wire up the transport's authorization state and refresh if stale.
    ///
    /// Exactly one refresh call and one account update happen when the token
    /// is expired; none otherwise. A refresh failure surfaces as
    /// [`TimelineError::TokenRefresh`] with no fallback to the stale token.
    pub async fn install<T, S>(
        transport: &mut T,
        store: &S,
        keys: &ApiKeys,
        setup: TokenSetup,
    ) -> Result<(), TimelineError>
    where
        T: Transport + ?Sized,
        S: AccountStore + ?Sized,
    {
        let access_token = setup.access_token.or_else(|| store.token());
        let refresh_token = setup.refresh_token.or_else(|| store.refresh_token());
        let expired = setup.expired.unwrap_or_else(|| store.has_expired_token());

        transport.set_client_credentials(&keys.client_id, &keys.client_secret);
        transport.set_user_tokens(access_token.as_deref(), refresh_token.as_deref());

        if !expired {
            tracing::debug!("Stored access token is still fresh, skipping refresh");
            return Ok(());
        }

        tracing::info!("Stored access token is stale, refreshing");
        let credentials = transport.refresh_access_token().await.map_err(|e| match e {
            TimelineError::TokenRefresh(msg) => TimelineError::TokenRefresh(msg),
            other => TimelineError::TokenRefresh(other.to_string()),
        })?;

        let update = Self::translate(&credentials);
        tracing::debug!("Persisting refreshed credentials, expires_at={}", update.expires_at);
        store.update_tokens(update)?;

        Ok(())
    }

    /// Translate refresh-response credentials into the account's persisted
    /// shape: `access_token` -> `token`, relative `expires_in` -> absolute
    /// `expires_at` epoch seconds, `id_token` passed through.
    fn translate(credentials: &Credentials) -> TokenUpdate {
        TokenUpdate {
            token: credentials.access_token.clone(),
            expires_at: Utc::now().timestamp() + credentials.expires_in,
            id_token: credentials.id_token.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_computes_absolute_expiry() {
        let credentials = Credentials {
            access_token: "ya29.fresh".to_string(),
            refresh_token: None,
            expires_in: 3600,
            id_token: Some("id.xyz".to_string()),
        };

        let before = Utc::now().timestamp();
        let update = TokenManager::translate(&credentials);
        let after = Utc::now().timestamp();

        assert_eq!(update.token, "ya29.fresh");
        assert_eq!(update.id_token.as_deref(), Some("id.xyz"));
        assert!(update.expires_at >= before + 3600);
        assert!(update.expires_at <= after + 3600);
    }
}
