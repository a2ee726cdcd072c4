use crate::timeline_api::request::{Action, ApiCall};
use crate::timeline_api::transport::Transport;
use crate::timeline_api::types::{TimelineError, TimelineItem};
use serde::Deserialize;

/// One page of timeline items as returned by the list endpoint
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub items: Vec<TimelineItem>,
    #[serde(default, rename = "nextPageToken", alias = "next_page_token")]
    pub next_page_token: Option<String>,
}

/// Pagination state: either about to fetch the page at the carried token
/// (`None` meaning the first page) or finished.
enum FetchState {
    Fetching(Option<String>),
    Done,
}

/// Retrieve the full collection page by page, preserving server order.
///
/// Termination rules:
/// - no continuation token (or an empty-string one) ends the loop;
/// - an empty item page ends the loop even when a continuation token is
///   present, guarding against servers that echo a stale token forever;
/// - a non-success page call is logged and ends the loop, keeping the partial
///   results instead of raising.
///
/// A body that fails to parse is a malformed response and does surface.
pub(crate) async fn fetch_all<T>(transport: &T) -> Result<Vec<TimelineItem>, TimelineError>
where
    T: Transport + ?Sized,
{
    let mut items: Vec<TimelineItem> = Vec::new();
    let mut state = FetchState::Fetching(None);

    while let FetchState::Fetching(page_token) = state {
        let mut call = ApiCall::new(Action::List);
        // Never send an empty string as a literal page token.
        if let Some(token) = page_token.as_deref().filter(|t| !t.is_empty()) {
            call = call.with_parameter("pageToken", token);
        }

        state = match transport.execute(&call).await {
            Ok(response) if response.success => {
                let page: Page = serde_json::from_str(&response.body).map_err(|e| {
                    TimelineError::MalformedResponse(format!("invalid list page: {}", e))
                })?;

                if page.items.is_empty() {
                    // An empty page terminates even if a token came back.
                    FetchState::Done
                } else {
                    items.extend(page.items);
                    match page.next_page_token.filter(|t| !t.is_empty()) {
                        Some(token) => FetchState::Fetching(Some(token)),
                        None => FetchState::Done,
                    }
                }
            }
            Ok(response) => {
                tracing::error!(
                    "List page request failed: HTTP {} - {}",
                    response.status,
                    response.body
                );
                FetchState::Done
            }
            Err(e) => {
                tracing::error!("List page request failed: {}", e);
                FetchState::Done
            }
        };
    }

    tracing::debug!("Aggregated {} timeline items", items.len());
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_accepts_both_token_spellings() {
        let page: Page = serde_json::from_str(r#"{"items":[],"nextPageToken":"t1"}"#).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("t1"));

        let page: Page = serde_json::from_str(r#"{"items":[],"next_page_token":"t2"}"#).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("t2"));
    }

    #[test]
    fn test_page_defaults_when_fields_missing() {
        let page: Page = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
