use crate::timeline_api::fields::Fields;
use crate::timeline_api::types::{ApiError, TimelineError, TimelineItem};
use indexmap::IndexMap;
use serde_json::Value;
use std::str::FromStr;

/// The closed set of remote operations the client can perform
///
/// Replaces by-name dynamic dispatch with an enum so an unknown action is
/// unrepresentable once parsed; `FromStr` covers the logical wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Get,
    Insert,
    Patch,
    Update,
    Delete,
    List,
    GetLocation,
    GetContact,
    InsertContact,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Get => "get",
            Action::Insert => "insert",
            Action::Patch => "patch",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::List => "list",
            Action::GetLocation => "get_location",
            Action::GetContact => "get_contact",
            Action::InsertContact => "insert_contact",
        }
    }

    /// Whether a call for this action carries a request body.
    pub fn takes_body(&self) -> bool {
        matches!(
            self,
            Action::Insert | Action::Patch | Action::Update | Action::InsertContact
        )
    }
}

impl FromStr for Action {
    type Err = TimelineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "get" => Ok(Action::Get),
            "insert" => Ok(Action::Insert),
            "patch" => Ok(Action::Patch),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "list" => Ok(Action::List),
            other => Err(TimelineError::InvalidAction(other.to_string())),
        }
    }
}

/// One outgoing API call: action, string parameters, optional body
///
/// The action is always set; a body is present only for the write actions.
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub action: Action,
    pub parameters: IndexMap<String, String>,
    pub body: Option<Fields>,
}

impl ApiCall {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            parameters: IndexMap::new(),
            body: None,
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Fields) -> Self {
        self.body = Some(body);
        self
    }
}

/// Explicit item content for a write call
#[derive(Debug, Clone)]
pub enum Content {
    /// Plain text, wrapped as `{"text": ...}` on the wire
    Text(String),
    /// A structured mapping used as-is (then normalized)
    Structured(Fields),
}

/// Caller-supplied options for building a content payload
///
/// `content`, when present, fully determines the payload. Otherwise the
/// attached timeline item is serialized and `extra` is merged over it, which
/// is how application-specific fields like `speakableText` ride along.
#[derive(Debug, Clone, Default)]
pub struct ContentOptions {
    pub content: Option<Content>,
    pub extra: Fields,
}

impl ContentOptions {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(Content::Text(text.into())),
            extra: Fields::new(),
        }
    }

    pub fn structured(fields: Fields) -> Self {
        Self {
            content: Some(Content::Structured(fields)),
            extra: Fields::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key, value);
        self
    }
}

/// Builds normalized payloads and call descriptors
///
/// Holds a borrow of the client's attached timeline item so the fallback
/// serialization path never clones it eagerly.
pub struct RequestBuilder<'a> {
    timeline_item: Option<&'a TimelineItem>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(timeline_item: Option<&'a TimelineItem>) -> Self {
        Self { timeline_item }
    }

    /// Build the wire-shaped content payload for a write call.
    ///
    /// Explicit content wins outright; otherwise the attached timeline item is
    /// serialized and the remaining options merged over it. The result is
    /// normalized (camelCase keys, `displayTime` reformatting) either way.
    pub fn content_payload(&self, options: &ContentOptions) -> Result<Fields, TimelineError> {
        let data = match &options.content {
            Some(Content::Text(text)) => {
                let mut fields = Fields::new();
                fields.insert("text", Value::String(text.clone()));
                fields
            }
            Some(Content::Structured(fields)) => fields.clone(),
            None => {
                let mut fields = match self.timeline_item {
                    Some(item) => {
                        let value = serde_json::to_value(item).map_err(|e| {
                            TimelineError::Api(ApiError::Request(format!(
                                "failed to serialize timeline item: {}",
                                e
                            )))
                        })?;
                        Fields::from_value(value)?
                    }
                    None => Fields::new(),
                };
                fields.merge(options.extra.clone());
                fields
            }
        };
        Ok(data.normalized())
    }

    /// Assemble a call descriptor for `action`, attaching a body only when the
    /// action carries one.
    pub fn call(&self, action: Action, options: &ContentOptions) -> Result<ApiCall, TimelineError> {
        let mut call = ApiCall::new(action);
        if action.takes_body() {
            call.body = Some(self.content_payload(options)?);
        }
        Ok(call)
    }

    /// Assemble a call descriptor for an action addressing one item.
    ///
    /// The identifier travels as the `id` request parameter, never inside the
    /// body; any `id` field the payload picked up is stripped.
    pub fn call_with_id(
        &self,
        action: Action,
        id: &str,
        options: &ContentOptions,
    ) -> Result<ApiCall, TimelineError> {
        let mut call = self.call(action, options)?;
        if let Some(body) = call.body.as_mut() {
            body.remove("id");
        }
        call.parameters.insert("id".to_string(), id.to_string());
        Ok(call)
    }
}
