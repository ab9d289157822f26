//! Request and response value objects exchanged with the function runtime.
//!
//! The inbound payload is the raw invocation event. The outbound response is
//! an API-gateway style envelope whose `body` is itself a string of JSON text.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};

/// Named query parameters forwarded to the graph as bindings.
pub type Bindings = HashMap<String, Value>;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// Body message returned when a request carries no query.
pub const MISSING_QUERY: &str = "Missing query";

// ── Inbound ───────────────────────────────────────────────────────

/// A single invocation payload: `{ "query": "...", "variables": { ... } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InboundRequest {
    #[serde(default)]
    pub query: Option<String>,

    #[serde(default)]
    pub variables: Option<Bindings>,
}

impl InboundRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            variables: None,
        }
    }

    pub fn with_variables(mut self, variables: Bindings) -> Self {
        self.variables = Some(variables);
        self
    }

    /// A request is valid iff the query is present and non-empty.
    pub fn is_valid(&self) -> bool {
        self.query.as_deref().is_some_and(|q| !q.is_empty())
    }

    /// Return the query text, or a validation error when it is missing.
    pub fn validate(&self) -> Result<&str> {
        match self.query.as_deref() {
            Some(q) if !q.is_empty() => Ok(q),
            _ => Err(BridgeError::Validation(MISSING_QUERY.to_string())),
        }
    }

    /// Bindings to forward, or `None` when absent, null, or empty.
    pub fn bindings(&self) -> Option<&Bindings> {
        self.variables.as_ref().filter(|v| !v.is_empty())
    }
}

// ── Outbound ──────────────────────────────────────────────────────

/// Gateway-style response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundResponse {
    pub body: String,
    pub headers: BTreeMap<String, String>,
    pub status_code: u16,
}

impl OutboundResponse {
    fn new(body: String, status_code: u16) -> Self {
        Self {
            body,
            headers: json_headers(),
            status_code,
        }
    }

    /// Submission and drain completed.
    pub fn succeeded() -> Self {
        Self::new("{}".to_string(), 200)
    }

    /// Submission or drain failed. The cause is never exposed to the caller.
    pub fn failed() -> Self {
        Self::new("{}".to_string(), 500)
    }

    /// The request was rejected before submission.
    pub fn rejected(message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::new(body, 500)
    }

    /// Map a validation error to its response; anything else is a plain failure.
    pub fn from_error(err: &BridgeError) -> Self {
        match err {
            BridgeError::Validation(msg) => Self::rejected(msg),
            _ => Self::failed(),
        }
    }
}

fn json_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
    headers
}
