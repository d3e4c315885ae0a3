//! Core types for the CureDoc client
//!
//! Wire formats exchanged with the CureBot service and the history record
//! persisted on the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the CureBot service when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5009";

/// Key the whole history list is stored under
pub const HISTORY_STORAGE_KEY: &str = "chatHistory";

/// Query recorded for an image upload that carried no prompt
pub const DEFAULT_IMAGE_QUERY: &str = "Medical image analysis";

/// Maximum characters of a query shown in the history sidebar
pub const HISTORY_LABEL_MAX_CHARS: usize = 25;

// ============================================================================
// History Types
// ============================================================================

/// What kind of exchange a history entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Text,
    Image,
}

impl EntryKind {
    /// Heading used for this kind in the text report
    pub fn report_heading(&self) -> &'static str {
        match self {
            EntryKind::Text => "TEXT QUERY",
            EntryKind::Image => "IMAGE ANALYSIS",
        }
    }
}

/// One user/assistant exchange kept in local history
///
/// Field names on the wire follow the layout the browser client has always
/// written to storage, so older histories keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub query: String,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub final_solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session_id: Option<String>,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none", default)]
    pub image_ref: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn text(query: impl Into<String>, response: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: EntryKind::Text,
            query: query.into(),
            response: response.into(),
            final_solution: None,
            session_id: None,
            image_ref: None,
            timestamp,
        }
    }

    pub fn image(
        query: impl Into<String>,
        response: impl Into<String>,
        session_id: impl Into<String>,
        image_ref: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: EntryKind::Image,
            query: query.into(),
            response: response.into(),
            final_solution: None,
            session_id: Some(session_id.into()),
            image_ref,
            timestamp,
        }
    }

    /// Text to show for the assistant side of the exchange.
    ///
    /// The initial response wins; the final solution is used when the
    /// response is empty.
    pub fn display_response(&self) -> Option<&str> {
        if !self.response.is_empty() {
            Some(&self.response)
        } else {
            self.final_solution.as_deref().filter(|s| !s.is_empty())
        }
    }

    /// Whether a report can be downloaded for this entry
    pub fn has_report(&self) -> bool {
        self.session_id.is_some() || self.final_solution.is_some()
    }

    /// Whether the user typed a prompt for this image upload
    pub fn has_custom_prompt(&self) -> bool {
        self.kind == EntryKind::Image && self.query != DEFAULT_IMAGE_QUERY
    }

    /// Sidebar label: the query, cut to `max_chars` characters plus `...`
    pub fn label(&self, max_chars: usize) -> String {
        if self.query.chars().count() > max_chars {
            format!("{}...", self.query.chars().take(max_chars).collect::<String>())
        } else {
            self.query.clone()
        }
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// Helper function to deserialize string or null values
pub fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Body of `POST /ask`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

/// Reply to `POST /ask`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
    #[serde(default)]
    pub followups: Vec<String>,
}

/// Body of `POST /answer`
///
/// `followups` and `responses` are matched by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub query: String,
    pub followups: Vec<String>,
    pub responses: Vec<String>,
}

/// Reply to `POST /answer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub session_id: String,
    pub final_solution: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pdf_download: Option<String>,
}

/// Reply to the multipart `POST /upload`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session_id: String,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pdf_download: Option<String>,
}

/// Error body the service sends with a non-success status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
