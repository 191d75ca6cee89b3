//! Change event message types.
//!
//! Events are JSON objects of the form
//! `{"event": "created|updated|deleted", "id": "42", "title": ..., "content": ...}`.
//! Only `event` and `id` drive processing; `title` and `content` are
//! advisory and the document store stays authoritative.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use search_sync_shared::DocumentId;

/// The kind of change a producer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl ChangeKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(ChangeKind::Created),
            "updated" => Some(ChangeKind::Updated),
            "deleted" => Some(ChangeKind::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// Reasons a payload could not be turned into a `ChangeEvent`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventDecodeError {
    #[error("malformed event payload: {0}")]
    Malformed(String),

    #[error("invalid document id '{0}'")]
    InvalidId(String),

    #[error("unknown event type '{kind}' for document {document_id}")]
    UnknownKind {
        kind: String,
        document_id: DocumentId,
    },
}

/// Document ids arrive as strings, but numeric ids are tolerated.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn parse(self) -> Result<DocumentId, EventDecodeError> {
        match self {
            RawId::Text(s) => s
                .trim()
                .parse::<DocumentId>()
                .map_err(|_| EventDecodeError::InvalidId(s)),
            RawId::Number(n) => {
                DocumentId::try_from(n).map_err(|_| EventDecodeError::InvalidId(n.to_string()))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawChangeEvent {
    event: String,
    id: RawId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// A decoded change notification for a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub document_id: DocumentId,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl ChangeEvent {
    /// Decode a raw payload.
    ///
    /// The JSON shape is checked first, then the id, then the event kind, so
    /// an unknown kind is only reported for an otherwise valid event.
    pub fn decode(payload: &[u8]) -> Result<Self, EventDecodeError> {
        let raw: RawChangeEvent = serde_json::from_slice(payload)
            .map_err(|e| EventDecodeError::Malformed(e.to_string()))?;

        let document_id = raw.id.parse()?;

        let kind = ChangeKind::parse(&raw.event).ok_or_else(|| EventDecodeError::UnknownKind {
            kind: raw.event.clone(),
            document_id,
        })?;

        Ok(Self {
            kind,
            document_id,
            title: raw.title,
            content: raw.content,
        })
    }
}

/// An owned copy of a message read from the event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub payload: Option<Vec<u8>>,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}
