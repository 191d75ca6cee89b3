//! Document types.
//!
//! `CanonicalDocument` is the authoritative record returned by the document
//! store. `IndexedDocument` is the projection written to the search index and
//! can always be regenerated from the canonical record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned document identifier.
pub type DocumentId = u32;

/// A document as held by the document store.
///
/// The store serializes `content` as a base64 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    /// Unique identifier assigned by the store.
    pub id: DocumentId,
    /// Document title.
    pub title: String,
    /// Raw content bytes, arbitrary encoding.
    #[serde(with = "base64_bytes", default)]
    pub content: Vec<u8>,
    /// Optional author name.
    #[serde(default)]
    pub author: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A document as stored in the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Same identifier as the canonical document.
    pub id: DocumentId,
    /// Document title.
    pub title: String,
    /// Content decoded to text.
    #[serde(default)]
    pub content: String,
    /// Optional author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl IndexedDocument {
    /// Project a canonical document into its indexable form.
    ///
    /// Content bytes are decoded as UTF-8; invalid sequences are replaced
    /// with U+FFFD. Every other field is copied unchanged.
    pub fn project(doc: &CanonicalDocument) -> Self {
        Self::from(doc.clone())
    }
}

impl From<CanonicalDocument> for IndexedDocument {
    fn from(doc: CanonicalDocument) -> Self {
        let content = match String::from_utf8(doc.content) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };

        Self {
            id: doc.id,
            title: doc.title,
            content,
            author: doc.author,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        // The store emits `null` for documents created without content.
        let encoded = Option::<String>::deserialize(deserializer)?;
        match encoded {
            Some(s) => STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
