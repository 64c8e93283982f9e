use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identifier. Opaque to the client: the primary table uses a
/// serial column, the degraded-mode table may use anything textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Serial(i64),
    Text(String),
}

/// A waitlist row as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    #[serde(default)]
    pub id: Option<EntryId>,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl WaitlistEntry {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            created_at: None,
        }
    }
}
