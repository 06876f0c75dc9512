use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a ceremony script, also used to scope storage keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptId(String);

impl ScriptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for a new script
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScriptId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStatus {
    #[default]
    Draft,
    /// Passed validation on its last save
    Ready,
}

/// A script as the surrounding application stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRecord {
    pub id: ScriptId,
    pub title: String,
    pub content: String,
    /// Unix milliseconds
    pub last_modified: u64,
    #[serde(default)]
    pub status: ScriptStatus,
}

impl ScriptRecord {
    pub fn new(id: ScriptId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            last_modified: now_millis(),
            status: ScriptStatus::Draft,
        }
    }

    /// A blank draft with a freshly generated id
    pub fn draft(title: impl Into<String>) -> Self {
        Self::new(ScriptId::generate(), title, String::new())
    }
}

/// Current time in unix milliseconds; 0 if the clock is before the epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generated_ids_are_unique_uuids() {
        let a = ScriptId::generate();
        let b = ScriptId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_draft_record() {
        let record = ScriptRecord::draft("Smith wedding");
        assert_eq!(record.title, "Smith wedding");
        assert_eq!(record.status, ScriptStatus::Draft);
        assert!(record.content.is_empty());
        assert!(record.last_modified > 0);
    }

    #[test]
    fn test_id_displays_raw_value() {
        assert_eq!(ScriptId::from("42").to_string(), "42");
    }
}
