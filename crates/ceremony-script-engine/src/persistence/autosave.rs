//! Autosave snapshots and load resolution.
//!
//! Storage layout per script id:
//!
//! | key                          | value                         |
//! |------------------------------|-------------------------------|
//! | `script_{id}`                | transient autosave content    |
//! | `script_{id}_autosave_time`  | unix ms of that snapshot      |
//! | `script_{id}_backup`         | content of the last real save |
//! | `script_{id}_saved_date`     | unix ms of the last real save |

use crate::document::has_markup;
use crate::models::{ScriptId, now_millis};
use crate::persistence::store::{KeyValueStore, StoreError};

/// Where loaded content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    AutoSave,
    Backup,
    /// The fallback handed in by the caller (the stored record)
    Record,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoSaveEntry {
    pub script_id: ScriptId,
    pub content: String,
    /// Unix milliseconds
    pub timestamp: u64,
}

fn autosave_key(id: &ScriptId) -> String {
    format!("script_{id}")
}

fn autosave_time_key(id: &ScriptId) -> String {
    format!("script_{id}_autosave_time")
}

fn backup_key(id: &ScriptId) -> String {
    format!("script_{id}_backup")
}

fn saved_date_key(id: &ScriptId) -> String {
    format!("script_{id}_saved_date")
}

pub struct AutoSaveManager<S> {
    store: S,
}

impl<S: KeyValueStore> AutoSaveManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Content to open `id` with: autosave, then backup, then `fallback`.
    /// Plain text with newlines gets its line breaks made structural.
    pub fn load(&self, id: &ScriptId, fallback: &str) -> (ContentSource, String) {
        let (source, content) = self
            .resolve(id)
            .unwrap_or_else(|| (ContentSource::Record, fallback.to_string()));
        log::info!("Loading script {id} from {source:?}");
        (source, convert_line_breaks(&content))
    }

    /// Which stored snapshot wins for `id`, if any. Empty snapshots and
    /// unreadable keys are skipped.
    pub fn resolve(&self, id: &ScriptId) -> Option<(ContentSource, String)> {
        [
            (ContentSource::AutoSave, autosave_key(id)),
            (ContentSource::Backup, backup_key(id)),
        ]
        .into_iter()
        .find_map(|(source, key)| match self.store.get(&key) {
            Ok(Some(content)) if !content.is_empty() => Some((source, content)),
            Ok(_) => None,
            Err(err) => {
                log::warn!("Skipping {key}: {err}");
                None
            }
        })
    }

    /// Write a transient snapshot for `id`
    pub fn save(&mut self, id: &ScriptId, content: &str) -> Result<AutoSaveEntry, StoreError> {
        let timestamp = now_millis();
        self.store.set(&autosave_key(id), content)?;
        self.store.set(&autosave_time_key(id), &timestamp.to_string())?;
        log::debug!("Autosaved script {id} ({} bytes)", content.len());
        Ok(AutoSaveEntry {
            script_id: id.clone(),
            content: content.to_string(),
            timestamp,
        })
    }

    pub fn entry(&self, id: &ScriptId) -> Result<Option<AutoSaveEntry>, StoreError> {
        let Some(content) = self.store.get(&autosave_key(id))? else {
            return Ok(None);
        };
        let timestamp = self
            .store
            .get(&autosave_time_key(id))?
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_default();
        Ok(Some(AutoSaveEntry {
            script_id: id.clone(),
            content,
            timestamp,
        }))
    }

    /// Record the content of a validated save
    pub fn backup(&mut self, id: &ScriptId, content: &str) -> Result<u64, StoreError> {
        let saved_at = now_millis();
        self.store.set(&backup_key(id), content)?;
        self.store.set(&saved_date_key(id), &saved_at.to_string())?;
        Ok(saved_at)
    }

    /// Drop the transient snapshot so it cannot shadow a deliberate save
    pub fn promote(&mut self, id: &ScriptId) -> Result<(), StoreError> {
        self.store.remove(&autosave_key(id))?;
        self.store.remove(&autosave_time_key(id))?;
        log::debug!("Promoted script {id}: autosave cleared");
        Ok(())
    }
}

/// Plain text with newlines becomes escaped text with `<br>` line breaks;
/// anything carrying markup is returned untouched.
fn convert_line_breaks(content: &str) -> String {
    if has_markup(content) || !content.contains('\n') {
        return content.to_string();
    }
    content
        .split('\n')
        .map(|line| html_escape::encode_text(line.strip_suffix('\r').unwrap_or(line)).into_owned())
        .collect::<Vec<_>>()
        .join("<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn manager_with(autosave: Option<&str>, backup: Option<&str>) -> AutoSaveManager<MemoryStore> {
        let id = ScriptId::from("7");
        let mut store = MemoryStore::new();
        if let Some(content) = autosave {
            store.set(&autosave_key(&id), content).unwrap();
        }
        if let Some(content) = backup {
            store.set(&backup_key(&id), content).unwrap();
        }
        AutoSaveManager::new(store)
    }

    #[rstest]
    #[case::autosave_wins(Some("A"), Some("B"), (ContentSource::AutoSave, "A"))]
    #[case::backup_next(None, Some("B"), (ContentSource::Backup, "B"))]
    #[case::record_last(None, None, (ContentSource::Record, "C"))]
    #[case::empty_autosave_skipped(Some(""), Some("B"), (ContentSource::Backup, "B"))]
    fn test_load_resolution_order(
        #[case] autosave: Option<&str>,
        #[case] backup: Option<&str>,
        #[case] expected: (ContentSource, &str),
    ) {
        let manager = manager_with(autosave, backup);
        let (source, content) = manager.load(&ScriptId::from("7"), "C");
        assert_eq!((source, content.as_str()), expected);
    }

    #[rstest]
    #[case::plain_lines("Dearly beloved\nwe are gathered", "Dearly beloved<br>we are gathered")]
    #[case::windows_lines("a\r\nb", "a<br>b")]
    #[case::escapes_text("Tom & Ann\n<3", "Tom &amp; Ann<br>&lt;3")]
    #[case::single_line("no breaks here", "no breaks here")]
    #[case::markup_untouched("<b>x</b>\ny", "<b>x</b>\ny")]
    fn test_line_break_conversion(#[case] input: &str, #[case] expected: &str) {
        let manager = manager_with(None, None);
        let (_, content) = manager.load(&ScriptId::from("7"), input);
        assert_eq!(content, expected);
    }

    #[test]
    fn test_save_entry_and_promote() {
        let id = ScriptId::from("7");
        let mut manager = AutoSaveManager::new(MemoryStore::new());

        let written = manager.save(&id, "draft").unwrap();
        let read = manager.entry(&id).unwrap().unwrap();
        assert_eq!(read, written);
        assert!(read.timestamp > 0);

        manager.backup(&id, "final").unwrap();
        manager.promote(&id).unwrap();

        assert_eq!(manager.entry(&id).unwrap(), None);
        assert_eq!(
            manager.store().keys().collect::<Vec<_>>(),
            vec!["script_7_backup", "script_7_saved_date"]
        );
        assert_eq!(manager.load(&id, "record").1, "final");
    }
}
