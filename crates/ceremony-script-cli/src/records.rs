use anyhow::{Context, Result};
use ceremony_script_engine::{ScriptId, ScriptRecord};
use std::fs;
use std::path::PathBuf;

/// Saved script records, one TOML file per script
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &ScriptId) -> PathBuf {
        self.dir.join(format!("{id}.toml"))
    }

    pub fn load(&self, id: &ScriptId) -> Result<Option<ScriptRecord>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(record))
    }

    pub fn save(&self, record: &ScriptRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let content = toml::to_string_pretty(record)?;
        fs::write(self.path_for(&record.id), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ceremony_script_engine::ScriptStatus;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_record_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let records = RecordStore::new(temp_dir.path());
        assert_eq!(records.load(&ScriptId::from("nope")).unwrap(), None);
    }

    #[test]
    fn test_save_and_load_record() {
        let temp_dir = TempDir::new().unwrap();
        let records = RecordStore::new(temp_dir.path().join("records"));
        let mut record = ScriptRecord::new(ScriptId::from("lee-park"), "Lee & Park", "<b>Welcome</b>");
        record.status = ScriptStatus::Ready;

        records.save(&record).unwrap();

        assert_eq!(records.load(&record.id).unwrap(), Some(record));
    }
}
