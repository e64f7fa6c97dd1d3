use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, StoreError};
use crate::services::storage::KeyValueStore;

pub fn get_app_data_dir() -> Result<PathBuf, ConfigError> {
    let data_dir = dirs::data_dir()
        .ok_or(ConfigError::NoDataDir)?
        .join("TacticalTerminal");

    ensure_dir(&data_dir).map_err(|e| ConfigError::Write(e.to_string()))?;
    Ok(data_dir)
}

pub fn get_store_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("store")
}

fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Key/value store keeping one file per key inside a directory.
///
/// Writes go to a temporary sibling file which is synced and then renamed
/// over the target, so readers never observe a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StoreError::io(key, e))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        ensure_dir(&self.dir).map_err(|e| StoreError::io(key, e))?;

        let tmp_path = self.dir.join(format!(".{}.tmp", key));
        let write_tmp = || -> std::io::Result<()> {
            let mut tmp_file = File::create(&tmp_path)?;
            tmp_file.write_all(value.as_bytes())?;
            tmp_file.sync_all()
        };

        if let Err(e) = write_tmp() {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::io(key, e));
        }

        fs::rename(&tmp_path, &path).map_err(|e| StoreError::io(key, e))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(&path).map_err(|e| StoreError::io(key, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn values_survive_a_new_handle() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("store"));
        store.set("pubgKnowledgeBase", "{\n  \"a\": 1\n}").unwrap();

        let reopened = FileStore::new(temp.path().join("store"));
        assert_eq!(
            reopened.get("pubgKnowledgeBase").unwrap().as_deref(),
            Some("{\n  \"a\": 1\n}")
        );
    }

    #[test]
    fn set_leaves_no_temp_file_behind() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        store.set("chatHistory", "[]").unwrap();
        store.set("chatHistory", "[1]").unwrap();

        let names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["chatHistory".to_string()]);
    }

    #[test]
    fn missing_key_and_remove_are_quiet() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        assert_eq!(store.get("nothing").unwrap(), None);
        store.remove("nothing").unwrap();
    }

    #[test]
    fn rejects_keys_that_escape_the_directory() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        for key in ["", "../config", "a/b", ".hidden"] {
            assert!(matches!(store.set(key, "x"), Err(StoreError::InvalidKey(_))), "{key}");
        }
    }

    #[test]
    fn unreadable_value_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("pubgKnowledgeBase"), [0xff, 0xfe, 0x00]).unwrap();
        let store = FileStore::new(temp.path());
        assert!(matches!(store.get("pubgKnowledgeBase"), Err(StoreError::Io { .. })));
    }
}
