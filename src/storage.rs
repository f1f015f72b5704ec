//! JSON file storage adapter
//!
//! Every save rewrites the whole document. The previous document is copied
//! to `<file>.bak` first so a bad write can be recovered.

use std::fs::{self, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{DuepetError, Result};

/// JSON snapshot storage for a single document
#[derive(Debug, Clone)]
pub struct JsonStorage {
    path: PathBuf,
    backups: bool,
}

impl JsonStorage {
    /// Create a new storage adapter for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backups: true,
        }
    }

    /// Skip the `.bak` copy on save
    pub fn without_backup(mut self) -> Self {
        self.backups = false;
        self
    }

    /// Get the storage path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, `None` when the file does not exist
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = fs::File::open(&self.path)
            .map_err(|e| DuepetError::io(format!("opening {}", self.path.display()), e))?;
        let value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            DuepetError::storage_with_source(format!("{} is not valid", self.path.display()), e)
        })?;

        Ok(Some(value))
    }

    /// Save the full document, replacing whatever was there
    pub fn save<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| DuepetError::io(format!("creating {}", parent.display()), e))?;
        }

        if self.backups {
            self.backup()?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| DuepetError::io(format!("writing {}", self.path.display()), e))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;

        debug!("wrote {}", self.path.display());
        Ok(())
    }

    /// Path of the backup copy
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Copy the current file to the backup path
    pub fn backup(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(()); // Nothing to backup
        }

        fs::copy(&self.path, self.backup_path())
            .map_err(|e| DuepetError::io("creating backup", e))?;
        Ok(())
    }

    /// Check if backup exists
    pub fn backup_exists(&self) -> bool {
        self.backup_path().exists()
    }

    /// Read the document from the backup file
    pub fn recover<T: DeserializeOwned>(&self) -> Result<T> {
        if !self.backup_exists() {
            return Err(DuepetError::storage("Backup file not found"));
        }

        JsonStorage::new(self.backup_path())
            .load()?
            .ok_or_else(|| DuepetError::storage("Backup file not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().join("absent.json"));
        let loaded: Option<Vec<u32>> = storage.load().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().join("nested/data/tasks.json"));
        storage.save(&vec![1, 2, 3]).unwrap();

        let loaded: Option<Vec<u32>> = storage.load().unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_backup_and_recover() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().join("tasks.json"));

        storage.save(&vec!["first"]).unwrap();
        assert!(!storage.backup_exists());

        storage.save(&vec!["second"]).unwrap();
        assert!(storage.backup_exists());
        assert_eq!(storage.backup_path(), dir.path().join("tasks.json.bak"));

        let recovered: Vec<String> = storage.recover().unwrap();
        assert_eq!(recovered, vec!["first"]);
    }

    #[test]
    fn test_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().join("pet.json")).without_backup();
        storage.save(&1u8).unwrap();
        storage.save(&2u8).unwrap();
        assert!(!storage.backup_exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "[{not json").unwrap();

        let result: Result<Option<Vec<u32>>> = JsonStorage::new(path).load();
        assert!(matches!(result, Err(DuepetError::Storage { .. })));
    }
}
