// Local persistence of definitions and cached account details
//
// Both files are small JSON documents loaded and saved as a whole. Definition
// order is meaningful: the CLI addresses definitions by position.

use crate::errors::StorageError;
use crate::models::{Definition, UserInfo};
use crate::validation::validate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const DEFINITIONS_FILE: &str = "tournaments.json";
pub const USER_INFO_FILE: &str = "user_info.json";

/// File-backed store rooted at a data directory
#[derive(Debug, Clone)]
pub struct DefinitionStore {
    data_dir: PathBuf,
}

impl DefinitionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn definitions_path(&self) -> PathBuf {
        self.data_dir.join(DEFINITIONS_FILE)
    }

    pub fn user_info_path(&self) -> PathBuf {
        self.data_dir.join(USER_INFO_FILE)
    }

    /// All definitions in stored order; empty when nothing was saved yet
    pub fn load_definitions(&self) -> Result<Vec<Definition>, StorageError> {
        Ok(read_json(&self.definitions_path())?.unwrap_or_default())
    }

    #[instrument(skip_all, fields(count = definitions.len()))]
    pub fn save_definitions(&self, definitions: &[Definition]) -> Result<(), StorageError> {
        write_json(&self.definitions_path(), &definitions)?;
        debug!(path = %self.definitions_path().display(), "Definitions saved");
        Ok(())
    }

    /// Cached account details, `None` until refreshed
    pub fn load_user_info(&self) -> Result<Option<UserInfo>, StorageError> {
        read_json(&self.user_info_path())
    }

    pub fn save_user_info(&self, user_info: &UserInfo) -> Result<(), StorageError> {
        write_json(&self.user_info_path(), user_info)
    }

    /// Append a definition, returning its index
    pub fn add(&self, definition: Definition) -> Result<usize, StorageError> {
        let mut definitions = self.load_definitions()?;
        definitions.push(definition);
        self.save_definitions(&definitions)?;
        Ok(definitions.len() - 1)
    }

    pub fn get(&self, index: usize) -> Result<Definition, StorageError> {
        let definitions = self.load_definitions()?;
        let count = definitions.len();
        definitions
            .into_iter()
            .nth(index)
            .ok_or(StorageError::NotFound { index, count })
    }

    /// Apply `change` to the definition at `index` and save
    pub fn update<F, E>(&self, index: usize, change: F) -> Result<Definition, E>
    where
        F: FnOnce(&mut Definition) -> Result<(), E>,
        E: From<StorageError>,
    {
        let mut definitions = self.load_definitions()?;
        let count = definitions.len();
        let definition = definitions
            .get_mut(index)
            .ok_or(StorageError::NotFound { index, count })?;
        change(definition)?;
        let updated = definition.clone();
        self.save_definitions(&definitions)?;
        Ok(updated)
    }

    pub fn remove(&self, index: usize) -> Result<Definition, StorageError> {
        let mut definitions = self.load_definitions()?;
        let count = definitions.len();
        if index >= count {
            return Err(StorageError::NotFound { index, count });
        }
        let removed = definitions.remove(index);
        self.save_definitions(&definitions)?;
        Ok(removed)
    }

    /// Drop every definition that fails validation, returning their names
    #[instrument(skip(self))]
    pub fn purge_invalid(&self) -> Result<Vec<String>, StorageError> {
        let definitions = self.load_definitions()?;
        let (kept, removed): (Vec<_>, Vec<_>) = definitions
            .into_iter()
            .partition(|definition| validate(definition).valid);

        if !removed.is_empty() {
            self.save_definitions(&kept)?;
        }

        let names: Vec<String> = removed.into_iter().map(|d| d.name).collect();
        info!(removed = names.len(), kept = kept.len(), "Purged invalid definitions");
        Ok(names)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };

    if text.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| StorageError::InvalidJson {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let text = serde_json::to_string_pretty(value).map_err(|e| StorageError::InvalidJson {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    // Write beside the target, then rename over it
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, text).map_err(|e| io_error(&staging, e))?;
    fs::rename(&staging, path).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
