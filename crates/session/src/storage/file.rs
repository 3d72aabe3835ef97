//! File-backed token store.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{StorageError, TokenStore};

/// File name used inside a state directory.
const STORE_FILE: &str = "session.json";

type Document = BTreeMap<String, String>;

/// Token store persisted as one JSON object on disk.
///
/// Every call re-reads the file, so entries written by another process are
/// picked up. Writes go to a temporary sibling that is renamed over the
/// original. On Unix the file is created with mode `0600`.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    /// Use the store file at `path`. Nothing is touched until the first call.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Use the default store file inside a state directory.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::open(dir.join(STORE_FILE))
    }

    /// Location of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Document, StorageError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Document::new());
        }

        serde_json::from_slice(&raw).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, document: &Document) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let encoded = serde_json::to_vec_pretty(document).map_err(|source| {
            StorageError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded).map_err(io_err)?;
        restrict_permissions(&tmp).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;

        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Document) -> bool) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut document = self.read()?;
        if apply(&mut document) {
            self.write(&document)?;
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|doc| {
            doc.insert(key.to_owned(), value.to_owned());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|doc| doc.remove(key).is_some())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
