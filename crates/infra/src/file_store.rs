//! Directory-backed [`BlobStore`]: one `<key>.json` file per key.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use pizzapos_core::{BlobStore, StorageError, StorageResult};

#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Use `dir` as the store root, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error("create data directory", &dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::backend(format!("invalid blob key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(action: &str, path: &Path, err: io::Error) -> StorageError {
    StorageError::backend(format!("{action} {}: {err}", path.display()))
}

impl BlobStore for FileBlobStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", &path, e)),
        }
    }

    /// Write to a sibling temp file, then rename over the target so readers
    /// never observe a half-written document.
    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp).map_err(|e| io_error("create", &tmp, e))?;
        file.write_all(value.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| io_error("write", &tmp, e))?;
        drop(file);
        fs::rename(&tmp, &path).map_err(|e| io_error("replace", &path, e))?;

        debug!(key, bytes = value.len(), "blob saved");
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, e)),
        }
    }
}
