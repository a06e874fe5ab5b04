use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;
use uuid::Uuid;

use conduit_state::{SnapshotBackend, SnapshotError};

/// [`SnapshotBackend`] that keeps each key in `<dir>/<key>.json`.
///
/// Writes go to a uniquely named temporary file in the same directory and are
/// then renamed over the target, so a crash mid-write never leaves a torn
/// snapshot behind. The directory is created on first save.
#[derive(Debug, Clone)]
pub struct FileSnapshotBackend {
    dir: PathBuf,
}

impl FileSnapshotBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, SnapshotError> {
        if key.is_empty()
            || key.contains(['/', '\\'])
            || key.contains("..")
            || key.starts_with('.')
        {
            return Err(SnapshotError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SnapshotBackend for FileSnapshotBackend {
    fn load(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapshotError::Io(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SnapshotError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            SnapshotError::Io(format!(
                "failed to prepare snapshot directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, value).map_err(|e| {
            SnapshotError::Io(format!("failed to write {}: {e}", temp_path.display()))
        })?;
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(SnapshotError::Io(format!(
                "failed to finalize {}: {e}",
                path.display()
            )));
        }

        debug!(path = %path.display(), bytes = value.len(), "snapshot written");
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<bool, SnapshotError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SnapshotError::Io(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}
