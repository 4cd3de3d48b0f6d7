//! File-based SnapshotRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use stellar_protocol::{Envelope, EnvelopeKind, StateSnapshot};

use crate::repository::{RepositoryError, Result, SnapshotRepository, validate_name};

/// File-based implementation of SnapshotRepository.
///
/// # File Format
///
/// Each snapshot is stored as `{name}.json`, holding the JSON form of a
/// sealed snapshot envelope `{kind, payload, hash}`. Loading recomputes the
/// payload hash, so a truncated or hand-edited save is reported as
/// [`RepositoryError::CorruptedData`] instead of being half-loaded.
pub struct FileSnapshotRepository {
    base_dir: PathBuf,
}

impl FileSnapshotRepository {
    /// Create a new file-based snapshot repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", name))
    }
}

impl SnapshotRepository for FileSnapshotRepository {
    fn save(&self, name: &str, snapshot: &StateSnapshot) -> Result<()> {
        validate_name(name)?;
        let path = self.snapshot_path(name);
        let temp_path = path.with_extension("json.tmp");

        let envelope = Envelope::wrap(EnvelopeKind::Snapshot, snapshot);
        let bytes = envelope
            .to_bytes()
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;

        // Atomic rename
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        tracing::debug!(
            "Saved snapshot {} ({}) to {}",
            name,
            envelope.hash.short(),
            path.display()
        );

        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<StateSnapshot>> {
        validate_name(name)?;
        let path = self.snapshot_path(name);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
        let envelope = Envelope::from_bytes(&bytes)
            .map_err(|e| RepositoryError::CorruptedData(format!("{}: {}", path.display(), e)))?;

        if envelope.kind != EnvelopeKind::Snapshot {
            return Err(RepositoryError::CorruptedData(format!(
                "{}: holds a {} envelope",
                path.display(),
                envelope.kind
            )));
        }

        let snapshot = envelope
            .decode::<StateSnapshot>()
            .map_err(|e| RepositoryError::CorruptedData(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Loaded snapshot {} from {}", name, path.display());

        Ok(Some(snapshot))
    }

    fn exists(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.snapshot_path(name).exists()
    }

    fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let path = self.snapshot_path(name);

        if path.exists() {
            fs::remove_file(&path).map_err(RepositoryError::Io)?;
            tracing::debug!("Deleted snapshot {}", name);
        }

        Ok(())
    }

    fn list_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        let entries = fs::read_dir(&self.base_dir).map_err(RepositoryError::Io)?;

        for entry in entries {
            let entry = entry.map_err(RepositoryError::Io)?;
            let path = entry.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(name) = filename.strip_suffix(".json")
                && validate_name(name).is_ok()
            {
                names.push(name.to_string());
            }
        }

        names.sort_unstable();
        Ok(names)
    }
}
