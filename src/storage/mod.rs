//! Artifact storage: a content-addressed, run-scoped directory tree.
//!
//! Every artifact a run produces (`chronology.pdf`, `render_manifest.json`,
//! the debug JSON reports, ...) is written exactly once under
//! `<base_path>/runs/<run_id>/<name>`. A run re-invoked with the same
//! `run_id` calls [`Storage::clear_run`] first so the write-once contract
//! holds without leaking stale artifacts from a prior attempt.

use sha2::{Digest, Sha256};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File not found: {0}")]
    NotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A pointer to a stored artifact: where it lives and the hash of its bytes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ArtifactRef {
    pub name: String,
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: u64,
}

/// Write-once, run-scoped artifact store.
pub struct Storage {
    base_path: PathBuf,
}

impl Storage {
    pub fn new(base_path: PathBuf) -> Self {
        std::fs::create_dir_all(&base_path).ok();
        Self { base_path }
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        let path = self.base_path.join("runs").join(run_id);
        std::fs::create_dir_all(&path).ok();
        path
    }

    /// Removes any artifacts left behind by a prior attempt at `run_id`, so
    /// a re-invocation starts from a clean directory.
    pub fn clear_run(&self, run_id: &str) -> StorageResult<()> {
        let dir = self.base_path.join("runs").join(run_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;
        Ok(())
    }

    /// Writes `data` under the run's directory as `name`, returning an
    /// [`ArtifactRef`] with the content hash.
    pub fn write_artifact(&self, run_id: &str, name: &str, data: &[u8]) -> StorageResult<ArtifactRef> {
        let dir = self.run_dir(run_id);
        let path = dir.join(name);
        std::fs::write(&path, data)?;
        log::info!("Wrote artifact: {} ({} bytes)", path.display(), data.len());
        Ok(ArtifactRef {
            name: name.to_string(),
            path,
            sha256: Self::calculate_hash(data),
            bytes: data.len() as u64,
        })
    }

    pub fn read_artifact(&self, run_id: &str, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.run_dir(run_id).join(name);
        if !path.exists() {
            return Err(StorageError::NotFound(path.to_string_lossy().to_string()));
        }
        Ok(std::fs::read(path)?)
    }

    pub fn calculate_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        let artifact = storage.write_artifact("run-1", "chronology.csv", b"a,b\n1,2\n").unwrap();
        assert_eq!(artifact.bytes, 8);
        let read_back = storage.read_artifact("run-1", "chronology.csv").unwrap();
        assert_eq!(read_back, b"a,b\n1,2\n");
    }

    #[test]
    fn test_clear_run_removes_prior_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.write_artifact("run-1", "old.json", b"{}").unwrap();
        storage.clear_run("run-1").unwrap();
        assert!(storage.read_artifact("run-1", "old.json").is_err());
    }

    #[test]
    fn test_missing_artifact_errors() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        assert!(storage.read_artifact("run-1", "missing.json").is_err());
    }
}
