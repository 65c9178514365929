//! Artifact store.
//!
//! Each video index is one JSON file at `<root>/<identifier>.json`. Files are
//! written once per identifier and treated as immutable afterwards; the store
//! is the only writer.

use std::io::ErrorKind;
use std::path::PathBuf;

use scenespot_models::Identifier;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Directory-backed artifact store.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`. The directory is not touched until
    /// [`ArtifactStore::ensure_dir`] or the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if it does not exist.
    pub async fn ensure_dir(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Deterministic location of the artifact for `id`.
    pub fn path(&self, id: &Identifier) -> PathBuf {
        self.root.join(id.artifact_file_name())
    }

    /// Check whether an artifact is stored for `id`.
    pub async fn exists(&self, id: &Identifier) -> bool {
        match tokio::fs::metadata(self.path(id)).await {
            Ok(meta) => meta.is_file(),
            Err(_) => false,
        }
    }

    /// Store `content` as the artifact for `id`, replacing any previous one.
    ///
    /// The bytes land in a hidden sibling file first and are renamed into
    /// place, so a concurrent reader sees either the old file or the new one.
    pub async fn write(&self, id: &Identifier, content: &[u8]) -> StorageResult<PathBuf> {
        self.ensure_dir().await?;

        let path = self.path(id);
        let staging = self
            .root
            .join(format!(".{}.{}.partial", id, Uuid::new_v4().simple()));

        if let Err(e) = tokio::fs::write(&staging, content).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(StorageError::write_failed(staging.display().to_string(), e));
        }

        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(StorageError::write_failed(path.display().to_string(), e));
        }

        info!(
            identifier = %id,
            path = %path.display(),
            size = content.len(),
            "Artifact saved"
        );
        Ok(path)
    }

    /// Read the artifact for `id`.
    pub async fn read(&self, id: &Identifier) -> StorageResult<Vec<u8>> {
        let path = self.path(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(identifier = %id, size = bytes.len(), "Artifact loaded");
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(id.as_str())),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Verify the store directory accepts writes.
    pub async fn check_writable(&self) -> StorageResult<()> {
        self.ensure_dir().await?;
        let marker = self.root.join(format!(".writable.{}", Uuid::new_v4().simple()));
        tokio::fs::write(&marker, b"ok").await?;
        tokio::fs::remove_file(&marker).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenespot_models::SceneEvent;

    fn id(name: &str) -> Identifier {
        Identifier::from_filename(name).unwrap()
    }

    #[test]
    fn test_artifact_path() {
        let store = ArtifactStore::new("indices");
        assert_eq!(
            store.path(&id("demo clip.mp4")),
            PathBuf::from("indices/demo_clip.mp4.json")
        );
    }

    #[tokio::test]
    async fn test_exists_false_for_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(!store.exists(&id("missing.mp4")).await);
    }

    #[tokio::test]
    async fn test_write_read_roundtrip_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("indices"));
        let events = vec![
            SceneEvent::new(0, 5, "Hello there", "A woman in a red coat waves"),
            SceneEvent::new(5, 10, "", "A car speeds away"),
        ];
        let content = serde_json::to_vec_pretty(&events).unwrap();

        let path = store.write(&id("demo clip.mp4"), &content).await.unwrap();
        assert!(path.ends_with("demo_clip.mp4.json"));
        assert!(store.exists(&id("demo clip.mp4")).await);

        let read_back = store.read(&id("demo_clip.mp4")).await.unwrap();
        assert_eq!(read_back, content);
    }

    #[tokio::test]
    async fn test_write_overwrites_and_leaves_no_partials() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.write(&id("a.mp4"), b"[1]").await.unwrap();
        store.write(&id("a.mp4"), b"[2]").await.unwrap();

        assert_eq!(store.read(&id("a.mp4")).await.unwrap(), b"[2]");

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["a.mp4.json".to_string()]);
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.read(&id("nope.mp4")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_write_into_unwritable_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let store = ArtifactStore::new(&blocker);
        assert!(store.write(&id("a.mp4"), b"[]").await.is_err());
        assert!(store.check_writable().await.is_err());
    }

    #[tokio::test]
    async fn test_check_writable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("fresh"));
        store.check_writable().await.unwrap();
        assert!(dir.path().join("fresh").is_dir());
    }
}
