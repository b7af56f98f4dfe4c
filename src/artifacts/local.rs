// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Local filesystem artifact store
//!
//! Layout under the root:
//!
//! ```text
//! <root>/<stage>/...            last saved artifact of <stage>
//! <root>/.records/<stage>.json  metadata of that artifact
//! <root>/.staging-<stage>/      copy in progress
//! ```
//!
//! Stage names never start with `.`, so the bookkeeping entries cannot
//! collide with artifacts.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use super::{ArtifactRecord, ArtifactStore};
use crate::errors::{StagecraftError, StagecraftResult};

/// Default artifact root, relative to the working directory
pub const DEFAULT_ARTIFACT_ROOT: &str = ".stagecraft/artifacts";

const RECORDS_DIR: &str = ".records";

/// Artifact store copying directories under a local root
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// Create a store rooted at `root`; nothing is created until the first save
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a store at the default root under `base_dir`
    pub fn default_store(base_dir: &Path) -> Self {
        Self::new(base_dir.join(DEFAULT_ARTIFACT_ROOT))
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn records_dir(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }

    fn record_path(&self, stage: &str) -> PathBuf {
        self.records_dir().join(format!("{}.json", stage))
    }

    fn staging_path(&self, stage: &str) -> PathBuf {
        self.root.join(format!(".staging-{}", stage))
    }

    async fn write_record(&self, record: &ArtifactRecord) -> StagecraftResult<()> {
        let write_err =
            |e: &dyn std::fmt::Display| StagecraftError::artifact_write(&record.stage, &record.source, e);

        let json = serde_json::to_string_pretty(record).map_err(|e| write_err(&e))?;
        tokio::fs::create_dir_all(self.records_dir())
            .await
            .map_err(|e| write_err(&e))?;
        tokio::fs::write(self.record_path(&record.stage), json)
            .await
            .map_err(|e| write_err(&e))
    }

    fn store_error(message: impl Into<String>) -> StagecraftError {
        StagecraftError::ArtifactStore {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    fn locate(&self, stage: &str) -> PathBuf {
        self.root.join(stage)
    }

    async fn save(&self, stage: &str, source: &Path) -> StagecraftResult<ArtifactRecord> {
        let write_err = |e: &dyn std::fmt::Display| StagecraftError::artifact_write(stage, source, e);

        let metadata = tokio::fs::metadata(source).await.map_err(|e| write_err(&e))?;
        if !metadata.is_dir() {
            return Err(write_err(&"not a directory"));
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| write_err(&e))?;

        // Copy into a staging directory first so a failed copy never
        // leaves a half-written artifact behind
        let staging = self.staging_path(stage);
        remove_dir_if_exists(&staging).await.map_err(|e| write_err(&e))?;

        // The source may contain the store itself (`artifact: .`); compare
        // canonical paths so the walk can prune it
        let src = tokio::fs::canonicalize(source)
            .await
            .map_err(|e| write_err(&e))?;
        let store_root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|e| write_err(&e))?;

        let dst = staging.clone();
        let copied = tokio::task::spawn_blocking(move || copy_tree(&src, &dst, &store_root))
            .await
            .map_err(|e| write_err(&e))?;

        let (files, size_bytes) = match copied {
            Ok(totals) => totals,
            Err(e) => {
                let _ = remove_dir_if_exists(&staging).await;
                return Err(write_err(&e));
            }
        };

        let location = self.locate(stage);
        remove_dir_if_exists(&location)
            .await
            .map_err(|e| write_err(&e))?;
        tokio::fs::rename(&staging, &location)
            .await
            .map_err(|e| write_err(&e))?;

        let record = ArtifactRecord {
            stage: stage.to_string(),
            location,
            source: source.to_path_buf(),
            files,
            size_bytes,
            saved_at: SystemTime::now(),
        };

        self.write_record(&record).await?;

        tracing::debug!(stage, files, size_bytes, location = %record.location.display(), "saved artifact");

        Ok(record)
    }

    async fn record(&self, stage: &str) -> StagecraftResult<Option<ArtifactRecord>> {
        let path = self.record_path(stage);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Self::store_error(format!(
                    "Failed to read artifact record '{}': {}",
                    path.display(),
                    e
                )))
            }
        };

        let record: ArtifactRecord = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    async fn list(&self) -> StagecraftResult<Vec<ArtifactRecord>> {
        let dir = self.records_dir();
        let mut records = Vec::new();

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(records),
            Err(e) => {
                return Err(Self::store_error(format!(
                    "Failed to read artifact records: {}",
                    e
                )))
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::store_error(format!("Failed to read artifact record: {}", e)))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            // Skip records that no longer parse or whose artifact vanished
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                continue;
            };
            match serde_json::from_str::<ArtifactRecord>(&content) {
                Ok(record) if record.location.is_dir() => records.push(record),
                Ok(record) => {
                    tracing::warn!(stage = %record.stage, "artifact record without artifact directory")
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "unreadable artifact record"),
            }
        }

        records.sort_by(|a, b| a.stage.cmp(&b.stage));
        Ok(records)
    }

    async fn remove(&self, stage: &str) -> StagecraftResult<()> {
        remove_dir_if_exists(&self.locate(stage))
            .await
            .map_err(|e| Self::store_error(format!("Failed to remove artifact '{}': {}", stage, e)))?;

        match tokio::fs::remove_file(self.record_path(stage)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::store_error(format!(
                "Failed to remove artifact record '{}': {}",
                stage, e
            ))),
        }
    }

    async fn clear(&self) -> StagecraftResult<()> {
        remove_dir_if_exists(&self.root)
            .await
            .map_err(|e| Self::store_error(format!("Failed to clear artifacts: {}", e)))
    }
}

async fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Recursively copy `src` into `dst`, returning `(files, bytes)` copied
///
/// `store_root` is pruned from the walk when it lies inside `src`.
fn copy_tree(src: &Path, dst: &Path, store_root: &Path) -> io::Result<(u64, u64)> {
    let mut files = 0;
    let mut bytes = 0;

    let walker = WalkDir::new(src)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.path() != store_root);

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            bytes += std::fs::copy(entry.path(), &target)?;
            files += 1;
        }
    }

    Ok((files, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_save_copies_tree() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("out/lib");
        write(&source.join("libfoo.a"), "archive");
        write(&source.join("include/foo.h"), "int foo(void);");

        let store = LocalArtifactStore::new(temp_dir.path().join("store"));
        let record = store.save("lib", &source).await.unwrap();

        let location = store.locate("lib");
        assert_eq!(record.location, location);
        assert_eq!(record.files, 2);
        assert_eq!(
            std::fs::read_to_string(location.join("include/foo.h")).unwrap(),
            "int foo(void);"
        );
        assert_eq!(store.record("lib").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_save_replaces_previous_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(temp_dir.path().join("store"));

        let first = temp_dir.path().join("first");
        write(&first.join("stale.o"), "old");
        store.save("lib", &first).await.unwrap();

        let second = temp_dir.path().join("second");
        write(&second.join("fresh.o"), "new");
        store.save("lib", &second).await.unwrap();

        let location = store.locate("lib");
        assert!(!location.join("stale.o").exists());
        assert_eq!(std::fs::read_to_string(location.join("fresh.o")).unwrap(), "new");
        assert!(!store.staging_path("lib").exists());
    }

    #[tokio::test]
    async fn test_missing_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(temp_dir.path().join("store"));

        let err = store
            .save("lib", &temp_dir.path().join("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, StagecraftError::ArtifactWriteError { ref stage, .. } if stage == "lib"));
        assert!(!store.locate("lib").exists());
    }

    #[tokio::test]
    async fn test_file_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("out.txt");
        write(&file, "not a dir");
        let store = LocalArtifactStore::new(temp_dir.path().join("store"));

        let err = store.save("lib", &file).await.unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[tokio::test]
    async fn test_save_working_dir_skips_store() {
        let temp_dir = TempDir::new().unwrap();
        write(&temp_dir.path().join("out/app"), "binary");
        write(&temp_dir.path().join("README"), "docs");
        let store = LocalArtifactStore::default_store(temp_dir.path());

        let first = store.save("all", temp_dir.path()).await.unwrap();
        assert_eq!(first.files, 2);

        // A second save must not pick up the first artifact or its record
        let second = store.save("all", temp_dir.path()).await.unwrap();
        assert_eq!(second.files, 2);

        let location = store.locate("all");
        assert_eq!(std::fs::read_to_string(location.join("out/app")).unwrap(), "binary");
        assert!(!location.join(".stagecraft/artifacts").exists());
    }

    #[tokio::test]
    async fn test_unserializable_record_is_write_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(temp_dir.path().join("store"));

        let record = ArtifactRecord {
            stage: "lib".into(),
            location: store.locate("lib"),
            source: temp_dir.path().join("out/lib"),
            files: 0,
            size_bytes: 0,
            saved_at: SystemTime::UNIX_EPOCH - std::time::Duration::from_secs(1),
        };

        let err = store.write_record(&record).await.unwrap_err();
        assert!(matches!(err, StagecraftError::ArtifactWriteError { ref stage, .. } if stage == "lib"));
        assert!(!store.record_path("lib").exists());
    }

    #[tokio::test]
    async fn test_locate_before_save() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::default_store(temp_dir.path());

        let location = store.locate("exe");
        assert_eq!(location, temp_dir.path().join(".stagecraft/artifacts/exe"));
        assert!(!location.exists());
        assert_eq!(store.record("exe").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_remove_clear() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        write(&source.join("a.txt"), "12345");
        let store = LocalArtifactStore::new(temp_dir.path().join("store"));

        store.save("lib_dyn", &source).await.unwrap();
        store.save("exe", &source).await.unwrap();

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|r| r.stage).collect();
        assert_eq!(names, vec!["exe", "lib_dyn"]);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.size_bytes, 10);

        store.remove("exe").await.unwrap();
        assert!(!store.locate("exe").exists());
        assert_eq!(store.list().await.unwrap().len(), 1);

        store.clear().await.unwrap();
        assert_eq!(store.stats().await.unwrap().entries, 0);
    }
}
