// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Artifact storage
//!
//! A stage's declared output directory is persisted under a location
//! addressed by the stage name. The backend is pluggable; the local
//! filesystem copy is the reference implementation.

mod local;

pub use local::{LocalArtifactStore, DEFAULT_ARTIFACT_ROOT};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::errors::StagecraftResult;

/// Trait for artifact store implementations
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Location consumers read the artifact of `stage` from
    ///
    /// Resolvable for any name, whether or not the stage has run yet.
    fn locate(&self, stage: &str) -> PathBuf;

    /// Persist `source` as the artifact of `stage`, fully replacing any
    /// previous artifact of that stage
    async fn save(&self, stage: &str, source: &Path) -> StagecraftResult<ArtifactRecord>;

    /// Metadata of the last saved artifact of `stage`
    async fn record(&self, stage: &str) -> StagecraftResult<Option<ArtifactRecord>>;

    /// Metadata of every stored artifact, ordered by stage name
    async fn list(&self) -> StagecraftResult<Vec<ArtifactRecord>>;

    /// Delete the artifact of `stage`
    async fn remove(&self, stage: &str) -> StagecraftResult<()>;

    /// Delete every stored artifact
    async fn clear(&self) -> StagecraftResult<()>;

    /// Get store statistics
    async fn stats(&self) -> StagecraftResult<ArtifactStats> {
        let records = self.list().await?;

        Ok(ArtifactStats {
            entries: records.len(),
            size_bytes: records.iter().map(|r| r.size_bytes).sum(),
            newest_entry: records.iter().map(|r| r.saved_at).max(),
        })
    }
}

/// Metadata kept alongside a stored artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Producing stage
    pub stage: String,
    /// Where the artifact is stored
    pub location: PathBuf,
    /// Directory it was copied from
    pub source: PathBuf,
    /// Number of files copied
    pub files: u64,
    /// Total size of the copied files
    pub size_bytes: u64,
    /// When the artifact was saved
    pub saved_at: SystemTime,
}

/// Artifact store statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactStats {
    /// Number of stored artifacts
    pub entries: usize,
    /// Total size in bytes
    pub size_bytes: u64,
    /// Most recent save
    pub newest_entry: Option<SystemTime>,
}

impl ArtifactStats {
    /// Format size for display
    pub fn formatted_size(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Format a byte count for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
