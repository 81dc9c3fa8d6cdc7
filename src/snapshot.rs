//! Snapshot persistence for resumable runs.
//!
//! The full record collection is written as one JSON document after every
//! mutating pipeline stage, so an interrupted crawl restarts from the last
//! completed stage instead of repeating hours of rate-limited network work.

use crate::models::AddinMetadata;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the previously saved record set, or `None` when no snapshot
    /// exists. A present-but-unreadable snapshot is an error: silently
    /// restarting discovery would throw away expensive crawl state.
    pub fn load(&self) -> Result<Option<Vec<AddinMetadata>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read snapshot {}", self.path.display()))?;
        let addins: Vec<AddinMetadata> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse snapshot {}", self.path.display()))?;

        info!(count = addins.len(), path = %self.path.display(), "loaded snapshot");
        Ok(Some(addins))
    }

    /// Overwrites the snapshot with the current record set.
    pub fn save(&self, addins: &[AddinMetadata]) -> Result<()> {
        let json = serde_json::to_string_pretty(addins).context("failed to serialize snapshot")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write snapshot {}", self.path.display()))?;

        debug!(count = addins.len(), path = %self.path.display(), "snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddinMetadata, DiscoverySource};
    use tempfile::TempDir;

    #[test]
    fn test_missing_snapshot_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("addins.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("addins.json"));

        let mut addin = AddinMetadata::new("Cake.Foo", DiscoverySource::YamlListing);
        addin.repository_url = Some("https://github.com/cake-contrib/Cake.Foo".to_string());
        addin.link_from_url();
        addin.add_note("find-solution", "no solution file found");
        store.save(&[addin]).unwrap();

        let restored = store.load().unwrap().unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].name, "Cake.Foo");
        assert!(restored[0].is_linked());
        assert_eq!(restored[0].analysis.notes.len(), 1);
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("addins.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = SnapshotStore::new(path);
        assert!(store.load().is_err());
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("addins.json"));

        store
            .save(&[AddinMetadata::new("Cake.A", DiscoverySource::YamlListing)])
            .unwrap();
        store
            .save(&[
                AddinMetadata::new("Cake.A", DiscoverySource::YamlListing),
                AddinMetadata::new("Cake.B", DiscoverySource::CuratedListing),
            ])
            .unwrap();

        assert_eq!(store.load().unwrap().unwrap().len(), 2);
    }
}
