//! Persistent local state: configuration, credentials, stats and sync history.
//!
//! Everything lives in one pretty-printed JSON file. A missing file reads as
//! the default state so a first run needs no setup.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::contract::{Configuration, Credentials};
use crate::error::PublishError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt state file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StoreError> for PublishError {
    fn from(e: StoreError) -> Self {
        PublishError::Store(e.to_string())
    }
}

/// Publish counters. Only ever incremented.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total: u64,
    pub easy: u64,
    pub medium: u64,
    pub hard: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Stats {
    pub fn record(&mut self, difficulty: &str, at: DateTime<Utc>) {
        self.total += 1;
        match difficulty.trim().to_lowercase().as_str() {
            "easy" => self.easy += 1,
            "medium" => self.medium += 1,
            "hard" => self.hard += 1,
            _ => {}
        }
        self.last_updated = Some(at);
    }
}

/// One successful publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub title: String,
    pub difficulty: String,
    pub path: String,
    /// SHA-256 of the published document.
    pub content_digest: String,
    pub synced_at: DateTime<Utc>,
}

pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Distinct problems solved, keyed by the number in front of the title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolvedSummary {
    pub total: usize,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub config: Configuration,
    pub credentials: Option<Credentials>,
    pub stats: Stats,
    pub history: Vec<SyncRecord>,
}

impl AppState {
    pub fn is_authenticated(&self) -> bool {
        self.credentials
            .as_ref()
            .map(|c| !c.token.is_empty() && !c.username.is_empty())
            .unwrap_or(false)
    }

    pub fn record_publish(&mut self, record: SyncRecord) {
        self.stats.record(&record.difficulty, record.synced_at);
        self.history.push(record);
    }

    pub fn solved_summary(&self) -> SolvedSummary {
        let mut seen = HashSet::new();
        let mut summary = SolvedSummary::default();
        for entry in &self.history {
            let id = entry.title.split('.').next().unwrap_or("").trim().to_string();
            if !seen.insert(id) {
                continue;
            }
            match entry.difficulty.trim() {
                "Easy" => summary.easy += 1,
                "Medium" => summary.medium += 1,
                "Hard" => summary.hard += 1,
                _ => {}
            }
        }
        summary.total = seen.len();
        summary
    }
}

/// JSON-file backed [`AppState`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<AppState, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No state file yet, using defaults");
            return Ok(AppState::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| {
            error!(path = %self.path.display(), error = ?source, "Failed to read state file");
            StoreError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        serde_json::from_str(&content).map_err(|source| {
            error!(path = %self.path.display(), error = ?source, "Failed to parse state file");
            StoreError::Json {
                path: self.path.clone(),
                source,
            }
        })
    }

    pub fn save(&self, state: &AppState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let json = serde_json::to_string_pretty(state).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "Saved state");
        Ok(())
    }

    /// Load, apply `f`, save.
    pub fn update<F>(&self, f: F) -> Result<AppState, StoreError>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.load()?;
        f(&mut state);
        self.save(&state)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(title: &str, difficulty: &str) -> SyncRecord {
        SyncRecord {
            title: title.into(),
            difficulty: difficulty.into(),
            path: "solutions/x.md".into(),
            content_digest: content_digest(title),
            synced_at: Utc::now(),
        }
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested/state.json"));
        let state = store.load().unwrap();
        assert_eq!(state.config, Configuration::default());
        assert!(!state.is_authenticated());
        assert_eq!(state.stats.total, 0);
    }

    #[test]
    fn save_then_load_preserves_state() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested/state.json"));
        store
            .update(|s| {
                s.config.repo_name = "algos".into();
                s.credentials = Some(Credentials {
                    token: "t".into(),
                    username: "octocat".into(),
                });
            })
            .unwrap();

        let state = store.load().unwrap();
        assert_eq!(state.config.repo_name, "algos");
        assert!(state.is_authenticated());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let err = StateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"config": {"repo_name": "mine"}}"#).unwrap();
        let state = StateStore::new(&path).load().unwrap();
        assert_eq!(state.config.repo_name, "mine");
        assert_eq!(state.config.folder_path, "solutions/");
        assert!(state.config.auto_commit);
    }

    #[test]
    fn stats_count_by_difficulty() {
        let mut state = AppState::default();
        state.record_publish(entry("1. Two Sum", "Easy"));
        state.record_publish(entry("1. Two Sum", "Easy"));
        state.record_publish(entry("4. Median", "hard"));
        state.record_publish(entry("9. Whatever", "Unknown"));

        assert_eq!(state.stats.total, 4);
        assert_eq!(state.stats.easy, 2);
        assert_eq!(state.stats.hard, 1);
        assert_eq!(state.stats.medium, 0);
        assert!(state.stats.last_updated.is_some());

        let summary = state.solved_summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.easy, 1);
        // History keeps the label as scraped; only exact labels are bucketed.
        assert_eq!(summary.hard, 0);
    }

    #[test]
    fn digest_is_sha256_hex() {
        assert_eq!(
            content_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
