#![allow(unused)]

//! # contract: shared data model and the seams to the outside world
//!
//! This module defines the plain data types that flow through the pipeline
//! (a [`SolutionRecord`] scraped from a page, the user's [`Configuration`]
//! and [`Credentials`]) and the three async traits the core talks through:
//!
//! - [`RepoHost`]: the remote repository service (GitHub REST API in the CLI crate)
//! - [`DifficultySource`]: looks up a problem's difficulty by slug (LeetCode GraphQL)
//! - [`PageSource`]: produces snapshots of the submission page to observe
//!
//! All three are annotated for `mockall` so tests can drive the pipeline
//! deterministically without a network.

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use serde::{Deserialize, Serialize};

use crate::error::PublishError;

/// Boxed error used by the page and difficulty sources.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Everything scraped from an accepted submission. Ephemeral: built per
/// detection and dropped after publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub problem_title: String,
    pub difficulty: String,
    pub code: String,
    pub language: String,
    pub runtime: String,
    pub memory: String,
    /// Page URL the record was scraped from.
    pub url: String,
    pub complexity: Option<Complexity>,
}

/// A complexity summary and where it came from. A `source` of `"fallback"`
/// marks a locally estimated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complexity {
    pub result: String,
    pub source: Option<String>,
}

/// User-editable publishing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub repo_name: String,
    /// Prefix joined verbatim in front of the file name, e.g. `solutions/`.
    pub folder_path: String,
    pub auto_commit: bool,
    pub include_constraints: bool,
    pub include_complexity: bool,
    pub private_repo: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            repo_name: "leetcode-solutions".to_string(),
            folder_path: "solutions/".to_string(),
            auto_commit: true,
            include_constraints: true,
            include_complexity: true,
            private_repo: false,
        }
    }
}

/// Access token and the login it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub username: String,
}

/// Authenticated user as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub login: String,
    pub avatar_url: Option<String>,
}

/// Request body for creating a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRepository {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub auto_init: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryInfo {
    pub full_name: String,
    pub html_url: Option<String>,
    pub private: bool,
}

/// An existing file; `sha` is the revision token required to update it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub path: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

/// A create-or-update of a single file.
#[derive(Debug, Clone, PartialEq)]
pub struct PutFile {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub message: String,
    /// Base64 of the UTF-8 document.
    pub content: String,
    /// Present on update, absent on create.
    pub sha: Option<String>,
    pub committer: Committer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutFileResult {
    pub path: String,
    pub sha: String,
    pub html_url: String,
}

/// Remote repository service, authenticated with a bearer token per call.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Resolve the user owning `token`.
    async fn current_user(&self, token: &str) -> Result<UserProfile, PublishError>;

    /// `Ok(None)` when the repository does not exist.
    async fn get_repository(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Option<RepositoryInfo>, PublishError>;

    async fn create_repository(
        &self,
        token: &str,
        req: NewRepository,
    ) -> Result<RepositoryInfo, PublishError>;

    /// `Ok(None)` when no file exists at `path`.
    async fn get_file(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<RemoteFile>, PublishError>;

    async fn put_file(&self, token: &str, req: PutFile) -> Result<PutFileResult, PublishError>;
}

/// Looks up a problem's difficulty label ("Easy", "Medium", "Hard").
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DifficultySource: Send + Sync {
    async fn fetch_difficulty(&self, slug: &str) -> Result<String, SourceError>;
}

/// Raw page state at one instant: where the page is and what it renders.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

/// Produces fresh snapshots of the page being observed.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn snapshot(&self) -> Result<PageSnapshot, SourceError>;
}
