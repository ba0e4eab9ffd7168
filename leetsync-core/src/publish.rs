//! Publishing pipeline: validate → ensure repository → upsert file → record stats.
//!
//! The remote side is reached only through [`RepoHost`], so the whole flow can
//! be exercised against a mock.
//!
//! # Idempotency
//! - The repository is checked before it is created; an existing repository is
//!   left untouched.
//! - The target file is looked up by path first. When it exists its `sha` is
//!   sent with the PUT (an update); otherwise the PUT carries no `sha` (a
//!   create). Re-publishing the same solution therefore updates one file
//!   instead of conflicting.
//!
//! # Error Handling
//! Every failure maps to one [`PublishError`] variant. Nothing is retried; the
//! only wait is the settle delay after creating a repository, because the
//! host finishes repository creation asynchronously.

use std::sync::OnceLock;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use regex::Regex;
use tracing::{error, info, warn};

use crate::contract::{
    Committer, Configuration, Credentials, NewRepository, PutFile, PutFileResult, RepoHost,
    SolutionRecord,
};
use crate::error::PublishError;
use crate::format;
use crate::store::{content_digest, StateStore, SyncRecord};

/// Wait after creating a repository before the first write.
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

pub const COMMITTER_NAME: &str = "leetsync";
pub const COMMITTER_EMAIL: &str = "leetsync@users.noreply.github.com";

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(ghp_|gho_|ghu_|ghs_)[a-zA-Z0-9]{36,}$").expect("static regex"))
}

/// Prefixed GitHub tokens, or anything at least 40 characters long (classic tokens).
pub fn is_valid_token(token: &str) -> bool {
    token_re().is_match(token) || token.len() >= 40
}

pub fn committer() -> Committer {
    Committer {
        name: COMMITTER_NAME.to_string(),
        email: COMMITTER_EMAIL.to_string(),
    }
}

/// Base64 of the UTF-8 bytes, as the contents API expects.
pub fn encode_content(content: &str) -> String {
    STANDARD.encode(content.as_bytes())
}

#[derive(Debug, Clone, Copy)]
pub struct PublishOptions {
    pub settle_delay: Duration,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            settle_delay: SETTLE_DELAY,
        }
    }
}

/// What a successful publish produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    pub url: String,
    pub file_name: String,
    pub path: String,
    /// False when an existing file was updated.
    pub created: bool,
    pub content_digest: String,
}

/// Checks the record and settings before any network call.
pub fn validate<'a>(
    record: &SolutionRecord,
    config: &Configuration,
    credentials: Option<&'a Credentials>,
) -> Result<&'a Credentials, PublishError> {
    if record.problem_title.trim().is_empty() {
        return Err(PublishError::InvalidSolution("missing problem title".into()));
    }
    if record.code.trim().is_empty() {
        return Err(PublishError::InvalidSolution("missing solution code".into()));
    }
    let credentials = credentials
        .filter(|c| !c.token.is_empty() && !c.username.is_empty())
        .ok_or(PublishError::MissingCredentials)?;
    if config.repo_name.trim().is_empty() {
        return Err(PublishError::MissingRepoName);
    }
    if !is_valid_token(&credentials.token) {
        return Err(PublishError::InvalidTokenFormat);
    }
    Ok(credentials)
}

/// Makes sure `owner/repo` exists. Returns true when it had to be created.
pub async fn ensure_repository<H>(
    host: &H,
    credentials: &Credentials,
    config: &Configuration,
    settle_delay: Duration,
) -> Result<bool, PublishError>
where
    H: RepoHost + ?Sized,
{
    let owner = &credentials.username;
    let repo = &config.repo_name;

    if host
        .get_repository(&credentials.token, owner, repo)
        .await?
        .is_some()
    {
        info!(owner = %owner, repo = %repo, "[PUBLISH] Repository exists");
        return Ok(false);
    }

    info!(owner = %owner, repo = %repo, private = config.private_repo, "[PUBLISH] Creating repository");
    let created = host
        .create_repository(
            &credentials.token,
            NewRepository {
                name: repo.clone(),
                description: format::REPOSITORY_DESCRIPTION.to_string(),
                private: config.private_repo,
                auto_init: true,
            },
        )
        .await
        .map_err(|e| {
            error!(error = ?e, repo = %repo, "[PUBLISH][ERROR] Failed to create repository");
            e
        })?;
    info!(full_name = %created.full_name, "[PUBLISH] Repository created");

    tokio::time::sleep(settle_delay).await;

    // The README is cosmetic; failing to write it must not block the solution.
    let readme = PutFile {
        owner: owner.clone(),
        repo: repo.clone(),
        path: "README.md".to_string(),
        message: format::README_COMMIT_MESSAGE.to_string(),
        content: encode_content(&format::initial_readme()),
        sha: None,
        committer: committer(),
    };
    if let Err(e) = host.put_file(&credentials.token, readme).await {
        warn!(error = ?e, repo = %repo, "[PUBLISH] Failed to create README, continuing");
    }

    Ok(true)
}

/// Create-or-update of `path`, keyed by the file's current `sha`.
pub async fn upsert_file<H>(
    host: &H,
    credentials: &Credentials,
    repo: &str,
    path: &str,
    content: &str,
    problem_title: &str,
) -> Result<(PutFileResult, bool), PublishError>
where
    H: RepoHost + ?Sized,
{
    let owner = &credentials.username;
    let existing = host
        .get_file(&credentials.token, owner, repo, path)
        .await?;
    let sha = existing.map(|f| f.sha);
    let is_update = sha.is_some();

    let req = PutFile {
        owner: owner.clone(),
        repo: repo.to_string(),
        path: path.to_string(),
        message: format::commit_message(problem_title, is_update),
        content: encode_content(content),
        sha,
        committer: committer(),
    };

    let result = host.put_file(&credentials.token, req).await.map_err(|e| {
        error!(error = ?e, path, "[PUBLISH][ERROR] Failed to write file");
        e
    })?;
    info!(
        path,
        action = if is_update { "updated" } else { "created" },
        "[PUBLISH] File written"
    );
    Ok((result, !is_update))
}

/// Renders and publishes one solution. Does not touch local state.
pub async fn publish_solution<H>(
    host: &H,
    record: &SolutionRecord,
    config: &Configuration,
    credentials: Option<&Credentials>,
    options: PublishOptions,
) -> Result<PublishReceipt, PublishError>
where
    H: RepoHost + ?Sized,
{
    let credentials = validate(record, config, credentials)?;

    let markdown = format::render_markdown(record, config);
    let file_name = format::file_name(&record.problem_title, &record.language);
    let path = format::file_path(config, &file_name);
    info!(title = %record.problem_title, path = %path, "[PUBLISH] Publishing solution");

    ensure_repository(host, credentials, config, options.settle_delay).await?;
    let (result, created) = upsert_file(
        host,
        credentials,
        &config.repo_name,
        &path,
        &markdown,
        &record.problem_title,
    )
    .await?;

    Ok(PublishReceipt {
        url: result.html_url,
        file_name,
        path,
        created,
        content_digest: content_digest(&markdown),
    })
}

/// Publishes with the stored settings and records the result in the store.
///
/// A failure to persist the stats afterwards is logged only; the solution is
/// already on the remote at that point.
pub async fn push_solution<H>(
    host: &H,
    store: &StateStore,
    record: &SolutionRecord,
    options: PublishOptions,
) -> Result<PublishReceipt, PublishError>
where
    H: RepoHost + ?Sized,
{
    let state = store.load()?;
    let receipt = publish_solution(
        host,
        record,
        &state.config,
        state.credentials.as_ref(),
        options,
    )
    .await?;

    let entry = SyncRecord {
        title: record.problem_title.clone(),
        difficulty: record.difficulty.clone(),
        path: receipt.path.clone(),
        content_digest: receipt.content_digest.clone(),
        synced_at: Utc::now(),
    };
    if let Err(e) = store.update(|s| s.record_publish(entry)) {
        warn!(error = %e, "[PUBLISH] Failed to update statistics");
    }

    info!(url = %receipt.url, file = %receipt.file_name, "[PUBLISH] Solution pushed successfully");
    Ok(receipt)
}
