use thiserror::Error;

/// Everything that can stop a solution from reaching the repository.
///
/// Each variant maps to a distinct message shown to the user. Nothing here is
/// retried automatically.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("GitHub authentication required. Please set up your GitHub token with `leetsync auth`.")]
    MissingCredentials,

    #[error("Repository name not configured. Please set it with `leetsync config set repo-name <name>`.")]
    MissingRepoName,

    #[error("Invalid GitHub token format. Please check your token and try again.")]
    InvalidTokenFormat,

    #[error("Invalid solution data: {0}. Please ensure you have a valid accepted solution.")]
    InvalidSolution(String),

    #[error("Not found on GitHub: {0}")]
    NotFound(String),

    #[error("GitHub API error: {message}")]
    Remote { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to access local state: {0}")]
    Store(String),
}

impl PublishError {
    /// Builds a [`PublishError::Remote`], falling back to `HTTP <status>` when
    /// the API gave no message.
    pub fn remote(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {status}"));
        PublishError::Remote { status, message }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("Could not extract problem title")]
    MissingTitle,

    #[error("Could not extract solution code")]
    MissingCode,
}
