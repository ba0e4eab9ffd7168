use tracing::{error, info};

use crate::contract::{Credentials, RepoHost, UserProfile};
use crate::error::PublishError;
use crate::publish::is_valid_token;
use crate::store::StateStore;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub username: Option<String>,
}

/// Verifies `token` against the host and stores it with the resolved login,
/// replacing any earlier credentials.
pub async fn authenticate<H>(
    host: &H,
    store: &StateStore,
    token: &str,
) -> Result<Credentials, PublishError>
where
    H: RepoHost + ?Sized,
{
    let token = token.trim();
    if token.is_empty() {
        return Err(PublishError::MissingCredentials);
    }
    if !is_valid_token(token) {
        return Err(PublishError::InvalidTokenFormat);
    }

    let user = host.current_user(token).await.map_err(|e| {
        error!(error = ?e, "Authentication failed");
        e
    })?;

    let credentials = Credentials {
        token: token.to_string(),
        username: user.login,
    };
    let stored = credentials.clone();
    store.update(move |s| s.credentials = Some(stored))?;
    info!(username = %credentials.username, "Authentication successful");
    Ok(credentials)
}

pub fn check_auth(store: &StateStore) -> Result<AuthStatus, PublishError> {
    let state = store.load()?;
    Ok(AuthStatus {
        authenticated: state.is_authenticated(),
        username: state.credentials.map(|c| c.username).filter(|u| !u.is_empty()),
    })
}

/// Re-checks the stored token. A changed login is written back.
pub async fn test_connection<H>(host: &H, store: &StateStore) -> Result<UserProfile, PublishError>
where
    H: RepoHost + ?Sized,
{
    let state = store.load()?;
    let credentials = state
        .credentials
        .filter(|c| !c.token.is_empty())
        .ok_or(PublishError::MissingCredentials)?;

    let user = host.current_user(&credentials.token).await?;
    if user.login != credentials.username {
        info!(old = %credentials.username, new = %user.login, "Stored username changed");
        let login = user.login.clone();
        store.update(move |s| {
            if let Some(c) = s.credentials.as_mut() {
                c.username = login;
            }
        })?;
    }
    Ok(user)
}
