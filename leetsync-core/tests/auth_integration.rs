use leetsync_core::auth::{authenticate, check_auth, test_connection};
use leetsync_core::contract::{Credentials, MockRepoHost, UserProfile};
use leetsync_core::store::StateStore;
use leetsync_core::PublishError;
use tempfile::tempdir;

fn token() -> String {
    format!("ghp_{}", "Q7".repeat(18))
}

fn profile(login: &str) -> UserProfile {
    UserProfile {
        login: login.to_string(),
        avatar_url: None,
    }
}

#[tokio::test]
async fn authenticate_stores_token_and_login() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let mut host = MockRepoHost::new();
    host.expect_current_user()
        .times(1)
        .returning(|_| Ok(profile("octocat")));

    let creds = authenticate(&host, &store, &format!("  {}\n", token()))
        .await
        .expect("auth should succeed");
    assert_eq!(creds.username, "octocat");
    assert_eq!(creds.token, token());

    let status = check_auth(&store).unwrap();
    assert!(status.authenticated);
    assert_eq!(status.username.as_deref(), Some("octocat"));
}

#[tokio::test]
async fn authenticate_rejects_bad_tokens_offline() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let mut host = MockRepoHost::new();
    host.expect_current_user().never();

    let err = authenticate(&host, &store, "   ").await.unwrap_err();
    assert!(matches!(err, PublishError::MissingCredentials));

    let err = authenticate(&host, &store, "ghp_tooshort").await.unwrap_err();
    assert!(matches!(err, PublishError::InvalidTokenFormat));

    assert!(!check_auth(&store).unwrap().authenticated);
}

#[tokio::test]
async fn rejected_token_is_not_stored() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let mut host = MockRepoHost::new();
    host.expect_current_user()
        .returning(|_| Err(PublishError::remote(401, Some("Bad credentials".into()))));

    let err = authenticate(&host, &store, &token()).await.unwrap_err();
    assert_eq!(err.to_string(), "GitHub API error: Bad credentials");
    assert!(store.load().unwrap().credentials.is_none());
}

#[tokio::test]
async fn test_connection_requires_stored_token() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let host = MockRepoHost::new();

    let err = test_connection(&host, &store).await.unwrap_err();
    assert!(matches!(err, PublishError::MissingCredentials));
}

#[tokio::test]
async fn test_connection_refreshes_renamed_login() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    store
        .update(|s| {
            s.credentials = Some(Credentials {
                token: token(),
                username: "old-name".into(),
            })
        })
        .unwrap();

    let mut host = MockRepoHost::new();
    host.expect_current_user()
        .times(1)
        .returning(|_| Ok(profile("new-name")));

    let user = test_connection(&host, &store).await.unwrap();
    assert_eq!(user.login, "new-name");
    assert_eq!(
        check_auth(&store).unwrap().username.as_deref(),
        Some("new-name")
    );
}
