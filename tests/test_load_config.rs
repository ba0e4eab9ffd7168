use std::env;
use std::fs::write;
use std::path::PathBuf;
use std::time::Duration;

use leetsync::load_config::{load_config, COOKIE_ENV, STATE_ENV, TOKEN_ENV};
use serial_test::serial;
use tempfile::NamedTempFile;

fn clear_env() {
    env::remove_var(STATE_ENV);
    env::remove_var(TOKEN_ENV);
    env::remove_var(COOKIE_ENV);
}

fn yaml(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), content).unwrap();
    file
}

/// A static config file plus env secrets merge into one CliConfig.
#[test]
#[serial]
fn load_config_merges_file_and_env() {
    clear_env();
    let file = yaml(
        r#"
state_path: /tmp/leetsync-test/state.json
github:
  api_url: http://localhost:9999
leetcode:
  base_url: http://localhost:9998
watch:
  interval_secs: 7
"#,
    );
    env::set_var(TOKEN_ENV, "ghp_from_env");

    let config = load_config(Some(file.path()), None).expect("config should load");
    assert_eq!(config.state_path, PathBuf::from("/tmp/leetsync-test/state.json"));
    assert_eq!(config.github_api_url, "http://localhost:9999");
    assert_eq!(config.leetcode_base_url, "http://localhost:9998");
    assert_eq!(config.poll_interval, Duration::from_secs(7));
    assert_eq!(config.github_token.as_deref(), Some("ghp_from_env"));
    assert_eq!(config.leetcode_cookie, None);
    clear_env();
}

#[test]
#[serial]
fn state_env_wins_over_file() {
    clear_env();
    let file = yaml("state_path: /from/file.json\n");
    env::set_var(STATE_ENV, "/from/env.json");

    let config = load_config(Some(file.path()), None).unwrap();
    assert_eq!(config.state_path, PathBuf::from("/from/env.json"));
    clear_env();
}

#[test]
#[serial]
fn no_file_means_public_endpoints() {
    clear_env();
    env::set_var(STATE_ENV, "/tmp/leetsync-defaults.json");
    let config = load_config(None, None).unwrap();
    assert_eq!(config.github_api_url, "https://api.github.com");
    assert_eq!(config.leetcode_base_url, "https://leetcode.com");
    assert_eq!(config.poll_interval, Duration::from_secs(3));
    assert!(config.github_token.is_none());

    let empty = yaml("");
    let config = load_config(Some(empty.path()), None).unwrap();
    assert_eq!(config.github_api_url, "https://api.github.com");
    clear_env();
}

#[test]
#[serial]
fn blank_token_counts_as_missing() {
    clear_env();
    env::set_var(STATE_ENV, "/tmp/x.json");
    env::set_var(TOKEN_ENV, "   ");
    assert!(load_config(None, None).unwrap().github_token.is_none());
    clear_env();
}

#[test]
#[serial]
fn invalid_yaml_is_reported() {
    clear_env();
    let file = yaml("github: [unclosed\n");
    let err = load_config(Some(file.path()), None).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"), "got: {err}");
}

#[test]
#[serial]
fn unknown_keys_are_rejected() {
    clear_env();
    let file = yaml("gihtub:\n  api_url: http://x\n");
    assert!(load_config(Some(file.path()), None).is_err());
}

#[test]
#[serial]
fn zero_interval_is_rejected() {
    clear_env();
    env::set_var(STATE_ENV, "/tmp/x.json");
    let file = yaml("watch:\n  interval_secs: 0\n");
    let err = load_config(Some(file.path()), None).unwrap_err();
    assert!(err.to_string().contains("interval_secs"));
    clear_env();
}

#[test]
#[serial]
fn missing_file_is_reported() {
    clear_env();
    let err = load_config(Some(std::path::Path::new("/nonexistent/leetsync.yaml")), None).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
#[serial]
fn state_flag_wins_over_env() {
    clear_env();
    env::set_var(STATE_ENV, "/from/env.json");
    let config = load_config(None, Some(PathBuf::from("/from/flag.json"))).unwrap();
    assert_eq!(config.state_path, PathBuf::from("/from/flag.json"));
    clear_env();
}
