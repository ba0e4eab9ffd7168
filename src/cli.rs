//! # leetsync CLI
//!
//! Command parsing and orchestration only. Detection, extraction,
//! formatting and publishing live in `leetsync-core`; this module wires the
//! concrete clients ([`GitHubClient`], [`LeetCodeClient`], the page sources)
//! into it and prints results.
//!
//! For programmatic and integration use, call [`run`] with a parsed [`Cli`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use leetsync_core::auth::{authenticate, check_auth, test_connection};
use leetsync_core::contract::{Configuration, PageSource};
use leetsync_core::detect::{Page, PushOffer};
use leetsync_core::extract::extract_solution;
use leetsync_core::format::render_markdown;
use leetsync_core::publish::{push_solution, PublishOptions};
use leetsync_core::store::StateStore;
use leetsync_core::watch::{WatchEvent, WatchOptions, Watcher};

use crate::github::GitHubClient;
use crate::leetcode::{FilePageSource, HttpPageSource, LeetCodeClient};
use crate::load_config::{load_config, CliConfig, TOKEN_ENV};

/// CLI for leetsync: publish accepted LeetCode solutions to GitHub.
#[derive(Parser)]
#[clap(
    name = "leetsync",
    version,
    about = "Detect accepted LeetCode submissions and publish them to a GitHub repository as Markdown"
)]
pub struct Cli {
    /// Path to an optional YAML config file (endpoints, state location, poll interval)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the JSON state file; overrides the config file and LEETSYNC_STATE
    #[clap(long, global = true)]
    pub state: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify a GitHub token and store it
    Auth {
        /// Token to store; defaults to GITHUB_TOKEN from the environment
        #[clap(long)]
        token: Option<String>,
    },
    /// Show authentication state and target repository
    Status,
    /// Re-check the stored token against GitHub
    TestConnection,
    /// Show or change publishing settings
    Config {
        #[clap(subcommand)]
        action: ConfigAction,
    },
    /// Show publish counters
    Stats,
    /// Extract the solution from a submission page and publish it once
    Push {
        #[clap(flatten)]
        page: PageArgs,
        /// Print the Markdown instead of publishing
        #[clap(long)]
        dry_run: bool,
    },
    /// Poll a submission page and handle each new accepted submission
    Watch {
        #[clap(flatten)]
        page: PageArgs,
        /// Seconds between polls; defaults to the config file or 3
        #[clap(long)]
        interval: Option<u64>,
        /// Stop after this many polls
        #[clap(long)]
        max_polls: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current settings as YAML
    Show,
    /// Set one setting, e.g. `repo-name my-solutions` or `private-repo true`
    Set { key: String, value: String },
}

#[derive(Args)]
pub struct PageArgs {
    /// Submission page URL; fetched over HTTP unless --html is given
    #[clap(long)]
    pub url: String,
    /// Saved HTML of the page, re-read on every poll
    #[clap(long)]
    pub html: Option<PathBuf>,
}

/// Setting names accepted by `config set`.
pub const SETTING_KEYS: &[&str] = &[
    "repo-name",
    "folder-path",
    "auto-commit",
    "include-constraints",
    "include-complexity",
    "private-repo",
];

/// Applies one `config set` to `config`.
pub fn apply_setting(config: &mut Configuration, key: &str, value: &str) -> Result<()> {
    let flag = || -> Result<bool> {
        value
            .trim()
            .parse::<bool>()
            .with_context(|| format!("{key} expects true or false, got {value:?}"))
    };
    match key.replace('_', "-").as_str() {
        "repo-name" => {
            let name = value.trim();
            if name.is_empty() {
                anyhow::bail!("repo-name cannot be empty");
            }
            config.repo_name = name.to_string();
        }
        "folder-path" => config.folder_path = value.trim().to_string(),
        "auto-commit" => config.auto_commit = flag()?,
        "include-constraints" => config.include_constraints = flag()?,
        "include-complexity" => config.include_complexity = flag()?,
        "private-repo" => config.private_repo = flag()?,
        other => anyhow::bail!(
            "Unknown setting {other:?}; expected one of: {}",
            SETTING_KEYS.join(", ")
        ),
    }
    Ok(())
}

fn page_source(page: &PageArgs, config: &CliConfig) -> Result<Box<dyn PageSource>> {
    Ok(match &page.html {
        Some(path) => Box::new(FilePageSource::new(path, page.url.clone())),
        None => Box::new(HttpPageSource::new(
            page.url.clone(),
            config.leetcode_cookie.clone(),
        )?),
    })
}

fn print_event(event: &WatchEvent) {
    match event {
        WatchEvent::Offered { offer, record, .. } => {
            println!("Accepted: {} ({})", record.problem_title, record.difficulty);
            println!("  {}", offer.hint);
            println!("  Run `leetsync push` to publish, or enable auto-commit.");
        }
        WatchEvent::Published { receipt, .. } => {
            let action = if receipt.created { "Added" } else { "Updated" };
            println!("{action} {} -> {}", receipt.file_name, receipt.url);
        }
        WatchEvent::ExtractionFailed { reason, .. } => {
            eprintln!("Could not extract solution: {reason}");
        }
        WatchEvent::PublishFailed { reason, .. } => {
            eprintln!("Failed to push solution: {reason}");
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.state)?;
    let store = StateStore::new(&config.state_path);
    tracing::info!(state_path = %store.path().display(), "Using state file");

    match cli.command {
        Commands::Auth { token } => {
            let token = token
                .or_else(|| config.github_token.clone())
                .with_context(|| format!("No token given; pass --token or set {TOKEN_ENV}"))?;
            let github = GitHubClient::new(&config.github_api_url)?;
            let credentials = authenticate(&github, &store, &token).await?;
            println!("Authenticated as {}", credentials.username);
        }
        Commands::Status => {
            let status = check_auth(&store)?;
            let state = store.load()?;
            match status.username.filter(|_| status.authenticated) {
                Some(user) => {
                    println!("Authenticated: yes ({user})");
                    println!("Repository:    {user}/{}", state.config.repo_name);
                }
                None => {
                    println!("Authenticated: no");
                    println!("Repository:    {}", state.config.repo_name);
                }
            }
            println!("Auto-commit:   {}", state.config.auto_commit);
            println!("State file:    {}", store.path().display());
        }
        Commands::TestConnection => {
            let github = GitHubClient::new(&config.github_api_url)?;
            let user = test_connection(&github, &store).await?;
            println!("Connection OK: {}", user.login);
            if let Some(avatar) = user.avatar_url {
                println!("Avatar: {avatar}");
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let state = store.load()?;
                print!("{}", serde_yaml::to_string(&state.config)?);
            }
            ConfigAction::Set { key, value } => {
                let mut state = store.load()?;
                apply_setting(&mut state.config, &key, &value)?;
                store.save(&state)?;
                tracing::info!(key = %key, value = %value, "Setting updated");
                println!("Set {key} = {value}");
            }
        },
        Commands::Stats => {
            let state = store.load()?;
            let stats = &state.stats;
            let solved = state.solved_summary();
            println!("Pushed:   {} (easy {}, medium {}, hard {})", stats.total, stats.easy, stats.medium, stats.hard);
            println!("Problems: {} (easy {}, medium {}, hard {})", solved.total, solved.easy, solved.medium, solved.hard);
            match stats.last_updated {
                Some(at) => println!("Last push: {}", at.to_rfc3339()),
                None => println!("Last push: never"),
            }
        }
        Commands::Push { page, dry_run } => {
            let pages = page_source(&page, &config)?;
            let snapshot = pages
                .snapshot()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read page: {e}"))?;
            let offer = {
                let page = Page::parse(&snapshot);
                PushOffer::for_page(&page)
            };
            if !offer.enabled {
                anyhow::bail!(offer.hint);
            }

            let leetcode = LeetCodeClient::new(&config.leetcode_base_url)?;
            let record = extract_solution(&snapshot, &leetcode).await?;
            if dry_run {
                let state = store.load()?;
                print!("{}", render_markdown(&record, &state.config));
                return Ok(());
            }

            let github = GitHubClient::new(&config.github_api_url)?;
            let receipt = push_solution(&github, &store, &record, PublishOptions::default())
                .await
                .map_err(|e| {
                    tracing::error!(command = "push", error = %e, "Push failed");
                    e
                })?;
            let action = if receipt.created { "Added" } else { "Updated" };
            println!("{action} {} -> {}", receipt.file_name, receipt.url);
        }
        Commands::Watch {
            page,
            interval,
            max_polls,
        } => {
            let pages = page_source(&page, &config)?;
            let leetcode = LeetCodeClient::new(&config.leetcode_base_url)?;
            let github = GitHubClient::new(&config.github_api_url)?;
            let options = WatchOptions {
                interval: interval
                    .filter(|s| *s > 0)
                    .map(std::time::Duration::from_secs)
                    .unwrap_or(config.poll_interval),
                max_polls,
                publish: PublishOptions::default(),
            };
            let mut watcher = Watcher::new(&*pages, &leetcode, &github, &store, options);
            println!("Watching {} (Ctrl-C to stop)", page.url);
            tokio::select! {
                report = watcher.run(print_event) => {
                    tracing::info!(command = "watch", polls = report.polls, events = report.events.len(), "Watch finished");
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!(command = "watch", "Interrupted");
                }
            }
        }
    }

    Ok(())
}
