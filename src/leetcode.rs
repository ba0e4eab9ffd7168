//! LeetCode-facing adapters: the GraphQL difficulty lookup and the page
//! sources the watcher polls.

use std::path::PathBuf;

use async_trait::async_trait;
use leetsync_core::contract::{DifficultySource, PageSnapshot, PageSource, SourceError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://leetcode.com";

const QUESTION_DETAIL_QUERY: &str = "query getQuestionDetail($titleSlug: String!) {\n  question(titleSlug: $titleSlug) {\n    difficulty\n  }\n}";

#[derive(Serialize)]
struct GraphQLRequest<'a> {
    #[serde(rename = "operationName")]
    operation_name: &'a str,
    query: &'a str,
    variables: SlugVariables<'a>,
}

#[derive(Serialize)]
struct SlugVariables<'a> {
    #[serde(rename = "titleSlug")]
    title_slug: &'a str,
}

#[derive(Deserialize)]
struct GraphQLResponse {
    data: Option<QuestionData>,
}

#[derive(Deserialize)]
struct QuestionData {
    question: Option<Question>,
}

#[derive(Deserialize)]
struct Question {
    difficulty: Option<String>,
}

/// Difficulty lookups against `<base>/graphql`.
pub struct LeetCodeClient {
    client: reqwest::Client,
    graphql_url: String,
}

impl LeetCodeClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::github::USER_AGENT)
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        let graphql_url = format!("{}/graphql", base_url.trim_end_matches('/'));
        tracing::info!(graphql_url = %graphql_url, "Initialized LeetCodeClient");
        Ok(Self {
            client,
            graphql_url,
        })
    }
}

#[async_trait]
impl DifficultySource for LeetCodeClient {
    async fn fetch_difficulty(&self, slug: &str) -> Result<String, SourceError> {
        let body = GraphQLRequest {
            operation_name: "getQuestionDetail",
            query: QUESTION_DETAIL_QUERY,
            variables: SlugVariables { title_slug: slug },
        };
        let response = self
            .client
            .post(&self.graphql_url)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(format!("LeetCode GraphQL returned {}", response.status()).into());
        }
        let parsed: GraphQLResponse = response.json().await?;
        parsed
            .data
            .and_then(|d| d.question)
            .and_then(|q| q.difficulty)
            .ok_or_else(|| format!("no difficulty for {slug}").into())
    }
}

/// Re-reads a saved HTML file on every poll, reporting it under `url`.
pub struct FilePageSource {
    path: PathBuf,
    url: String,
}

impl FilePageSource {
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl PageSource for FilePageSource {
    async fn snapshot(&self) -> Result<PageSnapshot, SourceError> {
        let html = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            tracing::error!(error = ?e, path = %self.path.display(), "Failed to read page file");
            e
        })?;
        Ok(PageSnapshot {
            url: self.url.clone(),
            html,
        })
    }
}

/// Fetches the page over HTTP on every poll. The snapshot URL is the final
/// URL after redirects.
pub struct HttpPageSource {
    client: reqwest::Client,
    url: String,
    cookie: Option<String>,
}

impl HttpPageSource {
    pub fn new(url: impl Into<String>, cookie: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::github::USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            cookie,
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn snapshot(&self) -> Result<PageSnapshot, SourceError> {
        let mut request = self.client.get(&self.url);
        if let Some(cookie) = &self.cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(format!("GET {} returned {}", self.url, response.status()).into());
        }
        let url = response.url().to_string();
        let html = response.text().await?;
        Ok(PageSnapshot { url, html })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_body_matches_question_detail_shape() {
        let body = GraphQLRequest {
            operation_name: "getQuestionDetail",
            query: QUESTION_DETAIL_QUERY,
            variables: SlugVariables {
                title_slug: "two-sum",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["operationName"], "getQuestionDetail");
        assert_eq!(json["variables"]["titleSlug"], "two-sum");
        assert!(json["query"].as_str().unwrap().contains("difficulty"));
    }

    #[test]
    fn missing_question_has_no_difficulty() {
        let parsed: GraphQLResponse =
            serde_json::from_str(r#"{"data": {"question": null}}"#).unwrap();
        assert!(parsed.data.and_then(|d| d.question).is_none());
    }

    #[tokio::test]
    async fn file_source_reads_on_every_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>first</p>").unwrap();
        let source = FilePageSource::new(&path, "https://leetcode.com/problems/x/submissions/1/");

        assert_eq!(source.snapshot().await.unwrap().html, "<p>first</p>");
        std::fs::write(&path, "<p>second</p>").unwrap();
        let snap = source.snapshot().await.unwrap();
        assert_eq!(snap.html, "<p>second</p>");
        assert_eq!(snap.url, "https://leetcode.com/problems/x/submissions/1/");
    }

    #[tokio::test]
    async fn file_source_missing_file_is_an_error() {
        let source = FilePageSource::new("/nonexistent/page.html", "u");
        assert!(source.snapshot().await.is_err());
    }
}
