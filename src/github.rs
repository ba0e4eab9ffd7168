//! # GitHub REST client
//!
//! [`GitHubClient`] implements [`RepoHost`] over `reqwest` against the v3
//! REST API (`/user`, `/repos/{owner}/{repo}`, `/user/repos` and the
//! contents endpoint). It only translates: status codes and JSON bodies
//! become core types and [`PublishError`] variants. Ordering, validation
//! and idempotency live in `leetsync_core::publish`.
//!
//! - 404 on a lookup (repository or file) is `Ok(None)`.
//! - Any other non-2xx becomes [`PublishError::Remote`] carrying the API's
//!   `message` field, or `HTTP <status>` when the body has none.
//! - Transport failures become [`PublishError::Network`].

use async_trait::async_trait;
use leetsync_core::contract::{
    NewRepository, PutFile, PutFileResult, RemoteFile, RepoHost, RepositoryInfo, UserProfile,
};
use leetsync_core::PublishError;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const USER_AGENT: &str = concat!("leetsync/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github.v3+json";

pub struct GitHubClient {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct ApiMessage {
    message: Option<String>,
}

#[derive(Deserialize)]
struct UserJson {
    login: String,
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct RepoJson {
    full_name: String,
    html_url: Option<String>,
    #[serde(default)]
    private: bool,
}

#[derive(Serialize)]
struct CreateRepoBody<'a> {
    name: &'a str,
    description: &'a str,
    private: bool,
    auto_init: bool,
}

#[derive(Deserialize)]
struct ContentJson {
    path: String,
    sha: String,
    html_url: Option<String>,
}

#[derive(Serialize)]
struct CommitterBody<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    committer: CommitterBody<'a>,
}

#[derive(Deserialize)]
struct PutResponse {
    content: ContentJson,
}

impl GitHubClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid GitHub API URL {base_url:?}: {e}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("GitHub API URL {base_url} cannot be used as a base");
        }
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        tracing::info!(base_url = %base_url, "Initialized GitHubClient");
        Ok(Self { client, base_url })
    }

    /// Joins `segments` onto the base URL, percent-encoding each one.
    /// A segment holding `/` (a file path) is split first.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        url
    }

    fn request(&self, method: Method, token: &str, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, ACCEPT)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, PublishError> {
        builder.send().await.map_err(|e| {
            tracing::error!(error = ?e, "GitHub request failed to send");
            PublishError::Network(e.to_string())
        })
    }
}

async fn remote_error(response: Response) -> PublishError {
    let status = response.status().as_u16();
    let message = response
        .json::<ApiMessage>()
        .await
        .ok()
        .and_then(|m| m.message);
    tracing::error!(status, message = ?message, "GitHub API returned an error");
    PublishError::remote(status, message)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, PublishError> {
    let status = response.status().as_u16();
    response.json::<T>().await.map_err(|e| {
        tracing::error!(error = ?e, status, "Failed to decode GitHub response");
        PublishError::remote(status, Some(format!("unexpected response body: {e}")))
    })
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn current_user(&self, token: &str) -> Result<UserProfile, PublishError> {
        let url = self.endpoint(&["user"]);
        let response = self.send(self.request(Method::GET, token, url)).await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        let user: UserJson = decode(response).await?;
        tracing::info!(login = %user.login, "Resolved GitHub user");
        Ok(UserProfile {
            login: user.login,
            avatar_url: user.avatar_url,
        })
    }

    async fn get_repository(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Option<RepositoryInfo>, PublishError> {
        let url = self.endpoint(&["repos", owner, repo]);
        let response = self.send(self.request(Method::GET, token, url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let repo: RepoJson = decode(response).await?;
                Ok(Some(RepositoryInfo {
                    full_name: repo.full_name,
                    html_url: repo.html_url,
                    private: repo.private,
                }))
            }
            _ => Err(remote_error(response).await),
        }
    }

    async fn create_repository(
        &self,
        token: &str,
        req: NewRepository,
    ) -> Result<RepositoryInfo, PublishError> {
        let url = self.endpoint(&["user", "repos"]);
        let body = CreateRepoBody {
            name: &req.name,
            description: &req.description,
            private: req.private,
            auto_init: req.auto_init,
        };
        let response = self
            .send(self.request(Method::POST, token, url).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        let repo: RepoJson = decode(response).await?;
        Ok(RepositoryInfo {
            full_name: repo.full_name,
            html_url: repo.html_url,
            private: repo.private,
        })
    }

    async fn get_file(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<RemoteFile>, PublishError> {
        let url = self.endpoint(&["repos", owner, repo, "contents", path]);
        let response = self.send(self.request(Method::GET, token, url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let file: ContentJson = decode(response).await?;
                Ok(Some(RemoteFile {
                    path: file.path,
                    sha: file.sha,
                }))
            }
            _ => Err(remote_error(response).await),
        }
    }

    async fn put_file(&self, token: &str, req: PutFile) -> Result<PutFileResult, PublishError> {
        let url = self.endpoint(&["repos", &req.owner, &req.repo, "contents", &req.path]);
        let body = PutBody {
            message: &req.message,
            content: &req.content,
            sha: req.sha.as_deref(),
            committer: CommitterBody {
                name: &req.committer.name,
                email: &req.committer.email,
            },
        };
        let response = self
            .send(self.request(Method::PUT, token, url).json(&body))
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(PublishError::NotFound(format!(
                "{}/{}/{}",
                req.owner, req.repo, req.path
            ))),
            s if s.is_success() => {
                let written: PutResponse = decode(response).await?;
                let html_url = written.content.html_url.unwrap_or_else(|| {
                    format!(
                        "https://github.com/{}/{}/blob/main/{}",
                        req.owner, req.repo, written.content.path
                    )
                });
                Ok(PutFileResult {
                    path: written.content.path,
                    sha: written.content.sha,
                    html_url,
                })
            }
            _ => Err(remote_error(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use leetsync_core::contract::Committer;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use super::*;

    #[test]
    fn endpoint_encodes_each_path_segment() {
        let client = GitHubClient::new("https://api.github.com").unwrap();
        let url = client.endpoint(&["repos", "octocat", "algos", "contents", "solutions/c#_notes.md"]);
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/octocat/algos/contents/solutions/c%23_notes.md"
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = GitHubClient::new("http://localhost:8080/api/v3/").unwrap();
        let url = client.endpoint(&["user"]);
        assert_eq!(url.as_str(), "http://localhost:8080/api/v3/user");
    }

    #[test]
    fn put_body_omits_sha_on_create() {
        let body = PutBody {
            message: "m",
            content: "Yw==",
            sha: None,
            committer: CommitterBody {
                name: "leetsync",
                email: "e",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());
        assert_eq!(json["committer"]["name"], "leetsync");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(GitHubClient::new("not a url").is_err());
    }

    /// A request as it arrived on the wire.
    struct Recorded {
        head: String,
        body: String,
    }

    /// Serves `responses` in order, one connection each, and hands back
    /// what the client sent.
    async fn canned_server(
        responses: Vec<(u16, &'static str)>,
    ) -> (GitHubClient, JoinHandle<Vec<Recorded>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                seen.push(read_request(&mut stream).await);
                let reply = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(reply.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            seen
        });
        let client = GitHubClient::new(&format!("http://{addr}")).unwrap();
        (client, handle)
    }

    async fn read_request(stream: &mut TcpStream) -> Recorded {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);
        while buf.len() < head_end + length {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed mid-body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[head_end..head_end + length]).to_string();
        Recorded { head, body }
    }

    fn put_request(sha: Option<&str>) -> PutFile {
        PutFile {
            owner: "octocat".into(),
            repo: "algos".into(),
            path: "1-two-sum.md".into(),
            message: "Add solution: Two Sum (Easy)".into(),
            content: "Yw==".into(),
            sha: sha.map(str::to_string),
            committer: Committer {
                name: "leetsync".into(),
                email: "leetsync@users.noreply.github.com".into(),
            },
        }
    }

    const PUT_OK: &str = r#"{"content":{"path":"1-two-sum.md","sha":"new1","html_url":"https://github.com/octocat/algos/blob/main/1-two-sum.md"}}"#;

    #[tokio::test]
    async fn lookups_treat_404_as_absent() {
        let (client, server) = canned_server(vec![
            (404, r#"{"message":"Not Found"}"#),
            (404, r#"{"message":"Not Found"}"#),
        ])
        .await;

        let repo = client.get_repository("tok", "octocat", "algos").await.unwrap();
        assert!(repo.is_none());
        let file = client
            .get_file("tok", "octocat", "algos", "1-two-sum.md")
            .await
            .unwrap();
        assert!(file.is_none());

        let seen = server.await.unwrap();
        assert!(seen[0].head.starts_with("GET /repos/octocat/algos HTTP/1.1"));
        assert!(seen[1]
            .head
            .starts_with("GET /repos/octocat/algos/contents/1-two-sum.md HTTP/1.1"));
        let auth = seen[0].head.to_ascii_lowercase();
        assert!(auth.contains("authorization: bearer tok"));
        assert!(auth.contains("accept: application/vnd.github.v3+json"));
    }

    #[tokio::test]
    async fn get_file_decodes_sha() {
        let (client, server) =
            canned_server(vec![(200, r#"{"path":"1-two-sum.md","sha":"abc123","type":"file"}"#)])
                .await;
        let file = client
            .get_file("tok", "octocat", "algos", "1-two-sum.md")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(file.sha, "abc123");
        assert_eq!(file.path, "1-two-sum.md");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn put_file_404_is_not_found() {
        let (client, server) = canned_server(vec![(404, r#"{"message":"Not Found"}"#)]).await;
        let err = client.put_file("tok", put_request(None)).await.unwrap_err();
        assert!(
            matches!(&err, PublishError::NotFound(path) if path == "octocat/algos/1-two-sum.md"),
            "got {err:?}"
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn put_file_sends_sha_only_on_update() {
        let (client, server) = canned_server(vec![(201, PUT_OK), (200, PUT_OK)]).await;

        let created = client.put_file("tok", put_request(None)).await.unwrap();
        assert_eq!(created.sha, "new1");
        assert_eq!(
            created.html_url,
            "https://github.com/octocat/algos/blob/main/1-two-sum.md"
        );
        client
            .put_file("tok", put_request(Some("old9")))
            .await
            .unwrap();

        let seen = server.await.unwrap();
        assert!(seen[0]
            .head
            .starts_with("PUT /repos/octocat/algos/contents/1-two-sum.md HTTP/1.1"));
        let create: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
        assert!(create.get("sha").is_none());
        assert_eq!(create["content"], "Yw==");
        assert_eq!(create["message"], "Add solution: Two Sum (Easy)");
        let update: serde_json::Value = serde_json::from_str(&seen[1].body).unwrap();
        assert_eq!(update["sha"], "old9");
        assert_eq!(update["committer"]["email"], "leetsync@users.noreply.github.com");
    }

    #[tokio::test]
    async fn put_file_without_html_url_falls_back_to_blob_link() {
        let (client, server) =
            canned_server(vec![(201, r#"{"content":{"path":"1-two-sum.md","sha":"s"}}"#)]).await;
        let written = client.put_file("tok", put_request(None)).await.unwrap();
        assert_eq!(
            written.html_url,
            "https://github.com/octocat/algos/blob/main/1-two-sum.md"
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn other_statuses_carry_api_message_or_status() {
        let (client, server) = canned_server(vec![
            (422, r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#),
            (500, ""),
            (401, r#"{"message":"Bad credentials"}"#),
        ])
        .await;

        let err = client.put_file("tok", put_request(None)).await.unwrap_err();
        assert!(
            matches!(&err, PublishError::Remote { status: 422, message } if message == "Invalid request.\n\n\"sha\" wasn't supplied."),
            "got {err:?}"
        );

        let err = client
            .get_repository("tok", "octocat", "algos")
            .await
            .unwrap_err();
        assert!(
            matches!(&err, PublishError::Remote { status: 500, message } if message == "HTTP 500"),
            "got {err:?}"
        );

        let err = client.current_user("tok").await.unwrap_err();
        assert_eq!(err.to_string(), "GitHub API error: Bad credentials");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn closed_port_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GitHubClient::new(&format!("http://{addr}")).unwrap();
        let err = client.get_file("tok", "o", "r", "p.md").await.unwrap_err();
        assert!(matches!(err, PublishError::Network(_)), "got {err:?}");
    }
}
