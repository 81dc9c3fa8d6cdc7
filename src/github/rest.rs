use super::r#trait::{ContentEntry, Issue, PullRequest, RepositoryHost};
use crate::error::HostError;
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const API_BASE: &str = "https://api.github.com";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";
const PAGE_SIZE: u32 = 100;

/// GitHub REST v3 implementation of [`RepositoryHost`].
pub struct GithubHost {
    client: Client,
    base_url: String,
}

impl GithubHost {
    pub fn new(token: Option<&str>) -> Result<Self, HostError> {
        Self::with_base_url(API_BASE, token)
    }

    /// Points the client at a different API root, e.g. a GitHub
    /// Enterprise instance.
    pub fn with_base_url(base_url: &str, token: Option<&str>) -> Result<Self, HostError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("cake-addin-audit/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|e| HostError::InvalidResponse(e.to_string()))?,
        );
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| HostError::InvalidResponse("token is not a valid header".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(HostError::from)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(&self, response: Response) -> Result<Response, HostError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        if status == StatusCode::NOT_FOUND {
            return Err(HostError::NotFound(url));
        }

        let message = response
            .text()
            .await
            .ok()
            .and_then(|body| {
                serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| format!("request to {url} failed"));

        Err(HostError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, HostError> {
        let response = self
            .client
            .get(self.url(path))
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .send()
            .await?;
        let response = self.check(response).await?;
        response
            .json()
            .await
            .map_err(|e| HostError::InvalidResponse(e.to_string()))
    }

    async fn existing_file_sha(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> Result<Option<String>, HostError> {
        #[derive(Deserialize)]
        struct FileInfo {
            sha: String,
        }

        match self
            .get_json::<FileInfo>(&format!("repos/{owner}/{repo}/contents/{path}?ref={branch}"))
            .await
        {
            Ok(info) => Ok(Some(info.sha)),
            Err(HostError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[derive(Deserialize)]
struct IssueJson {
    number: u64,
    title: String,
    html_url: String,
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct PullRequestJson {
    number: u64,
    title: String,
    html_url: String,
}

#[derive(Deserialize)]
struct RepoJson {
    default_branch: String,
}

#[derive(Deserialize)]
struct RefJson {
    object: RefObjectJson,
}

#[derive(Deserialize)]
struct RefObjectJson {
    sha: String,
}

#[async_trait]
impl RepositoryHost for GithubHost {
    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>, HostError> {
        let path = if path.is_empty() {
            format!("repos/{owner}/{repo}/contents")
        } else {
            format!("repos/{owner}/{repo}/contents/{path}")
        };
        self.get_json(&path).await
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<u8>, HostError> {
        let response = self
            .client
            .get(self.url(&format!("repos/{owner}/{repo}/contents/{path}")))
            .header(ACCEPT, RAW_MEDIA_TYPE)
            .send()
            .await?;
        let response = self.check(response).await?;
        Ok(response.bytes().await.map(|b| b.to_vec())?)
    }

    async fn get_archive(&self, owner: &str, repo: &str) -> Result<Vec<u8>, HostError> {
        let response = self
            .client
            .get(self.url(&format!("repos/{owner}/{repo}/tarball")))
            .send()
            .await?;
        let response = self.check(response).await?;
        Ok(response.bytes().await.map(|b| b.to_vec())?)
    }

    async fn find_issues_by_creator(
        &self,
        owner: &str,
        repo: &str,
        creator: &str,
    ) -> Result<Vec<Issue>, HostError> {
        let issues: Vec<IssueJson> = self
            .get_json(&format!(
                "repos/{owner}/{repo}/issues?creator={creator}&state=open&per_page={PAGE_SIZE}"
            ))
            .await?;

        // The issues endpoint reports pull requests too; only keep plain
        // issues.
        Ok(issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(|i| Issue {
                number: i.number,
                title: i.title,
                html_url: i.html_url,
            })
            .collect())
    }

    async fn count_open_issues(&self, owner: &str, repo: &str) -> Result<u32, HostError> {
        let issues: Vec<IssueJson> = self
            .get_json(&format!(
                "repos/{owner}/{repo}/issues?state=open&per_page={PAGE_SIZE}"
            ))
            .await?;
        Ok(issues.iter().filter(|i| i.pull_request.is_none()).count() as u32)
    }

    async fn count_open_pull_requests(&self, owner: &str, repo: &str) -> Result<u32, HostError> {
        let pulls: Vec<PullRequestJson> = self
            .get_json(&format!(
                "repos/{owner}/{repo}/pulls?state=open&per_page={PAGE_SIZE}"
            ))
            .await?;
        Ok(pulls.len() as u32)
    }

    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<Issue, HostError> {
        let response = self
            .client
            .post(self.url(&format!("repos/{owner}/{repo}/issues")))
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .json(&json!({ "title": title, "body": body }))
            .send()
            .await?;
        let response = self.check(response).await?;
        let issue: IssueJson = response
            .json()
            .await
            .map_err(|e| HostError::InvalidResponse(e.to_string()))?;

        debug!(owner, repo, number = issue.number, "created issue");
        Ok(Issue {
            number: issue.number,
            title: issue.title,
            html_url: issue.html_url,
        })
    }

    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from_branch: &str,
    ) -> Result<(), HostError> {
        let head: RefJson = self
            .get_json(&format!("repos/{owner}/{repo}/git/ref/heads/{from_branch}"))
            .await?;

        let response = self
            .client
            .post(self.url(&format!("repos/{owner}/{repo}/git/refs")))
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .json(&json!({
                "ref": format!("refs/heads/{branch}"),
                "sha": head.object.sha,
            }))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn create_or_update_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
        message: &str,
        content: &str,
    ) -> Result<(), HostError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);
        let mut payload = json!({
            "message": message,
            "content": encoded,
            "branch": branch,
        });
        if let Some(sha) = self.existing_file_sha(owner, repo, branch, path).await? {
            payload["sha"] = json!(sha);
        }

        let response = self
            .client
            .put(self.url(&format!("repos/{owner}/{repo}/contents/{path}")))
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .json(&payload)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn open_pull_request(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, HostError> {
        let response = self
            .client
            .post(self.url(&format!("repos/{owner}/{repo}/pulls")))
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .json(&json!({
                "title": title,
                "body": body,
                "head": head,
                "base": base,
            }))
            .send()
            .await?;
        let response = self.check(response).await?;
        let pull: PullRequestJson = response
            .json()
            .await
            .map_err(|e| HostError::InvalidResponse(e.to_string()))?;

        Ok(PullRequest {
            number: pull.number,
            title: pull.title,
            html_url: pull.html_url,
        })
    }

    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String, HostError> {
        let repo: RepoJson = self.get_json(&format!("repos/{owner}/{repo}")).await?;
        Ok(repo.default_branch)
    }
}
