use crate::error::HostError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    File,
    Dir,
    #[serde(other)]
    Other,
}

/// One entry from a repository directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

/// Read/write access to a source-hosting service.
///
/// Every call can fail with [`HostError::NotFound`], which callers handle
/// as a distinct recoverable case (missing repo, missing file) rather than
/// a generic fault.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Lists the contents of a directory; an empty `path` lists the
    /// repository root.
    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>, HostError>;

    /// Fetches a file's raw bytes.
    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<u8>, HostError>;

    /// Fetches the repository as a gzipped tarball.
    async fn get_archive(&self, owner: &str, repo: &str) -> Result<Vec<u8>, HostError>;

    /// Open issues filed by `creator`.
    async fn find_issues_by_creator(
        &self,
        owner: &str,
        repo: &str,
        creator: &str,
    ) -> Result<Vec<Issue>, HostError>;

    async fn count_open_issues(&self, owner: &str, repo: &str) -> Result<u32, HostError>;

    async fn count_open_pull_requests(&self, owner: &str, repo: &str) -> Result<u32, HostError>;

    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<Issue, HostError>;

    /// Creates `branch` pointing at the head of `from_branch`.
    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from_branch: &str,
    ) -> Result<(), HostError>;

    /// Creates or replaces a file on `branch` with `content`.
    async fn create_or_update_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
        message: &str,
        content: &str,
    ) -> Result<(), HostError>;

    async fn open_pull_request(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, HostError>;

    /// The repository's default branch name.
    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String, HostError>;
}
