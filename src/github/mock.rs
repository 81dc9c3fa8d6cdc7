use super::r#trait::{ContentEntry, ContentType, Issue, PullRequest, RepositoryHost};
use crate::error::HostError;
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// In-memory [`RepositoryHost`] for tests.
///
/// Repositories are registered as flat `path -> content` maps; directory
/// listings are derived from the registered paths the same way a filesystem
/// would. Individual repositories can be poisoned with `fail_repo` to
/// exercise per-record fault isolation.
#[derive(Default)]
pub struct MockRepositoryHost {
    state: RwLock<MockState>,
}

#[derive(Default)]
struct MockState {
    repos: HashMap<RepoKey, MockRepo>,
    failures: HashMap<RepoKey, String>,
    created_issues: Vec<(RepoKey, Issue)>,
    opened_pull_requests: Vec<(RepoKey, PullRequest)>,
    upserted_files: Vec<(RepoKey, String, String)>,
    created_branches: Vec<(RepoKey, String)>,
}

#[derive(Default)]
struct MockRepo {
    files: BTreeMap<String, Vec<u8>>,
    issues_by_creator: HashMap<String, Vec<Issue>>,
    open_issues: u32,
    open_pull_requests: u32,
}

type RepoKey = (String, String);

fn key(owner: &str, repo: &str) -> RepoKey {
    (owner.to_string(), repo.to_string())
}

impl MockRepositoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_repo(&self, owner: &str, repo: &str) {
        self.state
            .write()
            .unwrap()
            .repos
            .entry(key(owner, repo))
            .or_default();
    }

    pub fn add_file(&self, owner: &str, repo: &str, path: &str, content: &str) {
        let mut state = self.state.write().unwrap();
        state
            .repos
            .entry(key(owner, repo))
            .or_default()
            .files
            .insert(path.trim_matches('/').to_string(), content.as_bytes().to_vec());
    }

    /// Makes every call touching `owner/repo` fail with a generic API error.
    pub fn fail_repo(&self, owner: &str, repo: &str, message: &str) {
        self.state
            .write()
            .unwrap()
            .failures
            .insert(key(owner, repo), message.to_string());
    }

    pub fn seed_issues(&self, owner: &str, repo: &str, creator: &str, issues: Vec<Issue>) {
        let mut state = self.state.write().unwrap();
        state
            .repos
            .entry(key(owner, repo))
            .or_default()
            .issues_by_creator
            .insert(creator.to_string(), issues);
    }

    pub fn set_activity(&self, owner: &str, repo: &str, issues: u32, pull_requests: u32) {
        let mut state = self.state.write().unwrap();
        let entry = state.repos.entry(key(owner, repo)).or_default();
        entry.open_issues = issues;
        entry.open_pull_requests = pull_requests;
    }

    pub fn created_issues(&self) -> Vec<(String, String, Issue)> {
        self.state
            .read()
            .unwrap()
            .created_issues
            .iter()
            .map(|((owner, repo), issue)| (owner.clone(), repo.clone(), issue.clone()))
            .collect()
    }

    pub fn opened_pull_requests(&self) -> Vec<(String, String, PullRequest)> {
        self.state
            .read()
            .unwrap()
            .opened_pull_requests
            .iter()
            .map(|((owner, repo), pr)| (owner.clone(), repo.clone(), pr.clone()))
            .collect()
    }

    pub fn upserted_files(&self) -> Vec<(String, String)> {
        self.state
            .read()
            .unwrap()
            .upserted_files
            .iter()
            .map(|(_, path, content)| (path.clone(), content.clone()))
            .collect()
    }

    fn guard(&self, owner: &str, repo: &str) -> Result<(), HostError> {
        let state = self.state.read().unwrap();
        if let Some(message) = state.failures.get(&key(owner, repo)) {
            return Err(HostError::Api {
                status: 500,
                message: message.clone(),
            });
        }
        if !state.repos.contains_key(&key(owner, repo)) {
            return Err(HostError::NotFound(format!("{owner}/{repo}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryHost for MockRepositoryHost {
    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>, HostError> {
        self.guard(owner, repo)?;

        let state = self.state.read().unwrap();
        let files = &state.repos[&key(owner, repo)].files;
        let prefix = path.trim_matches('/');

        let mut entries: Vec<ContentEntry> = Vec::new();
        for file_path in files.keys() {
            let relative = if prefix.is_empty() {
                file_path.as_str()
            } else {
                match file_path.strip_prefix(prefix).and_then(|r| r.strip_prefix('/')) {
                    Some(r) => r,
                    None => continue,
                }
            };

            let (name, content_type) = match relative.split_once('/') {
                Some((dir, _)) => (dir, ContentType::Dir),
                None => (relative, ContentType::File),
            };
            if name.is_empty() || entries.iter().any(|e| e.name == name) {
                continue;
            }

            let entry_path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}/{name}")
            };
            entries.push(ContentEntry {
                name: name.to_string(),
                path: entry_path.clone(),
                content_type,
                html_url: Some(format!(
                    "https://github.com/{owner}/{repo}/blob/main/{entry_path}"
                )),
            });
        }

        if entries.is_empty() && !prefix.is_empty() && !files.contains_key(prefix) {
            return Err(HostError::NotFound(format!("{owner}/{repo}/{prefix}")));
        }

        Ok(entries)
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<u8>, HostError> {
        self.guard(owner, repo)?;

        let state = self.state.read().unwrap();
        state.repos[&key(owner, repo)]
            .files
            .get(path.trim_matches('/'))
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("{owner}/{repo}/{path}")))
    }

    async fn get_archive(&self, owner: &str, repo: &str) -> Result<Vec<u8>, HostError> {
        self.guard(owner, repo)?;

        let state = self.state.read().unwrap();
        let files = &state.repos[&key(owner, repo)].files;

        // Mirror the hosting service's layout: every entry sits below a
        // synthetic "<owner>-<repo>-<sha>/" top-level folder.
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(
                    &mut header,
                    format!("{owner}-{repo}-0000000/{path}"),
                    content.as_slice(),
                )
                .map_err(|e| HostError::InvalidResponse(e.to_string()))?;
        }

        builder
            .into_inner()
            .and_then(|gz| gz.finish())
            .map_err(|e| HostError::InvalidResponse(e.to_string()))
    }

    async fn find_issues_by_creator(
        &self,
        owner: &str,
        repo: &str,
        creator: &str,
    ) -> Result<Vec<Issue>, HostError> {
        self.guard(owner, repo)?;

        let state = self.state.read().unwrap();
        Ok(state.repos[&key(owner, repo)]
            .issues_by_creator
            .get(creator)
            .cloned()
            .unwrap_or_default())
    }

    async fn count_open_issues(&self, owner: &str, repo: &str) -> Result<u32, HostError> {
        self.guard(owner, repo)?;
        Ok(self.state.read().unwrap().repos[&key(owner, repo)].open_issues)
    }

    async fn count_open_pull_requests(&self, owner: &str, repo: &str) -> Result<u32, HostError> {
        self.guard(owner, repo)?;
        Ok(self.state.read().unwrap().repos[&key(owner, repo)].open_pull_requests)
    }

    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        _body: &str,
    ) -> Result<Issue, HostError> {
        self.guard(owner, repo)?;

        let mut state = self.state.write().unwrap();
        let number = state.created_issues.len() as u64 + 1;
        let issue = Issue {
            number,
            title: title.to_string(),
            html_url: format!("https://github.com/{owner}/{repo}/issues/{number}"),
        };
        state.created_issues.push((key(owner, repo), issue.clone()));
        Ok(issue)
    }

    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        _from_branch: &str,
    ) -> Result<(), HostError> {
        self.guard(owner, repo)?;
        self.state
            .write()
            .unwrap()
            .created_branches
            .push((key(owner, repo), branch.to_string()));
        Ok(())
    }

    async fn create_or_update_file(
        &self,
        owner: &str,
        repo: &str,
        _branch: &str,
        path: &str,
        _message: &str,
        content: &str,
    ) -> Result<(), HostError> {
        self.guard(owner, repo)?;
        self.state.write().unwrap().upserted_files.push((
            key(owner, repo),
            path.to_string(),
            content.to_string(),
        ));
        Ok(())
    }

    async fn open_pull_request(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        _body: &str,
        _head: &str,
        _base: &str,
    ) -> Result<PullRequest, HostError> {
        self.guard(owner, repo)?;

        let mut state = self.state.write().unwrap();
        let number = state.opened_pull_requests.len() as u64 + 1;
        let pull = PullRequest {
            number,
            title: title.to_string(),
            html_url: format!("https://github.com/{owner}/{repo}/pull/{number}"),
        };
        state
            .opened_pull_requests
            .push((key(owner, repo), pull.clone()));
        Ok(pull)
    }

    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String, HostError> {
        self.guard(owner, repo)?;
        Ok("main".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listing_derives_files_and_dirs() {
        let host = MockRepositoryHost::new();
        host.add_file("owner", "repo", "README.md", "hello");
        host.add_file("owner", "repo", "src/Cake.Foo.sln", "");
        host.add_file("owner", "repo", "src/Cake.Foo/Cake.Foo.csproj", "");

        let root = host.list_directory("owner", "repo", "").await.unwrap();
        let names: Vec<&str> = root.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["README.md", "src"]);
        assert_eq!(root[1].content_type, ContentType::Dir);

        let src = host.list_directory("owner", "repo", "src").await.unwrap();
        let names: Vec<&str> = src.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Cake.Foo.sln", "Cake.Foo"]);
    }

    #[tokio::test]
    async fn test_unknown_repo_is_not_found() {
        let host = MockRepositoryHost::new();
        let err = host.list_directory("nobody", "nothing", "").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_poisoned_repo_fails_generically() {
        let host = MockRepositoryHost::new();
        host.add_repo("owner", "repo");
        host.fail_repo("owner", "repo", "boom");

        let err = host.get_file_content("owner", "repo", "x").await.unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_archive_round_trip() {
        let host = MockRepositoryHost::new();
        host.add_file("owner", "repo", "src/Cake.Foo/Cake.Foo.nuspec", "<package/>");

        let bytes = host.get_archive("owner", "repo").await.unwrap();
        let paths = super::super::archive_file_paths(&bytes).unwrap();
        assert_eq!(paths, vec!["src/Cake.Foo/Cake.Foo.nuspec"]);
    }
}
