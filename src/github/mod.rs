//! Repository host abstraction for testable remote crawling.

mod archive;
mod mock;
mod rest;
mod r#trait;

pub use archive::{archive_file_content, archive_file_paths};
pub use mock::MockRepositoryHost;
pub use rest::GithubHost;
pub use r#trait::{ContentEntry, ContentType, Issue, PullRequest, RepositoryHost};
