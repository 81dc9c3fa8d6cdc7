//! Best-effort search for a repository's build-solution file.

use crate::error::HostError;
use crate::github::{ContentEntry, ContentType, RepositoryHost};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

const SOLUTION_EXTENSION: &str = ".sln";

/// Finds the canonical solution file in a repository, or `None` when the
/// biased search exhausts without a match.
///
/// The search favors conventional layouts and returns on the first hit:
/// solution files in the current folder win (first alphabetically when
/// several exist), then folders named `source`/`src` are descended into
/// before any other folder, then the remaining folders in listing order.
/// Deeply nested unconventional layouts can legitimately come up empty;
/// callers record that as a diagnostic, not a failure.
pub async fn find_solution_file(
    host: &dyn RepositoryHost,
    owner: &str,
    repo: &str,
    folder: Option<&str>,
) -> Result<Option<ContentEntry>, HostError> {
    search_folder(host, owner, repo, folder.unwrap_or("").to_string()).await
}

fn search_folder<'a>(
    host: &'a dyn RepositoryHost,
    owner: &'a str,
    repo: &'a str,
    folder: String,
) -> BoxFuture<'a, Result<Option<ContentEntry>, HostError>> {
    async move {
        let listing = host.list_directory(owner, repo, &folder).await?;

        let mut solutions: Vec<&ContentEntry> = listing
            .iter()
            .filter(|e| {
                e.content_type == ContentType::File
                    && e.name.to_lowercase().ends_with(SOLUTION_EXTENSION)
            })
            .collect();
        if !solutions.is_empty() {
            solutions.sort_by(|a, b| a.name.cmp(&b.name));
            return Ok(Some(solutions[0].clone()));
        }

        let folders: Vec<&ContentEntry> = listing
            .iter()
            .filter(|e| e.content_type == ContentType::Dir)
            .collect();
        let is_source_folder = |e: &&&ContentEntry| {
            e.name.eq_ignore_ascii_case("source") || e.name.eq_ignore_ascii_case("src")
        };

        for subfolder in folders.iter().filter(is_source_folder) {
            if let Some(found) =
                search_folder(host, owner, repo, subfolder.path.clone()).await?
            {
                return Ok(Some(found));
            }
        }

        for subfolder in folders.iter().filter(|e| !is_source_folder(e)) {
            if let Some(found) =
                search_folder(host, owner, repo, subfolder.path.clone()).await?
            {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::MockRepositoryHost;

    #[tokio::test]
    async fn test_root_solution_wins_over_nested_one() {
        let host = MockRepositoryHost::new();
        host.add_file("owner", "repo", "Cake.Root.sln", "");
        host.add_file("owner", "repo", "src/sub/Cake.Nested.sln", "");

        let found = find_solution_file(&host, "owner", "repo", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.path, "Cake.Root.sln");
    }

    #[tokio::test]
    async fn test_multiple_solutions_picks_first_alphabetically() {
        let host = MockRepositoryHost::new();
        host.add_file("owner", "repo", "Zebra.sln", "");
        host.add_file("owner", "repo", "Alpha.sln", "");

        let found = find_solution_file(&host, "owner", "repo", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "Alpha.sln");
    }

    #[tokio::test]
    async fn test_source_folders_searched_before_others() {
        let host = MockRepositoryHost::new();
        // "build" sorts before "src" in the listing, but the biased order
        // must reach the src solution first.
        host.add_file("owner", "repo", "build/Decoy.sln", "");
        host.add_file("owner", "repo", "src/Cake.Foo.sln", "");

        let found = find_solution_file(&host, "owner", "repo", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.path, "src/Cake.Foo.sln");
    }

    #[tokio::test]
    async fn test_descends_into_deeply_nested_layouts() {
        let host = MockRepositoryHost::new();
        host.add_file("owner", "repo", "source/nested/deep/Cake.Foo.sln", "");
        host.add_file("owner", "repo", "README.md", "");

        let found = find_solution_file(&host, "owner", "repo", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.path, "source/nested/deep/Cake.Foo.sln");
    }

    #[tokio::test]
    async fn test_no_solution_yields_none() {
        let host = MockRepositoryHost::new();
        host.add_file("owner", "repo", "README.md", "");

        let found = find_solution_file(&host, "owner", "repo", None).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_missing_repository_surfaces_not_found() {
        let host = MockRepositoryHost::new();
        let err = find_solution_file(&host, "ghost", "repo", None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_search_can_start_in_subfolder() {
        let host = MockRepositoryHost::new();
        host.add_file("owner", "repo", "Top.sln", "");
        host.add_file("owner", "repo", "sub/Inner.sln", "");

        let found = find_solution_file(&host, "owner", "repo", Some("sub"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.path, "sub/Inner.sln");
    }
}
