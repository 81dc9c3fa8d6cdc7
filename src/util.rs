//! Small text helpers shared by the discovery and descriptor parsers.

/// Extracts the substring between two markers.
///
/// `extract_between("[", "]", "Hello [world]")` returns `Some("world")`.
/// Returns `None` when either marker is missing.
pub fn extract_between<'a>(start_mark: &str, end_mark: &str, content: &'a str) -> Option<&'a str> {
    let start = content.find(start_mark)? + start_mark.len();
    let end = content[start..].find(end_mark)? + start;
    Some(content[start..end].trim())
}

/// Derives `(owner, name)` from a GitHub repository URL.
///
/// Handles both browser URLs (`https://github.com/owner/name`) and API URLs
/// (`https://api.github.com/repos/owner/name`), with or without a `.git`
/// suffix.
pub fn derive_repo_info(url: &str) -> Option<(String, String)> {
    let path = url.split("://").nth(1)?;
    let mut parts = path.split('/').filter(|p| !p.is_empty());

    let host = parts.next()?;
    if !host.ends_with("github.com") {
        return None;
    }

    let first = parts.next()?;
    let (owner, name) = if first.eq_ignore_ascii_case("repos") {
        (parts.next()?, parts.next()?)
    } else {
        (first, parts.next()?)
    };

    let name = name.strip_suffix(".git").unwrap_or(name);
    if owner.is_empty() || name.is_empty() {
        return None;
    }

    Some((owner.to_string(), name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_between() {
        assert_eq!(extract_between("[", "]", "Hello [world]"), Some("world"));
        assert_eq!(
            extract_between("Version=", ",", "Cake.Core, Version=0.22.0.0, Culture=neutral"),
            Some("0.22.0.0")
        );
        assert_eq!(extract_between("[", "]", "no markers"), None);
    }

    #[test]
    fn test_derive_repo_info_browser_url() {
        assert_eq!(
            derive_repo_info("https://github.com/cake-contrib/Cake.Git"),
            Some(("cake-contrib".to_string(), "Cake.Git".to_string()))
        );
    }

    #[test]
    fn test_derive_repo_info_api_url() {
        assert_eq!(
            derive_repo_info("https://api.github.com/repos/cake-contrib/Cake.Git"),
            Some(("cake-contrib".to_string(), "Cake.Git".to_string()))
        );
    }

    #[test]
    fn test_derive_repo_info_strips_git_suffix() {
        assert_eq!(
            derive_repo_info("https://github.com/owner/repo.git"),
            Some(("owner".to_string(), "repo".to_string()))
        );
    }

    #[test]
    fn test_derive_repo_info_rejects_other_hosts() {
        assert_eq!(derive_repo_info("https://www.nuget.org/packages/Cake.Git"), None);
    }
}
