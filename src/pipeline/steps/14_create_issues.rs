use crate::config::{CAKE_COMMON_PACKAGE, CAKE_CORE_PACKAGE};
use crate::models::{AddinMetadata, CakeVersion};
use crate::pipeline::context::{RunContext, RunServices};
use crate::pipeline::step::Step;
use crate::version::is_up_to_date;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use regex::{Captures, Regex};
use tracing::{debug, info};

const STAGE: &str = "create-issues";

/// Opt-in remediation: files an issue for every cleanly-audited addin with
/// violations, and (when enabled) a pull request upgrading stale Cake
/// references.
pub struct CreateIssuesStep;

fn issue_title(cake: &CakeVersion) -> String {
    format!("Audit findings for Cake {}", cake.version)
}

fn violations_for(addin: &AddinMetadata, cake: &CakeVersion) -> Vec<String> {
    let analysis = &addin.analysis;
    let mut violations = Vec::new();

    for (package, version, up_to_date, private) in [
        (
            CAKE_CORE_PACKAGE,
            &analysis.cake_core_version,
            analysis.cake_core_is_up_to_date,
            analysis.cake_core_is_private,
        ),
        (
            CAKE_COMMON_PACKAGE,
            &analysis.cake_common_version,
            analysis.cake_common_is_up_to_date,
            analysis.cake_common_is_private,
        ),
    ] {
        if !up_to_date {
            violations.push(format!(
                "The {package} reference ({}) is older than {}",
                version.as_deref().unwrap_or("unknown"),
                cake.version
            ));
        }
        if version.is_some() && !private {
            violations.push(format!(
                "The {package} reference is not marked private (`PrivateAssets=\"All\"`)"
            ));
        }
    }

    if !analysis.targets_expected_framework {
        violations.push(format!(
            "The addin does not target {} (optionally also {})",
            cake.required_framework,
            cake.optional_frameworks.join(", ")
        ));
    }
    if !analysis.uses_expected_icon {
        violations.push("The package does not use the recommended cake-contrib icon".to_string());
    }

    violations
}

/// Bumps stale `Version` attributes on the tracked package references.
/// Anything already at or past the recommended version is left alone.
fn upgrade_reference_versions(content: &str, cake: &CakeVersion) -> (String, bool) {
    let mut changed = false;
    let mut result = content.to_string();

    for package in [CAKE_CORE_PACKAGE, CAKE_COMMON_PACKAGE] {
        let pattern = Regex::new(&format!(
            r#"(<PackageReference[^>]*Include="{}"[^>]*Version=")([^"]+)(")"#,
            regex::escape(package)
        ))
        .expect("reference pattern is valid");

        result = pattern
            .replace_all(&result, |captures: &Captures| {
                if is_up_to_date(Some(&captures[2]), cake.version) {
                    captures[0].to_string()
                } else {
                    changed = true;
                    format!("{}{}{}", &captures[1], cake.version, &captures[3])
                }
            })
            .into_owned();
    }

    (result, changed)
}

async fn submit_upgrade_pull_request(
    services: &RunServices,
    addin: &AddinMetadata,
    owner: &str,
    repo: &str,
    issue_number: u64,
    title: &str,
) -> Result<()> {
    let cake = &services.options.cake_version;
    let folder = services.options.addin_folder(&addin.name);

    // Work out the upgraded descriptor contents from the local copies
    // before touching the remote repository at all.
    let mut upgrades: Vec<(String, String)> = Vec::new();
    for path in addin.project_paths.as_deref().unwrap_or(&[]) {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let local = folder.join(file_name);
        let Ok(content) = tokio::fs::read_to_string(&local).await else {
            continue;
        };

        let (upgraded, changed) = upgrade_reference_versions(&content, cake);
        if changed {
            upgrades.push((path.clone(), upgraded));
        }
    }
    if upgrades.is_empty() {
        debug!(addin = %addin.name, "no reference upgrade to submit");
        return Ok(());
    }

    let branch = format!("audit/cake-{}", cake.version);
    let base = services.github.default_branch(owner, repo).await?;
    services.github.create_branch(owner, repo, &branch, &base).await?;

    for (path, content) in &upgrades {
        services
            .github
            .create_or_update_file(
                owner,
                repo,
                &branch,
                path,
                &format!("Upgrade Cake references to {}", cake.version),
                content,
            )
            .await?;
    }

    let body = format!("This pull request was created by a tool.\n\nResolves #{issue_number}");
    let pull = services
        .github
        .open_pull_request(owner, repo, title, &body, &branch, &base)
        .await?;
    info!(addin = %addin.name, number = pull.number, "opened upgrade pull request");

    Ok(())
}

fn process<'a>(
    services: &'a RunServices,
    addin: &'a mut AddinMetadata,
) -> BoxFuture<'a, Result<()>> {
    async move {
        // Only cleanly-audited addins get actionable issues; records with
        // notes are surfaced in the report's exceptions section instead.
        if !addin.is_linked() || addin.analysis.has_notes() {
            return Ok(());
        }

        let cake = services.options.cake_version;
        let violations = violations_for(addin, &cake);
        if violations.is_empty() {
            return Ok(());
        }

        let owner = addin.repository_owner.clone().unwrap_or_default();
        let repo = addin.repository_name.clone().unwrap_or_default();
        let title = issue_title(&cake);

        let existing = services.issues_by_actor(&owner, &repo).await?;
        if existing.iter().any(|issue| issue.title == title) {
            debug!(addin = %addin.name, "audit issue already filed");
            return Ok(());
        }

        let mut body = String::from("An automated audit of this addin found the following:\n\n");
        for violation in &violations {
            body.push_str(&format!("- {violation}\n"));
        }

        let issue = services.github.create_issue(&owner, &repo, &title, &body).await?;
        info!(addin = %addin.name, number = issue.number, "filed audit issue");

        if services.options.submit_prs {
            submit_upgrade_pull_request(services, addin, &owner, &repo, issue.number, &title)
                .await?;
        }
        Ok(())
    }
    .boxed()
}

#[async_trait]
impl Step for CreateIssuesStep {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn should_run(&self, context: &RunContext) -> bool {
        context.services.options.create_issues
    }

    /// Remediation acts on the outside world, not on the record set.
    fn persists(&self) -> bool {
        false
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        context.for_each_addin(STAGE, process).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditOptions;
    use crate::github::{Issue, MockRepositoryHost};
    use crate::models::{DiscoverySource, PackageReference};
    use crate::pipeline::context::RunServices;
    use crate::registry::StaticNormalizer;
    use std::sync::Arc;
    use tempfile::TempDir;

    const CAKE: CakeVersion = CakeVersion {
        version: "1.0.0",
        required_framework: "netstandard2.0",
        optional_frameworks: &["net461", "net5.0"],
    };

    fn outdated_addin(name: &str) -> AddinMetadata {
        let mut addin = AddinMetadata::new(name, DiscoverySource::YamlListing);
        addin.repository_url = Some(format!("https://github.com/cake-contrib/{name}"));
        addin.link_from_url();
        addin.references = Some(vec![PackageReference {
            id: CAKE_CORE_PACKAGE.to_string(),
            version: Some("0.26.0".to_string()),
            is_private: true,
        }]);
        addin.analysis.cake_core_version = Some("0.26.0".to_string());
        addin.analysis.cake_core_is_up_to_date = false;
        addin.analysis.cake_core_is_private = true;
        addin.analysis.cake_common_is_up_to_date = true;
        addin.analysis.targets_expected_framework = true;
        addin.analysis.uses_expected_icon = true;
        addin
    }

    fn options_with(work_dir: &TempDir) -> AuditOptions {
        AuditOptions {
            work_dir: work_dir.path().to_path_buf(),
            github_user: Some("audit-bot".to_string()),
            create_issues: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_violations_cover_every_flag() {
        let mut addin = AddinMetadata::new("Cake.Foo", DiscoverySource::YamlListing);
        addin.analysis.cake_core_version = Some("0.26.0".to_string());

        let violations = violations_for(&addin, &CAKE);
        assert!(violations.iter().any(|v| v.contains("older than 1.0.0")));
        assert!(violations.iter().any(|v| v.contains("not marked private")));
        assert!(violations.iter().any(|v| v.contains("does not target")));
        assert!(violations.iter().any(|v| v.contains("icon")));
    }

    #[test]
    fn test_compliant_addin_has_no_violations() {
        let mut addin = AddinMetadata::new("Cake.Foo", DiscoverySource::YamlListing);
        addin.analysis.cake_core_is_up_to_date = true;
        addin.analysis.cake_common_is_up_to_date = true;
        addin.analysis.targets_expected_framework = true;
        addin.analysis.uses_expected_icon = true;

        assert!(violations_for(&addin, &CAKE).is_empty());
    }

    #[test]
    fn test_upgrade_rewrites_only_stale_versions() {
        let content = r#"
            <PackageReference Include="Cake.Core" Version="0.26.0" PrivateAssets="All" />
            <PackageReference Include="Cake.Common" Version="1.0.0" PrivateAssets="All" />
            <PackageReference Include="Newtonsoft.Json" Version="9.0.0" />
        "#;

        let (upgraded, changed) = upgrade_reference_versions(content, &CAKE);
        assert!(changed);
        assert!(upgraded.contains(r#"Include="Cake.Core" Version="1.0.0""#));
        assert!(upgraded.contains(r#"Include="Cake.Common" Version="1.0.0""#));
        assert!(upgraded.contains(r#"Include="Newtonsoft.Json" Version="9.0.0""#));
    }

    #[tokio::test]
    async fn test_files_issue_for_violating_addin() {
        let work_dir = TempDir::new().unwrap();
        let host = Arc::new(MockRepositoryHost::new());
        host.add_repo("cake-contrib", "Cake.Foo");

        let mut context = RunContext::new(RunServices::new(
            options_with(&work_dir),
            Arc::clone(&host) as Arc<dyn crate::github::RepositoryHost>,
            Arc::new(StaticNormalizer::empty()),
        ));
        context.addins.push(outdated_addin("Cake.Foo"));

        CreateIssuesStep.execute(&mut context).await.unwrap();

        let created = host.created_issues();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].2.title, "Audit findings for Cake 1.0.0");
    }

    #[tokio::test]
    async fn test_existing_issue_is_not_duplicated() {
        let work_dir = TempDir::new().unwrap();
        let host = Arc::new(MockRepositoryHost::new());
        host.add_repo("cake-contrib", "Cake.Foo");
        host.seed_issues(
            "cake-contrib",
            "Cake.Foo",
            "audit-bot",
            vec![Issue {
                number: 1,
                title: "Audit findings for Cake 1.0.0".to_string(),
                html_url: "https://github.com/cake-contrib/Cake.Foo/issues/1".to_string(),
            }],
        );

        let mut context = RunContext::new(RunServices::new(
            options_with(&work_dir),
            Arc::clone(&host) as Arc<dyn crate::github::RepositoryHost>,
            Arc::new(StaticNormalizer::empty()),
        ));
        context.addins.push(outdated_addin("Cake.Foo"));

        CreateIssuesStep.execute(&mut context).await.unwrap();

        assert!(host.created_issues().is_empty());
    }

    #[tokio::test]
    async fn test_noted_addins_are_skipped() {
        let work_dir = TempDir::new().unwrap();
        let host = Arc::new(MockRepositoryHost::new());
        host.add_repo("cake-contrib", "Cake.Foo");

        let mut addin = outdated_addin("Cake.Foo");
        addin.add_note("find-solution", "earlier failure");

        let mut context = RunContext::new(RunServices::new(
            options_with(&work_dir),
            Arc::clone(&host) as Arc<dyn crate::github::RepositoryHost>,
            Arc::new(StaticNormalizer::empty()),
        ));
        context.addins.push(addin);

        CreateIssuesStep.execute(&mut context).await.unwrap();

        assert!(host.created_issues().is_empty());
    }

    #[tokio::test]
    async fn test_pull_request_upgrades_stale_descriptor() {
        let work_dir = TempDir::new().unwrap();
        let folder = work_dir.path().join("Cake.Foo");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(
            folder.join("Cake.Foo.csproj"),
            r#"<Project><ItemGroup><PackageReference Include="Cake.Core" Version="0.26.0" PrivateAssets="All" /></ItemGroup></Project>"#,
        )
        .unwrap();

        let host = Arc::new(MockRepositoryHost::new());
        host.add_repo("cake-contrib", "Cake.Foo");

        let mut options = options_with(&work_dir);
        options.submit_prs = true;

        let mut addin = outdated_addin("Cake.Foo");
        addin.project_paths = Some(vec!["src/Cake.Foo/Cake.Foo.csproj".to_string()]);

        let mut context = RunContext::new(RunServices::new(
            options,
            Arc::clone(&host) as Arc<dyn crate::github::RepositoryHost>,
            Arc::new(StaticNormalizer::empty()),
        ));
        context.addins.push(addin);

        CreateIssuesStep.execute(&mut context).await.unwrap();

        let pulls = host.opened_pull_requests();
        assert_eq!(pulls.len(), 1);

        let upserted = host.upserted_files();
        assert_eq!(upserted.len(), 1);
        assert_eq!(upserted[0].0, "src/Cake.Foo/Cake.Foo.csproj");
        assert!(upserted[0].1.contains(r#"Version="1.0.0""#));
    }
}
