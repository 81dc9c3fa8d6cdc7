use crate::descriptor::parse_icon_url;
use crate::github::{archive_file_content, archive_file_paths};
use crate::models::AddinMetadata;
use crate::pipeline::context::{RunContext, RunServices};
use crate::pipeline::step::Step;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::debug;

const STAGE: &str = "find-icon";

/// Resolves the icon URL each addin packages with.
///
/// The downloaded descriptors are checked first; when they declare no icon
/// the repository archive is searched for a package manifest (`.nuspec`).
/// An addin with no icon metadata anywhere keeps an absent icon field —
/// that is data absence, not a failure.
pub struct FindIconStep;

async fn icon_from_downloads(folder: &std::path::Path) -> Result<Option<String>> {
    if !folder.exists() {
        return Ok(None);
    }

    let mut entries = tokio::fs::read_dir(folder).await?;
    while let Some(entry) = entries.next_entry().await? {
        if let Ok(content) = tokio::fs::read_to_string(entry.path()).await {
            if let Some(url) = parse_icon_url(&content) {
                return Ok(Some(url));
            }
        }
    }

    Ok(None)
}

fn process<'a>(
    services: &'a RunServices,
    addin: &'a mut AddinMetadata,
) -> BoxFuture<'a, Result<()>> {
    async move {
        if addin.icon_url.is_some() {
            return Ok(());
        }

        let folder = services.options.addin_folder(&addin.name);
        if let Some(url) = icon_from_downloads(&folder).await? {
            addin.icon_url = Some(url);
            return Ok(());
        }

        if !addin.is_linked() {
            return Ok(());
        }
        let owner = addin.repository_owner.clone().unwrap_or_default();
        let repo = addin.repository_name.clone().unwrap_or_default();

        let archive = match services.github.get_archive(&owner, &repo).await {
            Ok(archive) => archive,
            Err(error) if error.is_not_found() => return Ok(()),
            Err(error) => return Err(error.into()),
        };

        let paths = archive_file_paths(&archive)?;
        let Some(manifest) = paths.iter().find(|p| p.to_lowercase().ends_with(".nuspec")) else {
            debug!(addin = %addin.name, "no package manifest in repository");
            return Ok(());
        };

        if let Some(content) = archive_file_content(&archive, manifest)? {
            addin.icon_url = parse_icon_url(&String::from_utf8_lossy(&content));
        }
        Ok(())
    }
    .boxed()
}

#[async_trait]
impl Step for FindIconStep {
    fn name(&self) -> &'static str {
        STAGE
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
    use crate::github::MockRepositoryHost;
    use crate::models::{AddinMetadata, DiscoverySource};
    use crate::pipeline::context::RunServices;
    use crate::registry::StaticNormalizer;
    use std::sync::Arc;
    use tempfile::TempDir;

    const ICON: &str =
        "https://cdn.jsdelivr.net/gh/cake-contrib/graphics/png/cake-contrib-medium.png";

    fn linked_addin(name: &str) -> AddinMetadata {
        let mut addin = AddinMetadata::new(name, DiscoverySource::YamlListing);
        addin.repository_url = Some(format!("https://github.com/cake-contrib/{name}"));
        addin.link_from_url();
        addin
    }

    fn context_in(work_dir: &TempDir, host: MockRepositoryHost) -> RunContext {
        RunContext::new(RunServices::new(
            AuditOptions {
                work_dir: work_dir.path().to_path_buf(),
                ..Default::default()
            },
            Arc::new(host),
            Arc::new(StaticNormalizer::empty()),
        ))
    }

    #[tokio::test]
    async fn test_icon_from_downloaded_descriptor() {
        let work_dir = TempDir::new().unwrap();
        let folder = work_dir.path().join("Cake.Foo");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(
            folder.join("Cake.Foo.csproj"),
            format!(
                r#"<Project><PropertyGroup><PackageIconUrl>{ICON}</PackageIconUrl></PropertyGroup></Project>"#
            ),
        )
        .unwrap();

        let mut context = context_in(&work_dir, MockRepositoryHost::new());
        context.addins.push(linked_addin("Cake.Foo"));

        FindIconStep.execute(&mut context).await.unwrap();

        assert_eq!(context.addins[0].icon_url.as_deref(), Some(ICON));
    }

    #[tokio::test]
    async fn test_icon_from_package_manifest_in_archive() {
        let work_dir = TempDir::new().unwrap();
        let host = MockRepositoryHost::new();
        host.add_file(
            "cake-contrib",
            "Cake.Foo",
            "src/Cake.Foo/Cake.Foo.nuspec",
            &format!(
                r#"<package><metadata><iconUrl>{ICON}</iconUrl></metadata></package>"#
            ),
        );

        let mut context = context_in(&work_dir, host);
        context.addins.push(linked_addin("Cake.Foo"));

        FindIconStep.execute(&mut context).await.unwrap();

        assert_eq!(context.addins[0].icon_url.as_deref(), Some(ICON));
    }

    #[tokio::test]
    async fn test_no_icon_metadata_leaves_field_absent() {
        let work_dir = TempDir::new().unwrap();
        let host = MockRepositoryHost::new();
        host.add_file("cake-contrib", "Cake.Foo", "README.md", "no icon here");

        let mut context = context_in(&work_dir, host);
        context.addins.push(linked_addin("Cake.Foo"));

        FindIconStep.execute(&mut context).await.unwrap();

        assert_eq!(context.addins[0].icon_url, None);
        assert!(context.addins[0].analysis.notes.is_empty());
    }
}
