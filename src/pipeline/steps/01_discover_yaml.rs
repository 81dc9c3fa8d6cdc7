use crate::config::{YAML_LISTING_OWNER, YAML_LISTING_PATH, YAML_LISTING_REPO};
use crate::github::ContentType;
use crate::models::{AddinMetadata, DiscoverySource};
use crate::pipeline::context::RunContext;
use crate::pipeline::step::Step;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Deserialize;
use tracing::{info, warn};

/// Discovers addins from the website listing: one YAML file per addin.
pub struct DiscoverByYamlStep;

#[derive(Debug, Deserialize)]
struct ListingEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Repository")]
    repository: Option<String>,
}

#[async_trait]
impl Step for DiscoverByYamlStep {
    fn name(&self) -> &'static str {
        "discover-yaml"
    }

    fn should_run(&self, context: &RunContext) -> bool {
        !context.resumed
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        let services = &context.services;

        let listing = services
            .github
            .list_directory(YAML_LISTING_OWNER, YAML_LISTING_REPO, YAML_LISTING_PATH)
            .await
            .context("failed to list the YAML addin listing")?;

        let yaml_files: Vec<_> = listing
            .into_iter()
            .filter(|e| {
                e.content_type == ContentType::File && e.name.to_lowercase().ends_with(".yml")
            })
            .collect();
        info!(count = yaml_files.len(), "found YAML listing entries");

        let fetches = yaml_files.iter().map(|entry| async move {
            let bytes = services
                .github
                .get_file_content(YAML_LISTING_OWNER, YAML_LISTING_REPO, &entry.path)
                .await?;
            let parsed: ListingEntry = serde_yaml::from_slice(&bytes)?;
            Ok::<_, anyhow::Error>(parsed)
        });

        for (entry, result) in yaml_files.iter().zip(join_all(fetches).await) {
            match result {
                Ok(parsed) => {
                    let mut addin = AddinMetadata::new(parsed.name, DiscoverySource::YamlListing);
                    addin.repository_url = parsed.repository;
                    addin.link_from_url();
                    context.addins.push(addin);
                }
                Err(error) => {
                    // A single broken listing file should not sink the
                    // whole discovery pass.
                    warn!(file = %entry.path, error = %error, "skipping unparseable listing entry");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditOptions;
    use crate::github::MockRepositoryHost;
    use crate::pipeline::context::RunServices;
    use crate::registry::StaticNormalizer;
    use std::sync::Arc;

    fn context_with_host(host: MockRepositoryHost) -> RunContext {
        RunContext::new(RunServices::new(
            AuditOptions::default(),
            Arc::new(host),
            Arc::new(StaticNormalizer::empty()),
        ))
    }

    #[tokio::test]
    async fn test_discovers_addins_from_yaml_files() {
        let host = MockRepositoryHost::new();
        host.add_file(
            YAML_LISTING_OWNER,
            YAML_LISTING_REPO,
            "addins/Cake.Foo.yml",
            "Name: Cake.Foo\nRepository: https://github.com/cake-contrib/Cake.Foo\n",
        );
        host.add_file(
            YAML_LISTING_OWNER,
            YAML_LISTING_REPO,
            "addins/Cake.Bar.yml",
            "Name: Cake.Bar\nRepository: https://www.nuget.org/packages/Cake.Bar\n",
        );
        host.add_file(YAML_LISTING_OWNER, YAML_LISTING_REPO, "addins/README.md", "docs");

        let mut context = context_with_host(host);
        DiscoverByYamlStep.execute(&mut context).await.unwrap();

        assert_eq!(context.addins.len(), 2);
        let foo = context.addins.iter().find(|a| a.name == "Cake.Foo").unwrap();
        assert!(foo.is_linked());
        let bar = context.addins.iter().find(|a| a.name == "Cake.Bar").unwrap();
        assert!(!bar.is_linked());
        assert!(bar.repository_url.is_some());
    }

    #[tokio::test]
    async fn test_unparseable_entry_is_skipped() {
        let host = MockRepositoryHost::new();
        host.add_file(
            YAML_LISTING_OWNER,
            YAML_LISTING_REPO,
            "addins/Cake.Good.yml",
            "Name: Cake.Good\nRepository: https://github.com/cake-contrib/Cake.Good\n",
        );
        host.add_file(
            YAML_LISTING_OWNER,
            YAML_LISTING_REPO,
            "addins/broken.yml",
            ": [ not yaml",
        );

        let mut context = context_with_host(host);
        DiscoverByYamlStep.execute(&mut context).await.unwrap();

        assert_eq!(context.addins.len(), 1);
        assert_eq!(context.addins[0].name, "Cake.Good");
    }

    #[tokio::test]
    async fn test_skipped_on_resume() {
        let host = MockRepositoryHost::new();
        let mut context = context_with_host(host);
        context.resumed = true;
        assert!(!DiscoverByYamlStep.should_run(&context));
    }

    #[tokio::test]
    async fn test_missing_listing_is_fatal() {
        let mut context = context_with_host(MockRepositoryHost::new());
        assert!(DiscoverByYamlStep.execute(&mut context).await.is_err());
    }
}
