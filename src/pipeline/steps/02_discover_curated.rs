use crate::config::{
    CURATED_LISTING_OWNER, CURATED_LISTING_PATH, CURATED_LISTING_REPO, CURATED_LISTING_SECTIONS,
};
use crate::models::{AddinMetadata, DiscoverySource};
use crate::pipeline::context::RunContext;
use crate::pipeline::step::Step;
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Discovers addins from the curated status page: a markdown document with
/// one table per category.
pub struct DiscoverByCuratedListStep;

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern is valid"))
}

/// The markdown between a section heading and the next heading, or the end
/// of the document for the final section.
fn section_content<'a>(content: &'a str, title: &str) -> Option<&'a str> {
    let marker = format!("# {title}");
    let start = content.find(&marker)? + marker.len();
    let rest = &content[start..];
    match rest.find("\n#") {
        Some(end) => Some(&rest[..end]),
        None => Some(rest),
    }
}

fn parse_section(section: &str, addins: &mut Vec<AddinMetadata>) {
    // The first two table rows are the header and the separator.
    for line in section
        .lines()
        .filter(|l| l.trim_start().starts_with('|'))
        .skip(2)
    {
        let Some(first_cell) = line.split('|').find(|c| !c.trim().is_empty()) else {
            continue;
        };
        let Some(captures) = link_pattern().captures(first_cell) else {
            continue;
        };

        let mut addin = AddinMetadata::new(captures[1].trim(), DiscoverySource::CuratedListing);
        addin.repository_url = Some(captures[2].trim().to_string());
        addin.link_from_url();
        addins.push(addin);
    }
}

#[async_trait]
impl Step for DiscoverByCuratedListStep {
    fn name(&self) -> &'static str {
        "discover-curated-list"
    }

    fn should_run(&self, context: &RunContext) -> bool {
        !context.resumed
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        let bytes = context
            .services
            .github
            .get_file_content(
                CURATED_LISTING_OWNER,
                CURATED_LISTING_REPO,
                CURATED_LISTING_PATH,
            )
            .await
            .context("failed to fetch the curated status page")?;
        let content = String::from_utf8_lossy(&bytes);

        let mut discovered = Vec::new();
        for &title in CURATED_LISTING_SECTIONS {
            match section_content(&content, title) {
                Some(section) => parse_section(section, &mut discovered),
                None => warn!(section = title, "section missing from the curated status page"),
            }
        }

        info!(count = discovered.len(), "discovered addins from the curated list");
        context.addins.append(&mut discovered);
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

    const STATUS_PAGE: &str = "\
# Recipes

| Name | Maintainer |
|------|------------|
| [Cake.Recipe](https://github.com/cake-contrib/Cake.Recipe) | someone |

# Modules

| Name | Maintainer |
|------|------------|
| [Cake.DotNetTool.Module](https://github.com/cake-contrib/Cake.DotNetTool.Module) | someone |

# Addins

| Name | Maintainer |
|------|------------|
| [Cake.Foo](https://github.com/cake-contrib/Cake.Foo) | someone |
| [Cake.Bar](https://www.nuget.org/packages/Cake.Bar) | someone else |
";

    #[tokio::test]
    async fn test_harvests_every_configured_section() {
        let host = MockRepositoryHost::new();
        host.add_file(
            CURATED_LISTING_OWNER,
            CURATED_LISTING_REPO,
            CURATED_LISTING_PATH,
            STATUS_PAGE,
        );

        let mut context = RunContext::new(RunServices::new(
            AuditOptions::default(),
            Arc::new(host),
            Arc::new(StaticNormalizer::empty()),
        ));
        DiscoverByCuratedListStep.execute(&mut context).await.unwrap();

        let names: Vec<&str> = context.addins.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Cake.Recipe",
                "Cake.DotNetTool.Module",
                "Cake.Foo",
                "Cake.Bar"
            ]
        );

        let foo = context.addins.iter().find(|a| a.name == "Cake.Foo").unwrap();
        assert!(foo.is_linked());
        let bar = context.addins.iter().find(|a| a.name == "Cake.Bar").unwrap();
        assert!(!bar.is_linked());
    }

    #[test]
    fn test_section_content_stops_at_next_heading() {
        let section = section_content(STATUS_PAGE, "Recipes").unwrap();
        assert!(section.contains("Cake.Recipe"));
        assert!(!section.contains("Cake.Foo"));
    }

    #[test]
    fn test_final_section_runs_to_end_of_document() {
        let section = section_content(STATUS_PAGE, "Addins").unwrap();
        assert!(section.contains("Cake.Bar"));
    }

    #[test]
    fn test_missing_section_is_none() {
        assert!(section_content(STATUS_PAGE, "Websites").is_none());
    }
}
