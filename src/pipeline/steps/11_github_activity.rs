use crate::models::AddinMetadata;
use crate::pipeline::context::{RunContext, RunServices};
use crate::pipeline::step::Step;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

const STAGE: &str = "github-activity";

/// Records how many issues and pull requests are open against each linked
/// addin's repository; the report surfaces these as maintenance signals.
pub struct GithubActivityStep;

fn process<'a>(
    services: &'a RunServices,
    addin: &'a mut AddinMetadata,
) -> BoxFuture<'a, Result<()>> {
    async move {
        if !addin.is_linked() {
            return Ok(());
        }
        if addin.open_issues_count.is_some() && addin.open_pull_requests_count.is_some() {
            return Ok(());
        }
        let owner = addin.repository_owner.clone().unwrap_or_default();
        let repo = addin.repository_name.clone().unwrap_or_default();

        let issues = services.github.count_open_issues(&owner, &repo).await?;
        let pulls = services.github.count_open_pull_requests(&owner, &repo).await?;

        addin.open_issues_count = Some(issues);
        addin.open_pull_requests_count = Some(pulls);
        Ok(())
    }
    .boxed()
}

#[async_trait]
impl Step for GithubActivityStep {
    fn name(&self) -> &'static str {
        STAGE
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        context.for_each_addin(STAGE, process).await;
        Ok(())
    }
}
