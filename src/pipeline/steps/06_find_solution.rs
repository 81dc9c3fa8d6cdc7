use crate::locator::find_solution_file;
use crate::models::AddinMetadata;
use crate::pipeline::context::{RunContext, RunServices};
use crate::pipeline::step::Step;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::debug;

const STAGE: &str = "find-solution";

/// Locates each linked addin's build-solution file.
pub struct FindSolutionStep;

fn process<'a>(
    services: &'a RunServices,
    addin: &'a mut AddinMetadata,
) -> BoxFuture<'a, Result<()>> {
    async move {
        if !addin.is_linked() || addin.solution_path.is_some() {
            return Ok(());
        }
        let owner = addin.repository_owner.clone().unwrap_or_default();
        let repo = addin.repository_name.clone().unwrap_or_default();

        match find_solution_file(services.github.as_ref(), &owner, &repo, None).await {
            Ok(Some(entry)) => {
                debug!(addin = %addin.name, path = %entry.path, "found solution");
                addin.solution_path = Some(entry.path);
            }
            Ok(None) => {
                addin.add_note(STAGE, "no solution file found in the repository");
            }
            Err(error) if error.is_not_found() => {
                let url = addin.repository_url.clone().unwrap_or_default();
                addin.add_note(STAGE, format!("the project does not exist: {url}"));
            }
            Err(error) => return Err(error.into()),
        }
        Ok(())
    }
    .boxed()
}

#[async_trait]
impl Step for FindSolutionStep {
    fn name(&self) -> &'static str {
        STAGE
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        context.for_each_addin(STAGE, process).await;
        Ok(())
    }
}
