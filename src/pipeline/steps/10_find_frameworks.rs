use crate::descriptor::parse_target_frameworks;
use crate::models::AddinMetadata;
use crate::pipeline::context::{RunContext, RunServices};
use crate::pipeline::step::Step;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

const STAGE: &str = "find-frameworks";

/// Records the target frameworks declared across each addin's descriptors.
pub struct FindFrameworksStep;

fn process<'a>(
    services: &'a RunServices,
    addin: &'a mut AddinMetadata,
) -> BoxFuture<'a, Result<()>> {
    async move {
        if addin.frameworks.is_some() {
            return Ok(());
        }

        let folder = services.options.addin_folder(&addin.name);
        let mut frameworks: Vec<String> = Vec::new();

        if folder.exists() {
            let mut entries = tokio::fs::read_dir(&folder).await?;
            while let Some(entry) = entries.next_entry().await? {
                match tokio::fs::read_to_string(entry.path()).await {
                    Ok(content) => {
                        for framework in parse_target_frameworks(&content) {
                            if !frameworks.contains(&framework) {
                                frameworks.push(framework);
                            }
                        }
                    }
                    Err(error) => addin.add_note(
                        STAGE,
                        format!("failed to read {}: {error}", entry.path().display()),
                    ),
                }
            }
        }

        addin.frameworks = Some(frameworks);
        Ok(())
    }
    .boxed()
}

#[async_trait]
impl Step for FindFrameworksStep {
    fn name(&self) -> &'static str {
        STAGE
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        context.for_each_addin(STAGE, process).await;
        Ok(())
    }
}
