use crate::models::AddinMetadata;
use crate::pipeline::context::{RunContext, RunServices};
use crate::pipeline::step::Step;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::debug;

const STAGE: &str = "normalize-urls";

/// Resolves package-registry URLs to source-repository URLs so the record
/// can be linked.
pub struct NormalizeUrlStep;

fn process<'a>(
    services: &'a RunServices,
    addin: &'a mut AddinMetadata,
) -> BoxFuture<'a, Result<()>> {
    async move {
        if addin.is_linked() {
            return Ok(());
        }
        let Some(url) = addin.repository_url.clone() else {
            return Ok(());
        };

        let resolved = services.normalizer.resolve_canonical_project_url(&url).await?;
        if resolved != url {
            debug!(addin = %addin.name, from = %url, to = %resolved, "normalized URL");
        }

        addin.repository_url = Some(resolved);
        addin.link_from_url();
        Ok(())
    }
    .boxed()
}

#[async_trait]
impl Step for NormalizeUrlStep {
    fn name(&self) -> &'static str {
        STAGE
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        context.for_each_addin(STAGE, process).await;
        Ok(())
    }
}
