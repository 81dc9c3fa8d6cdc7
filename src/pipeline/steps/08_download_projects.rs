use crate::models::AddinMetadata;
use crate::pipeline::context::{RunContext, RunServices};
use crate::pipeline::step::Step;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::debug;

const STAGE: &str = "download-projects";

/// Downloads each addin's descriptor files into the work dir so the
/// parsing steps (and any remediation) work off a local copy. Already
/// downloaded files are kept, which makes resumed runs cheap.
pub struct DownloadProjectsStep;

fn process<'a>(
    services: &'a RunServices,
    addin: &'a mut AddinMetadata,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let Some(project_paths) = addin.project_paths.clone() else {
            return Ok(());
        };
        if project_paths.is_empty() {
            return Ok(());
        }
        let owner = addin.repository_owner.clone().unwrap_or_default();
        let repo = addin.repository_name.clone().unwrap_or_default();

        let folder = services.options.addin_folder(&addin.name);
        tokio::fs::create_dir_all(&folder)
            .await
            .with_context(|| format!("failed to create {}", folder.display()))?;

        for path in &project_paths {
            let file_name = path.rsplit('/').next().unwrap_or(path);
            let local = folder.join(file_name);
            if local.exists() {
                debug!(addin = %addin.name, file = file_name, "already downloaded");
                continue;
            }

            match services.github.get_file_content(&owner, &repo, path).await {
                Ok(bytes) => {
                    if let Err(error) = tokio::fs::write(&local, bytes).await {
                        addin.add_note(STAGE, format!("failed to store {file_name}: {error}"));
                    }
                }
                Err(error) => {
                    // Keep going: one missing descriptor should not block
                    // the others.
                    addin.add_note(STAGE, format!("failed to download {path}: {error}"));
                }
            }
        }
        Ok(())
    }
    .boxed()
}

#[async_trait]
impl Step for DownloadProjectsStep {
    fn name(&self) -> &'static str {
        STAGE
    }

    /// Downloads only touch the filesystem cache, not the record set.
    fn persists(&self) -> bool {
        false
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        context.for_each_addin(STAGE, process).await;
        Ok(())
    }
}
