use crate::descriptor::parse_references;
use crate::models::{AddinMetadata, PackageReference};
use crate::pipeline::context::{RunContext, RunServices};
use crate::pipeline::step::Step;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::path::Path;

const STAGE: &str = "find-references";

/// Parses the downloaded descriptors and records every declared package
/// reference, deduplicated per package id.
pub struct FindReferencesStep;

async fn collect_from_folder<T>(
    folder: &Path,
    parse: impl Fn(&str) -> Vec<T>,
    notes: &mut Vec<(String, String)>,
) -> Result<Vec<T>> {
    let mut collected = Vec::new();
    if !folder.exists() {
        return Ok(collected);
    }

    let mut entries = tokio::fs::read_dir(folder).await?;
    while let Some(entry) = entries.next_entry().await? {
        match tokio::fs::read_to_string(entry.path()).await {
            Ok(content) => collected.extend(parse(&content)),
            Err(error) => notes.push((
                entry.path().display().to_string(),
                error.to_string(),
            )),
        }
    }

    Ok(collected)
}

fn process<'a>(
    services: &'a RunServices,
    addin: &'a mut AddinMetadata,
) -> BoxFuture<'a, Result<()>> {
    async move {
        if addin.references.is_some() {
            return Ok(());
        }

        let folder = services.options.addin_folder(&addin.name);
        let mut failures = Vec::new();
        let raw: Vec<PackageReference> =
            collect_from_folder(&folder, parse_references, &mut failures).await?;

        for (file, error) in failures {
            addin.add_note(STAGE, format!("failed to read {file}: {error}"));
        }
        addin.set_references(raw);
        Ok(())
    }
    .boxed()
}

#[async_trait]
impl Step for FindReferencesStep {
    fn name(&self) -> &'static str {
        STAGE
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        context.for_each_addin(STAGE, process).await;
        Ok(())
    }
}
