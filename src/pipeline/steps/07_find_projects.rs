use crate::models::AddinMetadata;
use crate::pipeline::context::{RunContext, RunServices};
use crate::pipeline::step::Step;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use regex::Regex;
use std::sync::OnceLock;

const STAGE: &str = "find-projects";

/// Extracts the descriptor paths referenced by each addin's solution file.
pub struct FindProjectsStep;

fn project_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?m)^Project\("\{[^}]*\}"\)\s*=\s*"[^"]*",\s*"([^"]+)""#)
            .expect("project line pattern is valid")
    })
}

/// Project paths in a solution file are relative to the solution and use
/// backslash separators. Test projects are not part of the shipped addin
/// and are skipped.
fn project_paths_from_solution(solution_path: &str, content: &str) -> Vec<String> {
    let solution_dir = solution_path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("");

    project_line_pattern()
        .captures_iter(content)
        .map(|captures| captures[1].replace('\\', "/"))
        .filter(|path| {
            let lower = path.to_lowercase();
            lower.ends_with(".csproj") && !lower.ends_with(".tests.csproj")
        })
        .map(|path| {
            if solution_dir.is_empty() {
                path
            } else {
                format!("{solution_dir}/{path}")
            }
        })
        .collect()
}

fn process<'a>(
    services: &'a RunServices,
    addin: &'a mut AddinMetadata,
) -> BoxFuture<'a, Result<()>> {
    async move {
        if addin.project_paths.is_some() {
            return Ok(());
        }
        let Some(solution_path) = addin.solution_path.clone() else {
            return Ok(());
        };
        let owner = addin.repository_owner.clone().unwrap_or_default();
        let repo = addin.repository_name.clone().unwrap_or_default();

        let bytes = services
            .github
            .get_file_content(&owner, &repo, &solution_path)
            .await?;
        let content = String::from_utf8_lossy(&bytes);

        let paths = project_paths_from_solution(&solution_path, &content);
        if paths.is_empty() {
            addin.add_note(STAGE, "the solution file does not reference any project");
        }
        addin.project_paths = Some(paths);
        Ok(())
    }
    .boxed()
}

#[async_trait]
impl Step for FindProjectsStep {
    fn name(&self) -> &'static str {
        STAGE
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        context.for_each_addin(STAGE, process).await;
        Ok(())
    }
}
