use crate::pipeline::context::RunContext;
use crate::pipeline::step::Step;
use crate::report::{ReportRenderer, SpreadsheetRenderer};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

pub struct SpreadsheetReportStep;

#[async_trait]
impl Step for SpreadsheetReportStep {
    fn name(&self) -> &'static str {
        "spreadsheet-report"
    }

    fn should_run(&self, context: &RunContext) -> bool {
        context.services.options.spreadsheet_report
    }

    fn persists(&self) -> bool {
        false
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        let renderer = SpreadsheetRenderer;
        let report = renderer.render(&context.addins, &context.services.options.cake_version);

        let path = context.services.options.work_dir.join(renderer.file_name());
        tokio::fs::write(&path, report)
            .await
            .with_context(|| format!("failed to write report {}", path.display()))?;

        info!(path = %path.display(), "spreadsheet report written");
        Ok(())
    }
}
