use crate::analysis::classify;
use crate::config::EXPECTED_ICON_URL;
use crate::pipeline::context::RunContext;
use crate::pipeline::step::Step;
use anyhow::Result;
use async_trait::async_trait;

/// Derives every record's compliance flags from its accumulated metadata.
pub struct AnalyzeStep;

#[async_trait]
impl Step for AnalyzeStep {
    fn name(&self) -> &'static str {
        "analyze"
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        let cake = context.services.options.cake_version;

        for addin in &mut context.addins {
            // Notes accumulated by earlier stages survive classification.
            let notes = std::mem::take(&mut addin.analysis.notes);
            addin.analysis = classify(addin, &cake, EXPECTED_ICON_URL);
            addin.analysis.notes = notes;
        }

        Ok(())
    }
}
