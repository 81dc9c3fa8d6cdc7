use crate::models::AnalysisResult;
use crate::pipeline::context::RunContext;
use crate::pipeline::step::Step;
use anyhow::Result;
use async_trait::async_trait;

/// Clears every record's derived analysis before re-deriving it.
///
/// Analysis is a pure function of the record's final state, so it is never
/// carried over between runs — resumed runs keep the expensively crawled
/// fields and recompute everything derived.
pub struct ResetAnalysisStep;

#[async_trait]
impl Step for ResetAnalysisStep {
    fn name(&self) -> &'static str {
        "reset-analysis"
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        for addin in &mut context.addins {
            addin.analysis = AnalysisResult::default();
        }
        Ok(())
    }
}
