use crate::merge::merge_addins;
use crate::pipeline::context::RunContext;
use crate::pipeline::step::Step;
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Collapses the concatenated discovery lists into one record per name.
pub struct MergeAddinsStep;

#[async_trait]
impl Step for MergeAddinsStep {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn should_run(&self, context: &RunContext) -> bool {
        !context.resumed
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()> {
        let discovered = std::mem::take(&mut context.addins);
        let before = discovered.len();

        context.addins = merge_addins(discovered);
        info!(before, after = context.addins.len(), "merged discovery sources");
        Ok(())
    }
}
