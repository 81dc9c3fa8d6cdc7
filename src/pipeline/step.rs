use super::context::RunContext;
use anyhow::Result;
use async_trait::async_trait;

/// One stage of the audit pipeline.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    /// Steps whose precondition is not met are skipped entirely; a skipped
    /// step still counts as a completed tick for progress accounting.
    fn should_run(&self, context: &RunContext) -> bool {
        let _ = context;
        true
    }

    /// Whether the step mutates the record set and therefore requires a
    /// snapshot once its barrier completes.
    fn persists(&self) -> bool {
        true
    }

    async fn execute(&self, context: &mut RunContext) -> Result<()>;
}
