use super::context::RunContext;
use super::step::Step;
use super::steps;
use crate::snapshot::SnapshotStore;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{debug, info};

pub struct Orchestrator {
    steps: Vec<Box<dyn Step>>,
}

impl Orchestrator {
    /// The standard audit pipeline, in execution order.
    pub fn standard() -> Self {
        Self {
            steps: steps::standard_steps(),
        }
    }

    pub fn with_steps(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    /// Advances through the steps strictly in sequence, snapshotting the
    /// record set after every mutating step.
    ///
    /// Step-level failures are fatal by design: everything recoverable is
    /// already absorbed into per-record notes inside the step, so an error
    /// escaping a step means the run's own infrastructure is broken and
    /// continuing would produce a corrupt report.
    pub async fn run(&self, context: &mut RunContext, store: &SnapshotStore) -> Result<()> {
        let start = Instant::now();
        info!(steps = self.steps.len(), "starting audit pipeline");

        let progress = ProgressBar::new(self.steps.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        for step in &self.steps {
            let name = step.name();
            progress.set_message(name.to_string());

            if !step.should_run(context) {
                debug!(step = name, "precondition not met, skipping");
                progress.inc(1);
                continue;
            }

            info!(step = name, records = context.addins.len(), "starting step");
            let step_start = Instant::now();

            step.execute(context)
                .await
                .with_context(|| format!("step {name} failed"))?;

            if step.persists() {
                store
                    .save(&context.addins)
                    .with_context(|| format!("failed to snapshot after step {name}"))?;
            }

            info!(
                step = name,
                duration_ms = step_start.elapsed().as_millis() as u64,
                "step complete"
            );
            progress.inc(1);
        }

        progress.finish_and_clear();
        info!(
            records = context.addins.len(),
            total_time_ms = start.elapsed().as_millis() as u64,
            "audit pipeline complete"
        );

        Ok(())
    }
}
