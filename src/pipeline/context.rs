use crate::config::AuditOptions;
use crate::github::{Issue, RepositoryHost};
use crate::models::AddinMetadata;
use crate::registry::UrlNormalizer;
use anyhow::{anyhow, Result};
use futures_util::future::{join_all, BoxFuture};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::debug;

/// Shared collaborators and caches, alive for exactly one run.
pub struct RunServices {
    pub options: AuditOptions,
    pub github: Arc<dyn RepositoryHost>,
    pub normalizer: Arc<dyn UrlNormalizer>,
    limiter: Semaphore,
    issue_cache: Mutex<HashMap<(String, String), Arc<Vec<Issue>>>>,
}

impl RunServices {
    pub fn new(
        options: AuditOptions,
        github: Arc<dyn RepositoryHost>,
        normalizer: Arc<dyn UrlNormalizer>,
    ) -> Self {
        let limiter = Semaphore::new(options.concurrency);
        Self {
            options,
            github,
            normalizer,
            limiter,
            issue_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Open issues filed by the configured actor in `owner/repo`, fetched
    /// once per run and served from the cache afterwards.
    pub async fn issues_by_actor(&self, owner: &str, repo: &str) -> Result<Arc<Vec<Issue>>> {
        let actor = self
            .options
            .github_user
            .as_deref()
            .ok_or_else(|| anyhow!("no GitHub user configured"))?;

        let key = (owner.to_string(), repo.to_string());
        let mut cache = self.issue_cache.lock().await;
        if let Some(issues) = cache.get(&key) {
            return Ok(Arc::clone(issues));
        }

        let issues = Arc::new(self.github.find_issues_by_creator(owner, repo, actor).await?);
        cache.insert(key, Arc::clone(&issues));
        Ok(issues)
    }
}

/// The record set and everything a step needs to enrich it.
pub struct RunContext {
    pub services: RunServices,
    pub addins: Vec<AddinMetadata>,
    /// Set when the run started from an existing snapshot; discovery and
    /// merge are skipped in that case.
    pub resumed: bool,
}

impl RunContext {
    pub fn new(services: RunServices) -> Self {
        Self {
            services,
            addins: Vec::new(),
            resumed: false,
        }
    }

    /// Runs `op` concurrently for every record in the set.
    ///
    /// Each future owns exactly one record for the duration of the stage;
    /// fan-out is bounded by the configured concurrency limit and every
    /// operation is individually timed out. A failed or timed-out
    /// operation appends a note tagged with `stage` to its own record and
    /// never disturbs the others. Returning from this function is the
    /// stage barrier.
    pub async fn for_each_addin<F>(&mut self, stage: &str, op: F)
    where
        F: for<'a> Fn(&'a RunServices, &'a mut AddinMetadata) -> BoxFuture<'a, Result<()>>,
    {
        let Self {
            services, addins, ..
        } = self;
        let services: &RunServices = services;
        let op_timeout = Duration::from_secs(services.options.op_timeout_secs);

        let tasks = addins.iter_mut().map(|addin| {
            let op = &op;
            async move {
                let _permit = match services.limiter.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };

                let outcome = match tokio::time::timeout(op_timeout, op(services, &mut *addin)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(anyhow!(
                        "operation timed out after {}s",
                        op_timeout.as_secs()
                    )),
                };

                if let Err(error) = outcome {
                    debug!(stage, addin = %addin.name, error = %error, "recorded recoverable failure");
                    addin.add_note(stage, format!("{error:#}"));
                }
            }
        });

        join_all(tasks).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::MockRepositoryHost;
    use crate::models::DiscoverySource;
    use crate::registry::StaticNormalizer;
    use futures_util::FutureExt;

    fn context_with(addins: Vec<AddinMetadata>) -> RunContext {
        let services = RunServices::new(
            AuditOptions {
                github_user: Some("audit-bot".to_string()),
                ..Default::default()
            },
            Arc::new(MockRepositoryHost::new()),
            Arc::new(StaticNormalizer::empty()),
        );
        let mut context = RunContext::new(services);
        context.addins = addins;
        context
    }

    fn faulty_op<'a>(
        _services: &'a RunServices,
        addin: &'a mut AddinMetadata,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            if addin.name == "Cake.B" {
                anyhow::bail!("simulated fault");
            }
            addin.solution_path = Some("found.sln".to_string());
            Ok(())
        }
        .boxed()
    }

    fn slow_op<'a>(
        _services: &'a RunServices,
        _addin: &'a mut AddinMetadata,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
        .boxed()
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_its_own_record() {
        let mut context = context_with(vec![
            AddinMetadata::new("Cake.A", DiscoverySource::YamlListing),
            AddinMetadata::new("Cake.B", DiscoverySource::YamlListing),
            AddinMetadata::new("Cake.C", DiscoverySource::YamlListing),
        ]);

        context.for_each_addin("enrich", faulty_op).await;

        assert_eq!(context.addins.len(), 3);
        assert_eq!(context.addins[0].solution_path.as_deref(), Some("found.sln"));
        assert_eq!(context.addins[2].solution_path.as_deref(), Some("found.sln"));

        let failed = &context.addins[1];
        assert!(failed.solution_path.is_none());
        assert_eq!(failed.analysis.notes, vec!["enrich: simulated fault".to_string()]);
    }

    #[tokio::test]
    async fn test_timeout_is_a_recoverable_failure() {
        let mut context = context_with(vec![AddinMetadata::new(
            "Cake.Slow",
            DiscoverySource::YamlListing,
        )]);
        context.services.options.op_timeout_secs = 1;

        context.for_each_addin("enrich", slow_op).await;

        assert!(context.addins[0].analysis.notes[0].contains("timed out"));
    }

    #[tokio::test]
    async fn test_issue_cache_fetches_once() {
        let host = Arc::new(MockRepositoryHost::new());
        host.add_repo("owner", "repo");
        host.seed_issues(
            "owner",
            "repo",
            "audit-bot",
            vec![Issue {
                number: 7,
                title: "Address audit findings".to_string(),
                html_url: "https://github.com/owner/repo/issues/7".to_string(),
            }],
        );

        let services = RunServices::new(
            AuditOptions {
                github_user: Some("audit-bot".to_string()),
                ..Default::default()
            },
            host,
            Arc::new(StaticNormalizer::empty()),
        );

        let first = services.issues_by_actor("owner", "repo").await.unwrap();
        let second = services.issues_by_actor("owner", "repo").await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
