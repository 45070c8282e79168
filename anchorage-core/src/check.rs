// The run pipeline: populate, classify, validate fragments, check host hints,
// verify external targets and close the report stream

use crate::classify::{classify, follow_filter};
use crate::config::CheckConfig;
use crate::error::Result;
use crate::external::{TargetGroup, check_redirects, check_status, group_targets};
use crate::fragment::{check_fragments, is_eligible};
use crate::hints::check_hosts;
use crate::mixed::{ReferencingEdge, check_mixed_content};
use crate::model::{Asset, AssetId, Relation};
use crate::provider::GraphProvider;
use crate::report::{Check, Tally};
use crate::reporter::Reporter;
use anchorage_scanner::{HostResolver, ProgressCallback, Verifier};
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

pub struct Checker {
    config: CheckConfig,
    verifier: Verifier,
    resolver: HostResolver,
}

impl Checker {
    pub fn new(config: CheckConfig) -> Result<Self> {
        config.validate()?;
        let verifier = Verifier::with_timeout(config.timeout)?
            .with_concurrency(config.concurrency)?
            .with_cooldown(config.cooldown)
            .with_cooldown_retry(config.cooldown_retry)
            .with_max_redirects(config.max_redirects);
        let resolver = HostResolver::new(config.concurrency);

        Ok(Self {
            config,
            verifier,
            resolver,
        })
    }

    /// Called once per verified URL with the running count.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.verifier = self.verifier.with_progress_callback(callback);
        self
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Run every check against the provider's graph and close the reporter.
    /// Only a fatal provider error or a closed reporter ends the run early.
    pub async fn run<P: GraphProvider>(
        &self,
        provider: &mut P,
        reporter: &mut Reporter,
    ) -> Result<Tally> {
        info!("Checking site rooted at {}", self.config.root);

        let follow = follow_filter(&self.config);
        provider
            .populate(follow.as_ref(), self.config.population_concurrency)
            .await?;

        let provider_reports = provider.drain_reports();
        if !provider_reports.is_empty() {
            reporter.push_section(Check::Load.as_str())?;
            reporter.push_all(provider_reports)?;
        }

        let relations = provider.find_relations(&|_: &Relation| true);
        self.release_leaves(provider, &relations);

        let classification = classify(relations, &self.config);
        info!(
            "{} relations to populate, {} to verify, {} internal links, {} host hints, {} ignored",
            classification.populate.len(),
            classification.verify.len(),
            classification.navigate.len(),
            classification.host_checks.len(),
            classification.ignored.len()
        );

        let anchors: Vec<Relation> = classification
            .populate
            .iter()
            .chain(classification.verify.iter())
            .chain(classification.navigate.iter())
            .filter(|relation| is_eligible(relation))
            .cloned()
            .collect();
        if !anchors.is_empty() {
            reporter.push_section(Check::FragmentCheck.as_str())?;
            reporter.push_all(check_fragments(provider, &anchors))?;
        }

        for asset in provider.find_assets(&|asset: &Asset| asset.is_loaded) {
            provider.release(asset.id);
        }

        if !classification.host_checks.is_empty() {
            reporter.push_section("host-check")?;
            reporter.push_all(check_hosts(&self.resolver, &classification.host_checks).await)?;
        }

        let groups = group_targets(classification.verify);
        if !groups.is_empty() {
            reporter.push_section(Check::ExternalCheck.as_str())?;
            self.verify_groups(provider, reporter, groups).await?;
        }

        let tally = reporter.close();
        info!(
            "Check complete: {} findings, {} passed, {} failed, {} skipped, {} todo",
            tally.count, tally.pass, tally.fail, tally.skip, tally.todo
        );
        Ok(tally)
    }

    async fn verify_groups<P: GraphProvider>(
        &self,
        provider: &P,
        reporter: &mut Reporter,
        groups: Vec<TargetGroup>,
    ) -> Result<()> {
        let urls: Vec<String> = groups.iter().map(|group| group.url.clone()).collect();
        let by_url: HashMap<String, TargetGroup> = groups
            .into_iter()
            .map(|group| (group.url.clone(), group))
            .collect();

        let mut outcomes = Box::pin(self.verifier.verify_all(urls));
        while let Some(outcome) = outcomes.next().await {
            let Some(group) = by_url.get(&outcome.url) else {
                warn!("Verified {} but no relation points at it", outcome.url);
                continue;
            };
            debug!("{} -> {}", group.url, outcome.chain_string());

            reporter.push(check_status(&outcome, group))?;
            if let Some(report) = check_redirects(&outcome, group) {
                reporter.push(report)?;
            }

            let edges: Vec<ReferencingEdge<'_>> = group
                .relations
                .iter()
                .map(|relation| ReferencingEdge {
                    relation,
                    secure_origin: provider.is_secure_context(relation.from),
                })
                .collect();
            if let Some(report) = check_mixed_content(&outcome, &edges) {
                reporter.push(report)?;
            }
        }
        Ok(())
    }

    /// Loaded assets nothing more is wanted from: no outgoing relations and
    /// not the target of a fragment that still has to be looked up.
    fn release_leaves<P: GraphProvider>(&self, provider: &mut P, relations: &[Relation]) {
        let sources: HashSet<AssetId> = relations.iter().map(|relation| relation.from).collect();
        let fragment_targets: HashSet<AssetId> = relations
            .iter()
            .filter(|relation| is_eligible(relation))
            .filter_map(|relation| provider.target_of(relation))
            .collect();

        let leaves: Vec<AssetId> = provider
            .find_assets(&|asset: &Asset| asset.is_loaded)
            .into_iter()
            .map(|asset| asset.id)
            .filter(|id| !sources.contains(id) && !fragment_targets.contains(id))
            .collect();
        debug!("Releasing {} leaf assets", leaves.len());
        for id in leaves {
            provider.release(id);
        }
    }
}
