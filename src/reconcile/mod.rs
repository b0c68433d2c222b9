//! Reconciliation engine.
//!
//! A [`Reconciler`] converges an [`IdentityStore`] toward a [`DesiredState`]
//! in two phases:
//!
//! 1. Users and services ([`Tier::Base`]).
//! 2. Role grants and endpoints ([`Tier::Dependent`]), once every base
//!    resource has been applied or has failed.
//!
//! Within a phase every resource is independent and is applied concurrently.
//!
//! For each declared resource the engine reads the store record and then
//! creates it, sends only the differing attributes, deletes it, or leaves it
//! alone. Store records of a managed kind that nothing declares are deleted;
//! records of unmanaged kinds are never touched.
//!
//! # Example
//!
//! ```rust
//! use ironic_keystone_auth::{KeystoneAuth, Reconciler};
//! use ironic_keystone_auth::config::KeystoneAuthParams;
//! use ironic_keystone_auth::store::InMemoryIdentityStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let desired = KeystoneAuth::new(KeystoneAuthParams::with_password("secret"))?
//!     .desired_state()?;
//! let reconciler = Reconciler::new(InMemoryIdentityStore::new());
//!
//! let first = reconciler.reconcile(&desired).await;
//! assert_eq!(first.summary().created, 4);
//!
//! let second = reconciler.reconcile(&desired).await;
//! assert_eq!(second.summary().unchanged, 4);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod outcome;

pub use config::{ReconcilerConfig, RetryPolicy};
pub use outcome::{Outcome, ReconcileReport, ReportSummary, ResourceOutcome, SweepFailure};

use crate::config::ConfigurationSource;
use crate::error::{ConfigError, DependencyError, DependencyReason, ReconcileError};
use crate::keystone_auth::KeystoneAuth;
use crate::resource::{Attributes, DesiredResource, DesiredState, Ensure, ResourceKey, Tier};
use crate::store::{ApplyError, IdentityStore};
use chrono::Utc;
use futures::future::join_all;
use log::{debug, info, trace, warn};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// One unit of work within a tier.
enum Task<'a> {
    Declared(&'a DesiredResource),
    /// A store record of a managed kind that nothing declares.
    Undeclared(ResourceKey),
}

/// Converges an identity store toward a desired state.
#[derive(Debug, Clone)]
pub struct Reconciler<S: IdentityStore> {
    store: S,
    config: ReconcilerConfig,
}

impl<S: IdentityStore> Reconciler<S> {
    /// Create a reconciler with the default retry policy and no timeout.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ReconcilerConfig::default())
    }

    pub fn with_config(store: S, config: ReconcilerConfig) -> Self {
        Self { store, config }
    }

    pub fn builder(store: S) -> ReconcilerBuilder<S> {
        ReconcilerBuilder {
            store,
            config: ReconcilerConfig::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Load parameters from `source`, build the desired state and reconcile.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]; nothing is applied in that case.
    pub async fn run(
        &self,
        source: &impl ConfigurationSource,
    ) -> Result<ReconcileReport, ConfigError> {
        let auth = KeystoneAuth::from_source(source).await?;
        let desired = auth.desired_state()?;
        Ok(self.reconcile(&desired).await)
    }

    /// Run one pass.
    ///
    /// Never fails as a whole: every problem is reported against the
    /// resource it concerns.
    pub async fn reconcile(&self, desired: &DesiredState) -> ReconcileReport {
        let pass_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(
            "Starting reconciliation pass '{}' ({} declared resource(s), managing {:?})",
            pass_id,
            desired.len(),
            desired.managed_kinds().collect::<Vec<_>>()
        );

        let mut outcomes: Vec<ResourceOutcome> = Vec::new();
        let mut sweep_failures = Vec::new();
        for tier in Tier::ORDERED {
            let (tier_outcomes, tier_sweeps) = self.reconcile_tier(tier, desired, &outcomes).await;
            outcomes.extend(tier_outcomes);
            sweep_failures.extend(tier_sweeps);
        }

        let report = ReconcileReport::new(pass_id, started_at, outcomes, sweep_failures);
        if report.is_converged() {
            info!("Pass '{}' converged: {}", report.pass_id, report.summary());
        } else {
            warn!("Pass '{}' did not converge: {}", report.pass_id, report.summary());
        }
        report
    }

    async fn reconcile_tier(
        &self,
        tier: Tier,
        desired: &DesiredState,
        completed: &[ResourceOutcome],
    ) -> (Vec<ResourceOutcome>, Vec<SweepFailure>) {
        let mut tasks: Vec<Task<'_>> = desired.tier(tier).map(Task::Declared).collect();
        let mut sweep_failures = Vec::new();

        for kind in tier.kinds() {
            if !desired.is_managed(kind) {
                debug!("{} is not managed, leaving store records untouched", kind);
                continue;
            }
            match self.call("list", &kind, || self.store.list(kind)).await {
                Ok(observed) => tasks.extend(
                    observed
                        .into_iter()
                        .filter(|record| !desired.contains(&record.key))
                        .map(|record| Task::Undeclared(record.key)),
                ),
                Err(error) => {
                    warn!("Could not list {} records, skipping sweep: {}", kind, error);
                    sweep_failures.push(SweepFailure { kind, error });
                }
            }
        }

        debug!("Applying {} resource(s) in {:?} tier", tasks.len(), tier);
        let mut outcomes = join_all(
            tasks
                .into_iter()
                .map(|task| self.converge(task, desired, completed)),
        )
        .await;
        outcomes.sort_by(|a, b| a.key.cmp(&b.key));
        (outcomes, sweep_failures)
    }

    async fn converge(
        &self,
        task: Task<'_>,
        desired: &DesiredState,
        completed: &[ResourceOutcome],
    ) -> ResourceOutcome {
        let (key, result) = match task {
            Task::Declared(resource) => (
                resource.key().clone(),
                self.converge_declared(resource, desired, completed).await,
            ),
            Task::Undeclared(key) => {
                let result = self.delete(&key).await;
                (key, result)
            }
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("{} '{}' failed: {}", key.kind(), key, err);
                Outcome::Failed(err)
            }
        };
        ResourceOutcome { key, outcome }
    }

    async fn converge_declared(
        &self,
        resource: &DesiredResource,
        desired: &DesiredState,
        completed: &[ResourceOutcome],
    ) -> Result<Outcome, ReconcileError> {
        let key = resource.key();
        self.check_dependency(resource, desired, completed).await?;

        let observed = self.call("get", key, || self.store.get(key)).await?;
        match (resource.ensure(), observed) {
            (Ensure::Present, None) => {
                self.apply(key, resource.attributes(), Ensure::Present)
                    .await?;
                info!("Created {} '{}'", key.kind(), key);
                Ok(Outcome::Created)
            }
            (Ensure::Present, Some(observed)) => {
                let changed = resource.diff(&observed);
                if changed.is_empty() {
                    debug!("{} '{}' is up to date", key.kind(), key);
                    return Ok(Outcome::Unchanged);
                }
                let names: Vec<String> = changed.keys().cloned().collect();
                self.apply(key, &changed, Ensure::Present).await?;
                info!("Updated {} '{}' ({})", key.kind(), key, names.join(", "));
                Ok(Outcome::Updated { changed: names })
            }
            (Ensure::Absent, Some(_)) => self.delete(key).await,
            (Ensure::Absent, None) => {
                debug!("{} '{}' is already absent", key.kind(), key);
                Ok(Outcome::Unchanged)
            }
        }
    }

    /// A present dependent needs its parent declared present or in the store.
    ///
    /// Absent dependents are not checked.
    async fn check_dependency(
        &self,
        resource: &DesiredResource,
        desired: &DesiredState,
        completed: &[ResourceOutcome],
    ) -> Result<(), ReconcileError> {
        let Some(parent) = resource.key().parent() else {
            return Ok(());
        };
        if !resource.ensure().is_present() {
            return Ok(());
        }

        let reason = match desired.get(&parent) {
            Some(declared) if !declared.ensure().is_present() => {
                return Err(dependency(resource.key(), parent, DependencyReason::ParentAbsent));
            }
            Some(_) => {
                let failed = completed
                    .iter()
                    .any(|o| o.key == parent && o.outcome.is_failure());
                if !failed {
                    return Ok(());
                }
                DependencyReason::ParentFailed
            }
            None => DependencyReason::Missing,
        };

        trace!("Looking up {} '{}' in the store", parent.kind(), parent);
        match self.call("get", &parent, || self.store.get(&parent)).await? {
            Some(_) => Ok(()),
            None => Err(dependency(resource.key(), parent, reason)),
        }
    }

    async fn delete(&self, key: &ResourceKey) -> Result<Outcome, ReconcileError> {
        self.apply(key, &Attributes::new(), Ensure::Absent).await?;
        info!("Deleted {} '{}'", key.kind(), key);
        Ok(Outcome::Deleted)
    }

    async fn apply(
        &self,
        key: &ResourceKey,
        attributes: &Attributes,
        ensure: Ensure,
    ) -> Result<(), ReconcileError> {
        trace!(
            "Applying {} '{}' ensure={} attributes={:?}",
            key.kind(),
            key,
            ensure,
            attributes.keys().collect::<Vec<_>>()
        );
        self.call("apply", key, || self.store.apply(key, attributes, ensure))
            .await
    }

    /// Run one store call under the retry policy and timeout.
    async fn call<T, F, Fut>(
        &self,
        operation: &str,
        target: &(dyn fmt::Display + Sync),
        mut op: F,
    ) -> Result<T, ReconcileError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApplyError>>,
    {
        let attempts = self.config.retry.attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match self.config.apply_timeout {
                Some(limit) => with_timeout(limit, operation, target, op()).await,
                None => op().await,
            };
            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < attempts => {
                    let delay = self.config.retry.backoff(attempt);
                    warn!(
                        "{} '{}' failed (attempt {}/{}): {}; retrying in {:?}",
                        operation, target, attempt, attempts, err, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    return Err(ReconcileError::Apply {
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }
}

async fn with_timeout<T>(
    limit: Duration,
    operation: &str,
    target: &(dyn fmt::Display + Sync),
    fut: impl Future<Output = Result<T, ApplyError>>,
) -> Result<T, ApplyError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ApplyError::Timeout {
            operation: format!("{} '{}'", operation, target),
            duration: limit,
        }),
    }
}

fn dependency(key: &ResourceKey, parent: ResourceKey, reason: DependencyReason) -> ReconcileError {
    ReconcileError::Dependency(DependencyError {
        key: key.clone(),
        parent,
        reason,
    })
}

/// Builder for [`Reconciler`].
#[derive(Debug)]
pub struct ReconcilerBuilder<S: IdentityStore> {
    store: S,
    config: ReconcilerConfig,
}

impl<S: IdentityStore> ReconcilerBuilder<S> {
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.retry.max_attempts = max_attempts;
        self
    }

    /// Bound each individual store call. A timeout counts as a transient failure.
    pub fn apply_timeout(mut self, limit: Duration) -> Self {
        self.config.apply_timeout = Some(limit);
        self
    }

    pub fn build(self) -> Reconciler<S> {
        Reconciler::with_config(self.store, self.config)
    }
}
