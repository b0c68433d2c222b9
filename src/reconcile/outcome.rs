//! Per-resource outcomes and the report of a whole pass.

use crate::error::ReconcileError;
use crate::resource::{ResourceKey, ResourceKind};
use chrono::{DateTime, Utc};
use std::fmt;

/// What a pass did to one resource.
#[derive(Debug, Clone)]
pub enum Outcome {
    Created,
    /// Only the listed attributes were sent to the store.
    Updated {
        changed: Vec<String>,
    },
    Unchanged,
    Deleted,
    Failed(ReconcileError),
}

impl Outcome {
    /// Whether the store was written to.
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Outcome::Created | Outcome::Updated { .. } | Outcome::Deleted
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Created => "created",
            Outcome::Updated { .. } => "updated",
            Outcome::Unchanged => "unchanged",
            Outcome::Deleted => "deleted",
            Outcome::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Updated { changed } => write!(f, "updated ({})", changed.join(", ")),
            Outcome::Failed(err) => write!(f, "failed: {}", err),
            other => f.write_str(other.label()),
        }
    }
}

/// Outcome for one resource key.
#[derive(Debug, Clone)]
pub struct ResourceOutcome {
    pub key: ResourceKey,
    pub outcome: Outcome,
}

impl ResourceOutcome {
    pub fn kind(&self) -> ResourceKind {
        self.key.kind()
    }
}

/// Counts of each outcome in a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} unchanged, {} deleted, {} failed",
            self.created, self.updated, self.unchanged, self.deleted, self.failed
        )
    }
}

/// A managed kind whose store records could not be listed.
///
/// Undeclared records of that kind were not swept in this pass.
#[derive(Debug, Clone)]
pub struct SweepFailure {
    pub kind: ResourceKind,
    pub error: ReconcileError,
}

/// Result of one reconciliation pass.
///
/// Outcomes are ordered by tier, then by key.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub pass_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    outcomes: Vec<ResourceOutcome>,
    sweep_failures: Vec<SweepFailure>,
}

impl ReconcileReport {
    pub(crate) fn new(
        pass_id: String,
        started_at: DateTime<Utc>,
        outcomes: Vec<ResourceOutcome>,
        sweep_failures: Vec<SweepFailure>,
    ) -> Self {
        Self {
            pass_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
            sweep_failures,
        }
    }

    pub fn sweep_failures(&self) -> &[SweepFailure] {
        &self.sweep_failures
    }

    pub fn outcomes(&self) -> &[ResourceOutcome] {
        &self.outcomes
    }

    pub fn get(&self, key: &ResourceKey) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| &o.key == key)
            .map(|o| &o.outcome)
    }

    /// True when no resource failed and every managed kind was swept.
    pub fn is_converged(&self) -> bool {
        self.sweep_failures.is_empty() && !self.outcomes.iter().any(|o| o.outcome.is_failure())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ResourceKey, &ReconcileError)> {
        self.outcomes.iter().filter_map(|o| match &o.outcome {
            Outcome::Failed(err) => Some((&o.key, err)),
            _ => None,
        })
    }

    /// Keys the pass wrote to the store.
    ///
    /// Callers use this to restart whatever depends on the registration,
    /// for example the Ironic API after its endpoint moved.
    pub fn changed(&self) -> impl Iterator<Item = &ResourceKey> {
        self.outcomes
            .iter()
            .filter(|o| o.outcome.is_change())
            .map(|o| &o.key)
    }

    /// Whether any resource of `kind` was written to the store.
    pub fn changed_kind(&self, kind: ResourceKind) -> bool {
        self.changed().any(|key| key.kind() == kind)
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for o in &self.outcomes {
            match o.outcome {
                Outcome::Created => summary.created += 1,
                Outcome::Updated { .. } => summary.updated += 1,
                Outcome::Unchanged => summary.unchanged += 1,
                Outcome::Deleted => summary.deleted += 1,
                Outcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for o in &self.outcomes {
            writeln!(f, "{:<9} {:<40} {}", o.kind(), o.key.to_string(), o.outcome)?;
        }
        for sweep in &self.sweep_failures {
            writeln!(f, "{:<9} {:<40} not swept: {}", sweep.kind, "*", sweep.error)?;
        }
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ApplyError;

    fn report(outcomes: Vec<(ResourceKey, Outcome)>) -> ReconcileReport {
        let outcomes = outcomes
            .into_iter()
            .map(|(key, outcome)| ResourceOutcome { key, outcome })
            .collect();
        ReconcileReport::new("pass".to_string(), Utc::now(), outcomes, Vec::new())
    }

    #[test]
    fn summary_and_changes() {
        let user = ResourceKey::user("ironic").unwrap();
        let service = ResourceKey::service("ironic", "baremetal").unwrap();
        let endpoint = ResourceKey::endpoint("RegionOne", "ironic", "baremetal").unwrap();
        let report = report(vec![
            (user.clone(), Outcome::Unchanged),
            (service.clone(), Outcome::Created),
            (
                endpoint.clone(),
                Outcome::Updated {
                    changed: vec!["public_url".to_string()],
                },
            ),
        ]);

        assert!(report.is_converged());
        assert_eq!(
            report.summary(),
            ReportSummary {
                created: 1,
                updated: 1,
                unchanged: 1,
                ..ReportSummary::default()
            }
        );
        let changed: Vec<_> = report.changed().cloned().collect();
        assert_eq!(changed, vec![service, endpoint]);
        assert!(report.changed_kind(ResourceKind::Endpoint));
        assert!(!report.changed_kind(ResourceKind::User));
    }

    #[test]
    fn failures_break_convergence() {
        let user = ResourceKey::user("ironic").unwrap();
        let report = report(vec![(
            user.clone(),
            Outcome::Failed(ReconcileError::Apply {
                attempts: 3,
                source: ApplyError::Unavailable {
                    message: "503".to_string(),
                },
            }),
        )]);

        assert!(!report.is_converged());
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, &user);
        assert_eq!(report.summary().failed, 1);
        assert!(report.to_string().contains("failed: Apply failed after 3 attempt(s)"));
    }
}
