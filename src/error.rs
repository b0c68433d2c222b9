//! Error types for building and reconciling the Keystone registration.
//!
//! Errors are split by the layer that raises them:
//!
//! - [`ConfigError`] - invalid or missing configuration, raised before any
//!   store call is made
//! - [`DependencyError`] - a dependent resource whose parent is missing
//! - [`ApplyError`](crate::store::ApplyError) - failures reported by the
//!   identity store
//! - [`ReconcileError`] - the per-resource failure carried in a report
//!
//! [`Error`] ties them together for callers that drive a whole pass.

use crate::resource::{ResourceKey, ResourceKind};
use crate::store::ApplyError;
use std::fmt;

/// Main error type for driving a reconciliation pass end to end.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration could not be turned into a desired state
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The identity store failed outside of a per-resource apply
    #[error("Identity store error: {0}")]
    Store(#[from] ApplyError),
}

/// Errors for invalid or missing configuration.
///
/// These are raised by the desired-state builder and the configuration
/// sources. Nothing has been applied when one of them surfaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required parameter is absent
    #[error("Required parameter '{name}' is missing")]
    MissingParameter { name: String },

    /// Parameter has the wrong type or is not recognised
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Parameter has the right type but an unusable value
    #[error("Parameter '{name}' has invalid value: {reason}")]
    InvalidValue { name: String, reason: String },

    /// A resource key segment cannot be represented
    #[error("Invalid {kind} key '{value}': {reason}")]
    InvalidKey {
        kind: ResourceKind,
        value: String,
        reason: String,
    },

    /// A present resource lacks an attribute its kind requires
    #[error("{kind} '{key}' is missing required attribute '{attribute}'")]
    MissingAttribute {
        kind: ResourceKind,
        key: String,
        attribute: String,
    },

    /// The same key was declared twice in one desired state
    #[error("{kind} '{key}' is declared more than once")]
    DuplicateKey { kind: ResourceKind, key: String },

    /// The configuration source could not be read
    #[error("Configuration source error: {message}")]
    Source { message: String },
}

/// Why a dependent resource could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyReason {
    /// Parent is neither declared nor present in the store
    Missing,
    /// Parent is declared absent while the dependent is declared present
    ParentAbsent,
    /// Parent was declared but failed to apply and is not present
    ParentFailed,
}

/// A dependent resource references a parent that cannot be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{} '{}' depends on {} '{}' which is {}",
    .key.kind(),
    .key,
    .parent.kind(),
    .parent,
    .reason
)]
pub struct DependencyError {
    pub key: ResourceKey,
    pub parent: ResourceKey,
    pub reason: DependencyReason,
}

impl fmt::Display for DependencyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DependencyReason::Missing => "neither declared nor present",
            DependencyReason::ParentAbsent => "declared absent",
            DependencyReason::ParentFailed => "failed to apply",
        };
        f.write_str(text)
    }
}

/// Failure of a single resource within a reconciliation pass.
///
/// Configuration problems never show up here: a [`ConfigError`] fails the
/// whole pass before any resource is touched.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    /// Final store failure, after any retries
    #[error("Apply failed after {attempts} attempt(s): {source}")]
    Apply {
        attempts: u32,
        #[source]
        source: ApplyError,
    },
}

impl ReconcileError {
    /// Whether the failure came from the store and was worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, ReconcileError::Apply { source, .. } if source.is_transient())
    }
}

/// Result type for whole-pass operations.
pub type Result<T> = std::result::Result<T, Error>;
