//! Idempotent Keystone registration for the Ironic bare metal service.
//!
//! Declares the identity records Ironic needs in Keystone (a service user,
//! its role grant, the `baremetal` catalog service and its endpoint) and
//! converges an identity store toward them.
//!
//! # Core Components
//!
//! - [`KeystoneAuth`] - Validates parameters and builds the desired state
//! - [`Reconciler`] - Applies a desired state to a store in dependency order
//! - [`IdentityStore`] - Trait for implementing identity backends
//! - [`ConfigurationSource`](config::ConfigurationSource) - Where parameters come from
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ironic_keystone_auth::Reconciler;
//! use ironic_keystone_auth::config::JsonFileSource;
//! use ironic_keystone_auth::store::InMemoryIdentityStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reconciler = Reconciler::new(InMemoryIdentityStore::new());
//! let report = reconciler.run(&JsonFileSource::new("ironic-auth.json")).await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod keystone_auth;
pub mod reconcile;
pub mod resource;
pub mod store;

pub use error::{ConfigError, DependencyError, DependencyReason, Error, ReconcileError, Result};
pub use keystone_auth::KeystoneAuth;
pub use reconcile::{
    Outcome, ReconcileReport, Reconciler, ReconcilerBuilder, ReconcilerConfig, RetryPolicy,
};
pub use resource::{DesiredResource, DesiredState, Ensure, ResourceKey, ResourceKind};
pub use store::{ApplyError, IdentityStore, InMemoryIdentityStore, JsonFileIdentityStore};
