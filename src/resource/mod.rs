//! Resource model for the Keystone registration.
//!
//! Four kinds of record make up the registration of a service with the
//! identity service:
//!
//! - [`ResourceKind::User`] - the service account and its credential
//! - [`ResourceKind::UserRole`] - role grants for the account within a tenant
//! - [`ResourceKind::Service`] - the service catalog entry
//! - [`ResourceKind::Endpoint`] - public, admin and internal URLs for a region
//!
//! Role grants depend on users and endpoints depend on services, which
//! splits the kinds into two [`Tier`]s.

pub mod key;
pub mod kind;
pub mod state;
pub mod types;

pub use key::ResourceKey;
pub use kind::{Ensure, ResourceKind, Tier};
pub use state::DesiredState;
pub use types::{Attributes, DesiredResource, ObservedResource, redacted};
