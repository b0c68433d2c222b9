//! Resource kinds and their lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four kinds of record Ironic registers in Keystone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    User,
    UserRole,
    Service,
    Endpoint,
}

/// Dependency tier of a resource kind.
///
/// Every resource of [`Tier::Base`] is applied before any resource of
/// [`Tier::Dependent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Users and services, which depend on nothing.
    Base,
    /// Role grants and endpoints, which reference a base resource.
    Dependent,
}

impl Tier {
    /// Tiers in apply order.
    pub const ORDERED: [Tier; 2] = [Tier::Base, Tier::Dependent];

    /// Kinds belonging to this tier.
    pub fn kinds(self) -> [ResourceKind; 2] {
        match self {
            Tier::Base => [ResourceKind::User, ResourceKind::Service],
            Tier::Dependent => [ResourceKind::UserRole, ResourceKind::Endpoint],
        }
    }
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::User,
        ResourceKind::UserRole,
        ResourceKind::Service,
        ResourceKind::Endpoint,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::User => "User",
            ResourceKind::UserRole => "UserRole",
            ResourceKind::Service => "Service",
            ResourceKind::Endpoint => "Endpoint",
        }
    }

    pub fn tier(self) -> Tier {
        match self {
            ResourceKind::User | ResourceKind::Service => Tier::Base,
            ResourceKind::UserRole | ResourceKind::Endpoint => Tier::Dependent,
        }
    }

    /// The kind a resource of this kind references, if any.
    pub fn parent(self) -> Option<ResourceKind> {
        match self {
            ResourceKind::UserRole => Some(ResourceKind::User),
            ResourceKind::Endpoint => Some(ResourceKind::Service),
            ResourceKind::User | ResourceKind::Service => None,
        }
    }

    /// Attributes a present resource of this kind must carry before apply.
    pub fn required_attributes(self) -> &'static [&'static str] {
        match self {
            ResourceKind::User => &["password"],
            ResourceKind::UserRole => &["roles"],
            ResourceKind::Service => &["description"],
            ResourceKind::Endpoint => &["public_url", "admin_url", "internal_url"],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Desired lifecycle state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl Ensure {
    pub fn is_present(self) -> bool {
        matches!(self, Ensure::Present)
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ensure::Present => f.write_str("present"),
            Ensure::Absent => f.write_str("absent"),
        }
    }
}
