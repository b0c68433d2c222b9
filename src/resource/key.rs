//! Composite resource keys.
//!
//! Keys identify a resource uniquely within its kind and are stable across
//! reconciliation passes. Each kind renders its key in the title format the
//! Keystone resource types use:
//!
//! | Kind     | Format                            | Example                       |
//! |----------|-----------------------------------|-------------------------------|
//! | User     | `<name>`                          | `ironic`                      |
//! | UserRole | `<user>@<tenant>`                 | `ironic@services`             |
//! | Service  | `<name>::<type>`                  | `ironic::baremetal`           |
//! | Endpoint | `<region>/<service>::<type>`      | `RegionOne/ironic::baremetal` |
//!
//! Segments are validated at construction so that every key parses back to
//! itself: tenants never contain `@`, regions never contain `/`, service
//! names never contain `::` and service types never contain `:`.

use crate::error::ConfigError;
use crate::resource::kind::ResourceKind;
use std::fmt;

const ROLE_SEPARATOR: char = '@';
const TYPE_SEPARATOR: &str = "::";
const REGION_SEPARATOR: char = '/';

/// A validated key for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKey {
    User {
        name: String,
    },
    UserRole {
        user: String,
        tenant: String,
    },
    Service {
        name: String,
        service_type: String,
    },
    Endpoint {
        region: String,
        service: String,
        service_type: String,
    },
}

impl ResourceKey {
    pub fn user(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        non_empty(ResourceKind::User, &name, "user name")?;
        Ok(ResourceKey::User { name })
    }

    /// Role grant key. The tenant may not contain `@`; the user name may.
    pub fn user_role(
        user: impl Into<String>,
        tenant: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let (user, tenant) = (user.into(), tenant.into());
        let kind = ResourceKind::UserRole;
        non_empty(kind, &user, "user name")?;
        non_empty(kind, &tenant, "tenant")?;
        if tenant.contains(ROLE_SEPARATOR) {
            return Err(invalid(kind, &tenant, "tenant may not contain '@'"));
        }
        Ok(ResourceKey::UserRole { user, tenant })
    }

    pub fn service(
        name: impl Into<String>,
        service_type: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let (name, service_type) = (name.into(), service_type.into());
        check_service_segments(ResourceKind::Service, &name, &service_type)?;
        Ok(ResourceKey::Service { name, service_type })
    }

    pub fn endpoint(
        region: impl Into<String>,
        service: impl Into<String>,
        service_type: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let (region, service, service_type) = (region.into(), service.into(), service_type.into());
        let kind = ResourceKind::Endpoint;
        non_empty(kind, &region, "region")?;
        if region.contains(REGION_SEPARATOR) {
            return Err(invalid(kind, &region, "region may not contain '/'"));
        }
        check_service_segments(kind, &service, &service_type)?;
        Ok(ResourceKey::Endpoint {
            region,
            service,
            service_type,
        })
    }

    /// Parse the rendered form of a key of the given kind.
    pub fn parse(kind: ResourceKind, value: &str) -> Result<Self, ConfigError> {
        match kind {
            ResourceKind::User => Self::user(value),
            ResourceKind::UserRole => match value.rsplit_once(ROLE_SEPARATOR) {
                Some((user, tenant)) => Self::user_role(user, tenant),
                None => Err(invalid(kind, value, "expected '<user>@<tenant>'")),
            },
            ResourceKind::Service => match value.rsplit_once(TYPE_SEPARATOR) {
                Some((name, service_type)) => Self::service(name, service_type),
                None => Err(invalid(kind, value, "expected '<name>::<type>'")),
            },
            ResourceKind::Endpoint => {
                let parsed = value
                    .split_once(REGION_SEPARATOR)
                    .and_then(|(region, rest)| {
                        rest.rsplit_once(TYPE_SEPARATOR)
                            .map(|(service, service_type)| (region, service, service_type))
                    });
                match parsed {
                    Some((region, service, service_type)) => {
                        Self::endpoint(region, service, service_type)
                    }
                    None => Err(invalid(kind, value, "expected '<region>/<name>::<type>'")),
                }
            }
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceKey::User { .. } => ResourceKind::User,
            ResourceKey::UserRole { .. } => ResourceKind::UserRole,
            ResourceKey::Service { .. } => ResourceKind::Service,
            ResourceKey::Endpoint { .. } => ResourceKind::Endpoint,
        }
    }

    /// Key of the resource this one depends on.
    pub fn parent(&self) -> Option<ResourceKey> {
        match self {
            ResourceKey::UserRole { user, .. } => Some(ResourceKey::User { name: user.clone() }),
            ResourceKey::Endpoint {
                service,
                service_type,
                ..
            } => Some(ResourceKey::Service {
                name: service.clone(),
                service_type: service_type.clone(),
            }),
            ResourceKey::User { .. } | ResourceKey::Service { .. } => None,
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKey::User { name } => f.write_str(name),
            ResourceKey::UserRole { user, tenant } => write!(f, "{user}@{tenant}"),
            ResourceKey::Service { name, service_type } => write!(f, "{name}::{service_type}"),
            ResourceKey::Endpoint {
                region,
                service,
                service_type,
            } => write!(f, "{region}/{service}::{service_type}"),
        }
    }
}

fn check_service_segments(
    kind: ResourceKind,
    name: &str,
    service_type: &str,
) -> Result<(), ConfigError> {
    non_empty(kind, name, "service name")?;
    non_empty(kind, service_type, "service type")?;
    if name.contains(TYPE_SEPARATOR) {
        return Err(invalid(kind, name, "service name may not contain '::'"));
    }
    if service_type.contains(':') {
        return Err(invalid(kind, service_type, "service type may not contain ':'"));
    }
    Ok(())
}

fn non_empty(kind: ResourceKind, value: &str, segment: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(kind, value, &format!("{segment} cannot be empty")));
    }
    Ok(())
}

fn invalid(kind: ResourceKind, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidKey {
        kind,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_keystone_titles() {
        assert_eq!(ResourceKey::user("ironic").unwrap().to_string(), "ironic");
        assert_eq!(
            ResourceKey::user_role("ironic", "foobar").unwrap().to_string(),
            "ironic@foobar"
        );
        assert_eq!(
            ResourceKey::service("ironic", "baremetal").unwrap().to_string(),
            "ironic::baremetal"
        );
        assert_eq!(
            ResourceKey::endpoint("RegionOne", "ironic", "baremetal")
                .unwrap()
                .to_string(),
            "RegionOne/ironic::baremetal"
        );
    }

    #[test]
    fn user_role_splits_on_last_at_sign() {
        let key =
            ResourceKey::parse(ResourceKind::UserRole, "ironic@example.com@services").unwrap();
        assert_eq!(
            key,
            ResourceKey::UserRole {
                user: "ironic@example.com".to_string(),
                tenant: "services".to_string(),
            }
        );
    }

    #[test]
    fn parents_point_at_base_keys() {
        let role = ResourceKey::user_role("ironicy", "services").unwrap();
        assert_eq!(role.parent(), Some(ResourceKey::user("ironicy").unwrap()));

        let endpoint = ResourceKey::endpoint("RegionOne", "ironic_service", "baremetal").unwrap();
        assert_eq!(
            endpoint.parent(),
            Some(ResourceKey::service("ironic_service", "baremetal").unwrap())
        );

        assert_eq!(ResourceKey::user("ironic").unwrap().parent(), None);
    }

    #[test]
    fn rejects_unrepresentable_segments() {
        assert!(ResourceKey::user("").is_err());
        assert!(ResourceKey::user_role("ironic", "ser@vices").is_err());
        assert!(ResourceKey::service("iro::nic", "baremetal").is_err());
        assert!(ResourceKey::endpoint("Region/One", "ironic", "baremetal").is_err());
        assert!(ResourceKey::parse(ResourceKind::Service, "ironic").is_err());
        assert!(ResourceKey::parse(ResourceKind::Endpoint, "ironic::baremetal").is_err());
        assert!(ResourceKey::parse(ResourceKind::UserRole, "ironic@").is_err());
    }

    #[test]
    fn kind_follows_variant() {
        assert_eq!(
            ResourceKey::parse(ResourceKind::Endpoint, "RegionOne/ironic::baremetal")
                .unwrap()
                .kind(),
            ResourceKind::Endpoint
        );
    }
}
