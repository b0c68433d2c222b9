//! Desired-state builder for the Ironic Keystone registration.
//!
//! [`KeystoneAuth`] validates a set of [`KeystoneAuthParams`] and turns it
//! into the [`DesiredState`] of one pass: the `ironic` service account, its
//! role grant, the `baremetal` catalog entry and the region endpoint.
//!
//! Each toggle decides whether a kind is *managed*. A disabled kind is left
//! out of the desired state entirely, so the engine never touches it, which
//! is not the same as declaring it absent.
//!
//! # Example
//!
//! ```rust
//! use ironic_keystone_auth::KeystoneAuth;
//! use ironic_keystone_auth::config::KeystoneAuthParams;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let params = KeystoneAuthParams {
//!     tenant: "foobar".to_string(),
//!     ..KeystoneAuthParams::with_password("ironic_password")
//! };
//! let auth = KeystoneAuth::new(params)?;
//! assert_eq!(auth.user_role_key().to_string(), "ironic@foobar");
//! assert_eq!(auth.endpoint_key().to_string(), "RegionOne/ironic::baremetal");
//!
//! let desired = auth.desired_state()?;
//! assert_eq!(desired.len(), 4);
//! # Ok(())
//! # }
//! ```

use crate::config::{ConfigurationSource, KeystoneAuthParams};
use crate::error::ConfigError;
use crate::resource::{
    Attributes, DesiredResource, DesiredState, Ensure, ResourceKey, ResourceKind,
};
use serde_json::{Map, Value, json};
use std::fmt;

/// Validated registration parameters.
#[derive(Clone)]
pub struct KeystoneAuth {
    params: KeystoneAuthParams,
    password: String,
    user_key: ResourceKey,
    user_role_key: ResourceKey,
    service_key: ResourceKey,
    endpoint_key: ResourceKey,
}

impl KeystoneAuth {
    /// Validate parameters and derive the resource keys.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingParameter`] when `password` is not set
    /// - [`ConfigError::InvalidValue`] for empty passwords, URLs or roles
    /// - [`ConfigError::InvalidKey`] when a name cannot form a valid key
    pub fn new(params: KeystoneAuthParams) -> Result<Self, ConfigError> {
        let password = match params.password.as_deref() {
            None => {
                return Err(ConfigError::MissingParameter {
                    name: "password".to_string(),
                });
            }
            Some("") => return Err(invalid_value("password", "cannot be empty")),
            Some(password) => password.to_string(),
        };

        if params.roles.is_empty() {
            return Err(invalid_value("roles", "at least one role is required"));
        }
        if params.roles.iter().any(|role| role.trim().is_empty()) {
            return Err(invalid_value("roles", "role names cannot be empty"));
        }
        for (name, url) in [
            ("public_url", &params.public_url),
            ("admin_url", &params.admin_url),
            ("internal_url", &params.internal_url),
        ] {
            if url.trim().is_empty() {
                return Err(invalid_value(name, "cannot be empty"));
            }
        }

        let user_key = ResourceKey::user(params.auth_name.as_str())?;
        let user_role_key =
            ResourceKey::user_role(params.auth_name.as_str(), params.tenant.as_str())?;
        let service_key =
            ResourceKey::service(params.service_name.as_str(), params.service_type.as_str())?;
        let endpoint_key = ResourceKey::endpoint(
            params.region.as_str(),
            params.service_name.as_str(),
            params.service_type.as_str(),
        )?;

        Ok(Self {
            params,
            password,
            user_key,
            user_role_key,
            service_key,
            endpoint_key,
        })
    }

    /// Deserialize and validate a raw parameter mapping.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ConfigError> {
        Self::new(KeystoneAuthParams::from_map(map)?)
    }

    /// Load, deserialize and validate parameters from a source.
    pub async fn from_source(source: &impl ConfigurationSource) -> Result<Self, ConfigError> {
        let map = source.load().await?;
        Self::from_map(&map)
    }

    pub fn params(&self) -> &KeystoneAuthParams {
        &self.params
    }

    pub fn user_key(&self) -> &ResourceKey {
        &self.user_key
    }

    pub fn user_role_key(&self) -> &ResourceKey {
        &self.user_role_key
    }

    pub fn service_key(&self) -> &ResourceKey {
        &self.service_key
    }

    pub fn endpoint_key(&self) -> &ResourceKey {
        &self.endpoint_key
    }

    /// Whether the configuration manages a kind at all.
    pub fn manages(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::User => self.params.configure_user,
            ResourceKind::UserRole => self.params.configure_user_role,
            ResourceKind::Service => self.params.configure_service,
            ResourceKind::Endpoint => self.params.configure_endpoint,
        }
    }

    /// Build the desired state for one pass.
    pub fn desired_state(&self) -> Result<DesiredState, ConfigError> {
        let managed: Vec<ResourceKind> = ResourceKind::ALL
            .into_iter()
            .filter(|kind| self.manages(*kind))
            .collect();
        let resources = managed.iter().map(|kind| self.declare(*kind));
        DesiredState::new(resources, managed.iter().copied())
    }

    fn declare(&self, kind: ResourceKind) -> DesiredResource {
        let key = match kind {
            ResourceKind::User => &self.user_key,
            ResourceKind::UserRole => &self.user_role_key,
            ResourceKind::Service => &self.service_key,
            ResourceKind::Endpoint => &self.endpoint_key,
        };
        DesiredResource::new(key.clone(), self.attributes(kind), self.params.ensure)
    }

    fn attributes(&self, kind: ResourceKind) -> Attributes {
        let p = &self.params;
        let pairs: Vec<(&str, Value)> = match kind {
            ResourceKind::User => vec![
                ("password", json!(self.password)),
                ("email", json!(p.email)),
            ],
            ResourceKind::UserRole => vec![("roles", json!(p.roles))],
            ResourceKind::Service => vec![("description", json!(p.service_description))],
            ResourceKind::Endpoint => vec![
                ("public_url", json!(p.public_url)),
                ("admin_url", json!(p.admin_url)),
                ("internal_url", json!(p.internal_url)),
            ],
        };
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    /// Lifecycle applied to every managed resource.
    pub fn ensure(&self) -> Ensure {
        self.params.ensure
    }
}

impl fmt::Debug for KeystoneAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoneAuth")
            .field("params", &self.params)
            .field("user_key", &self.user_key.to_string())
            .field("user_role_key", &self.user_role_key.to_string())
            .field("service_key", &self.service_key.to_string())
            .field("endpoint_key", &self.endpoint_key.to_string())
            .finish()
    }
}

fn invalid_value(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
