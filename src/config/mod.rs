//! Configuration for the Ironic Keystone registration.
//!
//! Parameters arrive as a raw JSON object from a [`ConfigurationSource`] and
//! are deserialized into [`KeystoneAuthParams`]. Every key except `password`
//! has a default; a key explicitly set to `null` falls back to its default.
//!
//! | Key                   | Default                                   |
//! |-----------------------|-------------------------------------------|
//! | `password`            | required                                  |
//! | `auth_name`           | `ironic`                                  |
//! | `email`               | `ironic@localhost`                        |
//! | `tenant`              | `services`                                |
//! | `roles`               | `["admin"]`                               |
//! | `service_name`        | `ironic`                                  |
//! | `service_type`        | `baremetal`                               |
//! | `service_description` | `Ironic Bare Metal Provisioning Service`  |
//! | `region`              | `RegionOne`                               |
//! | `public_url`          | `http://127.0.0.1:6385`                   |
//! | `admin_url`           | `http://127.0.0.1:6385`                   |
//! | `internal_url`        | `http://127.0.0.1:6385`                   |
//! | `configure_user`      | `true`                                    |
//! | `configure_user_role` | `true`                                    |
//! | `configure_service`   | `true`                                    |
//! | `configure_endpoint`  | `true`                                    |
//! | `ensure`              | `present`                                 |
//!
//! Unknown keys are rejected.

pub mod source;

pub use source::{ConfigurationSource, JsonFileSource, StaticSource};

use crate::error::ConfigError;
use crate::resource::Ensure;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_AUTH_NAME: &str = "ironic";
pub const DEFAULT_EMAIL: &str = "ironic@localhost";
pub const DEFAULT_TENANT: &str = "services";
pub const DEFAULT_ROLE: &str = "admin";
pub const DEFAULT_SERVICE_NAME: &str = "ironic";
pub const DEFAULT_SERVICE_TYPE: &str = "baremetal";
pub const DEFAULT_SERVICE_DESCRIPTION: &str = "Ironic Bare Metal Provisioning Service";
pub const DEFAULT_REGION: &str = "RegionOne";
pub const DEFAULT_ENDPOINT_URL: &str = "http://127.0.0.1:6385";

/// Raw parameters of the registration, with defaults applied.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeystoneAuthParams {
    pub password: Option<String>,
    pub auth_name: String,
    pub email: String,
    pub tenant: String,
    pub roles: Vec<String>,
    pub service_name: String,
    pub service_type: String,
    pub service_description: String,
    pub region: String,
    pub public_url: String,
    pub admin_url: String,
    pub internal_url: String,
    pub configure_user: bool,
    pub configure_user_role: bool,
    pub configure_service: bool,
    pub configure_endpoint: bool,
    pub ensure: Ensure,
}

impl Default for KeystoneAuthParams {
    fn default() -> Self {
        Self {
            password: None,
            auth_name: DEFAULT_AUTH_NAME.to_string(),
            email: DEFAULT_EMAIL.to_string(),
            tenant: DEFAULT_TENANT.to_string(),
            roles: vec![DEFAULT_ROLE.to_string()],
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_type: DEFAULT_SERVICE_TYPE.to_string(),
            service_description: DEFAULT_SERVICE_DESCRIPTION.to_string(),
            region: DEFAULT_REGION.to_string(),
            public_url: DEFAULT_ENDPOINT_URL.to_string(),
            admin_url: DEFAULT_ENDPOINT_URL.to_string(),
            internal_url: DEFAULT_ENDPOINT_URL.to_string(),
            configure_user: true,
            configure_user_role: true,
            configure_service: true,
            configure_endpoint: true,
            ensure: Ensure::Present,
        }
    }
}

impl KeystoneAuthParams {
    /// Deserialize parameters from a raw mapping.
    ///
    /// Keys set to `null` are treated as unset.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidParameter`] for unknown keys and type mismatches.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ConfigError> {
        let provided: Map<String, Value> = map
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        serde_json::from_value(Value::Object(provided)).map_err(|e| {
            ConfigError::InvalidParameter {
                message: e.to_string(),
            }
        })
    }

    /// Start from defaults with the given password.
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            ..Self::default()
        }
    }
}

impl fmt::Debug for KeystoneAuthParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoneAuthParams")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("auth_name", &self.auth_name)
            .field("email", &self.email)
            .field("tenant", &self.tenant)
            .field("roles", &self.roles)
            .field("service_name", &self.service_name)
            .field("service_type", &self.service_type)
            .field("service_description", &self.service_description)
            .field("region", &self.region)
            .field("public_url", &self.public_url)
            .field("admin_url", &self.admin_url)
            .field("internal_url", &self.internal_url)
            .field("configure_user", &self.configure_user)
            .field("configure_user_role", &self.configure_user_role)
            .field("configure_service", &self.configure_service)
            .field("configure_endpoint", &self.configure_endpoint)
            .field("ensure", &self.ensure)
            .finish()
    }
}
