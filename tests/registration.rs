//! Desired state produced for the documented parameter sets.

mod common;

use common::{PASSWORD, desired, params};
use ironic_keystone_auth::config::{KeystoneAuthParams, StaticSource};
use ironic_keystone_auth::{
    ConfigError, DesiredState, Ensure, KeystoneAuth, ResourceKey, ResourceKind,
};
use serde_json::{Value, json};

fn keys(state: &DesiredState, kind: ResourceKind) -> Vec<String> {
    state.of_kind(kind).map(|r| r.key().to_string()).collect()
}

fn attribute<'a>(state: &'a DesiredState, key: &ResourceKey, name: &str) -> Option<&'a Value> {
    state.get(key).and_then(|r| r.attribute(name))
}

#[test]
fn test_default_registration_with_tenant() {
    let state = desired(KeystoneAuthParams {
        tenant: "foobar".to_string(),
        ..params()
    });

    assert_eq!(state.len(), 4);
    assert!(state.resources().all(|r| r.ensure() == Ensure::Present));

    let user = ResourceKey::user("ironic").unwrap();
    assert_eq!(attribute(&state, &user, "password"), Some(&json!(PASSWORD)));
    assert_eq!(attribute(&state, &user, "email"), Some(&json!("ironic@localhost")));

    let grant = ResourceKey::user_role("ironic", "foobar").unwrap();
    assert_eq!(attribute(&state, &grant, "roles"), Some(&json!(["admin"])));

    let service = ResourceKey::service("ironic", "baremetal").unwrap();
    assert_eq!(
        attribute(&state, &service, "description"),
        Some(&json!("Ironic Bare Metal Provisioning Service"))
    );

    let endpoint = ResourceKey::endpoint("RegionOne", "ironic", "baremetal").unwrap();
    for url in ["public_url", "admin_url", "internal_url"] {
        assert_eq!(
            attribute(&state, &endpoint, url),
            Some(&json!("http://127.0.0.1:6385"))
        );
    }
}

#[test]
fn test_endpoint_urls_are_independent() {
    let state = desired(KeystoneAuthParams {
        public_url: "https://10.0.0.10:6385".to_string(),
        admin_url: "https://10.0.0.11:6385".to_string(),
        internal_url: "https://10.0.0.11:6385".to_string(),
        ..params()
    });

    let endpoint = ResourceKey::endpoint("RegionOne", "ironic", "baremetal").unwrap();
    assert_eq!(
        attribute(&state, &endpoint, "public_url"),
        Some(&json!("https://10.0.0.10:6385"))
    );
    assert_eq!(
        attribute(&state, &endpoint, "admin_url"),
        Some(&json!("https://10.0.0.11:6385"))
    );
    assert_eq!(
        attribute(&state, &endpoint, "internal_url"),
        Some(&json!("https://10.0.0.11:6385"))
    );
}

#[test]
fn test_service_name_override() {
    let state = desired(KeystoneAuthParams {
        service_name: "ironic_service".to_string(),
        ..params()
    });

    assert_eq!(keys(&state, ResourceKind::Service), ["ironic_service::baremetal"]);
    assert_eq!(
        keys(&state, ResourceKind::Endpoint),
        ["RegionOne/ironic_service::baremetal"]
    );
    assert_eq!(keys(&state, ResourceKind::User), ["ironic"]);
    assert_eq!(keys(&state, ResourceKind::UserRole), ["ironic@services"]);
}

#[test]
fn test_auth_name_override() {
    let state = desired(KeystoneAuthParams {
        auth_name: "ironicy".to_string(),
        ..KeystoneAuthParams::with_password("foo")
    });

    assert_eq!(keys(&state, ResourceKind::User), ["ironicy"]);
    assert_eq!(keys(&state, ResourceKind::UserRole), ["ironicy@services"]);
    assert_eq!(keys(&state, ResourceKind::Service), ["ironic::baremetal"]);
    assert_eq!(keys(&state, ResourceKind::Endpoint), ["RegionOne/ironic::baremetal"]);
}

#[test]
fn test_roles_override_keeps_tenant_scope() {
    let state = desired(KeystoneAuthParams {
        roles: vec!["admin".to_string(), "service".to_string()],
        tenant: "foobar".to_string(),
        ..params()
    });
    let grant = ResourceKey::user_role("ironic", "foobar").unwrap();
    assert_eq!(attribute(&state, &grant, "roles"), Some(&json!(["admin", "service"])));

    let state = desired(KeystoneAuthParams {
        roles: vec!["admin".to_string(), "service".to_string()],
        ..params()
    });
    assert_eq!(keys(&state, ResourceKind::UserRole), ["ironic@services"]);
}

#[test]
fn test_configure_user_false_omits_user_only() {
    let state = desired(KeystoneAuthParams {
        configure_user: false,
        ..params()
    });

    assert!(!state.is_managed(ResourceKind::User));
    assert!(keys(&state, ResourceKind::User).is_empty());
    assert_eq!(keys(&state, ResourceKind::UserRole), ["ironic@services"]);
    assert_eq!(keys(&state, ResourceKind::Service), ["ironic::baremetal"]);
    assert_eq!(keys(&state, ResourceKind::Endpoint), ["RegionOne/ironic::baremetal"]);
}

#[test]
fn test_both_toggles_false_keeps_catalog() {
    let state = desired(KeystoneAuthParams {
        configure_user: false,
        configure_user_role: false,
        ..params()
    });

    assert_eq!(state.len(), 2);
    assert!(!state.is_managed(ResourceKind::User));
    assert!(!state.is_managed(ResourceKind::UserRole));
    assert!(state.is_managed(ResourceKind::Service));
    assert!(state.is_managed(ResourceKind::Endpoint));
}

#[tokio::test]
async fn test_parameters_from_source() {
    let source = StaticSource::from_value(json!({
        "password": "ironic_password",
        "tenant": "foobar",
        "roles": null,
        "region": "RegionTwo"
    }))
    .unwrap();

    let auth = KeystoneAuth::from_source(&source).await.unwrap();
    assert_eq!(auth.user_role_key().to_string(), "ironic@foobar");
    assert_eq!(auth.endpoint_key().to_string(), "RegionTwo/ironic::baremetal");
    assert_eq!(auth.params().roles, vec!["admin".to_string()]);
}

#[tokio::test]
async fn test_source_errors_fail_before_building() {
    let missing = StaticSource::from_value(json!({ "tenant": "foobar" })).unwrap();
    let err = KeystoneAuth::from_source(&missing).await.unwrap_err();
    assert_eq!(
        err,
        ConfigError::MissingParameter {
            name: "password".to_string()
        }
    );

    let unknown =
        StaticSource::from_value(json!({ "password": "x", "tennant": "foobar" })).unwrap();
    let err = KeystoneAuth::from_source(&unknown).await.unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidParameter { message } if message.contains("tennant")
    ));

    let mistyped =
        StaticSource::from_value(json!({ "password": "x", "configure_user": "yes" })).unwrap();
    assert!(matches!(
        KeystoneAuth::from_source(&mistyped).await,
        Err(ConfigError::InvalidParameter { .. })
    ));
}
