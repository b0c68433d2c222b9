//! Shared helpers for the integration tests.
//!
//! - parameter and desired-state builders
//! - [`FlakyStore`], an identity store wrapper that injects failures and delays

#![allow(dead_code)]

use ironic_keystone_auth::config::KeystoneAuthParams;
use ironic_keystone_auth::resource::{Attributes, ObservedResource};
use ironic_keystone_auth::store::{ApplyError, IdentityStore, InMemoryIdentityStore};
use ironic_keystone_auth::{DesiredState, Ensure, KeystoneAuth, ResourceKey, ResourceKind};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const PASSWORD: &str = "ironic_password";

/// Route engine logs to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Default parameters with the fixture password.
pub fn params() -> KeystoneAuthParams {
    KeystoneAuthParams::with_password(PASSWORD)
}

pub fn desired(params: KeystoneAuthParams) -> DesiredState {
    KeystoneAuth::new(params)
        .expect("valid parameters")
        .desired_state()
        .expect("valid desired state")
}

pub fn attrs(pairs: &[(&str, Value)]) -> Attributes {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

pub fn observed(key: ResourceKey, pairs: &[(&str, Value)]) -> ObservedResource {
    ObservedResource::new(key, attrs(pairs))
}

/// Failure to inject for a number of consecutive calls.
#[derive(Debug, Clone)]
struct Fault {
    error: ApplyError,
    remaining: Option<u32>,
}

impl Fault {
    /// Consume one injection, returning the error to raise if any.
    fn fire(&mut self) -> Option<ApplyError> {
        match &mut self.remaining {
            None => Some(self.error.clone()),
            Some(0) => None,
            Some(n) => {
                *n -= 1;
                Some(self.error.clone())
            }
        }
    }
}

/// Identity store that fails or stalls on demand.
///
/// Faults are keyed by resource kind and apply to `apply` and `list`
/// separately. `get` is never faulted.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    pub inner: InMemoryIdentityStore,
    apply_faults: Arc<Mutex<HashMap<ResourceKind, Fault>>>,
    list_faults: Arc<Mutex<HashMap<ResourceKind, Fault>>>,
    apply_delay: Arc<Mutex<Option<Duration>>>,
    apply_calls: Arc<Mutex<HashMap<ResourceKind, u32>>>,
}

impl FlakyStore {
    pub fn new(inner: InMemoryIdentityStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail the next `times` applies of `kind`.
    pub async fn fail_apply(&self, kind: ResourceKind, error: ApplyError, times: u32) {
        self.apply_faults.lock().await.insert(
            kind,
            Fault {
                error,
                remaining: Some(times),
            },
        );
    }

    /// Fail every apply of `kind`.
    pub async fn always_fail_apply(&self, kind: ResourceKind, error: ApplyError) {
        self.apply_faults.lock().await.insert(
            kind,
            Fault {
                error,
                remaining: None,
            },
        );
    }

    pub async fn always_fail_list(&self, kind: ResourceKind, error: ApplyError) {
        self.list_faults.lock().await.insert(
            kind,
            Fault {
                error,
                remaining: None,
            },
        );
    }

    /// Stall every apply for `delay` before forwarding it.
    pub async fn delay_apply(&self, delay: Duration) {
        *self.apply_delay.lock().await = Some(delay);
    }

    /// Apply attempts seen for `kind`, including failed ones.
    pub async fn apply_calls(&self, kind: ResourceKind) -> u32 {
        self.apply_calls
            .lock()
            .await
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }
}

impl IdentityStore for FlakyStore {
    async fn get(&self, key: &ResourceKey) -> Result<Option<ObservedResource>, ApplyError> {
        self.inner.get(key).await
    }

    async fn list(&self, kind: ResourceKind) -> Result<Vec<ObservedResource>, ApplyError> {
        if let Some(fault) = self.list_faults.lock().await.get_mut(&kind) {
            if let Some(error) = fault.fire() {
                return Err(error);
            }
        }
        self.inner.list(kind).await
    }

    async fn apply(
        &self,
        key: &ResourceKey,
        attributes: &Attributes,
        ensure: Ensure,
    ) -> Result<(), ApplyError> {
        *self.apply_calls.lock().await.entry(key.kind()).or_insert(0) += 1;

        let delay = *self.apply_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let injected = self
            .apply_faults
            .lock()
            .await
            .get_mut(&key.kind())
            .and_then(Fault::fire);
        if let Some(error) = injected {
            return Err(error);
        }
        self.inner.apply(key, attributes, ensure).await
    }
}

pub fn unavailable() -> ApplyError {
    ApplyError::Unavailable {
        message: "503 Service Unavailable".to_string(),
    }
}

pub fn unauthorized() -> ApplyError {
    ApplyError::Unauthorized {
        message: "token expired".to_string(),
    }
}

pub fn conflict(key: &ResourceKey) -> ApplyError {
    ApplyError::Conflict {
        key: key.to_string(),
        message: "name already taken".to_string(),
    }
}
