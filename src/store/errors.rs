//! Errors reported by identity stores.
//!
//! Every store failure is either transient (worth retrying: the service is
//! unreachable, rejected the credentials, or did not answer in time) or
//! permanent (retrying cannot help: conflicting records, invalid
//! attributes, corrupt persisted state).

use crate::resource::ResourceKind;
use std::time::Duration;

/// Errors that can occur while reading from or applying to an identity store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// The identity service cannot be reached right now.
    #[error("Identity service unavailable: {message}")]
    Unavailable { message: String },

    /// The identity service rejected the credentials used by the store.
    #[error("Authentication against identity service failed: {message}")]
    Unauthorized { message: String },

    /// A single call did not complete in time.
    #[error("Timed out after {duration:?} during {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// The record conflicts with existing state.
    #[error("Conflict on '{key}': {message}")]
    Conflict { key: String, message: String },

    /// The identity service refused an attribute value.
    #[error("Invalid attribute '{attribute}' on {kind} '{key}': {message}")]
    InvalidAttribute {
        kind: ResourceKind,
        key: String,
        attribute: String,
        message: String,
    },

    /// Persisted state could not be read back.
    #[error("Corrupt store state: {message}")]
    Corrupt { message: String },

    /// Local I/O failed.
    #[error("Store I/O error: {message}")]
    Io { message: String },
}

/// Retry classification of an [`ApplyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Permanent,
}

impl ApplyError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ApplyError::Unavailable { .. }
            | ApplyError::Unauthorized { .. }
            | ApplyError::Timeout { .. } => ErrorClass::Transient,
            ApplyError::Conflict { .. }
            | ApplyError::InvalidAttribute { .. }
            | ApplyError::Corrupt { .. }
            | ApplyError::Io { .. } => ErrorClass::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

impl From<std::io::Error> for ApplyError {
    fn from(err: std::io::Error) -> Self {
        ApplyError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let transient = [
            ApplyError::Unavailable {
                message: "503".to_string(),
            },
            ApplyError::Unauthorized {
                message: "token expired".to_string(),
            },
            ApplyError::Timeout {
                operation: "apply".to_string(),
                duration: Duration::from_secs(5),
            },
        ];
        for err in transient {
            assert!(err.is_transient(), "{err} should be transient");
        }

        let permanent = ApplyError::InvalidAttribute {
            kind: ResourceKind::Endpoint,
            key: "RegionOne/ironic::baremetal".to_string(),
            attribute: "public_url".to_string(),
            message: "not a URL".to_string(),
        };
        assert_eq!(permanent.class(), ErrorClass::Permanent);
    }

    #[test]
    fn io_errors_convert() {
        let err: ApplyError = std::io::Error::other("disk full").into();
        assert_eq!(
            err,
            ApplyError::Io {
                message: "disk full".to_string()
            }
        );
    }
}
