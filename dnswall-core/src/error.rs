//! Error taxonomy for the registry and its backend.
//!
//! Mirrors the kinds from the design: a bad name or missing address is a
//! caller mistake (`BackendValueError`), a KV I/O failure is transient
//! (`BackendError`), an unknown backend scheme is fatal at startup
//! (`BackendNotFound`), and bad CLI/env configuration is also fatal
//! (`MalformedConfig`). `KeyMissing` never leaves this crate: the registry
//! swallows it into empty results before returning to callers.

/// Result alias using the crate's [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A name failed syntax validation, isn't covered by the registry's pattern
/// filter, or a [`crate::model::DomainItem`] was built with no addresses.
#[derive(Debug)]
pub struct BackendValueErrorStruct {
    reason: String,
}

impl BackendValueErrorStruct {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The KV backend could not be reached or returned a protocol-level failure.
#[derive(Debug)]
pub struct BackendErrorStruct {
    reason: String,
}

impl BackendErrorStruct {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Unified error type surfaced by the registry and backend adapter.
#[derive(Debug)]
pub enum Error {
    /// Invalid name, missing uuid, unsupported name on a mutating op, or an
    /// item with no addresses.
    BackendValueError(BackendValueErrorStruct),
    /// The backend URL scheme is not one this build knows how to connect to.
    BackendNotFound(String),
    /// KV I/O failure (connection, protocol). Surfaces to the Supervisor.
    BackendError(BackendErrorStruct),
    /// Bad CLI/env configuration (address shape, empty patterns, malformed
    /// backend URL).
    MalformedConfig(String),
}

impl Error {
    pub fn value(reason: impl Into<String>) -> Self {
        Self::BackendValueError(BackendValueErrorStruct::new(reason))
    }

    pub fn backend(reason: impl Into<String>) -> Self {
        Self::BackendError(BackendErrorStruct::new(reason))
    }

    /// True for the kind the Reconciler is expected to log and skip rather
    /// than letting it abort a heartbeat pass.
    pub fn is_value_error(&self) -> bool {
        matches!(self, Error::BackendValueError(_))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BackendValueError(e) => write!(f, "invalid registration: {}", e.reason),
            Self::BackendNotFound(scheme) => write!(f, "unknown backend scheme: {}", scheme),
            Self::BackendError(e) => write!(f, "backend error: {}", e.reason),
            Self::MalformedConfig(msg) => write!(f, "malformed configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::value(format!("malformed item json: {value}"))
    }
}

impl From<crate::backend::KvError> for Error {
    /// `KvError::NotFound` never reaches this conversion: the registry
    /// intercepts it before it would become a public error.
    fn from(value: crate::backend::KvError) -> Self {
        match value {
            crate::backend::KvError::NotFound => {
                Self::backend("not-found reached error conversion; this is a registry bug")
            }
            crate::backend::KvError::Failure(reason) => Self::backend(reason),
        }
    }
}
