//! Error types for the poller

use thiserror::Error;

/// Failure of a single SNMP operation (one GET, one GETBULK page, one session bind).
///
/// These are recovered close to where they happen: a walk keeps the rows it
/// already has, a resolver falls back to `N/A`. Only the connectivity probe
/// turns one of these into a fatal [`FetchError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnmpError {
    /// Session could not be created (bad address, socket bind failure)
    #[error("Connect error: {0}")]
    Connect(String),

    /// No response within the timeout after all retries
    #[error("Timeout after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    /// Error indication from the transport layer
    #[error("Transport error: {0}")]
    Transport(String),

    /// Agent answered with a non-zero error-status
    #[error("Error status {status} at varbind {index}")]
    ErrorStatus { status: u32, index: u32 },

    /// Agent answered without any varbind
    #[error("Empty response")]
    EmptyResponse,

    #[error("Invalid OID: {0}")]
    InvalidOid(String),

    /// Value present but not of the expected kind
    #[error("Unexpected value: {0}")]
    UnexpectedValue(String),
}

/// Fatal outcome of one interface fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connectivity probe failed
    #[error("No interface data retrieved")]
    Unreachable,

    /// Every core column walk came back empty
    #[error("No interfaces found")]
    NoInterfaces,

    /// Worker failed outside the normal flow
    #[error("SNMP operation failed: {0}")]
    Failed(String),
}
