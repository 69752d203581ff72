//! Error taxonomy shared by the bridge.
//!
//! Refresh timeouts and missing records are NOT errors: those paths resolve to
//! `None`. The variants here are the hard failures a caller has to handle.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// A bounded wait ran out and there is no cached fallback.
    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: &'static str, after: Duration },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The host application runtime/session is not ready.
    #[error("Runtime unavailable: {0}")]
    RuntimeUnavailable(String),
    #[error("Malformed inbound packet: {0}")]
    Decode(String),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<prost::DecodeError> for BridgeError {
    fn from(err: prost::DecodeError) -> Self {
        BridgeError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
