//! Errors at the message boundary.

use access_crypto::CryptoError;
use access_policy::PolicyError;
use thiserror::Error;

/// Error type for `access-protocol`.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A message is not valid JSON or has the wrong shape.
    #[error("invalid message: {0}")]
    Json(#[from] serde_json::Error),

    /// Signing or verification failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A carried policy is malformed or its id does not match its payload.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// A masked preview policy was about to leave the device.
    #[error("policy {0} is a masked preview and cannot be sent")]
    Obfuscated(String),

    /// A stored policy list is unusable.
    #[error("policy store: {0}")]
    Store(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
