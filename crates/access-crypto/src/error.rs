//! Errors from key handling, signing and verification.

use thiserror::Error;

/// Error type for `access-crypto`.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// A signature could not be produced.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A signature did not verify.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key material is malformed or missing.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Base64 input could not be decoded.
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
}
