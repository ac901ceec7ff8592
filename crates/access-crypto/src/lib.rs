//! # access-crypto — Policy Signing
//!
//! The signing collaborator for delegated policies. A delegate request
//! carries a detached Ed25519 signature over the UTF-8 bytes of the policy
//! id, base64 encoded.
//!
//! ## Crate Policy
//!
//! - Depends only on `access-core` internally.
//! - Private keys are never serialized or logged.
//! - Masked preview ids are never signed.

pub mod ed25519;
pub mod error;
pub mod signer;

pub use ed25519::{verify_policy_id, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::CryptoError;
pub use signer::{LocalSigner, PolicySigner};
