//! # Policy Signer Abstraction
//!
//! Delegate requests are signed through [`PolicySigner`] so the request
//! builder does not care where the owner's key lives. [`LocalSigner`] holds
//! the key in process memory and can load it from an environment variable
//! holding a base64 secret.

use access_core::PolicyId;

use crate::ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::error::CryptoError;

/// Signs policy ids on behalf of a policy owner.
pub trait PolicySigner: Send + Sync {
    /// Detached signature over the UTF-8 bytes of `policy_id`.
    fn sign(&self, policy_id: &PolicyId) -> Result<Ed25519Signature, CryptoError>;

    /// Public key matching the signatures.
    fn public_key(&self) -> Ed25519PublicKey;

    /// Short backend name for logs.
    fn provider_name(&self) -> &str;
}

/// Signer backed by an in-memory key pair.
#[derive(Debug)]
pub struct LocalSigner {
    key: Ed25519KeyPair,
}

impl LocalSigner {
    /// Wrap a key pair.
    pub fn new(key: Ed25519KeyPair) -> Self {
        Self { key }
    }

    /// Random key.
    pub fn generate() -> Self {
        Self::new(Ed25519KeyPair::generate())
    }

    /// Load a base64 secret from the environment variable `var_name`.
    ///
    /// # Errors
    ///
    /// `CryptoError::InvalidKey` if the variable is unset, otherwise whatever
    /// [`Ed25519KeyPair::from_base64_secret`] reports.
    pub fn from_env(var_name: &str) -> Result<Self, CryptoError> {
        let encoded = std::env::var(var_name)
            .map_err(|_| CryptoError::InvalidKey(format!("environment variable {var_name} not set")))?;
        let key = Ed25519KeyPair::from_base64_secret(&encoded)?;
        tracing::debug!(var = var_name, public_key = %key.public_key(), "loaded signing key");
        Ok(Self::new(key))
    }
}

impl PolicySigner for LocalSigner {
    fn sign(&self, policy_id: &PolicyId) -> Result<Ed25519Signature, CryptoError> {
        self.key.sign_policy_id(policy_id)
    }

    fn public_key(&self) -> Ed25519PublicKey {
        self.key.public_key()
    }

    fn provider_name(&self) -> &str {
        "LocalSigner"
    }
}
