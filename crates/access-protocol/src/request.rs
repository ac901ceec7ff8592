//! # Policy Store Requests
//!
//! Bodies sent to the policy store's `/policy` endpoint. A delegate request
//! carries the full policy document and the owner's base64 signature over
//! its policy id:
//!
//! ```json
//! {"owner_id": "…", "device_id": "123", "policy": {…}, "signature": "base64…"}
//! ```

use access_crypto::{verify_policy_id, Ed25519PublicKey, Ed25519Signature, PolicySigner};
use access_policy::Policy;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Submission of a policy on behalf of its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatePolicyRequest {
    /// Public id of the delegating owner.
    pub owner_id: String,
    /// Device the policy applies to.
    pub device_id: String,
    /// The policy document.
    pub policy: Policy,
    /// Base64 signature over the UTF-8 policy id.
    pub signature: String,
}

impl DelegatePolicyRequest {
    /// Sign `policy` and build the request.
    ///
    /// # Errors
    ///
    /// `ProtocolError::Obfuscated` for a preview policy and
    /// `ProtocolError::Crypto` when the signer fails.
    pub fn sign(
        policy: &Policy,
        owner_id: impl Into<String>,
        device_id: impl Into<String>,
        signer: &dyn PolicySigner,
    ) -> Result<Self, ProtocolError> {
        if policy.is_obfuscated() {
            return Err(ProtocolError::Obfuscated(policy.policy_id().to_string()));
        }
        let signature = signer.sign(policy.policy_id())?.to_base64();
        tracing::debug!(
            policy_id = %policy.policy_id(),
            signer = signer.provider_name(),
            "signed delegate request"
        );
        Ok(Self {
            owner_id: owner_id.into(),
            device_id: device_id.into(),
            policy: policy.clone(),
            signature,
        })
    }

    /// Check the signature and that the policy id matches its payload.
    pub fn verify(&self, owner_key: &Ed25519PublicKey) -> Result<(), ProtocolError> {
        let signature = Ed25519Signature::from_base64(&self.signature)?;
        verify_policy_id(self.policy.policy_id(), &signature, owner_key)?;
        self.policy.verify_id()?;
        Ok(())
    }

    /// Encode as compact JSON.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Removal of every policy stored for a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearPolicyListRequest {
    /// Device whose policies are cleared.
    pub device_id: String,
}

impl ClearPolicyListRequest {
    /// Request for `device_id`.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use access_crypto::{Ed25519KeyPair, LocalSigner};
    use access_policy::{assemble, Catalog, Delegation, RuleBook};
    use serde_json::Value;

    fn policy(obfuscate: bool) -> Policy {
        let catalog = Catalog::default();
        let delegation = Delegation {
            users: vec![catalog.users[1].clone()],
            cost: "0.1".into(),
            ..Delegation::default()
        };
        assemble(&delegation, &RuleBook::new(), Some(&catalog.actions[2]), obfuscate).unwrap()
    }

    #[test]
    fn signed_request_shape_and_verification() {
        let signer = LocalSigner::new(Ed25519KeyPair::from_seed(&[4u8; 32]));
        let p = policy(false);
        let req = DelegatePolicyRequest::sign(&p, "owner", "123", &signer).unwrap();
        let v: Value = serde_json::from_str(&req.to_json().unwrap()).unwrap();
        assert_eq!(v["owner_id"], "owner");
        assert_eq!(v["device_id"], "123");
        assert_eq!(v["policy"]["policy_id"], p.policy_id().as_str());
        assert_eq!(v["policy"]["hash_function"], "sha-256");
        req.verify(&signer.public_key()).unwrap();
    }

    #[test]
    fn preview_policy_never_signed() {
        let signer = LocalSigner::generate();
        let err = DelegatePolicyRequest::sign(&policy(true), "owner", "123", &signer).unwrap_err();
        assert!(matches!(err, ProtocolError::Obfuscated(_)));
    }

    #[test]
    fn tampered_signature_fails() {
        let signer = LocalSigner::generate();
        let mut req = DelegatePolicyRequest::sign(&policy(false), "owner", "123", &signer).unwrap();
        let other = LocalSigner::generate();
        assert!(req.verify(&other.public_key()).is_err());
        req.signature = "not base64!".into();
        assert!(matches!(req.verify(&signer.public_key()), Err(ProtocolError::Crypto(_))));
    }

    #[test]
    fn request_roundtrips_through_json() {
        let signer = LocalSigner::generate();
        let req = DelegatePolicyRequest::sign(&policy(false), "owner", "123", &signer).unwrap();
        let back: DelegatePolicyRequest = serde_json::from_str(&req.to_json().unwrap()).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn clear_request_shape() {
        let json = serde_json::to_string(&ClearPolicyListRequest::new("123")).unwrap();
        assert_eq!(json, r#"{"device_id":"123"}"#);
    }
}
